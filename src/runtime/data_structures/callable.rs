use crate::{
    lang::{code::FunctionBody, source_buffer::SourceLocation},
    runtime::{
        data_structures::{deferred::Deferred, scope::Scope, value::Value},
        error,
    },
};
use gc::{Finalize, Gc, Trace};
use std::{
    fmt::{self, Display, Formatter},
    rc::Rc,
};

/// The Rust side of a host function.  Receives the invocation's input, if any.
pub type HostHandler = Rc<dyn Fn(Option<Value>) -> error::Result<Value>>;

/// A function provided by the host and registered into the root frame.
#[derive(Trace, Finalize)]
pub struct HostFunction {
    /// The name the function is bound to in the root frame.
    pub name: String,

    /// Where in the Rust source the function was registered.
    #[unsafe_ignore_trace]
    pub location: SourceLocation,

    /// Short help text for the function.
    pub description: String,

    /// The function itself.  Whatever it captured is kept alive for as long as the function is.
    #[unsafe_ignore_trace]
    pub handler: HostHandler,
}

impl HostFunction {
    pub fn new(
        name: &str,
        location: SourceLocation,
        description: &str,
        handler: HostHandler,
    ) -> HostFunction {
        HostFunction {
            name: name.to_string(),
            location,
            description: description.to_string(),
            handler,
        }
    }
}

/// A parsed unit paired with the frame that was current when it was pushed.
#[derive(Trace, Finalize)]
pub struct Closure {
    #[unsafe_ignore_trace]
    pub body: Rc<FunctionBody>,
    pub scope: Scope,
}

/// `f(g(x))`, or `f(g)` when `g` is not callable.
#[derive(Trace, Finalize)]
pub struct Composed {
    pub f: Value,
    pub g: Value,
}

/// Runs the guarded value, handing the error message to the handler on failure.  Both sides are
/// kept deferred so that a failure in computing the guarded value itself is also caught.
#[derive(Trace, Finalize)]
pub struct Guarded {
    pub guarded: Deferred,
    pub handler: Deferred,
}

/// The accumulator function built by reduce.  The source is either a list or a generator
/// callable that maps an index to the next element, answering `None` once it is exhausted.
#[derive(Trace, Finalize)]
pub struct Reducer {
    pub source: Value,
    pub step: Value,
}

/// Everything that can be applied to an argument.  Callables are immutable and shared, so cloning
/// one is cheap and clones compare equal to each other.
#[derive(Clone, Trace, Finalize)]
pub enum Callable {
    Closure(Gc<Closure>),
    Composed(Gc<Composed>),
    Guarded(Gc<Guarded>),
    Reducer(Gc<Reducer>),
    Host(Gc<HostFunction>),
}

impl Callable {
    pub fn closure(body: Rc<FunctionBody>, scope: Scope) -> Callable {
        Callable::Closure(Gc::new(Closure { body, scope }))
    }

    pub fn composed(f: Value, g: Value) -> Callable {
        Callable::Composed(Gc::new(Composed { f, g }))
    }

    pub fn guarded(guarded: Deferred, handler: Deferred) -> Callable {
        Callable::Guarded(Gc::new(Guarded { guarded, handler }))
    }

    pub fn reducer(source: Value, step: Value) -> Callable {
        Callable::Reducer(Gc::new(Reducer { source, step }))
    }

    pub fn host(function: HostFunction) -> Callable {
        Callable::Host(Gc::new(function))
    }

    /// A tail callable hands back an unforced continuation when called, the trampoline is
    /// expected to keep going with it.  A composition inherits this from its outer function.
    pub fn is_tail(&self) -> bool {
        match self {
            Callable::Closure(closure) => closure.body.is_tail(),
            Callable::Composed(composed) => composed.f.is_tail_callable(),
            Callable::Guarded(_) | Callable::Reducer(_) | Callable::Host(_) => false,
        }
    }

    /// Where the force this callable's trampoline performs was written.
    pub fn tail_location(&self) -> Option<SourceLocation> {
        match self {
            Callable::Closure(closure) => closure.body.tail_force.clone(),
            Callable::Composed(composed) => match &composed.f {
                Value::Callable(f) => f.tail_location(),
                _ => None,
            },
            Callable::Guarded(_) | Callable::Reducer(_) | Callable::Host(_) => None,
        }
    }

    /// Identity comparison.
    pub fn same_as(&self, other: &Callable) -> bool {
        match (self, other) {
            (Callable::Closure(a), Callable::Closure(b)) => Gc::ptr_eq(a, b),
            (Callable::Composed(a), Callable::Composed(b)) => Gc::ptr_eq(a, b),
            (Callable::Guarded(a), Callable::Guarded(b)) => Gc::ptr_eq(a, b),
            (Callable::Reducer(a), Callable::Reducer(b)) => Gc::ptr_eq(a, b),
            (Callable::Host(a), Callable::Host(b)) => Gc::ptr_eq(a, b),

            _ => false,
        }
    }
}

impl Display for Callable {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Callable::Closure(closure) => write!(f, "<closure {}>", closure.body.location),
            Callable::Composed(_) => write!(f, "<composition>"),
            Callable::Guarded(_) => write!(f, "<catch>"),
            Callable::Reducer(_) => write!(f, "<reducer>"),
            Callable::Host(host) => write!(f, "<host {}>", host.name),
        }
    }
}
