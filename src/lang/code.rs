use crate::{lang::source_buffer::SourceLocation, runtime::data_structures::value::Value};
use std::{
    fmt::{self, Debug, Display, Formatter},
    rc::Rc,
};

/// The operations a callable unit is made of.  Each one is a step over the invocation's local
/// stack and scope frame, see `runtime::interpreter::operators` for what each of them does.
#[derive(Clone)]
pub enum Op {
    /// Push an already settled value.  Used for literals and for symbol names.
    PushValue(Value),

    /// Push a callable made from a nested unit and the current frame.
    PushClosure(Rc<FunctionBody>),

    /// Declare a name in the current frame.  Expects the name on top and the value under it.
    Bind,

    /// Overwrite a name in the frame that already owns it.  Same stack layout as Bind.
    Rebind,

    /// Replace the name on top of the stack with its bound value.
    Lookup,

    /// Push the positional input of the current invocation.
    Input,

    /// Pop f then g and push the composition f(g(x)).
    Compose,

    /// Pop a value and push it forced.
    Force,

    /// Pop a handler then a guarded callable and push the guarded callable.
    Catch,

    /// Pop b then a and push their concatenation.
    Concat,

    /// Pop a value then a list and push the list with the value appended.
    Push,

    /// Pop a list and push everything but its last element, then the last element.
    Pop,

    /// Wrap the top of the stack in a single element list.
    NewList,

    /// Pop a callable then a list and push the list of results.
    Map,

    /// Pop a callable then a list or generator and push the accumulator function.
    Reduce,

    /// Load, run and push the result of a module.
    Load,

    /// Load a module and push its top level unit without running it.
    Access,

    /// Drop the top of the stack.
    Clear,
}

impl PartialEq for Op {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Op::PushValue(a), Op::PushValue(b)) => a == b,
            (Op::PushClosure(a), Op::PushClosure(b)) => Rc::ptr_eq(a, b),
            (Op::Bind, Op::Bind) => true,
            (Op::Rebind, Op::Rebind) => true,
            (Op::Lookup, Op::Lookup) => true,
            (Op::Input, Op::Input) => true,
            (Op::Compose, Op::Compose) => true,
            (Op::Force, Op::Force) => true,
            (Op::Catch, Op::Catch) => true,
            (Op::Concat, Op::Concat) => true,
            (Op::Push, Op::Push) => true,
            (Op::Pop, Op::Pop) => true,
            (Op::NewList, Op::NewList) => true,
            (Op::Map, Op::Map) => true,
            (Op::Reduce, Op::Reduce) => true,
            (Op::Load, Op::Load) => true,
            (Op::Access, Op::Access) => true,
            (Op::Clear, Op::Clear) => true,

            _ => false,
        }
    }
}

/// A single step of a callable unit along with where it came from.
#[derive(Clone, PartialEq, Debug)]
pub struct Instruction {
    /// Location in the source code this instruction was generated from.
    pub location: SourceLocation,

    /// The operation to perform.
    pub op: Op,
}

impl Instruction {
    /// Create a new instruction with a location and operation.
    pub fn new(location: SourceLocation, op: Op) -> Instruction {
        Instruction { location, op }
    }
}

/// Allow for pretty printing of the operation and it's value.
impl Display for Op {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            // Strings are shown quoted so that they can be told apart from symbol names.
            Op::PushValue(value) => write!(f, "PushValue   {:?}", value),
            Op::PushClosure(body) => write!(
                f,
                "PushClosure {} instructions{}",
                body.code.len(),
                if body.is_tail() { ", tail" } else { "" }
            ),
            Op::Bind => write!(f, "Bind"),
            Op::Rebind => write!(f, "Rebind"),
            Op::Lookup => write!(f, "Lookup"),
            Op::Input => write!(f, "Input"),
            Op::Compose => write!(f, "Compose"),
            Op::Force => write!(f, "Force"),
            Op::Catch => write!(f, "Catch"),
            Op::Concat => write!(f, "Concat"),
            Op::Push => write!(f, "Push"),
            Op::Pop => write!(f, "Pop"),
            Op::NewList => write!(f, "NewList"),
            Op::Map => write!(f, "Map"),
            Op::Reduce => write!(f, "Reduce"),
            Op::Load => write!(f, "Load"),
            Op::Access => write!(f, "Access"),
            Op::Clear => write!(f, "Clear"),
        }
    }
}

impl Debug for Op {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.op)
    }
}

/// The instructions that make up one callable unit, in source order.
pub type Code = Vec<Instruction>;

/// A parsed `( ... )` region, or the top level of a file.  Bodies are immutable once built and are
/// shared between every closure made from them.
#[derive(Debug)]
pub struct FunctionBody {
    /// The steps to run on every invocation.
    pub code: Code,

    /// Where the body's trailing force was, when it ended in one.  That force is dropped from
    /// the code and performed by the caller's trampoline instead.
    pub tail_force: Option<SourceLocation>,

    /// Where the body starts in the original source.
    pub location: SourceLocation,
}

impl FunctionBody {
    pub fn new(
        code: Code,
        tail_force: Option<SourceLocation>,
        location: SourceLocation,
    ) -> FunctionBody {
        FunctionBody {
            code,
            tail_force,
            location,
        }
    }

    /// Did the body end in a force?
    pub fn is_tail(&self) -> bool {
        self.tail_force.is_some()
    }
}

/// Pretty print a body and its nested bodies for debugging purposes.
pub fn pretty_print_code(body: &FunctionBody) -> String {
    use std::fmt::Write;

    fn print_level(result: &mut String, body: &FunctionBody, indent: usize) {
        for (index, instruction) in body.code.iter().enumerate() {
            writeln!(result, "{:indent$}{:4}: {}", "", index, instruction, indent = indent)
                .expect("Writing to String should never fail.");

            if let Op::PushClosure(nested) = &instruction.op {
                print_level(result, nested, indent + 6);
            }
        }
    }

    let mut result = String::with_capacity(body.code.len() * 20);

    print_level(&mut result, body, 0);
    result
}
