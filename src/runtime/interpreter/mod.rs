use crate::{
    lang::code::FunctionBody,
    runtime::{
        data_structures::{
            callable::{Callable, Reducer},
            deferred::{Deferred, LocalFuture},
            scope::{Frame, Scope},
            value::Value,
            value_list::ValueList,
        },
        error::{self, script_error, ErrorKind},
    },
};
use iceoryx2_bb_log::debug;
use std::future::Future;
use tokio::{runtime::Runtime, task::LocalSet};

pub mod gall_interpreter;
pub mod modules;
pub mod operators;

/// Trait for feeding source code to an interpreter and getting the final value back.
pub trait CodeManagement {
    /// Build and run a piece of source code.  The path is only used for error locations, and
    /// module references in the code resolve against the working directory.
    fn process_source(&mut self, path: &str, source: &str) -> error::Result<Value>;

    /// Find, build and run a source file as a module.
    fn process_source_file(&mut self, path: &str) -> error::Result<Value>;
}

/// Drive a future to completion on a fresh `LocalSet`, then keep going until every computation it
/// started has settled as well.
pub fn block_on_local<F: Future>(runtime: &Runtime, future: F) -> F::Output {
    let local = LocalSet::new();
    let output = local.block_on(runtime, future);

    runtime.block_on(local);
    output
}

/// Like `block_on_local` on a throwaway runtime.
#[cfg(test)]
pub fn run_local<F: Future>(future: F) -> F::Output {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("Failed to build the test runtime.");

    block_on_local(&runtime, future)
}

/// Fully resolve a value, applying it to the input if there is one.
///
/// Tail callables are run on a trampoline: each call hands back the continuation the body would
/// have forced, and the loop keeps calling those in place so deep tail recursion never nests.
pub fn force(value: Value, input: Option<Value>) -> LocalFuture<error::Result<Value>> {
    Box::pin(async move {
        let callable = match value {
            Value::Callable(ref callable) => callable.clone(),
            other => return apply_value(other, input),
        };

        if !callable.is_tail() {
            return call(callable, input).await;
        }

        let tail_location = callable.tail_location();

        let outcome = async move {
            let mut next = call(callable, input).await?;

            loop {
                next = match next {
                    Value::Callable(ref callable) if callable.is_tail() => {
                        call(callable.clone(), None).await?
                    }
                    Value::Callable(ref callable) => return call(callable.clone(), None).await,
                    other => return Ok(other),
                };
            }
        }
        .await;

        // Failures of the continuations are reported at the force that was dropped.
        match tail_location {
            Some(location) => outcome.map_err(|error| error.or_location(&location)),
            None => outcome,
        }
    })
}

/// Invoke a callable once.  Unlike `force` the result of a tail callable is handed back as is.
pub fn call(callable: Callable, input: Option<Value>) -> LocalFuture<error::Result<Value>> {
    Box::pin(async move {
        match callable {
            Callable::Closure(ref closure) => {
                let frame = Frame::new_child(&closure.scope, input.map(Deferred::settled));
                run_code(&closure.body, frame).await
            }

            Callable::Composed(ref composed) => {
                let inner = if composed.g.is_callable() {
                    force(composed.g.clone(), input).await?
                } else {
                    composed.g.clone()
                };

                match &composed.f {
                    Value::Callable(f) if f.is_tail() => call(f.clone(), Some(inner)).await,
                    f => force(f.clone(), Some(inner)).await,
                }
            }

            Callable::Guarded(ref guarded) => {
                let outcome = match guarded.guarded.get().await {
                    Ok(value) => force(value, input).await,
                    Err(error) => Err(error),
                };

                match outcome {
                    Ok(value) => Ok(value),
                    Err(error) => {
                        debug!("Catch intercepted: {}", error);

                        let handler = guarded.handler.get().await?;
                        force(handler, Some(Value::String(error.to_string()))).await
                    }
                }
            }

            Callable::Reducer(ref reducer) => reduce(&reducer, input).await,

            Callable::Host(ref host) => (host.handler)(input),
        }
    })
}

/// Run a unit's instructions against a fresh local stack, in source order, and hand back whatever
/// ended up on top.
pub async fn run_code(body: &FunctionBody, frame: Scope) -> error::Result<Value> {
    let mut stack = operators::LocalStack::new();

    for instruction in &body.code {
        operators::execute_instruction(instruction, &mut stack, &frame)
            .await
            .map_err(|error| error.or_location(&instruction.location))?;
    }

    match stack.pop() {
        Some(top) => top.get().await,
        None => Ok(Value::None),
    }
}

/// Apply a value that isn't callable.  Without an input that's the value itself, lists can be
/// indexed, anything else is an error.
pub fn apply_value(value: Value, input: Option<Value>) -> error::Result<Value> {
    let Some(input) = input else {
        return Ok(value);
    };

    match value {
        Value::List(ref list) => index_list(list, &input),
        other => script_error(
            ErrorKind::NotCallable,
            format!("Value {:?} of type {} is not callable.", other, other.type_name()),
        ),
    }
}

/// Integers index from zero, `false` picks the first element and `true` the second.
fn index_list(list: &ValueList, index: &Value) -> error::Result<Value> {
    let position = match index {
        Value::Int(position) => *position,
        Value::Bool(flag) => *flag as i64,
        other => {
            return script_error(
                ErrorKind::TypeMismatch,
                format!("Lists are indexed by integers or booleans, not {}.", other.type_name()),
            );
        }
    };

    let found = usize::try_from(position)
        .ok()
        .and_then(|position| list.get(position));

    match found {
        Some(value) => Ok(value.clone()),
        None => script_error(
            ErrorKind::Index,
            format!("Index {} out of range for a list of {} values.", position, list.len()),
        ),
    }
}

/// Left fold the reducer's source through its step function.  The step is given
/// `[accumulator, element, index]` and calls run one after the other in index order.
async fn reduce(reducer: &Reducer, init: Option<Value>) -> error::Result<Value> {
    let step = |accumulator: Value, element: Value, index: usize| {
        let arguments = ValueList::from(vec![accumulator, element, Value::Int(index as i64)]);
        force(reducer.step.clone(), Some(Value::List(arguments)))
    };

    match &reducer.source {
        Value::List(list) => {
            let (mut accumulator, start) = match init {
                Some(init) => (init, 0),
                None => match list.get(0) {
                    Some(first) => (first.clone(), 1),
                    None => {
                        return script_error(
                            ErrorKind::EmptyList,
                            "Can not reduce an empty list without an initial value.".to_string(),
                        );
                    }
                },
            };

            for (index, element) in list.iter().enumerate().skip(start) {
                accumulator = step(accumulator, element.clone(), index).await?;
            }

            Ok(accumulator)
        }

        generator => {
            let next = |index: usize| force(generator.clone(), Some(Value::Int(index as i64)));

            let (mut accumulator, mut index) = match init {
                Some(init) => (init, 0),
                None => match next(0).await? {
                    Value::None => {
                        return script_error(
                            ErrorKind::EmptyList,
                            "Can not reduce an empty generator without an initial value."
                                .to_string(),
                        );
                    }
                    first => (first, 1),
                },
            };

            loop {
                let element = next(index).await?;

                if element.is_none() {
                    return Ok(accumulator);
                }

                accumulator = step(accumulator, element, index).await?;
                index += 1;
            }
        }
    }
}
