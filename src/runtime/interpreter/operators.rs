use crate::{
    lang::{
        code::{Instruction, Op},
        source_buffer::SourceLocation,
    },
    runtime::{
        data_structures::{
            callable::Callable,
            deferred::{settle_all, Deferred},
            scope::{Frame, Scope},
            value::Value,
            value_list::ValueList,
        },
        error::{self, script_error, script_error_str, ErrorKind},
        interpreter::force,
    },
};
use iceoryx2_bb_log::trace;

/// The per-invocation stack.  Every slot holds a deferred value, settled or not.
pub type LocalStack = Vec<Deferred>;

/// Pop the top slot of the local stack.
fn pop(stack: &mut LocalStack) -> error::Result<Deferred> {
    match stack.pop() {
        Some(slot) => Ok(slot),
        None => script_error_str(ErrorKind::StackUnderflow, "Stack underflow."),
    }
}

/// Wait for a name operand and make sure it really is a name.
async fn pop_key(stack: &mut LocalStack) -> error::Result<String> {
    let key = pop(stack)?.get().await?;

    match key {
        Value::String(ref key) => Ok(key.clone()),
        other => script_error(
            ErrorKind::TypeMismatch,
            format!("Expected a name, found {}.", other.type_name()),
        ),
    }
}

/// Run one instruction against the invocation's stack and frame.
///
/// Instructions that only need names, the frame or already known values do their work right away.
/// Everything else starts a computation and pushes its deferred result without waiting, which is
/// what lets sibling computations overlap.
pub async fn execute_instruction(
    instruction: &Instruction,
    stack: &mut LocalStack,
    frame: &Scope,
) -> error::Result<()> {
    let location = &instruction.location;

    match &instruction.op {
        Op::PushValue(value) => stack.push(Deferred::settled(value.clone())),

        Op::PushClosure(body) => {
            let closure = Callable::closure(body.clone(), frame.clone());
            stack.push(Deferred::settled(Value::Callable(closure)));
        }

        Op::Bind => {
            let key = pop_key(stack).await?;
            let value = pop(stack)?;

            frame.declare(&key, value)?;
        }

        Op::Rebind => {
            let key = pop_key(stack).await?;
            let value = pop(stack)?;

            frame.rebind(&key, value)?;
        }

        Op::Lookup => {
            let key = pop_key(stack).await?;
            stack.push(frame.lookup(&key)?);
        }

        Op::Input => stack.push(frame.input()?),

        Op::Compose => {
            let f = pop(stack)?;
            let g = pop(stack)?;

            stack.push(Deferred::spawn_at(location, async move {
                let mut operands = settle_all(&[g, f]).await?.into_iter();

                let g = operands.next().unwrap_or_default();
                let f = operands.next().unwrap_or_default();

                Ok(Value::Callable(Callable::composed(f, g)))
            }));
        }

        Op::Force => {
            let f = pop(stack)?;

            stack.push(Deferred::spawn_at(location, async move {
                force(f.get().await?, None).await
            }));
        }

        Op::Catch => {
            let handler = pop(stack)?;
            let guarded = pop(stack)?;

            stack.push(Deferred::settled(Value::Callable(Callable::guarded(
                guarded, handler,
            ))));
        }

        Op::Concat => {
            let b = pop(stack)?;
            let a = pop(stack)?;

            stack.push(Deferred::spawn_at(location, async move {
                let mut operands = settle_all(&[a, b]).await?.into_iter();

                let a = operands.next().unwrap_or_default();
                let b = operands.next().unwrap_or_default();

                concat_values(a, b)
            }));
        }

        Op::Push => {
            let value = pop(stack)?;
            let list = pop(stack)?;

            stack.push(Deferred::spawn_at(location, async move {
                let mut operands = settle_all(&[list, value]).await?.into_iter();

                let list = operands.next().unwrap_or_default();
                let value = operands.next().unwrap_or_default();

                Ok(Value::List(list.as_list()?.appended(value)))
            }));
        }

        Op::Pop => {
            let list = pop(stack)?;

            let split = list.then(location, |list| {
                match list.as_list()?.split_last() {
                    Some((rest, last)) => Ok(Value::List(ValueList::from(vec![
                        Value::List(rest),
                        last,
                    ]))),
                    None => script_error_str(ErrorKind::EmptyList, "Can not pop from an empty list."),
                }
            });

            stack.push(split.then(location, |pair| Ok(pair.as_list()?[0].clone())));
            stack.push(split.then(location, |pair| Ok(pair.as_list()?[1].clone())));
        }

        Op::NewList => {
            let value = pop(stack)?;

            stack.push(value.then(location, |value| {
                Ok(Value::List(ValueList::singleton(value)))
            }));
        }

        Op::Map => {
            let f = pop(stack)?;
            let list = pop(stack)?;
            let element_location = location.clone();

            stack.push(Deferred::spawn_at(location, async move {
                let mut operands = settle_all(&[list, f]).await?.into_iter();

                let list = operands.next().unwrap_or_default();
                let f = operands.next().unwrap_or_default();

                map_values(&element_location, list.as_list()?, f).await
            }));
        }

        Op::Reduce => {
            let f = pop(stack)?;
            let source = pop(stack)?;

            stack.push(Deferred::spawn_at(location, async move {
                let mut operands = settle_all(&[source, f]).await?.into_iter();

                let source = operands.next().unwrap_or_default();
                let f = operands.next().unwrap_or_default();

                if !source.is_list() && !source.is_callable() {
                    return script_error(
                        ErrorKind::TypeMismatch,
                        format!("Can not reduce over {}.", source.type_name()),
                    );
                }

                Ok(Value::Callable(Callable::reducer(source, f)))
            }));
        }

        Op::Load => {
            let reference = pop(stack)?;
            let frame = frame.clone();

            stack.push(Deferred::spawn_at(location, async move {
                let module = open_module(reference, &frame).await?;
                force(module, None).await
            }));
        }

        Op::Access => {
            let reference = pop(stack)?;
            let frame = frame.clone();

            stack.push(Deferred::spawn_at(location, async move {
                open_module(reference, &frame).await
            }));
        }

        Op::Clear => {
            pop(stack)?;
        }
    }

    Ok(())
}

/// Join two lists or two strings.  The empty list joins with anything as an identity.
pub fn concat_values(a: Value, b: Value) -> error::Result<Value> {
    match (a, b) {
        (Value::List(ref a), Value::List(ref b)) => Ok(Value::List(a.concatenated(b))),
        (Value::String(ref a), Value::String(ref b)) => Ok(Value::String(a.clone() + b)),

        (a, b) if b.is_void() => Ok(a),
        (a, b) if a.is_void() => Ok(b),

        (a, b) => script_error(
            ErrorKind::TypeMismatch,
            format!("Can not concatenate {} with {}.", a.type_name(), b.type_name()),
        ),
    }
}

/// Apply the function to every `[element, index]` pair.  All of the applications are started
/// before any is waited on, the results still come back in index order.
async fn map_values(location: &SourceLocation, list: &ValueList, f: Value) -> error::Result<Value> {
    let results: Vec<Deferred> = list
        .iter()
        .enumerate()
        .map(|(index, element)| {
            let pair = ValueList::from(vec![element.clone(), Value::Int(index as i64)]);
            Deferred::spawn_at(location, force(f.clone(), Some(Value::List(pair))))
        })
        .collect();

    Ok(Value::List(ValueList::from(settle_all(&results).await?)))
}

/// Resolve, load and wrap a module's top level unit in a closure over a fresh module frame.
async fn open_module(reference: Deferred, frame: &Scope) -> error::Result<Value> {
    let reference = match reference.get().await? {
        Value::String(ref reference) => reference.clone(),
        other => {
            return script_error(
                ErrorKind::TypeMismatch,
                format!("Module references must be strings, found {}.", other.type_name()),
            );
        }
    };

    let loader = frame.loader()?;
    let path = loader.resolve(&reference, frame.module_dir())?;

    trace!("Module reference {} resolved to {}.", reference, path.display());

    let body = loader.load(&path).await?;
    let module_frame = Frame::new_module(&Frame::root(frame), path);

    Ok(Value::Callable(Callable::closure(body, module_frame)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn strings(values: &[&str]) -> Value {
        Value::List(ValueList::from(
            values
                .iter()
                .map(|value| Value::String(value.to_string()))
                .collect::<Vec<_>>(),
        ))
    }

    #[test_case(strings(&["a"]), strings(&["b"]), strings(&["a", "b"]); "lists")]
    #[test_case(Value::from("ab".to_string()), Value::from("c".to_string()), Value::from("abc".to_string()); "strings")]
    #[test_case(strings(&["a"]), Value::void(), strings(&["a"]); "void on the right")]
    #[test_case(Value::void(), Value::from("x".to_string()), Value::from("x".to_string()); "void on the left")]
    fn concatenation(a: Value, b: Value, expected: Value) {
        assert_eq!(concat_values(a, b).unwrap(), expected);
    }

    #[test]
    fn concatenation_is_associative() {
        let (a, b, c) = (strings(&["a"]), strings(&["b", "c"]), strings(&["d"]));

        let left = concat_values(concat_values(a.clone(), b.clone()).unwrap(), c.clone()).unwrap();
        let right = concat_values(a, concat_values(b, c).unwrap()).unwrap();

        assert_eq!(left, right);
    }

    #[test]
    fn mixed_concatenation_is_a_type_mismatch() {
        let error = concat_values(Value::Int(1), Value::from("a".to_string())).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn underflow_is_reported() {
        let mut stack = LocalStack::new();
        assert_eq!(pop(&mut stack).unwrap_err().kind(), ErrorKind::StackUnderflow);
    }
}
