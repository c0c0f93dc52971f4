use crate::{
    add_host_function,
    runtime::{
        data_structures::{scope::Scope, value::{ToValue, Value}, value_list::ValueList},
        error::{self, script_error, ErrorKind},
    },
};

/// Make sure a value is a number before doing math with it.
fn expect_number(name: &str, value: &Value) -> error::Result<()> {
    if value.is_numeric() {
        Ok(())
    } else {
        script_error(
            ErrorKind::TypeMismatch,
            format!("{} expects numbers, found {}.", name, value.type_name()),
        )
    }
}

/// Helper function to handle math operations.  Handlers for int or floating point operations are
/// passed in as arguments.  Integers stay integers unless either side is a float.
fn math_op(
    a: &Value,
    b: &Value,
    fop: fn(f64, f64) -> f64,
    iop: fn(i64, i64) -> i64,
) -> Value {
    if Value::either_is_float(a, b) {
        fop(a.get_float_val(), b.get_float_val()).to_value()
    } else {
        iop(a.get_int_val(), b.get_int_val()).to_value()
    }
}

/// Fold a list of numbers with an operation, or hand back a lone number unchanged.
fn fold_numbers(
    name: &str,
    input: Option<Value>,
    identity: i64,
    fop: fn(f64, f64) -> f64,
    iop: fn(i64, i64) -> i64,
) -> error::Result<Value> {
    match input {
        Some(Value::List(ref list)) => {
            let mut result = Value::Int(identity);

            for value in list.iter() {
                expect_number(name, value)?;
                result = math_op(&result, value, fop, iop);
            }

            Ok(result)
        }

        Some(value) => {
            expect_number(name, &value)?;
            Ok(value)
        }

        None => missing_input(name),
    }
}

fn missing_input<T>(name: &str) -> error::Result<T> {
    script_error(ErrorKind::Arity, format!("{} must have an input.", name))
}

/// The one or two numbers a binary word was given.
fn one_or_two<'a>(name: &str, list: &'a ValueList) -> error::Result<(&'a Value, Option<&'a Value>)> {
    let found = match list.len() {
        1 => (&list[0], None),
        2 => (&list[0], Some(&list[1])),
        _ => {
            return script_error(
                ErrorKind::Arity,
                format!("{} may only have 1 or 2 inputs.", name),
            );
        }
    };

    expect_number(name, found.0)?;

    if let Some(second) = found.1 {
        expect_number(name, second)?;
    }

    Ok(found)
}

fn negate(value: &Value) -> Value {
    math_op(&Value::Int(0), value, |_, b| -b, |_, b| b.wrapping_neg())
}

/// Add up a list of numbers.
///
/// Signature: `[numbers] -- total`
fn word_sum(input: Option<Value>) -> error::Result<Value> {
    fold_numbers("sum", input, 0, |a, b| a + b, |a, b| a.wrapping_add(b))
}

/// Multiply a list of numbers together.
///
/// Signature: `[numbers] -- product`
fn word_prod(input: Option<Value>) -> error::Result<Value> {
    fold_numbers("prod", input, 1, |a, b| a * b, |a, b| a.wrapping_mul(b))
}

/// Negate a single number, or subtract the second of a pair from the first.
///
/// Signature: `[a b] -- a-b` or `[a] -- -a` or `a -- -a`
fn word_diff(input: Option<Value>) -> error::Result<Value> {
    match input {
        Some(Value::List(ref list)) => match one_or_two("diff", &list)? {
            (a, None) => Ok(negate(a)),
            (a, Some(b)) => Ok(math_op(a, b, |a, b| a - b, |a, b| a.wrapping_sub(b))),
        },

        Some(value) => {
            expect_number("diff", &value)?;
            Ok(negate(&value))
        }

        None => missing_input("diff"),
    }
}

/// Raise the first of a pair to the power of the second.  A single number is returned as is.
///
/// Signature: `[a b] -- a^b` or `[a] -- a` or `a -- a`
fn word_pow(input: Option<Value>) -> error::Result<Value> {
    match input {
        Some(Value::List(ref list)) => match one_or_two("pow", &list)? {
            (a, None) => Ok(a.clone()),
            (Value::Int(base), Some(Value::Int(exponent))) if *exponent >= 0 => {
                match u32::try_from(*exponent) {
                    Ok(exponent) => Ok(Value::Int(base.wrapping_pow(exponent))),
                    Err(_) => Ok(Value::Float((*base as f64).powf(*exponent as f64))),
                }
            }
            (a, Some(b)) => Ok(Value::Float(a.get_float_val().powf(b.get_float_val()))),
        },

        Some(value) => {
            expect_number("pow", &value)?;
            Ok(value)
        }

        None => missing_input("pow"),
    }
}

/// Register the arithmetic words.
pub fn register_simple_arithmetic_words(root: &Scope) -> error::Result<()> {
    add_host_function!(root, "sum", word_sum, "Add up a list of numbers.")?;

    add_host_function!(root, "prod", word_prod, "Multiply a list of numbers together.")?;

    add_host_function!(
        root,
        "diff",
        word_diff,
        "Negate one number or subtract the second of two from the first."
    )?;

    add_host_function!(
        root,
        "pow",
        word_pow,
        "Raise the first of two numbers to the power of the second."
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn list(values: &[Value]) -> Option<Value> {
        Some(Value::List(ValueList::from(values.to_vec())))
    }

    #[test_case(list(&[Value::Int(1), Value::Int(2), Value::Int(3)]), Value::Int(6); "ints stay ints")]
    #[test_case(list(&[Value::Int(1), Value::Float(0.5)]), Value::Float(1.5); "any float makes a float")]
    #[test_case(list(&[]), Value::Int(0); "empty list")]
    #[test_case(Some(Value::Int(4)), Value::Int(4); "scalar")]
    fn sum(input: Option<Value>, expected: Value) {
        assert_eq!(word_sum(input).unwrap(), expected);
    }

    #[test_case(list(&[Value::Int(2), Value::Int(3), Value::Int(4)]), Value::Int(24); "ints")]
    #[test_case(list(&[]), Value::Int(1); "empty list")]
    fn prod(input: Option<Value>, expected: Value) {
        assert_eq!(word_prod(input).unwrap(), expected);
    }

    #[test_case(list(&[Value::Int(5), Value::Int(3)]), Value::Int(2); "subtract")]
    #[test_case(list(&[Value::Int(5)]), Value::Int(-5); "negate one")]
    #[test_case(Some(Value::Float(1.5)), Value::Float(-1.5); "negate scalar")]
    fn diff(input: Option<Value>, expected: Value) {
        assert_eq!(word_diff(input).unwrap(), expected);
    }

    #[test_case(list(&[Value::Int(2), Value::Int(10)]), Value::Int(1024); "int power")]
    #[test_case(list(&[Value::Int(4), Value::Float(0.5)]), Value::Float(2.0); "float power")]
    #[test_case(list(&[Value::Int(7)]), Value::Int(7); "identity")]
    fn pow(input: Option<Value>, expected: Value) {
        assert_eq!(word_pow(input).unwrap(), expected);
    }

    #[test_case(word_diff, None; "diff without input")]
    #[test_case(word_diff, list(&[Value::Int(1), Value::Int(2), Value::Int(3)]); "diff of three")]
    #[test_case(word_pow, None; "pow without input")]
    #[test_case(word_pow, list(&[]); "pow of nothing")]
    fn arity_errors(word: fn(Option<Value>) -> error::Result<Value>, input: Option<Value>) {
        assert_eq!(word(input).unwrap_err().kind(), ErrorKind::Arity);
    }

    #[test]
    fn non_numbers_are_rejected() {
        let error = word_sum(list(&[Value::Int(1), Value::Bool(true)])).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::TypeMismatch);
    }
}
