use crate::{
    add_host_function,
    runtime::{
        data_structures::{scope::Scope, value::Value, value_list::ValueList},
        error::{self, script_error, ErrorKind},
    },
};

/// Helper function to handle logic operations.  A list is folded with the operation starting from
/// the identity, a lone value is just converted to its truth value.
fn logic_op(
    name: &str,
    input: Option<Value>,
    identity: bool,
    bop: fn(bool, bool) -> bool,
) -> error::Result<Value> {
    match input {
        Some(Value::List(ref list)) => Ok(Value::Bool(
            list.iter()
                .fold(identity, |result, value| bop(result, value.get_bool_val())),
        )),

        Some(value) => Ok(Value::Bool(value.get_bool_val())),

        None => script_error(ErrorKind::Arity, format!("{} must have an input.", name)),
    }
}

/// Compare two values for equality.  Numbers compare by value across integers and floats.
///
/// Signature: `[a b] -- bool`
fn word_eq(input: Option<Value>) -> error::Result<Value> {
    match input {
        Some(Value::List(ref list)) if list.len() == 2 => Ok(Value::Bool(list[0] == list[1])),

        _ => script_error(
            ErrorKind::Arity,
            "eq expects a list of 2 values.".to_string(),
        ),
    }
}

/// Logically invert a value, or every value of a list.
///
/// Signature: `value -- bool` or `[values] -- [bools]`
fn word_not(input: Option<Value>) -> error::Result<Value> {
    match input {
        Some(Value::List(ref list)) => Ok(Value::List(ValueList::from(
            list.iter()
                .map(|value| Value::Bool(!value.get_bool_val()))
                .collect::<Vec<_>>(),
        ))),

        Some(value) => Ok(Value::Bool(!value.get_bool_val())),

        None => script_error(ErrorKind::Arity, "not must have an input.".to_string()),
    }
}

/// True if every value is true.
///
/// Signature: `[values] -- bool`
fn word_and(input: Option<Value>) -> error::Result<Value> {
    logic_op("and", input, true, |a, b| a && b)
}

/// True if any value is true.
///
/// Signature: `[values] -- bool`
fn word_or(input: Option<Value>) -> error::Result<Value> {
    logic_op("or", input, false, |a, b| a || b)
}

/// True if an odd number of the values are true.
///
/// Signature: `[values] -- bool`
fn word_xor(input: Option<Value>) -> error::Result<Value> {
    logic_op("xor", input, false, |a, b| a ^ b)
}

/// Register the logic and equality words.
pub fn register_logic_words(root: &Scope) -> error::Result<()> {
    add_host_function!(root, "eq", word_eq, "Are the two values of a pair equal?")?;

    add_host_function!(root, "not", word_not, "Logically invert a value or a list of values.")?;

    add_host_function!(root, "and", word_and, "Are all of the values true?")?;

    add_host_function!(root, "or", word_or, "Are any of the values true?")?;

    add_host_function!(root, "xor", word_xor, "Are an odd number of the values true?")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn bools(values: &[bool]) -> Option<Value> {
        Some(Value::List(ValueList::from(
            values.iter().map(|value| Value::Bool(*value)).collect::<Vec<_>>(),
        )))
    }

    #[test_case(word_and, bools(&[true, false]), false; "and mixed")]
    #[test_case(word_and, bools(&[]), true; "and of nothing")]
    #[test_case(word_or, bools(&[false, true]), true; "or mixed")]
    #[test_case(word_or, bools(&[]), false; "or of nothing")]
    #[test_case(word_xor, bools(&[true, true, true]), true; "xor odd")]
    #[test_case(word_xor, bools(&[true, true]), false; "xor even")]
    #[test_case(word_and, Some(Value::Int(0)), false; "scalar truth")]
    fn folds(word: fn(Option<Value>) -> error::Result<Value>, input: Option<Value>, expected: bool) {
        assert_eq!(word(input).unwrap(), Value::Bool(expected));
    }

    #[test]
    fn eq_compares_numbers_across_types() {
        let pair = Some(Value::List(ValueList::from(vec![Value::Int(2), Value::Float(2.0)])));

        assert_eq!(word_eq(pair).unwrap(), Value::Bool(true));
        assert_eq!(word_eq(Some(Value::Int(1))).unwrap_err().kind(), ErrorKind::Arity);
    }

    #[test]
    fn not_works_element_wise() {
        assert_eq!(word_not(bools(&[true, false])).unwrap(), bools(&[false, true]).unwrap());
        assert_eq!(word_not(Some(Value::Bool(false))).unwrap(), Value::Bool(true));
    }
}
