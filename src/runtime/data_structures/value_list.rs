use crate::runtime::data_structures::value::Value;
use gc::{Finalize, Gc, Trace};
use std::{
    fmt::{self, Display, Formatter},
    ops::Index,
};

/// An immutable list of interpreter values.  Lists are snapshots: every list operation builds a
/// new list and the original stays as it was, so sharing one between several deferred
/// computations is always safe.
#[derive(Clone, PartialEq, Debug, Trace, Finalize)]
pub struct ValueList {
    values: Gc<Vec<Value>>,
}

/// Pretty print the list for debugging and other uses.
impl Display for ValueList {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if self.values.is_empty() {
            return write!(f, "[]");
        }

        write!(f, "[ ")?;

        for (index, value) in self.values.iter().enumerate() {
            if let Value::String(text) = value {
                write!(f, "{}", Value::stringify(text))?;
            } else {
                write!(f, "{}", value)?;
            }

            if index < self.values.len() - 1 {
                write!(f, ", ")?;
            } else {
                write!(f, " ")?;
            }
        }

        write!(f, "]")
    }
}

/// Access a value by index.
impl Index<usize> for ValueList {
    type Output = Value;

    fn index(&self, index: usize) -> &Self::Output {
        if index >= self.len() {
            panic!("Index {} out of bounds {}!", index, self.len());
        }

        &self.values[index]
    }
}

impl From<Vec<Value>> for ValueList {
    fn from(values: Vec<Value>) -> ValueList {
        ValueList {
            values: Gc::new(values),
        }
    }
}

impl ValueList {
    /// The empty list, also known as `void`.
    pub fn empty() -> ValueList {
        ValueList::from(Vec::new())
    }

    /// A list holding one value.
    pub fn singleton(value: Value) -> ValueList {
        ValueList::from(vec![value])
    }

    /// Make sure users of the list can iterate it's values.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }

    /// How big is the list?
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checked access by index.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// A new list with the value added to the end.
    pub fn appended(&self, value: Value) -> ValueList {
        let mut values = self.values.to_vec();

        values.push(value);
        ValueList::from(values)
    }

    /// A new list holding this list's values followed by the other's.
    pub fn concatenated(&self, other: &ValueList) -> ValueList {
        let mut values = Vec::with_capacity(self.len() + other.len());

        values.extend_from_slice(&self.values);
        values.extend_from_slice(&other.values);
        ValueList::from(values)
    }

    /// Split off the last value, returning the remaining list and that value.
    pub fn split_last(&self) -> Option<(ValueList, Value)> {
        let (last, rest) = self.values.split_last()?;

        Some((ValueList::from(rest.to_vec()), last.clone()))
    }

    /// Copy the values out into a vector.
    pub fn to_vec(&self) -> Vec<Value> {
        self.values.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> ValueList {
        ValueList::from(values.iter().map(|value| Value::Int(*value)).collect::<Vec<_>>())
    }

    #[test]
    fn operations_leave_the_original_untouched() {
        let original = ints(&[1, 2]);

        let appended = original.appended(Value::Int(3));
        let joined = original.concatenated(&ints(&[9]));

        assert_eq!(original, ints(&[1, 2]));
        assert_eq!(appended, ints(&[1, 2, 3]));
        assert_eq!(joined, ints(&[1, 2, 9]));
    }

    #[test]
    fn split_last_of_singleton_leaves_empty() {
        let (rest, last) = ints(&[5]).split_last().unwrap();

        assert!(rest.is_empty());
        assert_eq!(last, Value::Int(5));
        assert!(ValueList::empty().split_last().is_none());
    }

    #[test]
    fn display_quotes_strings() {
        let list = ValueList::from(vec![Value::Int(1), Value::String("a".to_string())]);

        assert_eq!(list.to_string(), "[ 1, \"a\" ]");
        assert_eq!(ValueList::empty().to_string(), "[]");
    }
}
