use std::fmt::{ self,
                Debug,
                Display,
                Formatter };
use gc::{ Finalize, Trace };
use crate::runtime::{ data_structures::{ callable::Callable,
                                         value_list::ValueList },
                      error::{ self,
                               script_error,
                               ErrorKind } };



/// Core value enumeration used by the Gall interpreter.  Everything a program can push, bind or
/// pass to a callable is one of these.
#[derive(Clone, Default, Trace, Finalize)]
pub enum Value
{
    /// The value represents nothing.  This is what an invocation that leaves nothing on its
    /// stack produces, and what a generator returns to say it has run out.
    #[default]
    None,

    /// We have an integer value.  Represented as an i64.
    Int(i64),

    /// A floating-point value  Represented as a f64.
    Float(f64),

    /// A boolean value.
    Bool(bool),

    /// A string value, represented by a Rust string.  Symbol names are pushed as strings too.
    String(String),

    /// An immutable list of values.  `void` is the empty list.
    List(ValueList),

    /// Anything that can be applied to an argument.
    Callable(Callable)
}


/// Convert an arbitrary data type to a Value.
pub trait ToValue
{
    /// Implement to handle the actual conversion.
    fn to_value(&self) -> Value;
}


/// Convert a borrowed string into a Value.
impl ToValue for &str
{
    fn to_value(&self) -> Value
    {
        Value::String(self.to_string())
    }
}


/// Manage equality for the Value enumeration.  Integers and floats compare by numeric value,
/// lists compare element by element and callables only equal themselves.
impl PartialEq for Value
{
    fn eq(&self, other: &Value) -> bool
    {
        if Value::both_are_numeric(self, other)
        {
            if Value::either_is_float(self, other)
            {
                self.get_float_val() == other.get_float_val()
            }
            else
            {
                self.get_int_val() == other.get_int_val()
            }
        }
        else
        {
            match ( self, other )
            {
                ( Value::None,         Value::None         ) => true,
                ( Value::Bool(a),      Value::Bool(b)      ) => a == b,
                ( Value::String(a),    Value::String(b)    ) => a == b,
                ( Value::List(a),      Value::List(b)      ) => a == b,
                ( Value::Callable(a),  Value::Callable(b)  ) => a.same_as(b),

                _                                            => false
            }
        }
    }
}


/// Pretty print the value for display.
impl Display for Value
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        match self
        {
            Value::None              => write!(f, "none"),
            Value::Int(value)        => write!(f, "{}", value),
            Value::Float(value)      => write!(f, "{}", value),
            Value::Bool(value)       => write!(f, "{}", value),
            Value::String(value)     => write!(f, "{}", value),
            Value::List(value)       => write!(f, "{}", value),
            Value::Callable(value)   => write!(f, "{}", value)
        }
    }
}


impl Debug for Value
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        match self
        {
            Value::String(value) => write!(f, "{}", Value::stringify(value)),
            _                    => write!(f, "{}", self)
        }
    }
}


/// Define implementations for converting between Values and the raw data types they represent.
macro_rules! value_conversion
{
    ($data_type:ty , $variant:ident , $as_ident:ident , $name:literal) =>
    {
        impl Value
        {
            #[doc = concat!("Convert a value to ", $name, ", or fail with a type mismatch.")]
            pub fn $as_ident(&self) -> error::Result<&$data_type>
            {
                match self
                {
                    Value::$variant(value) => Ok(value),
                    _ => script_error(ErrorKind::TypeMismatch,
                                      format!("Expected {}, found {}.", $name, self.type_name()))
                }
            }
        }


        #[doc = concat!("Allow conversion from ", stringify!($data_type), " to a Value.")]
        impl ToValue for $data_type
        {
            fn to_value(&self) -> Value
            {
                Value::$variant(self.clone())
            }
        }


        #[doc = concat!("Support converting from a ", stringify!($data_type), " to a Value.")]
        impl From<$data_type> for Value
        {
            fn from(original: $data_type) -> Value
            {
                Value::$variant(original)
            }
        }
    };
}


// Implement the simple conversions for the value enumeration types.
value_conversion!(i64,       Int,      as_int,      "an integer");
value_conversion!(f64,       Float,    as_float,    "a float");
value_conversion!(bool,      Bool,     as_bool,     "a boolean");
value_conversion!(String,    String,   as_string,   "a string");
value_conversion!(ValueList, List,     as_list,     "a list");
value_conversion!(Callable,  Callable, as_callable, "a callable");


/// Used to convert a Vector of value compatible types to a list Value.
impl<T> From<Vec<T>> for Value
    where
        T: ToValue
{
    fn from(vec: Vec<T>) -> Value
    {
        let new_vec: Vec<Value> = vec.iter().map(|item| item.to_value()).collect();
        Value::List(ValueList::from(new_vec))
    }
}


impl ToValue for Value
{
    fn to_value(&self) -> Value
    {
        self.clone()
    }
}


/// Handily implement variant checks for the types the Value enumeration supports.
macro_rules! is_variant
{
    ($name:ident , $either_name:ident , $variant:ident) =>
    {
        #[doc = concat!("Check if the value is the variant ", stringify!($variant), ".")]
        pub fn $name(&self) -> bool
        {
            matches!(self, Value::$variant(_))
        }

        #[doc = concat!("Check if either of the two values are the variant ",
                        stringify!($variant),
                        ".")]
        pub fn $either_name(a: &Value, b: &Value) -> bool
        {
            a.$name() || b.$name()
        }
    };
}


impl Value
{
    /// Check if the value is the None variant.
    pub fn is_none(&self) -> bool
    {
        matches!(self, Value::None)
    }

    // Create variant checks for the other supported types.
    is_variant!(is_int,      either_is_int,      Int);
    is_variant!(is_float,    either_is_float,    Float);
    is_variant!(is_bool,     either_is_bool,     Bool);
    is_variant!(is_string,   either_is_string,   String);
    is_variant!(is_list,     either_is_list,     List);
    is_variant!(is_callable, either_is_callable, Callable);


    /// Is the value an integer or a float?
    pub fn is_numeric(&self) -> bool
    {
        matches!(self, Value::Int(_) | Value::Float(_))
    }


    /// Are both values numeric types?
    pub fn both_are_numeric(a: &Value, b: &Value) -> bool
    {
        a.is_numeric() && b.is_numeric()
    }


    /// Is this a callable whose body ended in a force that the trampoline must perform?
    pub fn is_tail_callable(&self) -> bool
    {
        match self
        {
            Value::Callable(callable) => callable.is_tail(),
            _                         => false
        }
    }


    /// The empty list.
    pub fn void() -> Value
    {
        Value::List(ValueList::empty())
    }


    /// Is this the empty list?
    pub fn is_void(&self) -> bool
    {
        matches!(self, Value::List(list) if list.is_empty())
    }


    /// A short name for the value's type, used in error messages.
    pub fn type_name(&self) -> &'static str
    {
        match self
        {
            Value::None        => "none",
            Value::Int(_)      => "integer",
            Value::Float(_)    => "float",
            Value::Bool(_)     => "boolean",
            Value::String(_)   => "string",
            Value::List(_)     => "list",
            Value::Callable(_) => "callable"
        }
    }


    /// Convert the Value to a boolean value, performing simple tests if it's not directly a boolean
    /// value.
    pub fn get_bool_val(&self) -> bool
    {
        match self
        {
            Value::None          => false,
            Value::Int(value)    => *value != 0,
            Value::Float(value)  => *value != 0.0,
            Value::Bool(value)   => *value,
            Value::String(value) => !value.is_empty(),
            Value::List(value)   => !value.is_empty(),
            Value::Callable(_)   => true
        }
    }


    /// Convert the value to an integer value.  Only meaningful for numeric values, anything else
    /// reads as zero.
    pub fn get_int_val(&self) -> i64
    {
        match self
        {
            Value::Int(value)   => *value,
            Value::Float(value) => *value as i64,
            Value::Bool(value)  => if *value { 1 } else { 0 },
            _                   => 0
        }
    }


    /// Convert the value to an floating point value.  Only meaningful for numeric values, anything
    /// else reads as zero.
    pub fn get_float_val(&self) -> f64
    {
        match self
        {
            Value::Int(value)   => *value as f64,
            Value::Float(value) => *value,
            Value::Bool(value)  => if *value { 1.0 } else { 0.0 },
            _                   => 0.0
        }
    }


    /// Convert a string to a string that could be used directly within source code.  For example,
    /// new lines are converted to the \n escape sequence, etc.  The string is also enclosed in
    /// double quotes.
    ///
    /// Mainly used for debug and list printing.
    pub fn stringify(text: &str) -> String
    {
        let mut result = String::new();

        result.push('"');

        for character in text.chars()
        {
            match character
            {
                '"'  => result.push_str("\\\""),
                '\n' => result.push_str("\\n"),
                '\r' => result.push_str("\\r"),
                '\t' => result.push_str("\\t"),
                '\\' => result.push_str("\\\\"),
                _    => result.push(character)
            }
        }

        result.push('"');

        result
    }
}
