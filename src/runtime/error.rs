use std::{ error::Error,
           fmt::{ self, Debug, Display, Formatter } };
use gc::{ unsafe_empty_trace, Finalize, Trace };
use crate::lang::source_buffer::SourceLocation;



pub type Result<T> = std::result::Result<T, ScriptError>;



/// The broad category of a failure.  Scripts can't see this, (the catch operator only hands the
/// message to its handler,) but embedders and tests match on it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ErrorKind
{
    /// No lexical rule matches the remaining input.
    Lexical,

    /// The token stream is not a valid program, only raised in strict mode.
    Parse,

    /// A name was declared twice in the same frame.
    DuplicateBinding,

    /// A lookup or rebind walked off the end of the scope chain.
    UnboundName,

    /// Pop was applied to an empty list.
    EmptyList,

    /// A value was applied to an argument but is neither callable nor a list.
    NotCallable,

    /// A host function was handed the wrong number of inputs.
    Arity,

    /// A module reference could not be mapped to readable source.
    ModuleResolution,

    /// An operand had the wrong type for the operation.
    TypeMismatch,

    /// A list was applied to an index outside of its bounds.
    Index,

    /// An operator needed more values than the local stack held.
    StackUnderflow,

    /// Reading or writing failed.
    Io,

    /// The command line could not be understood.
    Usage,

    /// The scheduler failed to run a computation to completion.
    Internal
}


impl Display for ErrorKind
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        let name = match self
            {
                ErrorKind::Lexical          => "lexical error",
                ErrorKind::Parse            => "parse error",
                ErrorKind::DuplicateBinding => "duplicate binding",
                ErrorKind::UnboundName      => "unbound name",
                ErrorKind::EmptyList        => "empty list",
                ErrorKind::NotCallable      => "not callable",
                ErrorKind::Arity            => "arity error",
                ErrorKind::ModuleResolution => "module resolution error",
                ErrorKind::TypeMismatch     => "type mismatch",
                ErrorKind::Index            => "index error",
                ErrorKind::StackUnderflow   => "stack underflow",
                ErrorKind::Io               => "I/O error",
                ErrorKind::Usage            => "usage error",
                ErrorKind::Internal         => "internal error"
            };

        write!(f, "{}", name)
    }
}



/// Any error that occurs while lexing, building or running a Gall program.
#[derive(Clone, PartialEq)]
pub struct ScriptError
{
    /// What sort of failure this is.
    kind: ErrorKind,

    /// The location in the source code the error occurred, if available.
    location: Option<SourceLocation>,

    /// The description of the error.
    error: String
}


/// Errors carry no interpreter values, so there is nothing in them for the collector to trace.
impl Finalize for ScriptError
{
}


unsafe impl Trace for ScriptError
{
    unsafe_empty_trace!();
}


impl Error for ScriptError
{
}


/// Pretty print the ScriptError for the user.
impl Display for ScriptError
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        match &self.location
        {
            Some(location) => write!(f, "{}: {}", location, self.error),
            None => write!(f, "{}", self.error)
        }
    }
}


/// Debug output is the same as the display output so that `main` reports errors readably.
impl Debug for ScriptError
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        write!(f, "{}", self)
    }
}


impl ScriptError
{
    /// Create a new ScriptError.
    pub fn new(kind: ErrorKind, location: Option<SourceLocation>, error: String) -> ScriptError
    {
        ScriptError
            {
                kind,
                location,
                error
            }
    }

    /// Create a new Script Error and wrap it in a Result::Err.
    pub fn new_as_result<T>(kind: ErrorKind,
                            location: Option<SourceLocation>,
                            error: String) -> Result<T>
    {
        Err(ScriptError::new(kind, location, error))
    }

    /// What category of error this is.
    pub fn kind(&self) -> ErrorKind
    {
        self.kind
    }

    /// If available, the location in the source code the error occurred.
    pub fn location(&self) -> &Option<SourceLocation>
    {
        &self.location
    }

    /// The description of the error.
    pub fn error(&self) -> &String
    {
        &self.error
    }

    /// Attach a location, keeping any location the error already had.  The innermost location is
    /// the most useful one.
    pub fn or_location(mut self, location: &SourceLocation) -> ScriptError
    {
        if self.location.is_none()
        {
            self.location = Some(location.clone());
        }

        self
    }
}


/// Allow for the conversion of a std::io::Error into a ScriptError.
impl From<std::io::Error> for ScriptError
{
    fn from(error: std::io::Error) -> ScriptError
    {
        ScriptError::new(ErrorKind::Io, None, format!("I/O error: {}", error))
    }
}


/// A task that panicked or was torn down never settles normally.
impl From<tokio::task::JoinError> for ScriptError
{
    fn from(error: tokio::task::JoinError) -> ScriptError
    {
        ScriptError::new(ErrorKind::Internal, None, format!("Computation failed: {}", error))
    }
}



/// Convenience for raising an error with no location.  The executing instruction fills the
/// location in as the error passes through it.
pub fn script_error<T>(kind: ErrorKind, message: String) -> Result<T>
{
    ScriptError::new_as_result(kind, None, message)
}



pub fn script_error_str<T>(kind: ErrorKind, message: &str) -> Result<T>
{
    script_error(kind, message.to_string())
}



#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn display_includes_location_when_present()
    {
        let location = SourceLocation::new_from_info("main.gall", 3, 7);
        let error = ScriptError::new(ErrorKind::UnboundName,
                                     Some(location),
                                     "Value for key x not defined.".to_string());

        assert_eq!(error.to_string(), "main.gall (3, 7): Value for key x not defined.");
    }

    #[test]
    fn or_location_keeps_the_innermost_location()
    {
        let inner = SourceLocation::new_from_info("a.gall", 1, 1);
        let outer = SourceLocation::new_from_info("b.gall", 9, 9);

        let error = ScriptError::new(ErrorKind::EmptyList, Some(inner.clone()), "x".to_string())
            .or_location(&outer);
        assert_eq!(error.location(), &Some(inner));

        let error = ScriptError::new(ErrorKind::EmptyList, None, "x".to_string())
            .or_location(&outer);
        assert_eq!(error.location(), &Some(outer));
    }
}
