/// Module for managing source code and building it into callable units.
#[macro_use]
pub mod lang;

/// Module for the runtime and the data structures used by the interpreter.  As well as the
/// interpreter itself.
#[macro_use]
pub mod runtime;

pub use runtime::{
    config::Config,
    data_structures::value::Value,
    error::{ErrorKind, Result, ScriptError},
    interpreter::{gall_interpreter::GallInterpreter, CodeManagement},
};
