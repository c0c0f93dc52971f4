/// All of the core data structures used by the Gall interpreter.
pub mod data_structures;

/// Module for defining the host functions that are available to every Gall program.
pub mod built_ins;

/// Module for defining the error reporting of the Gall interpreter.
pub mod error;

/// Settings gathered from the command line and the environment.
pub mod config;

/// Module for defining the core functionality of the Gall interpreter: forcing values, running
/// callable units, the operators and the module loader.
pub mod interpreter;
