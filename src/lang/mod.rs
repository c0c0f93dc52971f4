/// Module for managing the original source code.
pub mod source_buffer;

/// Module for managing the turning of the source code into a list of tokens for further processing.
pub mod tokenizing;

/// Module for defining the instructions that make up a callable unit.
pub mod code;

/// Module for building callable units from a token stream.  Parsing and closure construction
/// happen in the same pass: every `( ... )` group becomes a nested unit as soon as it's read.
pub mod compilation;
