/// Module contains the Value enumeration and it's implementation.  The value is one of the core
/// data structures of the interpreter.  It is used to represent all data types that the interpreter
/// and Gall programs can understand and manage.
pub mod value;

/// The immutable list type shared between values.
pub mod value_list;

/// Closures, compositions, catch guards, reducers and host functions.
pub mod callable;

/// Values that settle exactly once, possibly later.  Every stack slot and binding is one.
pub mod deferred;

/// The lexical scope chain that names are declared in and looked up through.
pub mod scope;
