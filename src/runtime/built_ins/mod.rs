use crate::runtime::{
    built_ins::{
        base_words::register_base_words,
        io_words::{register_io_words, OutputSink},
    },
    data_structures::{
        callable::{Callable, HostFunction},
        deferred::Deferred,
        scope::Scope,
        value::Value,
    },
    error,
};
use iceoryx2_bb_log::trace;

/// The core functions of the language.
pub mod base_words;

/// Functions that perform I/O operations.
pub mod io_words;

/// Simplify registering a host function into a scope frame.  The function is bound under its name
/// as an already settled callable, and remembers where in the Rust source it was registered.
///
/// Required parameters are the frame to declare the function in, the name of the function, the
/// handler to run, and a short description.  Evaluates to an `error::Result<()>`, registering a
/// name twice in the same frame fails like any other duplicate declaration.
#[macro_export]
macro_rules! add_host_function {
    (
        $scope:expr ,
        $name:expr ,
        $function:expr ,
        $description:expr
    ) => {{
        use std::rc::Rc;
        use $crate::runtime::data_structures::callable::HostFunction;

        let function = HostFunction::new(
            $name,
            $crate::location_here!(),
            $description,
            Rc::new($function),
        );

        $crate::runtime::built_ins::register_host_function($scope, function)
    }};
}

/// Bind a host function under its own name in the given frame.
pub fn register_host_function(scope: &Scope, function: HostFunction) -> error::Result<()> {
    trace!(
        "Registering host function {} from {}: {}",
        function.name,
        function.location,
        function.description
    );

    let name = function.name.clone();
    scope.declare(&name, Deferred::settled(Value::Callable(Callable::host(function))))
}

/// Register every host function into the root frame.  Anything `print` writes goes to `output`.
pub fn register_builtin_words(root: &Scope, output: OutputSink) -> error::Result<()> {
    register_base_words(root)?;
    register_io_words(root, output)?;

    Ok(())
}
