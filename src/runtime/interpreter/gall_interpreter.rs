use crate::{
    lang::compilation::build_from_source,
    runtime::{
        built_ins::{
            io_words::{stdout_sink, OutputSink},
            register_builtin_words,
        },
        config::Config,
        data_structures::{
            callable::Callable,
            scope::{Frame, Scope},
            value::Value,
        },
        error,
        interpreter::{block_on_local, force, modules::ModuleLoader, CodeManagement},
    },
};
use iceoryx2_bb_log::{debug, info};
use std::{future::Future, rc::Rc};
use tokio::runtime::{Builder, Runtime};

/// The interpreter: a root frame holding the host functions, the module loader every frame
/// shares, and the single threaded scheduler that programs run on.
pub struct GallInterpreter {
    config: Config,
    loader: Rc<ModuleLoader>,
    root: Scope,
    runtime: Runtime,
}

impl GallInterpreter {
    /// Create an interpreter whose `print` writes to standard output.
    pub fn new(config: Config) -> error::Result<GallInterpreter> {
        GallInterpreter::with_output(config, stdout_sink())
    }

    /// Create an interpreter whose `print` writes to the given sink.
    pub fn with_output(config: Config, output: OutputSink) -> error::Result<GallInterpreter> {
        let runtime = Builder::new_current_thread().build()?;
        let loader = Rc::new(ModuleLoader::new(
            config.search_paths.clone(),
            config.build_options(),
        ));
        let root = Frame::new_root(loader.clone());

        register_builtin_words(&root, output)?;

        Ok(GallInterpreter {
            config,
            loader,
            root,
            runtime,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The module loader, and through it the module cache.
    pub fn loader(&self) -> &Rc<ModuleLoader> {
        &self.loader
    }

    /// The frame the host functions are declared in.  Embedders can declare their own values
    /// here before running anything.
    pub fn root(&self) -> &Scope {
        &self.root
    }

    /// Run a future on the interpreter's scheduler.  Returns once the future and every
    /// computation it started have finished.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        block_on_local(&self.runtime, future)
    }

    /// Force a program's top level closure to its final value.
    fn run_program(&self, callable: Callable) -> error::Result<Value> {
        let result = self.block_on(force(Value::Callable(callable), None));

        match &result {
            Ok(value) => debug!("Program finished with {:?}.", value),
            Err(error) => debug!("Program failed: {}", error),
        }

        result
    }
}

impl CodeManagement for GallInterpreter {
    fn process_source(&mut self, path: &str, source: &str) -> error::Result<Value> {
        let body = build_from_source(path, source, self.loader.options())?;
        let frame = Frame::new_child(&self.root, None);

        info!("Running {}.", path);
        self.run_program(Callable::closure(body, frame))
    }

    fn process_source_file(&mut self, path: &str) -> error::Result<Value> {
        let loader = self.loader.clone();
        let resolved = loader.resolve(path, None)?;
        let body = self.block_on(loader.load(&resolved))?;

        info!("Running {}.", resolved.display());

        let frame = Frame::new_module(&self.root, resolved);
        self.run_program(Callable::closure(body, frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn interpreter() -> (GallInterpreter, Rc<RefCell<Vec<u8>>>) {
        let buffer = Rc::new(RefCell::new(Vec::new()));
        let interpreter = GallInterpreter::with_output(Config::default(), buffer.clone()).unwrap();

        (interpreter, buffer)
    }

    #[test]
    fn host_functions_are_declared_in_the_root() {
        let (interpreter, _) = interpreter();

        for name in ["sum", "prod", "pow", "diff", "eq", "not", "and", "or", "xor", "print"] {
            assert!(interpreter.root().is_declared_here(name), "{} is missing", name);
        }
    }

    #[test]
    fn loader_follows_the_configuration() {
        let config = Config {
            strict: true,
            search_paths: vec!["/opt/gall".into()],
            ..Config::default()
        };
        let interpreter =
            GallInterpreter::with_output(config, Rc::new(RefCell::new(Vec::new()))).unwrap();

        assert_eq!(interpreter.loader().options(), interpreter.config().build_options());
        assert_eq!(
            interpreter.loader().search_paths(),
            interpreter.config().search_paths.as_slice()
        );
    }

    #[test]
    fn programs_run_in_their_own_frame() {
        let (mut interpreter, _) = interpreter();

        interpreter.process_source("<test>", "1 x :").unwrap();
        interpreter.process_source("<test>", "2 x :").unwrap();

        assert!(!interpreter.root().is_declared_here("x"));
    }

    #[test]
    fn print_goes_to_the_output_sink() {
        let (mut interpreter, buffer) = interpreter();

        let result = interpreter
            .process_source("<test>", "\"hello\" print . * |")
            .unwrap();

        assert_eq!(result, Value::None);
        assert_eq!(String::from_utf8(buffer.borrow().clone()).unwrap(), "hello\n");
    }
}
