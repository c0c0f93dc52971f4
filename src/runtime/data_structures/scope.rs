use crate::runtime::{
    data_structures::deferred::Deferred,
    error::{self, script_error, ErrorKind},
    interpreter::modules::ModuleLoader,
};
use gc::{Finalize, Gc, GcCell, Trace};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    rc::Rc,
};

/// Frames are shared by every closure and pending computation that captured them.
pub type Scope = Gc<Frame>;

/// One level of the lexical binding chain.  A fresh frame is made for every invocation of a
/// callable unit and for every module run.
///
/// Bindings are only ever added, except through an explicit rebind.  Frames are garbage
/// collected, so a closure stored in the frame it captured doesn't keep that frame alive once
/// nothing else can reach either of them.
#[derive(Trace, Finalize)]
pub struct Frame {
    bindings: GcCell<HashMap<String, Deferred>>,
    parent: Option<Scope>,
    input: Option<Deferred>,

    #[unsafe_ignore_trace]
    module_path: Option<PathBuf>,

    /// Only set on the root frame.
    #[unsafe_ignore_trace]
    loader: Option<Rc<ModuleLoader>>,
}

impl Frame {
    /// The outermost frame of an interpreter.  The host functions are declared here.
    pub fn new_root(loader: Rc<ModuleLoader>) -> Scope {
        Gc::new(Frame {
            bindings: GcCell::new(HashMap::new()),
            parent: None,
            input: None,
            module_path: None,
            loader: Some(loader),
        })
    }

    /// A frame for one invocation of a unit that captured `parent`.
    pub fn new_child(parent: &Scope, input: Option<Deferred>) -> Scope {
        Gc::new(Frame {
            bindings: GcCell::new(HashMap::new()),
            parent: Some(parent.clone()),
            input,
            module_path: None,
            loader: None,
        })
    }

    /// A frame for running the top level of the module at `path`.
    pub fn new_module(root: &Scope, path: PathBuf) -> Scope {
        Gc::new(Frame {
            bindings: GcCell::new(HashMap::new()),
            parent: Some(root.clone()),
            input: None,
            module_path: Some(path),
            loader: None,
        })
    }

    /// Add a new name to this frame.  A name can only be declared once per frame, even if the
    /// new value is the same as the old one.
    pub fn declare(&self, key: &str, value: Deferred) -> error::Result<()> {
        let mut bindings = self.bindings.borrow_mut();

        if bindings.contains_key(key) {
            return script_error(
                ErrorKind::DuplicateBinding,
                format!("Value for key {} already defined.", key),
            );
        }

        bindings.insert(key.to_string(), value);
        Ok(())
    }

    /// Overwrite a name in the nearest frame that already has it.
    pub fn rebind(&self, key: &str, value: Deferred) -> error::Result<()> {
        let mut current = Some(self);

        while let Some(frame) = current {
            if let Some(slot) = frame.bindings.borrow_mut().get_mut(key) {
                *slot = value;
                return Ok(());
            }

            current = frame.parent.as_deref();
        }

        script_error(
            ErrorKind::UnboundName,
            format!("Value for key {} not defined.", key),
        )
    }

    /// Find the value of a name, looking outwards through the chain.
    pub fn lookup(&self, key: &str) -> error::Result<Deferred> {
        let mut current = Some(self);

        while let Some(frame) = current {
            if let Some(value) = frame.bindings.borrow().get(key) {
                return Ok(value.clone());
            }

            current = frame.parent.as_deref();
        }

        script_error(
            ErrorKind::UnboundName,
            format!("Value for key {} not defined.", key),
        )
    }

    /// The argument of the nearest invocation that was given one.
    pub fn input(&self) -> error::Result<Deferred> {
        let mut current = Some(self);

        while let Some(frame) = current {
            if let Some(input) = &frame.input {
                return Ok(input.clone());
            }

            current = frame.parent.as_deref();
        }

        script_error(ErrorKind::UnboundName, "Value for key $ not defined.".to_string())
    }

    /// Is the name declared in this frame itself?
    pub fn is_declared_here(&self, key: &str) -> bool {
        self.bindings.borrow().contains_key(key)
    }

    /// The file of the module this frame's code was defined in, if any.
    pub fn module_path(&self) -> Option<&Path> {
        let mut current = Some(self);

        while let Some(frame) = current {
            if let Some(path) = &frame.module_path {
                return Some(path);
            }

            current = frame.parent.as_deref();
        }

        None
    }

    /// The directory module references are resolved against.
    pub fn module_dir(&self) -> Option<&Path> {
        self.module_path().and_then(Path::parent)
    }

    /// The outermost frame of the chain.
    pub fn root(scope: &Scope) -> Scope {
        let mut current = scope.clone();

        while let Some(parent) = current.parent.clone() {
            current = parent;
        }

        current
    }

    /// The module loader shared by the whole chain.
    pub fn loader(&self) -> error::Result<Rc<ModuleLoader>> {
        let mut current = Some(self);

        while let Some(frame) = current {
            if let Some(loader) = &frame.loader {
                return Ok(loader.clone());
            }

            current = frame.parent.as_deref();
        }

        script_error(
            ErrorKind::Internal,
            "Scope chain has no module loader.".to_string(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        lang::{code::FunctionBody, compilation::BuildOptions, source_buffer::SourceLocation},
        runtime::{
            data_structures::{
                callable::{Callable, HostFunction},
                value::Value,
            },
            interpreter::run_local,
        },
    };

    fn root() -> Scope {
        Frame::new_root(Rc::new(ModuleLoader::new(Vec::new(), BuildOptions::default())))
    }

    fn value_of(deferred: error::Result<Deferred>) -> Value {
        run_local(async move { deferred?.get().await }).unwrap()
    }

    #[test]
    fn declare_once_regardless_of_value() {
        let frame = root();

        frame.declare("x", Deferred::settled(Value::Int(1))).unwrap();

        let error = frame
            .declare("x", Deferred::settled(Value::Int(1)))
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::DuplicateBinding);
        assert_eq!(error.error(), "Value for key x already defined.");
    }

    #[test]
    fn shadowing_in_a_child_leaves_siblings_alone() {
        let parent = root();
        parent.declare("x", Deferred::settled(Value::Int(1))).unwrap();

        let child = Frame::new_child(&parent, None);
        let sibling = Frame::new_child(&parent, None);

        child.declare("x", Deferred::settled(Value::Int(2))).unwrap();

        assert_eq!(value_of(child.lookup("x")), Value::Int(2));
        assert_eq!(value_of(sibling.lookup("x")), Value::Int(1));
        assert_eq!(value_of(parent.lookup("x")), Value::Int(1));
    }

    #[test]
    fn rebind_overwrites_the_owning_frame() {
        let parent = root();
        parent.declare("x", Deferred::settled(Value::Int(1))).unwrap();

        let child = Frame::new_child(&parent, None);
        child.rebind("x", Deferred::settled(Value::Int(5))).unwrap();

        assert!(!child.is_declared_here("x"));
        assert_eq!(value_of(parent.lookup("x")), Value::Int(5));

        let error = child
            .rebind("y", Deferred::settled(Value::None))
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::UnboundName);
    }

    #[test]
    fn lookup_miss_is_unbound() {
        let error = root().lookup("missing").unwrap_err();

        assert_eq!(error.kind(), ErrorKind::UnboundName);
        assert_eq!(error.error(), "Value for key missing not defined.");
    }

    #[test]
    fn input_falls_back_to_the_lexical_parent() {
        let top = root();
        let invoked = Frame::new_child(&top, Some(Deferred::settled(Value::Int(7))));
        let nested = Frame::new_child(&invoked, None);

        assert_eq!(value_of(nested.input()), Value::Int(7));
        assert_eq!(top.input().unwrap_err().kind(), ErrorKind::UnboundName);
    }

    #[test]
    fn module_path_is_inherited_and_loader_found_at_root() {
        let top = root();
        let module = Frame::new_module(&top, PathBuf::from("/lib/util.gall"));
        let inner = Frame::new_child(&module, None);

        assert_eq!(inner.module_path(), Some(Path::new("/lib/util.gall")));
        assert_eq!(inner.module_dir(), Some(Path::new("/lib")));
        assert!(Gc::ptr_eq(&Frame::root(&inner), &top));
        assert!(inner.loader().is_ok());
        assert_eq!(top.module_path(), None);
    }

    fn closure_over(frame: &Scope) -> Deferred {
        let body = Rc::new(FunctionBody::new(Vec::new(), None, SourceLocation::default()));

        Deferred::settled(Value::Callable(Callable::closure(body, frame.clone())))
    }

    /// A host function that holds on to `marker` for as long as it is alive.
    fn holding(marker: &Rc<()>) -> Deferred {
        let marker = marker.clone();
        let function = HostFunction::new(
            "holding",
            crate::location_here!(),
            "Keeps a marker alive.",
            Rc::new(move |_input: Option<Value>| {
                let _ = &marker;
                Ok(Value::None)
            }),
        );

        Deferred::settled(Value::Callable(Callable::host(function)))
    }

    #[test]
    fn frames_holding_their_own_closures_are_collected() {
        let marker = Rc::new(());

        {
            let frame = Frame::new_child(&root(), None);

            frame.declare("helper", closure_over(&frame)).unwrap();
            frame.declare("marker", holding(&marker)).unwrap();

            assert_eq!(Rc::strong_count(&marker), 2);
        }

        gc::force_collect();
        assert_eq!(Rc::strong_count(&marker), 1);
    }

    #[test]
    fn frames_reached_back_through_a_child_are_collected() {
        let marker = Rc::new(());

        {
            let parent = Frame::new_child(&root(), None);
            parent.declare("marker", holding(&marker)).unwrap();
            parent.declare("helper", Deferred::settled(Value::None)).unwrap();

            let child = Frame::new_child(&parent, None);
            child.rebind("helper", closure_over(&child)).unwrap();
        }

        gc::force_collect();
        assert_eq!(Rc::strong_count(&marker), 1);
    }

    #[test]
    fn reachable_frames_survive_a_collection() {
        let marker = Rc::new(());
        let frame = Frame::new_child(&root(), None);

        frame.declare("helper", closure_over(&frame)).unwrap();
        frame.declare("marker", holding(&marker)).unwrap();

        gc::force_collect();

        assert_eq!(Rc::strong_count(&marker), 2);
        assert!(frame.is_declared_here("helper"));
    }
}
