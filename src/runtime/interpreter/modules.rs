use crate::{
    lang::{
        code::FunctionBody,
        compilation::{build_from_source, BuildOptions},
    },
    runtime::error::{self, script_error, ErrorKind},
};
use iceoryx2_bb_log::{debug, trace};
use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    path::{Path, PathBuf},
    rc::Rc,
};
use tokio::sync::OnceCell;

/// The extension tried when a module reference doesn't name one.
pub const MODULE_EXTENSION: &str = "gall";

/// One cache slot per canonical module path.  The cell is shared by everyone importing the module
/// so only the first of them parses it.
type CacheEntry = Rc<OnceCell<Rc<FunctionBody>>>;

/// Finds module source files and keeps the parsed form of every module that was loaded.
///
/// The parse is what gets cached, not the result of running the module.  Each import runs the
/// module's top level again in a fresh frame.
pub struct ModuleLoader {
    search_paths: Vec<PathBuf>,
    options: BuildOptions,
    cache: RefCell<HashMap<PathBuf, CacheEntry>>,
    parse_count: Cell<usize>,
}

impl ModuleLoader {
    pub fn new(search_paths: Vec<PathBuf>, options: BuildOptions) -> ModuleLoader {
        ModuleLoader {
            search_paths,
            options,
            cache: RefCell::new(HashMap::new()),
            parse_count: Cell::new(0),
        }
    }

    /// The options modules are built with.
    pub fn options(&self) -> BuildOptions {
        self.options
    }

    /// Extra directories searched after the importing module's own directory.
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// How many module parses have been started over the loader's lifetime.
    pub fn parse_count(&self) -> usize {
        self.parse_count.get()
    }

    /// Has the module at the canonical path been parsed and cached?
    pub fn is_cached(&self, path: &Path) -> bool {
        self.cache
            .borrow()
            .get(path)
            .is_some_and(|entry| entry.initialized())
    }

    /// Map a module reference to the canonical path of its source file.  The reference is tried
    /// against the importing module's directory, or the working directory when there is no
    /// importing module, then against each search path in turn.
    pub fn resolve(&self, reference: &str, importing_dir: Option<&Path>) -> error::Result<PathBuf> {
        let first = match importing_dir {
            Some(directory) => directory.to_path_buf(),
            None => std::env::current_dir()?,
        };

        let bases = std::iter::once(first).chain(self.search_paths.iter().cloned());

        for base in bases {
            for candidate in candidates(&base.join(reference)) {
                trace!("Trying module path {}.", candidate.display());

                if candidate.is_file() {
                    return candidate
                        .canonicalize()
                        .or_else(|error| unreadable(&candidate, error));
                }
            }
        }

        script_error(
            ErrorKind::ModuleResolution,
            format!("Could not find module {}.", reference),
        )
    }

    /// Get the parsed unit for a canonical module path, parsing it on first request.  Imports of
    /// a module that is still being parsed wait for that parse instead of starting another.  A
    /// failed parse leaves nothing behind, so the next import tries again.
    pub async fn load(&self, path: &Path) -> error::Result<Rc<FunctionBody>> {
        let entry = self
            .cache
            .borrow_mut()
            .entry(path.to_path_buf())
            .or_insert_with(|| Rc::new(OnceCell::new()))
            .clone();

        let body = entry
            .get_or_try_init(|| async {
                let source = match tokio::fs::read_to_string(path).await {
                    Ok(source) => source,
                    Err(error) => return unreadable(path, error),
                };

                self.parse_count.set(self.parse_count.get() + 1);
                debug!("Parsing module {}.", path.display());

                build_from_source(&path.display().to_string(), &source, self.options)
            })
            .await?;

        Ok(body.clone())
    }
}

/// A module that was found but whose source can't be read.
fn unreadable<T>(path: &Path, error: std::io::Error) -> error::Result<T> {
    script_error(
        ErrorKind::ModuleResolution,
        format!("Could not read module {}: {}.", path.display(), error),
    )
}

/// The paths a reference may name: the path itself, then with the module extension if it has
/// none.
fn candidates(path: &Path) -> Vec<PathBuf> {
    let mut found = vec![path.to_path_buf()];

    if path.extension().is_none() {
        found.push(path.with_extension(MODULE_EXTENSION));
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::interpreter::run_local;
    use std::fs;

    fn write(directory: &Path, name: &str, source: &str) -> PathBuf {
        let path = directory.join(name);

        fs::write(&path, source).unwrap();
        path.canonicalize().unwrap()
    }

    #[test]
    fn resolves_relative_to_the_importing_directory_then_search_paths() {
        let importing = tempfile::tempdir().unwrap();
        let library = tempfile::tempdir().unwrap();

        let local = write(importing.path(), "local.gall", "1");
        let shared = write(library.path(), "shared.gall", "2");

        let loader = ModuleLoader::new(vec![library.path().to_path_buf()], BuildOptions::default());

        assert_eq!(loader.resolve("local", Some(importing.path())).unwrap(), local);
        assert_eq!(loader.resolve("local.gall", Some(importing.path())).unwrap(), local);
        assert_eq!(loader.resolve("shared", Some(importing.path())).unwrap(), shared);

        let error = loader.resolve("missing", Some(importing.path())).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ModuleResolution);
    }

    #[test]
    fn parses_once_per_canonical_path() {
        let directory = tempfile::tempdir().unwrap();
        let nested = directory.path().join("nested");

        fs::create_dir(&nested).unwrap();
        let path = write(directory.path(), "util.gall", "( 1 ) x :");

        let loader = ModuleLoader::new(Vec::new(), BuildOptions::default());

        let from_top = loader.resolve("util", Some(directory.path())).unwrap();
        let from_nested = loader.resolve("../util", Some(&nested)).unwrap();
        assert_eq!(from_top, from_nested);

        let (first, second) = run_local(async {
            let first = loader.load(&from_top).await.unwrap();
            let second = loader.load(&from_nested).await.unwrap();

            (first, second)
        });

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(loader.parse_count(), 1);
        assert!(loader.is_cached(&path));
    }

    #[test]
    fn concurrent_first_loads_share_one_parse() {
        let directory = tempfile::tempdir().unwrap();
        let path = write(directory.path(), "util.gall", "1 2 ,");

        let loader = Rc::new(ModuleLoader::new(Vec::new(), BuildOptions::default()));

        let bodies = run_local({
            let loader = loader.clone();

            async move {
                let tasks: Vec<_> = (0..4)
                    .map(|_| {
                        let loader = loader.clone();
                        let path = path.clone();

                        tokio::task::spawn_local(async move { loader.load(&path).await })
                    })
                    .collect();

                let mut bodies = Vec::new();

                for task in tasks {
                    bodies.push(task.await.unwrap().unwrap());
                }

                bodies
            }
        });

        assert_eq!(loader.parse_count(), 1);
        assert!(bodies.iter().all(|body| Rc::ptr_eq(body, &bodies[0])));
    }

    #[test]
    fn failed_parses_are_not_cached() {
        let directory = tempfile::tempdir().unwrap();
        let path = write(directory.path(), "broken.gall", "( 1");

        let loader = ModuleLoader::new(Vec::new(), BuildOptions { strict: true });

        let error = run_local(loader.load(&path)).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Parse);
        assert!(!loader.is_cached(&path));

        fs::write(&path, "( 1 )").unwrap();

        assert!(run_local(loader.load(&path)).is_ok());
        assert_eq!(loader.parse_count(), 2);
    }

    #[test]
    fn unreadable_modules_fail_to_resolve() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("bad.gall");

        fs::write(&path, [0xff, 0xfe, 0x31]).unwrap();

        let loader = ModuleLoader::new(Vec::new(), BuildOptions::default());
        let resolved = loader.resolve("bad", Some(directory.path())).unwrap();

        let error = run_local(loader.load(&resolved)).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::ModuleResolution);
        assert!(error.error().contains("Could not read module"), "{}", error);
        assert!(!loader.is_cached(&resolved));
        assert_eq!(loader.parse_count(), 0);
    }
}
