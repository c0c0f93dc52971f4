use crate::{
    lang::compilation::BuildOptions,
    runtime::error::{self, script_error, ErrorKind},
};
use iceoryx2_bb_log::warn;
use std::{
    env::{current_exe, split_paths, var, var_os},
    path::PathBuf,
};

/// Environment variable that turns on strict building when set to `1` or `true`.
pub const STRICT_VAR: &str = "GALL_STRICT";

/// Environment variable holding extra module search directories, separated the way the platform
/// separates `PATH` entries.
pub const LIB_PATH_VAR: &str = "GALL_LIB_PATH";

/// Everything that controls how the interpreter builds and runs programs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Config {
    /// Reject unknown tokens and unbalanced groups.
    pub strict: bool,

    /// Print the final value of the program once it has been forced.
    pub show_result: bool,

    /// Directories searched for modules after the importing module's own directory.
    pub search_paths: Vec<PathBuf>,

    /// The program to run, if one was given on the command line.
    pub source_file: Option<String>,
}

impl Config {
    /// Settings taken from the environment alone.  Without a library path variable the directory
    /// of the running executable is searched.
    pub fn from_env() -> Config {
        let strict = var(STRICT_VAR)
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let search_paths: Vec<PathBuf> = match var_os(LIB_PATH_VAR) {
            Some(paths) => split_paths(&paths).collect(),
            None => current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(PathBuf::from))
                .into_iter()
                .collect(),
        };

        for path in search_paths.iter().filter(|path| !path.is_dir()) {
            warn!("Module search path {} is not a directory.", path.display());
        }

        Config {
            strict,
            show_result: false,
            search_paths,
            source_file: None,
        }
    }

    /// Apply command line arguments on top of this configuration.  The arguments are expected
    /// without the program name.
    ///
    /// `gall [--strict] [--show-result] [-I path]... <file>`
    pub fn with_args<I>(mut self, args: I) -> error::Result<Config>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--strict" => self.strict = true,
                "--show-result" => self.show_result = true,

                "-I" => match args.next() {
                    Some(path) => self.search_paths.push(PathBuf::from(path)),
                    None => return usage_error("-I needs a directory."),
                },

                flag if flag.starts_with('-') && flag.len() > 1 => {
                    return usage_error(&format!("Unknown option {}.", flag));
                }

                _ => {
                    if self.source_file.is_some() {
                        return usage_error("Only one source file may be given.");
                    }

                    self.source_file = Some(arg);
                }
            }
        }

        Ok(self)
    }

    /// The program to run, or a usage error if none was given.
    pub fn required_source_file(&self) -> error::Result<&str> {
        match &self.source_file {
            Some(path) => Ok(path),
            None => usage_error("No source file given."),
        }
    }

    /// The options the builder should use.
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            strict: self.strict,
        }
    }
}

fn usage_error<T>(message: &str) -> error::Result<T> {
    script_error(
        ErrorKind::Usage,
        format!("{}\nUsage: gall [--strict] [--show-result] [-I path]... <file>", message),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn arguments_fill_in_the_config() {
        let config = Config::default()
            .with_args(args(&["--strict", "-I", "lib", "--show-result", "main.gall"]))
            .unwrap();

        assert!(config.strict);
        assert!(config.show_result);
        assert_eq!(config.search_paths, vec![PathBuf::from("lib")]);
        assert_eq!(config.source_file.as_deref(), Some("main.gall"));
        assert_eq!(config.build_options(), BuildOptions { strict: true });
    }

    #[test_case(&["-I"]; "missing include directory")]
    #[test_case(&["--fast"]; "unknown flag")]
    #[test_case(&["a.gall", "b.gall"]; "two files")]
    fn bad_arguments(list: &[&str]) {
        assert!(Config::default().with_args(args(list)).is_err());
    }

    #[test]
    fn a_source_file_is_required_to_run() {
        let error = Config::default().required_source_file().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Usage);
    }
}
