use gall::{CodeManagement, Config, GallInterpreter, ScriptError};
use iceoryx2_bb_log::{set_log_level_from_env_or, LogLevel};
use std::{env::args, process::ExitCode};

/// Build the configuration, run the program and report how it went.
fn run() -> Result<(), ScriptError> {
    let config = Config::from_env().with_args(args().skip(1))?;

    let source_file = config.required_source_file()?.to_string();
    let mut interpreter = GallInterpreter::new(config)?;

    let result = interpreter.process_source_file(&source_file)?;

    if interpreter.config().show_result {
        println!("{:?}", result);
    }

    Ok(())
}

fn main() -> ExitCode {
    // Warnings only unless the environment asks for more.
    set_log_level_from_env_or(LogLevel::Warn);

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {}", error);
            ExitCode::FAILURE
        }
    }
}
