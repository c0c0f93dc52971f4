use std::path::{Path, PathBuf};
use std::process::{Command, Output};

// Helper to get absolute path from manifest dir
fn manifest_path(rel: &str) -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    Path::new(manifest_dir).join(rel)
}

// Run the interpreter binary with the given arguments and capture everything.
fn run_gall(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gall"))
        .args(args)
        .env_remove("GALL_STRICT")
        .env_remove("GALL_LIB_PATH")
        .output()
        .expect("Failed to run interpreter")
}

fn run_demo(name: &str, extra: &[&str]) -> (bool, String) {
    let script = manifest_path(&format!("demos/{}", name));
    let script = script.display().to_string();

    let mut args = extra.to_vec();
    args.push(&script);

    let output = run_gall(&args);
    println!("\n--- stderr of {} ---\n{}", name, String::from_utf8_lossy(&output.stderr));

    (output.status.success(), String::from_utf8_lossy(&output.stdout).to_string())
}

#[test]
fn test_hello() {
    let (success, stdout) = run_demo("hello.gall", &[]);

    assert!(success);
    assert_eq!(stdout, "Hello, world!\n");
}

#[test]
fn test_squares_imports_a_module() {
    let (success, stdout) = run_demo("squares.gall", &[]);

    assert!(success);
    assert_eq!(stdout, "[ 1, 4, 9 ]\n");
}

#[test]
fn test_countdown_shows_its_result() {
    let (success, stdout) = run_demo("countdown.gall", &["--show-result"]);

    assert!(success);
    assert_eq!(stdout, "\"liftoff\"\n");
}

#[test]
fn test_recover_prints_the_caught_error() {
    let (success, stdout) = run_demo("recover.gall", &["--strict"]);

    assert!(success);
    assert!(stdout.starts_with("recovered: "), "{}", stdout);
    assert!(stdout.contains("Can not pop from an empty list."), "{}", stdout);
}

#[test]
fn test_missing_source_file_is_an_error() {
    let output = run_gall(&[]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("Error: "));
}

#[test]
fn test_unknown_module_is_an_error() {
    let output = run_gall(&["no_such_program.gall"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("Could not find module no_such_program.gall."), "{}", stderr);
}
