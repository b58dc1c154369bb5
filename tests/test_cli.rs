use std::fs;
use std::io::Write;
use std::process::{Command, Output, Stdio};

fn demangle(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_demangle"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run demangle")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn single_symbol() {
    let output = demangle(&["_ZN12SignalReader10onActivityEPN4maux6WaiterEi"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        stdout(&output),
        "SignalReader::onActivity(maux::Waiter*, int)\n"
    );

    let output = demangle(&["--no-params", "_ZN12SignalReader10onActivityEPN4maux6WaiterEi"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "SignalReader::onActivity\n");
}

#[test]
fn single_symbol_failures() {
    let output = demangle(&[""]);
    assert_eq!(output.status.code(), Some(4));
    assert_eq!(stdout(&output), "<invalid arg>\n");

    let output = demangle(&["_Zgarbage"]);
    assert_eq!(output.status.code(), Some(3));
    assert_eq!(stdout(&output), "<invalid name>\n");

    // a lone argument with a single dash is still a symbol
    let output = demangle(&["-x"]);
    assert_eq!(output.status.code(), Some(3));
    assert_eq!(stdout(&output), "<invalid name>\n");

    let deep = format!("_Z1f{}i", "P".repeat(100_000));
    let output = demangle(&[deep.as_str()]);
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stdout(&output), "<out of memory>\n");
}

#[test]
fn special_names() {
    let output = demangle(&["_ZTV5klass"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "vtable for klass\n");
}

#[test]
fn usage() {
    let output = demangle(&[]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output), "Nothing to do. Use --help for help.\n");

    let output = demangle(&["--help"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("6 - failed to open input file"));

    assert_eq!(demangle(&["--bogus"]).status.code(), Some(1));
    assert_eq!(demangle(&["--file", "only-source.log"]).status.code(), Some(1));
}

#[test]
fn file_mode() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let source = dir.path().join("source.log");
    let destination = dir.path().join("destination.log");
    fs::write(
        &source,
        "start\ncall site _ZN12SignalReader10onActivityEPN4maux6WaiterEi failed\n_Zgarbage!\nend",
    )
    .unwrap();

    let output = demangle(&[
        "--brackets",
        "--file",
        source.to_str().unwrap(),
        destination.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        fs::read_to_string(&destination).unwrap(),
        "start\ncall site [SignalReader::onActivity(maux::Waiter*, int)] failed\n_Zgarbage!\nend\n"
    );
}

#[test]
fn file_mode_with_std_streams() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_demangle"))
        .args(["--file", "-", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("failed to run demangle");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"x _Z3addii y\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "x add(int, int) y\n");
}

#[test]
fn file_errors() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let missing = dir.path().join("missing.log");
    let source = dir.path().join("source.log");
    fs::write(&source, "line\n").unwrap();
    let unwritable = dir.path().join("no-such-dir").join("out.log");

    let output = demangle(&[
        "--file",
        missing.to_str().unwrap(),
        dir.path().join("out.log").to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(6));

    let output = demangle(&[
        "--file",
        source.to_str().unwrap(),
        unwritable.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(7));
}
