//! The `stacknav` binary, run as a subprocess.

mod common;

use std::io::Write;
use std::process::{Command, Output, Stdio};

use tempfile::NamedTempFile;

use common::CHAINED_TRACE;

fn run(args: &[&str], stdin: &str) -> Output {
    let config = NamedTempFile::new().expect("create config file");
    let mut child = Command::new(env!("CARGO_BIN_EXE_stacknav"))
        .arg("--config")
        .arg(config.path())
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn stacknav");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin.as_bytes())
        .expect("write stdin");
    child.wait_with_output().expect("wait for stacknav")
}

#[test]
fn test_frames_marks_cursor() {
    let output = run(&["frames", "--line", "6"], CHAINED_TRACE);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], ">   1 at com.example.io.Writer.flush(Writer.java:99)");
    assert_eq!(lines[4], "    5 at com.example.app.Main.main(Main.java:8)");
}

#[test]
fn test_frames_from_literal_text() {
    let output = run(&["frames", "--from", "at a.B.c(B.java:3)"], "");
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        ">   1 at a.B.c(B.java:3)\n"
    );
}

#[test]
fn test_no_trace_exits_with_error() {
    let output = run(&["frames"], "just some prose\n");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("stacknav: error: no stack trace found"));
}
