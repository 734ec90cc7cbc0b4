//! Integration tests for the `interpret` binary.
//!
//! These tests invoke the binary as a subprocess and check exit codes,
//! stdout, stderr and the statistics file.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[allow(deprecated)]
fn interpret() -> Command {
    Command::cargo_bin("interpret").unwrap()
}

fn program_xml(instructions: &[(&str, &[(&str, &str)])]) -> String {
    let body: String = instructions
        .iter()
        .enumerate()
        .map(|(i, (opcode, args))| {
            let args: String = args
                .iter()
                .enumerate()
                .map(|(n, (ty, text))| format!("<arg{n} type=\"{ty}\">{text}</arg{n}>", n = n + 1))
                .collect();
            format!(
                "<instruction order=\"{}\" opcode=\"{opcode}\">{args}</instruction>",
                (i + 1) * 2
            )
        })
        .collect();
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<program language=\"IPPcode23\">{body}</program>")
}

/// Write `content` into `dir` and return the `--name=path` flag for it.
fn file_flag(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    format!("--{name}={}", path.display())
}

fn hello() -> String {
    program_xml(&[("WRITE", &[("string", "Hello,\\032world!")])])
}

// ---- Help and usage errors ----

#[test]
fn help_alone_exits_0() {
    interpret()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--source"))
        .stdout(predicate::str::contains("--stats"));
}

#[test]
fn help_with_other_arguments_exits_10() {
    interpret()
        .args(["--help", "--input=in.txt"])
        .assert()
        .code(10);
}

#[test]
fn no_arguments_exits_10() {
    interpret()
        .assert()
        .code(10)
        .stderr(predicate::str::contains("--source"));
}

#[test]
fn unknown_flag_exits_10() {
    interpret()
        .args(["--source=prog.xml", "--trace"])
        .assert()
        .code(10);
}

#[test]
fn statistics_without_destination_exits_10() {
    let dir = TempDir::new().unwrap();
    interpret()
        .arg(file_flag(&dir, "source", &hello()))
        .arg("--insts")
        .assert()
        .code(10)
        .stdout(predicate::str::is_empty());
}

// ---- Files ----

#[test]
fn missing_source_file_exits_11() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.xml");
    interpret()
        .arg(format!("--source={}", missing.display()))
        .assert()
        .code(11)
        .stderr(predicate::str::contains("cannot open"));
}

#[test]
fn missing_input_file_exits_11_before_loading() {
    let dir = TempDir::new().unwrap();
    interpret()
        .arg(file_flag(&dir, "source", "not xml"))
        .arg("--input=/nonexistent/input.txt")
        .assert()
        .code(11);
}

#[test]
fn source_from_file() {
    let dir = TempDir::new().unwrap();
    interpret()
        .arg(file_flag(&dir, "source", &hello()))
        .assert()
        .success()
        .stdout("Hello, world!");
}

#[test]
fn source_from_stdin() {
    let dir = TempDir::new().unwrap();
    interpret()
        .arg(file_flag(&dir, "input", ""))
        .write_stdin(hello())
        .assert()
        .success()
        .stdout("Hello, world!");
}

#[test]
fn input_from_file_and_stdin() {
    let source = program_xml(&[
        ("DEFVAR", &[("var", "GF@n")]),
        ("READ", &[("var", "GF@n"), ("type", "int")]),
        ("MUL", &[("var", "GF@n"), ("var", "GF@n"), ("int", "2")]),
        ("WRITE", &[("var", "GF@n")]),
    ]);

    let dir = TempDir::new().unwrap();
    interpret()
        .arg(file_flag(&dir, "source", &source))
        .arg(file_flag(&dir, "input", "21\n"))
        .assert()
        .success()
        .stdout("42");

    interpret()
        .arg(file_flag(&dir, "source", &source))
        .write_stdin("-4\n")
        .assert()
        .success()
        .stdout("-8");
}

// ---- Load errors ----

#[test]
fn malformed_xml_exits_31() {
    let dir = TempDir::new().unwrap();
    interpret()
        .arg(file_flag(&dir, "input", ""))
        .write_stdin("<program language=\"IPPcode23\">")
        .assert()
        .code(31)
        .stderr(predicate::str::contains("malformed XML"));
}

#[test]
fn source_that_is_not_utf8_exits_31() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.xml");
    fs::write(&path, [0x3c, 0xff, 0xfe, 0x3e]).unwrap();
    interpret()
        .arg(format!("--source={}", path.display()))
        .assert()
        .code(31);
}

#[test]
fn unknown_opcode_exits_32() {
    let dir = TempDir::new().unwrap();
    interpret()
        .arg(file_flag(&dir, "source", &program_xml(&[("JUMPS", &[])])))
        .assert()
        .code(32)
        .stdout(predicate::str::is_empty());
}

#[test]
fn duplicate_label_exits_52() {
    let source = program_xml(&[
        ("LABEL", &[("label", "top")]),
        ("LABEL", &[("label", "top")]),
    ]);
    let dir = TempDir::new().unwrap();
    interpret()
        .arg(file_flag(&dir, "source", &source))
        .assert()
        .code(52);
}

// ---- Execution ----

#[test]
fn exit_instruction_sets_status_after_flushing_output() {
    let source = program_xml(&[
        ("WRITE", &[("string", "before")]),
        ("EXIT", &[("int", "7")]),
        ("WRITE", &[("string", "after")]),
    ]);
    let dir = TempDir::new().unwrap();
    interpret()
        .arg(file_flag(&dir, "source", &source))
        .assert()
        .code(7)
        .stdout("before");
}

#[test]
fn runtime_error_keeps_earlier_output() {
    let source = program_xml(&[
        ("WRITE", &[("string", "partial")]),
        ("DEFVAR", &[("var", "GF@x")]),
        ("IDIV", &[("var", "GF@x"), ("int", "1"), ("int", "0")]),
        ("WRITE", &[("string", "never")]),
    ]);
    let dir = TempDir::new().unwrap();
    interpret()
        .arg(file_flag(&dir, "source", &source))
        .assert()
        .code(57)
        .stdout("partial")
        .stderr(predicate::str::contains("division by zero"));
}

#[test]
fn runtime_error_codes() {
    let cases: [(&[(&str, &str)], &str, i32); 3] = [
        (&[("var", "GF@missing")], "WRITE", 54),
        (&[("var", "LF@x")], "DEFVAR", 55),
        (&[("int", "50")], "EXIT", 57),
    ];
    let dir = TempDir::new().unwrap();
    for (args, opcode, code) in cases {
        interpret()
            .arg(file_flag(&dir, "source", &program_xml(&[(opcode, args)])))
            .assert()
            .code(code);
    }
}

#[test]
fn dprint_goes_to_stderr() {
    let source = program_xml(&[
        ("DPRINT", &[("string", "debug")]),
        ("WRITE", &[("string", "out")]),
    ]);
    let dir = TempDir::new().unwrap();
    interpret()
        .arg(file_flag(&dir, "source", &source))
        .assert()
        .success()
        .stdout("out")
        .stderr(predicate::str::contains("debug"));
}

// ---- Statistics ----

fn stats_program() -> String {
    program_xml(&[
        ("DEFVAR", &[("var", "GF@x")]),
        ("MOVE", &[("var", "GF@x"), ("int", "1")]),
        ("LABEL", &[("label", "end")]),
        ("WRITE", &[("var", "GF@x")]),
    ])
}

#[test]
fn statistics_follow_flag_order() {
    let dir = TempDir::new().unwrap();
    let stats: PathBuf = dir.path().join("stats.txt");
    interpret()
        .arg(file_flag(&dir, "source", &stats_program()))
        .arg(format!("--stats={}", stats.display()))
        .args([
            "--insts",
            "--print=:",
            "--hot",
            "--eol",
            "--vars",
            "--eol",
            "--frequent",
        ])
        .assert()
        .success()
        .stdout("1");

    assert_eq!(fs::read_to_string(&stats).unwrap(), "3:2\n1\nWRITE,MOVE,LABEL,DEFVAR");
}

#[test]
fn statistics_written_after_exit() {
    let source = program_xml(&[
        ("CREATEFRAME", &[]),
        ("EXIT", &[("int", "3")]),
    ]);
    let dir = TempDir::new().unwrap();
    let stats = dir.path().join("stats.txt");
    interpret()
        .arg(file_flag(&dir, "source", &source))
        .arg(format!("--stats={}", stats.display()))
        .arg("--insts")
        .assert()
        .code(3);

    assert_eq!(fs::read_to_string(&stats).unwrap(), "2");
}

#[test]
fn statistics_not_written_after_runtime_error() {
    let source = program_xml(&[
        ("DEFVAR", &[("var", "GF@x")]),
        ("POPS", &[("var", "GF@x")]),
    ]);
    let dir = TempDir::new().unwrap();
    let stats = dir.path().join("stats.txt");
    interpret()
        .arg(file_flag(&dir, "source", &source))
        .arg(format!("--stats={}", stats.display()))
        .arg("--insts")
        .assert()
        .code(56);

    assert!(!stats.exists());
}

#[test]
fn unwritable_statistics_file_exits_12() {
    let dir = TempDir::new().unwrap();
    let stats = dir.path().join("missing-dir").join("stats.txt");
    interpret()
        .arg(file_flag(&dir, "source", &hello()))
        .arg(format!("--stats={}", stats.display()))
        .arg("--vars")
        .assert()
        .code(12)
        .stdout("Hello, world!");
}
