use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const MELD_BIN: &str = env!("CARGO_BIN_EXE_meld");

struct Context {
    root: TempDir,
}

impl Context {
    fn new(files: &[(&str, &[u8])]) -> Self {
        let root = tempfile::tempdir().expect("failed to create root dir");
        for (name, contents) in files {
            fs::write(root.path().join(name), contents).expect("failed to write source file");
        }
        Self { root }
    }

    fn path(&self) -> &Path {
        self.root.path()
    }

    fn meld(&self, args: &[&str]) -> Output {
        Command::new(MELD_BIN)
            .arg(self.path())
            .args(args)
            .output()
            .expect("failed to run meld")
    }
}

#[test]
fn test_meld() {
    let ctx = Context::new(&[("a.txt", b"AAAABBBB"), ("b.txt", b"11112222")]);

    let output = ctx.meld(&["a.txt", "b.txt", "c.txt"]);
    assert!(output.status.success(), "meld failed");
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "16");

    let contents = fs::read(ctx.path().join("c.txt")).expect("failed to read melded file");
    assert_eq!(contents, b"AAAA1111BBBB2222");
}

#[test]
fn test_meld_unequal() {
    let ctx = Context::new(&[("a.txt", b"AAAAB"), ("b.txt", b"111122223")]);

    let output = ctx.meld(&["a.txt", "b.txt", "c.txt"]);
    assert!(output.status.success(), "meld failed");

    let contents = fs::read(ctx.path().join("c.txt")).expect("failed to read melded file");
    assert_eq!(contents, b"AAAA1111B22223");
}

#[test]
fn test_meld_existing_destination() {
    let ctx = Context::new(&[
        ("a.txt", b"AAAA"),
        ("b.txt", b"1111"),
        ("c.txt", b"untouched"),
    ]);

    let output = ctx.meld(&["a.txt", "b.txt", "c.txt"]);
    assert!(!output.status.success());

    let contents = fs::read(ctx.path().join("c.txt")).expect("failed to read destination");
    assert_eq!(contents, b"untouched");
}

#[test]
fn test_meld_missing_source() {
    let ctx = Context::new(&[("a.txt", b"AAAA")]);

    let output = ctx.meld(&["a.txt", "b.txt", "c.txt"]);
    assert!(!output.status.success());
    assert!(!ctx.path().join("c.txt").exists());
}

#[test]
fn test_meld_open_max() {
    let ctx = Context::new(&[("a.txt", b"AAAA"), ("b.txt", b"1111")]);

    let output = Command::new(MELD_BIN)
        .args(["-n", "2"])
        .arg(ctx.path())
        .args(["a.txt", "b.txt", "c.txt"])
        .output()
        .expect("failed to run meld");
    assert!(!output.status.success());
}

#[test]
fn test_meld_open_max_too_large() {
    let ctx = Context::new(&[("a.txt", b"AAAA"), ("b.txt", b"1111")]);

    let output = Command::new(MELD_BIN)
        .args(["-n", "3000000000"])
        .arg(ctx.path())
        .args(["a.txt", "b.txt", "c.txt"])
        .output()
        .expect("failed to run meld");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("meld [-n open_max]"));
    assert!(!ctx.path().join("c.txt").exists());
}

#[test]
fn test_usage() {
    let ctx = Context::new(&[]);
    let output = ctx.meld(&["a.txt"]);
    assert!(!output.status.success());
}
