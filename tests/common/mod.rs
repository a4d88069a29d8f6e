//! Common test utilities

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Create a temporary directory with a duties.yml file
pub fn create_test_duties(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let duties_path = temp_dir.path().join("duties.yml");
    fs::write(&duties_path, content).unwrap();
    (temp_dir, duties_path)
}

/// Create a test duties file with an empty subdirectory next to it
pub fn create_test_duties_in_subdir(content: &str) -> (TempDir, PathBuf, PathBuf) {
    let (temp_dir, duties_path) = create_test_duties(content);
    let sub_dir = temp_dir.path().join("subdir");
    fs::create_dir(&sub_dir).unwrap();
    (temp_dir, duties_path, sub_dir)
}

/// The duty binary, run from `dir` without colors or logs
pub fn duty_in(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("duty").unwrap();
    cmd.current_dir(dir).env("NO_COLOR", "1").env_remove("DUTY_LOG");
    cmd
}

/// Duties shared by the command line tests
pub const DUTIES: &str = r#"
duties:
  hello:
    description: Say hello.
    run: echo hello

  exit_with:
    description: |
      Exit with the given code.

      Any integer works.
    aliases: [exit]
    params:
      - name: code
        type: int
        usage: The exit code
    run: exit ${code}

  check_bool:
    description: Succeed when the value is true.
    params:
      - {name: value, type: bool}
    run: test ${value} = true

  greet:
    params:
      - {name: who, default: world}
      - {name: punctuation, kind: keyword-only, default: "!"}
    run: echo hello ${who}${punctuation}

  fail:
    options: {nofail: false}
    run: exit 2

  lenient:
    options: {nofail: true}
    run: exit 3

  strict_step:
    run:
      - command: exit 4
        options: {nofail: false, allow_overrides: false}

  announce:
    pre: [hello]
    post: [greet]
    run: echo announcing
"#;
