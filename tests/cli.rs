//! Integration tests for the command line

mod common;

use common::{create_test_duties, create_test_duties_in_subdir, duty_in, DUTIES};
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn test_run_duty() {
    let (dir, _) = create_test_duties(DUTIES);
    duty_in(dir.path())
        .arg("hello")
        .assert()
        .success()
        .stdout(predicate::str::contains("hello"));
}

#[test]
fn test_unknown_duty() {
    let (dir, _) = create_test_duties(DUTIES);
    duty_in(dir.path())
        .arg("byebye")
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "> Missing duty name before argument 'byebye', or unknown duty name",
        ));
}

#[test]
fn test_unexpected_keyword() {
    let (dir, _) = create_test_duties(DUTIES);
    duty_in(dir.path())
        .args(["hello", "hello=1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("hello() got an unexpected keyword argument 'hello'"));
}

#[test]
fn test_missing_argument() {
    let (dir, _) = create_test_duties(DUTIES);
    duty_in(dir.path())
        .arg("exit-with")
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "exit_with() missing 1 required positional argument: 'code'",
        ));
}

#[test]
fn test_exit_code_is_kept() {
    let (dir, _) = create_test_duties(DUTIES);
    duty_in(dir.path()).args(["exit-with", "3"]).assert().code(3);
    duty_in(dir.path()).args(["exit", "5"]).assert().code(5);
    duty_in(dir.path()).args(["exit_with", "code=0"]).assert().success();
}

#[test]
fn test_boolean_casting() {
    let (dir, _) = create_test_duties(DUTIES);

    for value in ["yes", "YES", "true", "1", "on", "y", "anything"] {
        duty_in(dir.path()).args(["check-bool", value]).assert().success();
    }
    for value in ["no", "False", "0", "off", "n", ""] {
        duty_in(dir.path()).args(["check-bool", value]).assert().code(1);
    }

    duty_in(dir.path()).args(["check-bool", "value=on"]).assert().success();
}

#[test]
fn test_defaults_and_keywords() {
    let (dir, _) = create_test_duties(DUTIES);
    duty_in(dir.path())
        .arg("greet")
        .assert()
        .success()
        .stdout(predicate::str::contains("hello world!"));

    duty_in(dir.path())
        .args(["greet", "you", "punctuation=?"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello you?"));

    duty_in(dir.path())
        .args(["greet", "you", "?"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("greet() takes from 0 to 1 positional argument but 2 were given"));
}

#[test]
fn test_override_precedence() {
    let (dir, _) = create_test_duties(DUTIES);

    duty_in(dir.path()).arg("fail").assert().code(2);
    duty_in(dir.path()).args(["-z", "fail"]).assert().success();
    duty_in(dir.path()).args(["fail", "--nofail"]).assert().success();
    duty_in(dir.path()).args(["-z", "fail", "-Z"]).assert().code(2);

    duty_in(dir.path()).arg("lenient").assert().success();
    duty_in(dir.path()).args(["lenient", "--strict"]).assert().code(3);
}

#[test]
fn test_run_flags_after_parameters() {
    let (dir, _) = create_test_duties(DUTIES);
    duty_in(dir.path()).args(["exit-with", "3", "--nofail"]).assert().success();
    duty_in(dir.path()).args(["exit-with", "code=3", "-z"]).assert().success();
    duty_in(dir.path())
        .args(["greet", "--", "-q"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello -q!"));
}

#[test]
fn test_parameters_are_quoted_in_shell_lines() {
    let (dir, _) = create_test_duties(DUTIES);
    duty_in(dir.path())
        .args(["greet", "you; exit 7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello you; exit 7!"));
}

#[cfg(unix)]
#[test]
fn test_ctrl_c_exits_with_130() {
    use std::os::unix::process::CommandExt;
    use std::process::{Command, Stdio};
    use std::thread;
    use std::time::{Duration, Instant};

    let (dir, _) = create_test_duties(
        r#"
duties:
  wait:
    run: sleep 30
"#,
    );

    // Own process group, so the signal reaches duty and its command like a terminal Ctrl-C
    let mut child = Command::new(assert_cmd::cargo::cargo_bin("duty"))
        .arg("wait")
        .current_dir(dir.path())
        .env("NO_COLOR", "1")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .process_group(0)
        .spawn()
        .unwrap();
    thread::sleep(Duration::from_secs(1));

    let started = Instant::now();
    let killed = Command::new("sh")
        .arg("-c")
        .arg(format!("kill -s INT -- -{}", child.id()))
        .status()
        .unwrap();
    assert!(killed.success());

    let status = child.wait().unwrap();
    assert_eq!(status.code(), Some(130));
    assert!(started.elapsed() < Duration::from_secs(20));
}

#[test]
fn test_overrides_can_be_refused_per_call() {
    let (dir, _) = create_test_duties(DUTIES);
    duty_in(dir.path()).args(["-z", "strict-step"]).assert().code(4);
}

#[test]
fn test_multiple_duties() {
    let (dir, _) = create_test_duties(DUTIES);
    duty_in(dir.path())
        .args(["hello", "greet", "you"])
        .assert()
        .success()
        .stdout(predicate::str::contains("echo hello").and(predicate::str::contains("hello you!")));
}

#[test]
fn test_first_failure_stops_the_run() {
    let (dir, _) = create_test_duties(DUTIES);
    duty_in(dir.path())
        .args(["exit-with", "2", "hello"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("echo hello").not());
}

#[test]
fn test_nothing_runs_when_a_duty_is_invalid() {
    let (dir, _) = create_test_duties(DUTIES);
    duty_in(dir.path())
        .args(["hello", "exit-with"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("echo hello").not());
}

#[test]
fn test_pre_and_post_duties() {
    let (dir, _) = create_test_duties(DUTIES);
    let output = duty_in(dir.path()).arg("announce").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let pre = stdout.find("echo hello").unwrap();
    let body = stdout.find("echo announcing").unwrap();
    let post = stdout.find("hello world!").unwrap();
    assert!(pre < body && body < post);
}

#[test]
fn test_silent_and_quiet() {
    let (dir, _) = create_test_duties(
        r#"
duties:
  noisy:
    run:
      - command: echo oops; exit 1
        options: {title: Noisy}
"#,
    );

    duty_in(dir.path())
        .arg("noisy")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("  > oops"));

    duty_in(dir.path())
        .args(["noisy", "-q"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("oops").not());

    duty_in(dir.path())
        .args(["-s", "noisy"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_skipped_duty() {
    let (dir, _) = create_test_duties(
        r#"
duties:
  deploy:
    skip_if: {exists: duties.yml}
    skip_reason: "deploy: nothing to do"
    run: exit 1
"#,
    );
    duty_in(dir.path())
        .arg("deploy")
        .assert()
        .success()
        .stdout(predicate::str::contains("deploy: nothing to do"));
}

#[test]
fn test_list_duties() {
    let (dir, _) = create_test_duties(DUTIES);
    duty_in(dir.path())
        .arg("-l")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("  hello")
                .and(predicate::str::contains("Say hello."))
                .and(predicate::str::contains("Exit with the given code."))
                .and(predicate::str::contains("Any integer works.").not()),
        );
}

#[test]
fn test_global_help() {
    let (dir, _) = create_test_duties(DUTIES);
    duty_in(dir.path())
        .arg("-h")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Global options")
                .and(predicate::str::contains("--duties-file"))
                .and(predicate::str::contains("Available duties:"))
                .and(predicate::str::contains("--complete").not()),
        );
}

#[test]
fn test_no_duty_prints_help() {
    let (dir, _) = create_test_duties(DUTIES);
    duty_in(dir.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Available duties:"));
}

#[test]
fn test_duty_help() {
    let (dir, _) = create_test_duties(DUTIES);
    duty_in(dir.path())
        .args(["-h", "exit"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("duty exit-with")
                .and(predicate::str::contains("Any integer works."))
                .and(predicate::str::contains("code: int"))
                .and(predicate::str::contains("The exit code")),
        );

    duty_in(dir.path())
        .args(["-h", "nope"])
        .assert()
        .success()
        .stdout(predicate::str::contains("> Unknown duty 'nope'"));
}

#[test]
fn test_version() {
    let (dir, _) = create_test_duties(DUTIES);
    duty_in(dir.path())
        .arg("-V")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("duty {}", env!("CARGO_PKG_VERSION"))));
}

#[test]
fn test_debug_info() {
    let dir = TempDir::new().unwrap();
    duty_in(dir.path())
        .arg("--debug-info")
        .assert()
        .success()
        .stdout(predicate::str::contains("__Version__").and(predicate::str::contains("__Interpreter__")));
}

#[test]
fn test_completion_scripts() {
    let dir = TempDir::new().unwrap();
    duty_in(dir.path())
        .args(["--completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("complete -o default -F _complete_duty duty"));

    duty_in(dir.path())
        .args(["--completion", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("_describe 'duty' subcmds"));

    duty_in(dir.path())
        .args(["--completion"])
        .env("SHELL", "/bin/zsh")
        .assert()
        .success()
        .stdout(predicate::str::contains("_describe 'duty' subcmds"));

    duty_in(dir.path()).args(["--completion", "fish"]).assert().code(1);
}

#[test]
fn test_complete_candidates() {
    let (dir, _) = create_test_duties(DUTIES);
    let output = duty_in(dir.path())
        .args(["--complete", "bash", "--", "exit-with"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    let code = lines.iter().position(|l| *l == "code=").unwrap();
    let hello = lines.iter().position(|l| *l == "hello").unwrap();
    let list = lines.iter().position(|l| *l == "--list").unwrap();
    assert!(hello < code && code < list);
    assert!(!lines.contains(&"--complete"));
}

#[test]
fn test_complete_zsh_descriptions() {
    let (dir, _) = create_test_duties(DUTIES);
    duty_in(dir.path())
        .args(["--complete", "zsh", "--"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello:Say hello."));
}

#[test]
fn test_discovery_from_subdirectory() {
    let (_dir, _, sub_dir) = create_test_duties_in_subdir(DUTIES);
    duty_in(&sub_dir).arg("hello").assert().success();
}

#[test]
fn test_explicit_duties_file() {
    let (dir, path) = create_test_duties(DUTIES);
    let other = TempDir::new().unwrap();

    duty_in(other.path())
        .args(["-d", path.to_str().unwrap(), "hello"])
        .assert()
        .success();

    duty_in(dir.path())
        .args(["-d", "missing.yml", "hello"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Duties file 'missing.yml' does not exist"));
}

#[test]
fn test_no_duties_file() {
    let dir = TempDir::new().unwrap();
    duty_in(dir.path()).arg("-l").assert().success();
    duty_in(dir.path()).arg("hello").assert().code(1);
}

#[test]
fn test_invalid_duties_file() {
    let (dir, _) = create_test_duties(
        r#"
duties:
  a:
    pre: [b]
  b:
    pre: [a]
"#,
    );
    duty_in(dir.path())
        .arg("a")
        .assert()
        .code(1)
        .stderr(
            predicate::str::contains("Failed to load duties from")
                .and(predicate::str::contains("Circular dependency detected")),
        );
}
