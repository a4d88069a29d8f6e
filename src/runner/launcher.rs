//! Command launching
//!
//! A [`Cmd`] is either a shell line, an argument vector, or an in-process
//! callable. The [`Launcher`] turns one into a [`RunResult`]; the default
//! [`ProcessLauncher`] spawns processes and prints a status line per command.

use colored::Colorize;
use std::fmt;
use std::io;
use std::path::Path;
use std::process::{self, Command as StdCommand, ExitStatus, Stdio};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use thiserror::Error;

use crate::error::DutyFailure;
use crate::runner::Options;

/// Number of child processes currently waited on
static RUNNING: AtomicUsize = AtomicUsize::new(0);

/// Set by the Ctrl-C handler while a child process runs
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Keep `duty` alive on Ctrl-C while a command runs.
///
/// The terminal sends SIGINT to the whole foreground process group, so the
/// running command gets it too; its launch then fails with
/// [`LaunchError::Interrupted`]. Outside of a command, Ctrl-C exits with 130.
pub fn install_interrupt_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(|| {
        if RUNNING.load(Ordering::SeqCst) > 0 {
            INTERRUPTED.store(true, Ordering::SeqCst);
        } else {
            process::exit(DutyFailure::INTERRUPTED);
        }
    })
}

/// Marks a child process as running until dropped
struct Running;

impl Running {
    fn enter() -> Self {
        if RUNNING.fetch_add(1, Ordering::SeqCst) == 0 {
            INTERRUPTED.store(false, Ordering::SeqCst);
        }
        Running
    }

    /// Whether Ctrl-C was pressed while the child ran, or it died from SIGINT
    fn interrupted(&self, status: &ExitStatus) -> bool {
        INTERRUPTED.swap(false, Ordering::SeqCst) || killed_by_sigint(status)
    }
}

impl Drop for Running {
    fn drop(&mut self) {
        RUNNING.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Errors that prevent a command from producing an exit code.
#[derive(Error, Debug)]
pub enum LaunchError {
    /// The user interrupted the command (Ctrl-C).
    #[error("Interrupted")]
    Interrupted,

    #[error("Command '{command}' could not be executed: {error}")]
    Spawn { command: String, error: io::Error },

    #[error("No command specified to run")]
    Empty,
}

/// What an in-process callable reports: an exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome(pub i32);

impl From<bool> for Outcome {
    fn from(success: bool) -> Self {
        Outcome(if success { 0 } else { 1 })
    }
}

impl From<i32> for Outcome {
    fn from(code: i32) -> Self {
        Outcome(code)
    }
}

impl From<()> for Outcome {
    fn from(_: ()) -> Self {
        Outcome(0)
    }
}

pub type CallableFn = Rc<dyn Fn() -> Result<Outcome, LaunchError>>;

/// A command to run.
#[derive(Clone)]
pub enum Cmd {
    /// A line run through the interpreter (`sh -c` by default)
    Shell(String),
    /// A program and its arguments, spawned directly
    Args(Vec<String>),
    Callable(CallableFn),
}

impl Cmd {
    /// Wrap an in-process callable returning `bool`, `i32` or `()`.
    pub fn callable<F, R>(f: F) -> Self
    where
        F: Fn() -> R + 'static,
        R: Into<Outcome>,
    {
        Cmd::Callable(Rc::new(move || Ok(f().into())))
    }

    /// Wrap a callable that may fail to produce an outcome.
    pub fn try_callable<F, R>(f: F) -> Self
    where
        F: Fn() -> Result<R, LaunchError> + 'static,
        R: Into<Outcome>,
    {
        Cmd::Callable(Rc::new(move || f().map(Into::into)))
    }
}

impl fmt::Debug for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cmd::Shell(line) => f.debug_tuple("Shell").field(line).finish(),
            Cmd::Args(args) => f.debug_tuple("Args").field(args).finish(),
            Cmd::Callable(_) => f.write_str("Callable"),
        }
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cmd::Shell(line) => f.write_str(line),
            Cmd::Args(args) => {
                let joined = shlex::try_join(args.iter().map(String::as_str))
                    .unwrap_or_else(|_| args.join(" "));
                f.write_str(&joined)
            }
            Cmd::Callable(_) => f.write_str("<callable>"),
        }
    }
}

impl From<&str> for Cmd {
    fn from(line: &str) -> Self {
        Cmd::Shell(line.to_string())
    }
}

impl From<String> for Cmd {
    fn from(line: String) -> Self {
        Cmd::Shell(line)
    }
}

impl From<Vec<String>> for Cmd {
    fn from(args: Vec<String>) -> Self {
        Cmd::Args(args)
    }
}

impl From<Vec<&str>> for Cmd {
    fn from(args: Vec<&str>) -> Self {
        Cmd::Args(args.into_iter().map(String::from).collect())
    }
}

/// Exit code and captured output of one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunResult {
    pub code: i32,
    pub output: String,
}

/// Runs commands on behalf of a [`Context`](crate::runner::Context).
pub trait Launcher {
    fn launch(&self, cmd: &Cmd, options: &Options) -> Result<RunResult, LaunchError>;
}

/// Which output streams are captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    Both,
    Stdout,
    Stderr,
    None,
}

impl Capture {
    fn from_options(options: &Options) -> Self {
        match options.get_str("capture").as_deref() {
            Some("stdout") => Capture::Stdout,
            Some("stderr") => Capture::Stderr,
            Some("none") | Some("false") => Capture::None,
            _ => Capture::Both,
        }
    }

    fn stdout(self) -> bool {
        matches!(self, Capture::Both | Capture::Stdout)
    }

    fn stderr(self) -> bool {
        matches!(self, Capture::Both | Capture::Stderr)
    }
}

/// Spawns processes and prints `✓ title` / `✗ title (code)` lines.
///
/// Captured output is only shown when the command fails, unless `quiet`.
/// `silent` prints nothing at all. `nofail` reports success whatever the code.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    interpreter: Vec<String>,
}

impl Default for ProcessLauncher {
    fn default() -> Self {
        ProcessLauncher {
            interpreter: vec!["sh".to_string(), "-c".to_string()],
        }
    }
}

impl ProcessLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the interpreter used for shell lines, e.g. `["bash", "-c"]`
    pub fn with_interpreter(mut self, interpreter: Vec<String>) -> Self {
        if !interpreter.is_empty() {
            self.interpreter = interpreter;
        }
        self
    }

    pub fn interpreter(&self) -> &[String] {
        &self.interpreter
    }

    fn build(&self, cmd: &Cmd) -> Result<StdCommand, LaunchError> {
        match cmd {
            Cmd::Shell(line) => {
                let mut command = StdCommand::new(&self.interpreter[0]);
                command.args(&self.interpreter[1..]).arg(line);
                Ok(command)
            }
            Cmd::Args(args) => {
                let (program, rest) = args.split_first().ok_or(LaunchError::Empty)?;
                let mut command = StdCommand::new(program);
                command.args(rest);
                Ok(command)
            }
            Cmd::Callable(_) => Err(LaunchError::Empty),
        }
    }

    fn spawn(&self, cmd: &Cmd, capture: Capture) -> Result<RunResult, LaunchError> {
        if let Cmd::Callable(f) = cmd {
            let Outcome(code) = f()?;
            return Ok(RunResult {
                code,
                output: String::new(),
            });
        }

        let mut command = self.build(cmd)?;
        command.stdin(Stdio::inherit());
        command.stdout(if capture.stdout() { Stdio::piped() } else { Stdio::inherit() });
        command.stderr(if capture.stderr() { Stdio::piped() } else { Stdio::inherit() });

        let running = Running::enter();
        let output = command.output().map_err(|error| LaunchError::Spawn {
            command: cmd.to_string(),
            error,
        })?;

        if running.interrupted(&output.status) {
            return Err(LaunchError::Interrupted);
        }

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(RunResult {
            code: output.status.code().unwrap_or(1),
            output: text,
        })
    }

    /// Run a shell line silently in `dir` and report whether it succeeded.
    pub fn check(&self, line: &str, dir: &Path) -> Result<bool, LaunchError> {
        let cmd = Cmd::Shell(line.to_string());
        let mut command = self.build(&cmd)?;
        command
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let running = Running::enter();
        let status = command.status().map_err(|error| LaunchError::Spawn {
            command: cmd.to_string(),
            error,
        })?;
        if running.interrupted(&status) {
            return Err(LaunchError::Interrupted);
        }
        Ok(status.success())
    }
}

impl Launcher for ProcessLauncher {
    fn launch(&self, cmd: &Cmd, options: &Options) -> Result<RunResult, LaunchError> {
        let capture = Capture::from_options(options);
        let quiet = options.get_bool("quiet", false);
        let silent = options.get_bool("silent", false);
        let nofail = options.get_bool("nofail", false);
        let title = options
            .get_str("title")
            .or_else(|| options.get_str("command"))
            .unwrap_or_else(|| cmd.to_string());

        log::debug!("Launching {:?} with {:?}", cmd, options);
        let mut result = self.spawn(cmd, capture)?;

        if !silent {
            if result.code == 0 {
                println!("{} {}", "✓".green().bold(), title);
            } else {
                println!("{} {} ({})", "✗".red().bold(), title, result.code);
            }
            if result.code != 0 && !quiet && !result.output.is_empty() {
                for line in result.output.lines() {
                    println!("  > {}", line);
                }
            }
        }

        if nofail {
            result.code = 0;
        }
        Ok(result)
    }
}

#[cfg(unix)]
fn killed_by_sigint(status: &ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;
    status.signal() == Some(2)
}

#[cfg(not(unix))]
fn killed_by_sigint(_status: &ExitStatus) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn silent() -> Options {
        Options::new().with("silent", true)
    }

    #[test]
    fn test_shell_line_output() {
        let result = ProcessLauncher::new()
            .launch(&Cmd::from("echo hello"), &silent())
            .unwrap();
        assert_eq!(result.code, 0);
        assert_eq!(result.output, "hello\n");
    }

    #[test]
    fn test_args_vector() {
        let result = ProcessLauncher::new()
            .launch(&Cmd::from(vec!["echo", "a b"]), &silent())
            .unwrap();
        assert_eq!(result.output, "a b\n");
    }

    #[test]
    fn test_failing_command_code() {
        let result = ProcessLauncher::new()
            .launch(&Cmd::from("exit 3"), &silent())
            .unwrap();
        assert_eq!(result.code, 3);
    }

    #[test]
    fn test_nofail_reports_success() {
        let options = silent().with("nofail", true);
        let result = ProcessLauncher::new()
            .launch(&Cmd::from("exit 3"), &options)
            .unwrap();
        assert_eq!(result.code, 0);
    }

    #[test]
    fn test_capture_stdout_only() {
        let options = silent().with("capture", "stdout");
        let result = ProcessLauncher::new()
            .launch(&Cmd::from("echo out; echo err >&2"), &options)
            .unwrap();
        assert_eq!(result.output, "out\n");
    }

    #[test]
    fn test_capture_none() {
        let options = silent().with("capture", "none");
        let result = ProcessLauncher::new()
            .launch(&Cmd::from("true"), &options)
            .unwrap();
        assert_eq!(result.output, "");
    }

    #[test]
    fn test_callable_outcomes() {
        let launcher = ProcessLauncher::new();
        assert_eq!(launcher.launch(&Cmd::callable(|| true), &silent()).unwrap().code, 0);
        assert_eq!(launcher.launch(&Cmd::callable(|| false), &silent()).unwrap().code, 1);
        assert_eq!(launcher.launch(&Cmd::callable(|| 4), &silent()).unwrap().code, 4);
        assert_eq!(launcher.launch(&Cmd::callable(|| ()), &silent()).unwrap().code, 0);
    }

    #[test]
    fn test_callable_interrupt() {
        let cmd = Cmd::try_callable(|| -> Result<bool, LaunchError> { Err(LaunchError::Interrupted) });
        let result = ProcessLauncher::new().launch(&cmd, &silent());
        assert!(matches!(result, Err(LaunchError::Interrupted)));
    }

    #[test]
    fn test_empty_args() {
        let result = ProcessLauncher::new().launch(&Cmd::Args(Vec::new()), &silent());
        assert!(matches!(result, Err(LaunchError::Empty)));
    }

    #[test]
    fn test_args_display_is_quoted() {
        let display = Cmd::from(vec!["echo", "a b"]).to_string();
        assert!(display.starts_with("echo "));
        assert_ne!(display, "echo a b");
    }

    #[test]
    fn test_check() {
        let launcher = ProcessLauncher::new();
        let dir = std::env::temp_dir();
        assert!(launcher.check("true", &dir).unwrap());
        assert!(!launcher.check("false", &dir).unwrap());
    }

    #[test]
    fn test_custom_interpreter() {
        let launcher = ProcessLauncher::new().with_interpreter(vec!["sh".into(), "-ec".into()]);
        assert_eq!(launcher.interpreter(), &["sh", "-ec"]);

        let launcher = ProcessLauncher::new().with_interpreter(Vec::new());
        assert_eq!(launcher.interpreter(), &["sh", "-c"]);
    }
}
