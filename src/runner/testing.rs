//! Test helpers shared by the runner modules

use std::cell::RefCell;
use std::sync::{Mutex, MutexGuard};

use crate::runner::{Cmd, LaunchError, Launcher, Options, RunResult};

static CWD_LOCK: Mutex<()> = Mutex::new(());

/// Serialize tests that change the process working directory.
pub fn cwd_lock() -> MutexGuard<'static, ()> {
    CWD_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Records every launch instead of running anything.
///
/// Callables are still invoked so their outcome is reported.
#[derive(Default)]
pub struct RecordingLauncher {
    pub calls: RefCell<Vec<(String, Options)>>,
}

impl RecordingLauncher {
    pub fn last_options(&self) -> Options {
        self.calls
            .borrow()
            .last()
            .map(|(_, options)| options.clone())
            .unwrap_or_default()
    }

    /// Titles of the launched commands, falling back to the command text.
    pub fn titles(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|(title, _)| title.clone()).collect()
    }
}

impl Launcher for RecordingLauncher {
    fn launch(&self, cmd: &Cmd, options: &Options) -> Result<RunResult, LaunchError> {
        let title = options.get_str("title").unwrap_or_else(|| cmd.to_string());
        self.calls.borrow_mut().push((title, options.clone()));
        let code = match cmd {
            Cmd::Callable(f) => f()?.0,
            _ => 0,
        };
        Ok(RunResult {
            code,
            output: String::new(),
        })
    }
}
