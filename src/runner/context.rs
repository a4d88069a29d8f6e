//! Execution context for duties
//!
//! A context is passed to every duty function. It holds the layered options
//! used to run commands, and the launcher that runs them.

use std::env;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::{DutyFailure, Result};
use crate::runner::{Cmd, Launcher, Options, ProcessLauncher};

/// Execution context handed to duty functions
pub struct Context {
    /// Base options: the duty's declared options plus scoped ones
    options: Options,

    /// Snapshots restored when an options scope ends
    option_stack: Vec<Options>,

    /// Options from the command line, applied on top of everything else
    options_override: Options,

    launcher: Rc<dyn Launcher>,
}

impl Context {
    pub fn new(options: Options, options_override: Options) -> Self {
        Context {
            options,
            option_stack: Vec::new(),
            options_override,
            launcher: Rc::new(ProcessLauncher::new()),
        }
    }

    /// Use another launcher for commands run by this context
    pub fn with_launcher(mut self, launcher: Rc<dyn Launcher>) -> Self {
        self.launcher = launcher;
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn options_override(&self) -> &Options {
        &self.options_override
    }

    pub fn launcher(&self) -> Rc<dyn Launcher> {
        Rc::clone(&self.launcher)
    }

    /// Run a command with the current options.
    pub fn run(&self, cmd: impl Into<Cmd>) -> Result<String> {
        self.run_with(cmd, &Options::new())
    }

    /// Run a command with additional per-call options.
    ///
    /// Per-call options beat the base options; command-line overrides beat both
    /// unless the merged options hold `allow_overrides: false`. A `workdir`
    /// option changes directory for this call only.
    ///
    /// Returns the captured output. A non-zero exit code becomes a
    /// [`DutyFailure`], an interruption becomes a failure with code 130.
    pub fn run_with(&self, cmd: impl Into<Cmd>, options: &Options) -> Result<String> {
        let cmd = cmd.into();
        let mut final_options = self.options.merged(options);

        let allow_overrides = final_options
            .remove("allow_overrides")
            .map_or(true, |v| v.is_truthy());
        let workdir = final_options.get_path("workdir");
        final_options.remove("workdir");

        if allow_overrides {
            final_options.extend(&self.options_override);
        }

        log::debug!("Running {} with options {:?}", cmd, final_options);

        let result = {
            let _dir = match &workdir {
                Some(dir) => Some(self.cd(dir)?),
                None => None,
            };
            self.launcher.launch(&cmd, &final_options)?
        };

        if result.code != 0 {
            return Err(DutyFailure::new(result.code).into());
        }
        Ok(result.output)
    }

    /// Merge `opts` into the base options until the returned guard is dropped.
    ///
    /// Scopes nest; each restores exactly what it replaced.
    pub fn with_options(&mut self, opts: &Options) -> OptionsGuard<'_> {
        let merged = self.options.merged(opts);
        let previous = std::mem::replace(&mut self.options, merged);
        self.option_stack.push(previous);
        OptionsGuard { ctx: self }
    }

    /// Change the working directory until the returned guard is dropped.
    ///
    /// An empty path leaves the directory untouched.
    pub fn cd(&self, directory: impl AsRef<Path>) -> Result<WorkdirGuard> {
        WorkdirGuard::enter(directory.as_ref())
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::new(Options::new(), Options::new())
    }
}

/// Restores the previous base options on drop.
pub struct OptionsGuard<'a> {
    ctx: &'a mut Context,
}

impl Deref for OptionsGuard<'_> {
    type Target = Context;

    fn deref(&self) -> &Context {
        self.ctx
    }
}

impl DerefMut for OptionsGuard<'_> {
    fn deref_mut(&mut self) -> &mut Context {
        self.ctx
    }
}

impl Drop for OptionsGuard<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.ctx.option_stack.pop() {
            self.ctx.options = previous;
        }
    }
}

/// Restores the previous working directory on drop.
#[must_use = "the directory is restored as soon as the guard is dropped"]
pub struct WorkdirGuard {
    previous: Option<PathBuf>,
}

impl WorkdirGuard {
    fn enter(directory: &Path) -> Result<Self> {
        if directory.as_os_str().is_empty() {
            return Ok(WorkdirGuard { previous: None });
        }
        let previous = env::current_dir()?;
        log::debug!("Entering {}", directory.display());
        env::set_current_dir(directory)?;
        Ok(WorkdirGuard {
            previous: Some(previous),
        })
    }
}

impl Drop for WorkdirGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            if let Err(e) = env::set_current_dir(&previous) {
                log::warn!("Failed to return to {}: {}", previous.display(), e);
            }
        }
    }
}
