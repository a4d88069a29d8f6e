//! Debug information for bug reports

use std::env;
use std::fmt;

use crate::runner::ProcessLauncher;
use crate::VERSION;

/// Environment variables worth reporting
const VARIABLES: &[&str] = &["DUTY_LOG", "SHELL", "TERM", "NO_COLOR", "CLICOLOR_FORCE"];

#[derive(Debug, Clone)]
pub struct DebugInfo {
    pub version: String,
    pub platform: String,
    pub interpreter: Vec<String>,
    pub variables: Vec<(String, String)>,
}

impl DebugInfo {
    pub fn collect() -> Self {
        let variables = VARIABLES
            .iter()
            .filter_map(|name| env::var(name).ok().map(|value| (name.to_string(), value)))
            .collect();

        DebugInfo {
            version: VERSION.to_string(),
            platform: format!("{}-{}", env::consts::OS, env::consts::ARCH),
            interpreter: ProcessLauncher::new().interpreter().to_vec(),
            variables,
        }
    }
}

impl fmt::Display for DebugInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "- __System__: {}", self.platform)?;
        writeln!(f, "- __Version__: duty v{}", self.version)?;
        writeln!(f, "- __Interpreter__: {}", self.interpreter.join(" "))?;
        writeln!(f)?;
        write!(f, "### Environment variables")?;
        for (name, value) in &self.variables {
            write!(f, "\n\n- `{}`: `{}`", name, value)?;
        }
        Ok(())
    }
}
