//! Shell completion
//!
//! The bash and zsh scripts call back into `duty --complete SHELL -- WORDS...`,
//! which prints one candidate per line.

use clap::Command;
use clap_complete::Shell;
use thiserror::Error;

use crate::runner::Collection;

pub const BASH_SCRIPT: &str = include_str!("completions/duty.bash");
pub const ZSH_SCRIPT: &str = include_str!("completions/duty.zsh");

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Completions for '{0}' shell are not available")]
pub struct UnsupportedShell(pub Shell);

/// The completion script of a shell
pub fn script(shell: Shell) -> Result<&'static str, UnsupportedShell> {
    match shell {
        Shell::Bash => Ok(BASH_SCRIPT),
        Shell::Zsh => Ok(ZSH_SCRIPT),
        other => Err(UnsupportedShell(other)),
    }
}

/// The shell from `$SHELL`, bash when unknown
pub fn detect_shell() -> Shell {
    Shell::from_env().unwrap_or(Shell::Bash)
}

/// A completion word with an optional description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub word: String,
    pub description: Option<String>,
}

impl Candidate {
    fn new(word: impl Into<String>, description: Option<String>) -> Self {
        Candidate {
            word: word.into(),
            description,
        }
    }
}

/// Visible option strings of a command, sorted
pub fn option_candidates(cmd: &Command) -> Vec<Candidate> {
    let mut options: Vec<Candidate> = cmd
        .get_arguments()
        .filter(|arg| !arg.is_hide_set() && !arg.is_positional())
        .flat_map(|arg| {
            let help = arg.get_help().map(|h| h.to_string());
            let shorts = arg
                .get_short_and_visible_aliases()
                .unwrap_or_default()
                .into_iter()
                .map(|c| format!("-{}", c));
            let longs = arg
                .get_long_and_visible_aliases()
                .unwrap_or_default()
                .into_iter()
                .map(|l| format!("--{}", l));
            shorts
                .chain(longs)
                .map(move |word| Candidate::new(word, help.clone()))
                .collect::<Vec<_>>()
        })
        .collect();
    options.sort_by(|a, b| a.word.cmp(&b.word));
    options
}

/// Duty names and parameters, then the global options
pub fn candidates<S: AsRef<str>>(collection: &Collection, cmd: &Command, words: &[S]) -> Vec<Candidate> {
    let mut all: Vec<Candidate> = collection
        .completion_candidates(words)
        .into_iter()
        .map(|word| {
            let description = collection
                .get(&word)
                .ok()
                .map(|duty| duty.summary().to_string())
                .filter(|summary| !summary.is_empty());
            Candidate::new(word, description)
        })
        .collect();
    all.extend(option_candidates(cmd));
    all
}

/// Render candidates for a shell, one per line
pub fn format_candidates(shell: Shell, candidates: &[Candidate]) -> String {
    candidates
        .iter()
        .map(|candidate| match (shell, &candidate.description) {
            (Shell::Zsh, Some(description)) => {
                format!("{}:{}", candidate.word.replace(':', "\\:"), description)
            }
            (Shell::Zsh, None) => candidate.word.replace(':', "\\:"),
            _ => candidate.word.clone(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
