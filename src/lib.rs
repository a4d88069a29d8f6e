//! Duty - A simple task runner
//!
//! Duties are functions with a typed signature. Command line arguments are
//! validated against that signature and cast to the declared types before a
//! duty runs its commands through a [`Context`].

// Public modules
pub mod cli;
pub mod config;
pub mod error;
pub mod runner;
pub mod validation;

// Re-export commonly used types
pub use error::{ConfigError, DutyError, DutyFailure, Result};
pub use runner::{Cmd, Collection, Context, Duty, DutyBuilder, DutyRef, Launcher, Options};
pub use validation::{validate, Annotation, Arguments, Param, ParamKind, Signature, Value};

/// Current version of duty
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
