//! Variable interpolation for strings
//!
//! Duty bodies written in a duties file refer to their parameters with the
//! `${name}` syntax.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::env;
use std::sync::OnceLock;

fn variable_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("variable pattern is valid"))
}

/// Interpolate variables in a string
///
/// `${var}` is looked up in `vars`, then in the environment. Unknown variables
/// are left as written so the shell can still expand them. Substituted values
/// are not interpolated again.
pub fn interpolate(s: &str, vars: &HashMap<String, String>) -> String {
    variable_pattern()
        .replace_all(s, |caps: &Captures| {
            let name = &caps[1];
            vars.get(name)
                .cloned()
                .or_else(|| env::var(name).ok())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Interpolate a list of strings
pub fn interpolate_list(list: &[String], vars: &HashMap<String, String>) -> Vec<String> {
    list.iter().map(|s| interpolate(s, vars)).collect()
}
