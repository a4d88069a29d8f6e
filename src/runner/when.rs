//! Skip condition evaluation
//!
//! Conditions in a duty's `skip_if` are evaluated once, when the duties file
//! is loaded. Paths and commands are relative to the duties file directory.

use crate::config::{Condition, SkipIf};
use crate::error::Result;
use crate::runner::{interpolate, ProcessLauncher};
use std::collections::HashMap;
use std::env;
use std::path::Path;

/// Evaluate a `skip_if` value (a list of conditions must all hold)
pub fn evaluate_skip_if(skip_if: &SkipIf, base_dir: &Path, launcher: &ProcessLauncher) -> Result<bool> {
    match skip_if {
        SkipIf::Always(skip) => Ok(*skip),
        SkipIf::One(condition) => evaluate_condition(condition, base_dir, launcher),
        SkipIf::All(conditions) => {
            for condition in conditions {
                if !evaluate_condition(condition, base_dir, launcher)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
    }
}

/// Evaluate a single condition
pub fn evaluate_condition(condition: &Condition, base_dir: &Path, launcher: &ProcessLauncher) -> Result<bool> {
    let vars = HashMap::new();
    let expand = |s: &str| interpolate(s, &vars);

    if let Some(cmp) = &condition.equal {
        return Ok(expand(&cmp.left) == expand(&cmp.right));
    }
    if let Some(cmp) = &condition.not_equal {
        return Ok(expand(&cmp.left) != expand(&cmp.right));
    }
    if let Some(command) = &condition.command {
        return Ok(launcher.check(&expand(command), base_dir)?);
    }
    if let Some(path) = &condition.exists {
        return Ok(base_dir.join(expand(path)).exists());
    }
    if let Some(name) = &condition.env_set {
        return Ok(env::var_os(expand(name)).is_some());
    }
    if let Some(name) = &condition.env_not_set {
        return Ok(env::var_os(expand(name)).is_none());
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Comparison;
    use tempfile::TempDir;

    fn eval(condition: Condition) -> bool {
        let dir = env::temp_dir();
        evaluate_condition(&condition, &dir, &ProcessLauncher::new()).unwrap()
    }

    fn comparison(left: &str, right: &str) -> Option<Comparison> {
        Some(Comparison {
            left: left.to_string(),
            right: right.to_string(),
        })
    }

    #[test]
    fn test_evaluate_equal() {
        assert!(eval(Condition {
            equal: comparison("a", "a"),
            ..Default::default()
        }));
        assert!(!eval(Condition {
            equal: comparison("a", "b"),
            ..Default::default()
        }));
    }

    #[test]
    fn test_evaluate_not_equal_with_environment() {
        env::set_var("TEST_DUTY_WHEN_ENV", "production");
        assert!(!eval(Condition {
            not_equal: comparison("${TEST_DUTY_WHEN_ENV}", "production"),
            ..Default::default()
        }));
        env::remove_var("TEST_DUTY_WHEN_ENV");
    }

    #[test]
    fn test_evaluate_command() {
        assert!(eval(Condition {
            command: Some("true".to_string()),
            ..Default::default()
        }));
        assert!(!eval(Condition {
            command: Some("false".to_string()),
            ..Default::default()
        }));
    }

    #[test]
    fn test_evaluate_exists_relative_to_base_dir() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("test.txt"), "test").unwrap();
        let launcher = ProcessLauncher::new();

        let exists = Condition {
            exists: Some("test.txt".to_string()),
            ..Default::default()
        };
        assert!(evaluate_condition(&exists, temp_dir.path(), &launcher).unwrap());

        let missing = Condition {
            exists: Some("nonexistent.txt".to_string()),
            ..Default::default()
        };
        assert!(!evaluate_condition(&missing, temp_dir.path(), &launcher).unwrap());
    }

    #[test]
    fn test_evaluate_env_set() {
        env::set_var("TEST_DUTY_WHEN_SET", "value");
        assert!(eval(Condition {
            env_set: Some("TEST_DUTY_WHEN_SET".to_string()),
            ..Default::default()
        }));
        env::remove_var("TEST_DUTY_WHEN_SET");

        assert!(eval(Condition {
            env_not_set: Some("TEST_DUTY_WHEN_SET".to_string()),
            ..Default::default()
        }));
    }

    #[test]
    fn test_all_conditions_must_hold() {
        let dir = env::temp_dir();
        let launcher = ProcessLauncher::new();
        let skip_if = SkipIf::All(vec![
            Condition {
                equal: comparison("x", "x"),
                ..Default::default()
            },
            Condition {
                command: Some("false".to_string()),
                ..Default::default()
            },
        ]);
        assert!(!evaluate_skip_if(&skip_if, &dir, &launcher).unwrap());
        assert!(evaluate_skip_if(&SkipIf::Always(true), &dir, &launcher).unwrap());
    }
}
