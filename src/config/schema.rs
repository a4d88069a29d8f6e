//! Duties file validation
//!
//! Everything that can be checked without running anything is checked when
//! the file is loaded: signatures and type names, alias clashes, pre/post
//! references and cycles between them.

use crate::config::types::{Condition, DutiesFile, DutyConfig, ParamConfig};
use crate::error::{ConfigError, ConfigResult};
use crate::validation::{Annotation, Param, Signature};
use std::collections::{HashMap, HashSet};

/// Validate a complete duties file
pub fn validate_duties(file: &DutiesFile) -> ConfigResult<()> {
    for (name, duty) in &file.duties {
        validate_duty(name, duty)?;
    }

    let names = NameTable::build(file)?;

    for (name, duty) in &file.duties {
        for reference in duty.pre.iter().chain(&duty.post) {
            names.resolve(reference).ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "duty '{}' references unknown duty '{}'",
                    name, reference
                ))
            })?;
        }
    }

    detect_circular_dependencies(file, &names)?;

    Ok(())
}

/// Validate a single duty declaration
pub fn validate_duty(name: &str, duty: &DutyConfig) -> ConfigResult<()> {
    build_signature(name, duty)?;

    if let Some(skip_if) = &duty.skip_if {
        for condition in skip_if.conditions().unwrap_or_default() {
            validate_condition(name, condition)?;
        }
    }

    Ok(())
}

fn validate_condition(name: &str, condition: &Condition) -> ConfigResult<()> {
    let set = [
        condition.equal.is_some(),
        condition.not_equal.is_some(),
        condition.command.is_some(),
        condition.exists.is_some(),
        condition.env_set.is_some(),
        condition.env_not_set.is_some(),
    ]
    .iter()
    .filter(|&&b| b)
    .count();

    if set != 1 {
        return Err(ConfigError::Invalid(format!(
            "skip_if condition of duty '{}' must have exactly one check, found {}",
            name, set
        )));
    }
    Ok(())
}

/// Build a parameter from its declaration
pub fn build_param(duty: &str, config: &ParamConfig) -> ConfigResult<Param> {
    let mut param = Param::new(config.name.clone(), config.kind);

    if let Some(type_text) = &config.param_type {
        let annotation: Annotation = type_text.parse().map_err(|e: ConfigError| {
            ConfigError::InvalidSignature {
                duty: duty.to_string(),
                reason: e.to_string(),
            }
        })?;
        param = param.with_annotation(annotation);
    }
    if let Some(default) = &config.default {
        param = param.with_default(default.clone());
    }
    if let Some(usage) = &config.usage {
        param = param.with_usage(usage.clone());
    }

    Ok(param)
}

/// Build and check the signature of a duty
pub fn build_signature(duty: &str, config: &DutyConfig) -> ConfigResult<Signature> {
    let params = config
        .params
        .iter()
        .map(|p| build_param(duty, p))
        .collect::<ConfigResult<Vec<_>>>()?;

    Signature::from_params(params).map_err(|reason| ConfigError::InvalidSignature {
        duty: duty.to_string(),
        reason,
    })
}

/// Every name and alias a duty can be reached by, mapped to its declared name
pub struct NameTable {
    entries: HashMap<String, String>,
}

impl NameTable {
    pub fn build(file: &DutiesFile) -> ConfigResult<Self> {
        let mut entries: HashMap<String, String> = HashMap::new();

        for (name, duty) in &file.duties {
            let normalized = name.replace('_', "-");
            let keys = std::iter::once(normalized)
                .chain(std::iter::once(name.clone()))
                .chain(duty.aliases.iter().cloned());

            for key in keys {
                match entries.get(&key) {
                    Some(owner) if owner != name => {
                        return Err(ConfigError::DuplicateAlias {
                            alias: key,
                            duty: owner.clone(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        entries.insert(key, name.clone());
                    }
                }
            }
        }

        Ok(NameTable { entries })
    }

    /// The declared name of the duty reached by `name_or_alias`
    pub fn resolve(&self, name_or_alias: &str) -> Option<&str> {
        self.entries.get(name_or_alias).map(String::as_str)
    }
}

/// Detect circular dependencies through pre and post duties
fn detect_circular_dependencies(file: &DutiesFile, names: &NameTable) -> ConfigResult<()> {
    let mut visited = HashSet::new();
    for (name, _) in &file.duties {
        let mut stack = Vec::new();
        check_duty_cycle(file, names, name, &mut visited, &mut stack)?;
    }
    Ok(())
}

/// Recursively check for cycles in duty dependencies
fn check_duty_cycle(
    file: &DutiesFile,
    names: &NameTable,
    duty_name: &str,
    visited: &mut HashSet<String>,
    stack: &mut Vec<String>,
) -> ConfigResult<()> {
    if stack.iter().any(|n| n == duty_name) {
        stack.push(duty_name.to_string());
        return Err(ConfigError::CircularDependency(stack.join(" -> ")));
    }

    if visited.contains(duty_name) {
        return Ok(());
    }

    let duty = file
        .duty(duty_name)
        .ok_or_else(|| ConfigError::DutyNotFound(duty_name.to_string()))?;

    stack.push(duty_name.to_string());

    for reference in duty.pre.iter().chain(&duty.post) {
        let target = names
            .resolve(reference)
            .ok_or_else(|| ConfigError::DutyNotFound(reference.clone()))?;
        check_duty_cycle(file, names, target, visited, stack)?;
    }

    stack.pop();
    visited.insert(duty_name.to_string());

    Ok(())
}
