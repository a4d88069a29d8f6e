//! Duties file types
//!
//! This module defines the data structures that represent a duties.yml file.

use serde::de::Error;
use serde::{Deserialize, Deserializer};
use serde_yaml::Value as Yaml;

use crate::runner::Options;
use crate::validation::{ParamKind, Value};

/// Top-level duties file structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DutiesFile {
    /// Interpreter for shell lines (e.g., ["bash", "-c"])
    #[serde(default)]
    pub interpreter: Option<Vec<String>>,

    /// Options for duties that declare none
    #[serde(default, deserialize_with = "deserialize_options")]
    pub options: Options,

    /// Duties in declaration order
    #[serde(default, deserialize_with = "deserialize_duties")]
    pub duties: Vec<(String, DutyConfig)>,
}

impl DutiesFile {
    pub fn duty(&self, name: &str) -> Option<&DutyConfig> {
        self.duties.iter().find(|(n, _)| n == name).map(|(_, d)| d)
    }
}

/// A duty declaration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DutyConfig {
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub aliases: Vec<String>,

    #[serde(default)]
    pub params: Vec<ParamConfig>,

    /// Options used to build the duty's context; `None` means the file defaults
    #[serde(default, deserialize_with = "deserialize_some_options")]
    pub options: Option<Options>,

    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub pre: Vec<String>,

    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub post: Vec<String>,

    #[serde(default, alias = "skip-if")]
    pub skip_if: Option<SkipIf>,

    #[serde(default, alias = "skip-reason")]
    pub skip_reason: Option<String>,

    #[serde(default, deserialize_with = "deserialize_steps")]
    pub run: Vec<Step>,
}

/// A declared parameter
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamConfig {
    pub name: String,

    /// Type annotation text, e.g. `int` or `Optional[int]`
    #[serde(rename = "type", default)]
    pub param_type: Option<String>,

    #[serde(default)]
    pub kind: ParamKind,

    /// Present even when written as `default: null`
    #[serde(default, deserialize_with = "deserialize_value")]
    pub default: Option<Value>,

    #[serde(default)]
    pub usage: Option<String>,
}

/// When to replace a duty's body by a no-op
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SkipIf {
    Always(bool),
    All(Vec<Condition>),
    One(Condition),
}

impl SkipIf {
    /// Conditions that must all hold, `None` for a literal boolean.
    pub fn conditions(&self) -> Option<&[Condition]> {
        match self {
            SkipIf::Always(_) => None,
            SkipIf::All(conditions) => Some(conditions),
            SkipIf::One(condition) => Some(std::slice::from_ref(condition)),
        }
    }
}

/// A condition evaluated when the duties file is loaded
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Condition {
    /// Check if values are equal
    #[serde(default)]
    pub equal: Option<Comparison>,

    /// Check if values are not equal
    #[serde(rename = "not-equal", default)]
    pub not_equal: Option<Comparison>,

    /// Check if a command succeeds
    #[serde(default)]
    pub command: Option<String>,

    /// Check if a path exists, relative to the duties file
    #[serde(default)]
    pub exists: Option<String>,

    /// Check if environment variable is set
    #[serde(rename = "env-set", default)]
    pub env_set: Option<String>,

    /// Check if environment variable is not set
    #[serde(rename = "env-not-set", default)]
    pub env_not_set: Option<String>,
}

/// A comparison for conditions
#[derive(Debug, Clone, Deserialize)]
pub struct Comparison {
    pub left: String,
    pub right: String,
}

/// One step of a duty body
#[derive(Debug, Clone)]
pub enum Step {
    /// A line run through the interpreter
    Shell(String),
    /// A program and its arguments
    Args(Vec<String>),
    /// One command run with per-call options
    Command { command: CommandLine, options: Options },
    /// Nested steps run with scoped options
    Scoped { options: Options, run: Vec<Step> },
}

/// The command of a `command:` step
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CommandLine {
    Shell(String),
    Args(Vec<String>),
}

impl<'de> Deserialize<'de> for Step {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Yaml::deserialize(deserializer)?;
        step_from_yaml(value).map_err(D::Error::custom)
    }
}

fn step_from_yaml(value: Yaml) -> Result<Step, String> {
    match value {
        Yaml::String(s) => Ok(Step::Shell(s)),
        Yaml::Sequence(seq) => seq
            .into_iter()
            .map(|item| match item {
                Yaml::String(s) => Ok(s),
                Yaml::Number(n) => Ok(n.to_string()),
                Yaml::Bool(b) => Ok(b.to_string()),
                _ => Err("argument vectors may only hold scalars".to_string()),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Step::Args),
        Yaml::Mapping(mut map) => {
            let options = match map.remove("options") {
                Some(Yaml::Mapping(m)) => Options::from_yaml(&m).map_err(|e| e.to_string())?,
                Some(Yaml::Null) | None => Options::new(),
                Some(_) => return Err("step options must be a mapping".to_string()),
            };
            let command = map.remove("command");
            let run = map.remove("run");
            if let Some((key, _)) = map.into_iter().next() {
                return Err(format!("unknown step field: {:?}", key));
            }
            match (command, run) {
                (Some(_), Some(_)) => Err("a step cannot have both 'command' and 'run'".to_string()),
                (Some(command), None) => {
                    let command = CommandLine::deserialize(command).map_err(|e| e.to_string())?;
                    Ok(Step::Command { command, options })
                }
                (None, Some(run)) => Ok(Step::Scoped {
                    options,
                    run: steps_from_yaml(run)?,
                }),
                (None, None) => Err("a step needs either 'command' or 'run'".to_string()),
            }
        }
        _ => Err("a step must be a string, a list or a mapping".to_string()),
    }
}

fn steps_from_yaml(value: Yaml) -> Result<Vec<Step>, String> {
    match value {
        Yaml::Null => Ok(Vec::new()),
        Yaml::Sequence(seq) => seq.into_iter().map(step_from_yaml).collect(),
        single => Ok(vec![step_from_yaml(single)?]),
    }
}

/// Steps: a single step or a list of steps
fn deserialize_steps<'de, D>(deserializer: D) -> Result<Vec<Step>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Yaml::deserialize(deserializer)?;
    steps_from_yaml(value).map_err(D::Error::custom)
}

/// Duties keep the order they are written in
fn deserialize_duties<'de, D>(deserializer: D) -> Result<Vec<(String, DutyConfig)>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Yaml::deserialize(deserializer)?;

    match value {
        Yaml::Mapping(map) => {
            let mut duties = Vec::new();
            for (key, body) in map {
                let name = match key {
                    Yaml::String(s) => s,
                    _ => return Err(D::Error::custom("duty names must be strings")),
                };
                let duty = match body {
                    Yaml::Null => DutyConfig::default(),
                    body => DutyConfig::deserialize(body)
                        .map_err(|e| D::Error::custom(format!("duty '{}': {}", name, e)))?,
                };
                duties.push((name, duty));
            }
            Ok(duties)
        }
        Yaml::Null => Ok(Vec::new()),
        _ => Err(D::Error::custom("duties must be a mapping")),
    }
}

/// A single string or a list of strings
fn deserialize_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Yaml::deserialize(deserializer)?;

    match value {
        Yaml::String(s) => Ok(vec![s]),
        Yaml::Sequence(seq) => seq
            .into_iter()
            .map(|item| match item {
                Yaml::String(s) => Ok(s),
                _ => Err(D::Error::custom("expected a list of strings")),
            })
            .collect(),
        Yaml::Null => Ok(Vec::new()),
        _ => Err(D::Error::custom("expected a string or a list of strings")),
    }
}

fn deserialize_options<'de, D>(deserializer: D) -> Result<Options, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Yaml::deserialize(deserializer)?;

    match value {
        Yaml::Mapping(map) => Options::from_yaml(&map).map_err(D::Error::custom),
        Yaml::Null => Ok(Options::new()),
        _ => Err(D::Error::custom("options must be a mapping")),
    }
}

fn deserialize_some_options<'de, D>(deserializer: D) -> Result<Option<Options>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_options(deserializer).map(Some)
}

fn deserialize_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Yaml::deserialize(deserializer)?;
    Value::from_yaml(&value).map(Some).map_err(D::Error::custom)
}
