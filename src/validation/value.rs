//! Typed argument and option values

use std::fmt;
use std::path::PathBuf;

use crate::error::{ConfigError, ConfigResult};
use crate::validation::Annotation;

/// A value produced by casting a command-line string, or declared in a duties file.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Path(PathBuf),
    List(Vec<Value>),
}

impl Value {
    /// Truthiness used when a value is read as a flag.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Path(p) => !p.as_os_str().is_empty(),
            Value::List(items) => !items.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The annotation matching this value's own type.
    ///
    /// Used for parameters that declare a default but no type.
    pub fn annotation(&self) -> Option<Annotation> {
        match self {
            Value::None => Some(Annotation::NoneType),
            Value::Bool(_) => Some(Annotation::Bool),
            Value::Int(_) => Some(Annotation::Int),
            Value::Float(_) => Some(Annotation::Float),
            Value::Str(_) => Some(Annotation::Str),
            Value::Path(_) => Some(Annotation::Path),
            Value::List(_) => None,
        }
    }

    /// Convert a YAML scalar or sequence into a value.
    pub fn from_yaml(value: &serde_yaml::Value) -> ConfigResult<Self> {
        use serde_yaml::Value as Yaml;

        match value {
            Yaml::Null => Ok(Value::None),
            Yaml::Bool(b) => Ok(Value::Bool(*b)),
            Yaml::Number(n) => match n.as_i64() {
                Some(i) => Ok(Value::Int(i)),
                None => n
                    .as_f64()
                    .map(Value::Float)
                    .ok_or_else(|| ConfigError::Invalid(format!("unsupported number: {}", n))),
            },
            Yaml::String(s) => Ok(Value::Str(s.clone())),
            Yaml::Sequence(seq) => seq
                .iter()
                .map(Value::from_yaml)
                .collect::<ConfigResult<Vec<_>>>()
                .map(Value::List),
            Yaml::Mapping(_) => Err(ConfigError::Invalid(
                "mappings are not supported as values".to_string(),
            )),
            Yaml::Tagged(tagged) => Value::from_yaml(&tagged.value),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => f.write_str(s),
            Value::Path(p) => write!(f, "{}", p.display()),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<PathBuf> for Value {
    fn from(p: PathBuf) -> Self {
        Value::Path(p)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_shell_friendly() {
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::None.to_string(), "");
        assert_eq!(Value::from(vec![1, 2, 3]).to_string(), "1 2 3");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::None.is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("no").is_truthy());
        assert!(Value::Bool(true).is_truthy());
    }

    #[test]
    fn test_from_yaml_scalars() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("[1, 1.5, true, hello, ~]").unwrap();
        let value = Value::from_yaml(&yaml).unwrap();
        assert_eq!(
            value,
            Value::List(vec![
                Value::Int(1),
                Value::Float(1.5),
                Value::Bool(true),
                Value::from("hello"),
                Value::None,
            ])
        );
    }

    #[test]
    fn test_from_yaml_rejects_mappings() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("{a: 1}").unwrap();
        assert!(Value::from_yaml(&yaml).is_err());
    }
}
