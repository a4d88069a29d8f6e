//! Best-effort casting of command-line strings
//!
//! Arguments always arrive as strings. Each parameter may declare an
//! [`Annotation`]; casting converts toward it and falls back to the raw
//! string when the conversion is not possible. Casting never fails.

use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;
use std::str::FromStr;
use thiserror::Error;

use crate::error::ConfigError;
use crate::validation::Value;

/// A conversion that could not be applied. Never surfaced to users.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("cannot cast '{value}' to {target}")]
pub struct CastError {
    pub value: String,
    pub target: String,
}

impl CastError {
    pub fn new(value: &str, target: impl Into<String>) -> Self {
        CastError {
            value: value.to_string(),
            target: target.into(),
        }
    }
}

/// A type that can be built from a single string.
///
/// Implement this to declare custom parameter types.
pub trait Parseable: fmt::Debug {
    /// Name shown in help messages.
    fn name(&self) -> &str;

    fn parse(&self, raw: &str) -> Result<Value, CastError>;
}

/// The declared type of a parameter.
#[derive(Debug, Clone)]
pub enum Annotation {
    Str,
    Bool,
    Int,
    Float,
    Path,
    NoneType,
    /// Alternatives tried in declaration order. `Optional[T]` is `T | None`.
    Union(Vec<Annotation>),
    Custom(Rc<dyn Parseable>),
}

impl Annotation {
    pub fn optional(inner: Annotation) -> Self {
        Annotation::Union(vec![inner, Annotation::NoneType])
    }

    pub fn custom(parser: impl Parseable + 'static) -> Self {
        Annotation::Custom(Rc::new(parser))
    }

    /// Parse a raw string into this type.
    pub fn parse(&self, raw: &str) -> Result<Value, CastError> {
        match self {
            Annotation::Str => Ok(Value::Str(raw.to_string())),
            Annotation::Bool => Ok(Value::Bool(to_bool(raw))),
            Annotation::Int => raw
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| CastError::new(raw, "int")),
            Annotation::Float => raw
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| CastError::new(raw, "float")),
            Annotation::Path => Ok(Value::Path(PathBuf::from(raw))),
            Annotation::NoneType => Err(CastError::new(raw, "None")),
            Annotation::Union(alternatives) => alternatives
                .iter()
                .filter(|alt| !matches!(alt, Annotation::NoneType))
                .find_map(|alt| alt.parse(raw).ok())
                .ok_or_else(|| CastError::new(raw, self.to_string())),
            Annotation::Custom(parser) => parser.parse(raw),
        }
    }
}

impl PartialEq for Annotation {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Annotation::Union(a), Annotation::Union(b)) => a == b,
            (Annotation::Custom(a), Annotation::Custom(b)) => Rc::ptr_eq(a, b),
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Annotation::Str => f.write_str("str"),
            Annotation::Bool => f.write_str("bool"),
            Annotation::Int => f.write_str("int"),
            Annotation::Float => f.write_str("float"),
            Annotation::Path => f.write_str("path"),
            Annotation::NoneType => f.write_str("None"),
            Annotation::Union(alternatives) => {
                for (i, alt) in alternatives.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{}", alt)?;
                }
                Ok(())
            }
            Annotation::Custom(parser) => f.write_str(parser.name()),
        }
    }
}

/// Parse annotation text as written in a duties file.
///
/// Accepts `int`, `int | None`, `Optional[int]` and `Union[int, float]`.
impl FromStr for Annotation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        let union_parts = split_top_level(s, '|');
        if union_parts.len() > 1 {
            return union_parts
                .into_iter()
                .map(str::parse)
                .collect::<Result<Vec<_>, _>>()
                .map(Annotation::Union);
        }

        if let Some(inner) = generic_argument(s, "Optional") {
            return Ok(Annotation::optional(inner.parse()?));
        }

        if let Some(inner) = generic_argument(s, "Union") {
            return split_top_level(inner, ',')
                .into_iter()
                .map(str::parse)
                .collect::<Result<Vec<_>, _>>()
                .map(Annotation::Union);
        }

        match s {
            "str" | "string" => Ok(Annotation::Str),
            "bool" | "boolean" => Ok(Annotation::Bool),
            "int" | "integer" => Ok(Annotation::Int),
            "float" => Ok(Annotation::Float),
            "path" | "Path" => Ok(Annotation::Path),
            "None" | "none" | "NoneType" => Ok(Annotation::NoneType),
            _ => Err(ConfigError::UnknownType(s.to_string())),
        }
    }
}

/// `Name[inner]` -> `inner`
fn generic_argument<'a>(s: &'a str, name: &str) -> Option<&'a str> {
    s.strip_prefix(name)?
        .trim_start()
        .strip_prefix('[')?
        .strip_suffix(']')
}

/// Split on `sep`, ignoring separators nested in brackets.
fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            c if c == sep && depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(s[start..].trim());
    parts
}

/// Convert a string to a boolean.
///
/// Case-insensitive. `""`, `"0"`, `"no"`, `"n"`, `"false"` and `"off"` are false,
/// everything else is true.
pub fn to_bool(value: &str) -> bool {
    !matches!(
        value.to_lowercase().as_str(),
        "" | "0" | "no" | "n" | "false" | "off"
    )
}

/// Cast a raw argument using an optional annotation.
///
/// Without an annotation, or when the conversion fails, the raw string is kept.
pub fn cast(value: &str, annotation: Option<&Annotation>) -> Value {
    match annotation {
        None => Value::Str(value.to_string()),
        Some(annotation) => annotation.parse(value).unwrap_or_else(|e| {
            log::trace!("{}, keeping the raw string", e);
            Value::Str(value.to_string())
        }),
    }
}
