//! Declared parameter lists of duty functions
//!
//! A signature never includes the context parameter: every duty function
//! receives the context first, and only the remaining parameters are
//! exposed to the command line.

use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

use crate::validation::{Annotation, Value};

/// How a parameter can be filled.
///
/// Variants are declared in the only order they may appear in a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParamKind {
    PositionalOnly,
    #[serde(alias = "positional-or-keyword")]
    Positional,
    VarPositional,
    KeywordOnly,
    VarKeyword,
}

impl Default for ParamKind {
    fn default() -> Self {
        ParamKind::Positional
    }
}

impl ParamKind {
    /// Can be filled by a positional argument.
    pub fn is_positional(self) -> bool {
        matches!(self, ParamKind::PositionalOnly | ParamKind::Positional)
    }

    /// Can be filled by a keyword argument of the same name.
    pub fn accepts_keyword(self) -> bool {
        matches!(self, ParamKind::Positional | ParamKind::KeywordOnly)
    }

    pub fn is_variadic(self) -> bool {
        matches!(self, ParamKind::VarPositional | ParamKind::VarKeyword)
    }
}

/// A single declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
    pub default: Option<Value>,
    pub annotation: Option<Annotation>,
    /// Help text shown by `duty -h NAME`
    pub usage: Option<String>,
}

impl Param {
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Param {
            name: name.into(),
            kind,
            default: None,
            annotation: None,
            usage: None,
        }
    }

    /// A positional-or-keyword parameter.
    pub fn positional(name: impl Into<String>) -> Self {
        Param::new(name, ParamKind::Positional)
    }

    pub fn positional_only(name: impl Into<String>) -> Self {
        Param::new(name, ParamKind::PositionalOnly)
    }

    pub fn keyword_only(name: impl Into<String>) -> Self {
        Param::new(name, ParamKind::KeywordOnly)
    }

    pub fn var_positional(name: impl Into<String>) -> Self {
        Param::new(name, ParamKind::VarPositional)
    }

    pub fn var_keyword(name: impl Into<String>) -> Self {
        Param::new(name, ParamKind::VarKeyword)
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotation = Some(annotation);
        self
    }

    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none() && !self.kind.is_variadic()
    }

    /// The declared annotation, or the type of the default value.
    pub fn resolved_annotation(&self) -> Option<Annotation> {
        self.annotation
            .clone()
            .or_else(|| self.default.as_ref().and_then(Value::annotation))
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ParamKind::VarPositional => write!(f, "*{}", self.name)?,
            ParamKind::VarKeyword => write!(f, "**{}", self.name)?,
            _ => f.write_str(&self.name)?,
        }
        if let Some(annotation) = &self.annotation {
            write!(f, ": {}", annotation)?;
        }
        if let Some(default) = &self.default {
            match default {
                Value::Str(s) => write!(f, " = {:?}", s)?,
                Value::None => f.write_str(" = None")?,
                other => write!(f, " = {}", other)?,
            }
        }
        Ok(())
    }
}

/// An ordered, validated parameter list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    params: Vec<Param>,
}

impl Signature {
    /// A signature taking no parameters besides the context.
    pub fn empty() -> Self {
        Signature::default()
    }

    /// Build a signature, enforcing the ordering rules of a native parameter list.
    pub fn from_params(params: Vec<Param>) -> Result<Self, String> {
        let mut seen = HashSet::new();
        let mut previous: Option<ParamKind> = None;
        let mut saw_default = false;

        for param in &params {
            if !seen.insert(param.name.as_str()) {
                return Err(format!("duplicate parameter '{}'", param.name));
            }

            if let Some(prev) = previous {
                if param.kind < prev {
                    return Err(format!("parameter '{}' is declared out of order", param.name));
                }
                if param.kind == prev && param.kind.is_variadic() {
                    return Err(format!("only one {:?} parameter is allowed", param.kind));
                }
            }

            if param.kind.is_variadic() && param.default.is_some() {
                return Err(format!(
                    "variadic parameter '{}' cannot have a default",
                    param.name
                ));
            }

            if param.kind.is_positional() {
                if param.default.is_some() {
                    saw_default = true;
                } else if saw_default {
                    return Err(format!(
                        "parameter '{}' without a default follows a parameter with a default",
                        param.name
                    ));
                }
            }

            previous = Some(param.kind);
        }

        Ok(Signature { params })
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn get(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Parameters that can be filled positionally, in order.
    pub fn positional_params(&self) -> impl Iterator<Item = &Param> {
        self.params.iter().filter(|p| p.kind.is_positional())
    }

    /// Index of the variadic positional parameter, if any.
    pub fn var_positional_index(&self) -> Option<usize> {
        self.params
            .iter()
            .position(|p| p.kind == ParamKind::VarPositional)
    }

    pub fn var_positional(&self) -> Option<&Param> {
        self.params
            .iter()
            .find(|p| p.kind == ParamKind::VarPositional)
    }

    pub fn var_keyword(&self) -> Option<&Param> {
        self.params.iter().find(|p| p.kind == ParamKind::VarKeyword)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let has_var_positional = self.var_positional().is_some();
        let mut items = Vec::new();
        let mut star_written = false;

        for (i, param) in self.params.iter().enumerate() {
            if param.kind == ParamKind::KeywordOnly && !has_var_positional && !star_written {
                items.push("*".to_string());
                star_written = true;
            }
            items.push(param.to_string());
            let next_kind = self.params.get(i + 1).map(|p| p.kind);
            if param.kind == ParamKind::PositionalOnly && next_kind != Some(ParamKind::PositionalOnly) {
                items.push("/".to_string());
            }
        }

        write!(f, "({})", items.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_signature() {
        let signature = Signature::from_params(vec![
            Param::positional_only("a"),
            Param::positional("b"),
            Param::var_positional("c"),
            Param::keyword_only("d"),
            Param::keyword_only("e").with_default(0),
            Param::var_keyword("f"),
        ])
        .unwrap();

        assert_eq!(signature.params().len(), 6);
        assert_eq!(signature.var_positional_index(), Some(2));
        assert_eq!(signature.var_keyword().map(|p| p.name.as_str()), Some("f"));
    }

    #[test]
    fn test_out_of_order_kinds() {
        let result = Signature::from_params(vec![
            Param::keyword_only("a"),
            Param::positional("b"),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_required_after_default() {
        let result = Signature::from_params(vec![
            Param::positional("a").with_default(1),
            Param::positional("b"),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_keyword_only_required_after_default_is_fine() {
        let result = Signature::from_params(vec![
            Param::positional("a").with_default(1),
            Param::keyword_only("b"),
        ]);
        assert!(result.is_ok());
    }

    #[test]
    fn test_duplicate_names() {
        let result = Signature::from_params(vec![Param::positional("a"), Param::keyword_only("a")]);
        assert!(result.is_err());
    }

    #[test]
    fn test_two_var_positionals() {
        let result = Signature::from_params(vec![
            Param::var_positional("a"),
            Param::var_positional("b"),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_resolved_annotation_falls_back_to_default_type() {
        let param = Param::positional("a").with_default(0);
        assert_eq!(param.resolved_annotation(), Some(Annotation::Int));

        let param = Param::positional("a").with_annotation(Annotation::Float).with_default(0);
        assert_eq!(param.resolved_annotation(), Some(Annotation::Float));

        assert_eq!(Param::positional("a").resolved_annotation(), None);
    }

    #[test]
    fn test_display() {
        let signature = Signature::from_params(vec![
            Param::positional_only("a").with_annotation(Annotation::Int),
            Param::positional("b"),
            Param::keyword_only("c").with_default("x"),
        ])
        .unwrap();
        assert_eq!(signature.to_string(), "(a: int, /, b, *, c = \"x\")");
    }
}
