//! Argument binding against a signature
//!
//! Binding checks the *shape* of a call (how many positionals, which keywords)
//! and reports mismatches with the same wording a native call would use.

use std::collections::HashMap;
use thiserror::Error;

use crate::validation::{ParamKind, Signature, Value};

/// Positional and keyword arguments of one duty invocation.
///
/// Keywords keep their insertion order; setting a keyword twice keeps the last value.
#[derive(Debug, Clone, PartialEq)]
pub struct Arguments<T = Value> {
    positional: Vec<T>,
    keyword: Vec<(String, T)>,
}

impl<T> Default for Arguments<T> {
    fn default() -> Self {
        Arguments {
            positional: Vec::new(),
            keyword: Vec::new(),
        }
    }
}

impl<T> Arguments<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<T>) -> Self {
        self.push(value.into());
        self
    }

    /// Set a keyword argument.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<T>) -> Self {
        self.insert(name.into(), value.into());
        self
    }

    pub fn push(&mut self, value: T) {
        self.positional.push(value);
    }

    pub fn insert(&mut self, name: String, value: T) {
        match self.keyword.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => *slot = value,
            None => self.keyword.push((name, value)),
        }
    }

    pub fn positional(&self) -> &[T] {
        &self.positional
    }

    pub fn keyword(&self) -> &[(String, T)] {
        &self.keyword
    }

    /// Look up a keyword argument.
    pub fn get(&self, name: &str) -> Option<&T> {
        self.keyword.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }
}

/// Arguments assigned to parameter names, defaults applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArguments {
    values: Vec<(String, Value)>,
}

impl BoundArguments {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Render every bound value as text, for interpolation.
    ///
    /// Extra keywords gathered by a variadic keyword parameter are exposed
    /// under their own names.
    pub fn to_vars(&self) -> HashMap<String, String> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect()
    }

    /// Like [`to_vars`](Self::to_vars), with values quoted for a shell line.
    ///
    /// List items are quoted one by one so they stay separate words.
    pub fn to_shell_vars(&self) -> HashMap<String, String> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), shell_quote(v)))
            .collect()
    }

    fn set(&mut self, name: &str, value: Value) {
        match self.values.iter_mut().find(|(k, _)| k == name) {
            Some((_, slot)) => *slot = value,
            None => self.values.push((name.to_string(), value)),
        }
    }
}

fn shell_quote(value: &Value) -> String {
    match value {
        Value::None => String::new(),
        Value::List(items) => items.iter().map(shell_quote).collect::<Vec<_>>().join(" "),
        other => {
            let text = other.to_string();
            shlex::try_quote(&text)
                .map(|quoted| quoted.into_owned())
                .unwrap_or_else(|_| text.clone())
        }
    }
}

/// A call whose shape does not match the declared parameters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{function}() {kind}")]
pub struct BindingError {
    pub function: String,
    pub kind: BindingErrorKind,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingErrorKind {
    #[error("takes {} positional argument{} but {} {} given", expected_count(.min, .max), plural_of(.max), .given, were(.given))]
    TooManyPositional { min: usize, max: usize, given: usize },

    #[error("got an unexpected keyword argument '{0}'")]
    UnexpectedKeyword(String),

    #[error("got multiple values for argument '{0}'")]
    MultipleValues(String),

    #[error("got some positional-only arguments passed as keyword arguments: {}", quote_comma(.0))]
    PositionalOnlyAsKeyword(Vec<String>),

    #[error("missing {} required positional argument{}: {}", .0.len(), plural(.0.len()), quote_list(.0))]
    MissingPositional(Vec<String>),

    #[error("missing {} required keyword-only argument{}: {}", .0.len(), plural(.0.len()), quote_list(.0))]
    MissingKeywordOnly(Vec<String>),
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

fn plural_of(n: &usize) -> &'static str {
    plural(*n)
}

fn were(n: &usize) -> &'static str {
    if *n == 1 {
        "was"
    } else {
        "were"
    }
}

fn expected_count(min: &usize, max: &usize) -> String {
    if min == max {
        max.to_string()
    } else {
        format!("from {} to {}", min, max)
    }
}

fn quote_comma(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("'{}'", n))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `'a'`, `'a' and 'b'`, `'a', 'b', and 'c'`
fn quote_list(names: &[String]) -> String {
    let quoted: Vec<String> = names.iter().map(|n| format!("'{}'", n)).collect();
    match quoted.as_slice() {
        [] => String::new(),
        [one] => one.clone(),
        [a, b] => format!("{} and {}", a, b),
        [rest @ .., last] => format!("{}, and {}", rest.join(", "), last),
    }
}

impl Signature {
    /// Check that arguments fit this signature, without casting them.
    pub fn check<T>(&self, function: &str, args: &Arguments<T>) -> Result<(), BindingError> {
        self.assign(function, args).map(|_| ())
    }

    /// Bind arguments to parameter names, applying defaults and gathering variadics.
    pub fn bind(&self, function: &str, args: &Arguments<Value>) -> Result<BoundArguments, BindingError> {
        let assignment = self.assign(function, args)?;
        let mut bound = BoundArguments::default();

        for param in self.params() {
            match param.kind {
                ParamKind::VarPositional => {
                    let rest = assignment
                        .extra_positional
                        .iter()
                        .map(|&i| args.positional[i].clone())
                        .collect();
                    bound.set(&param.name, Value::List(rest));
                }
                ParamKind::VarKeyword => {
                    for &i in &assignment.extra_keyword {
                        let (name, value) = &args.keyword[i];
                        if bound.get(name).is_none() {
                            bound.set(name, value.clone());
                        }
                    }
                }
                _ => {
                    let value = match assignment.slots.get(param.name.as_str()) {
                        Some(Slot::Positional(i)) => Some(args.positional[*i].clone()),
                        Some(Slot::Keyword(i)) => Some(args.keyword[*i].1.clone()),
                        None => param.default.clone(),
                    };
                    if let Some(value) = value {
                        bound.set(&param.name, value);
                    }
                }
            }
        }

        Ok(bound)
    }

    /// Simulate native argument binding.
    fn assign<T>(&self, function: &str, args: &Arguments<T>) -> Result<Assignment, BindingError> {
        let error = |kind| BindingError {
            function: function.to_string(),
            kind,
        };

        let positional: Vec<_> = self.positional_params().collect();
        let has_var_positional = self.var_positional().is_some();
        let has_var_keyword = self.var_keyword().is_some();
        let given = args.positional.len();

        if given > positional.len() && !has_var_positional {
            return Err(error(BindingErrorKind::TooManyPositional {
                min: positional.iter().filter(|p| p.default.is_none()).count(),
                max: positional.len(),
                given,
            }));
        }

        let mut assignment = Assignment::default();
        for i in 0..given {
            match positional.get(i) {
                Some(param) => {
                    assignment.slots.insert(param.name.clone(), Slot::Positional(i));
                }
                None => assignment.extra_positional.push(i),
            }
        }

        let mut positional_only_as_keyword = Vec::new();
        for (i, (name, _)) in args.keyword.iter().enumerate() {
            match self.get(name) {
                Some(param) if param.kind.accepts_keyword() => {
                    if assignment.slots.contains_key(name) {
                        return Err(error(BindingErrorKind::MultipleValues(name.clone())));
                    }
                    assignment.slots.insert(name.clone(), Slot::Keyword(i));
                }
                Some(param) if param.kind == ParamKind::PositionalOnly && !has_var_keyword => {
                    positional_only_as_keyword.push(name.clone());
                }
                _ if has_var_keyword => assignment.extra_keyword.push(i),
                _ => return Err(error(BindingErrorKind::UnexpectedKeyword(name.clone()))),
            }
        }
        if !positional_only_as_keyword.is_empty() {
            return Err(error(BindingErrorKind::PositionalOnlyAsKeyword(
                positional_only_as_keyword,
            )));
        }

        let missing = |kind: ParamKind| -> Vec<String> {
            self.params()
                .iter()
                .filter(|p| p.kind == kind || (kind == ParamKind::Positional && p.kind.is_positional()))
                .filter(|p| p.is_required() && !assignment.slots.contains_key(&p.name))
                .map(|p| p.name.clone())
                .collect()
        };

        let missing_positional = missing(ParamKind::Positional);
        if !missing_positional.is_empty() {
            return Err(error(BindingErrorKind::MissingPositional(missing_positional)));
        }

        let missing_keyword_only = missing(ParamKind::KeywordOnly);
        if !missing_keyword_only.is_empty() {
            return Err(error(BindingErrorKind::MissingKeywordOnly(missing_keyword_only)));
        }

        Ok(assignment)
    }
}

/// Where a named parameter got its value from.
enum Slot {
    Positional(usize),
    Keyword(usize),
}

#[derive(Default)]
struct Assignment {
    slots: HashMap<String, Slot>,
    extra_positional: Vec<usize>,
    extra_keyword: Vec<usize>,
}
