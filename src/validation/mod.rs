//! Argument validation
//!
//! Command-line arguments arrive as strings. Before a duty runs, its raw
//! arguments are bound against the duty's [`Signature`] (so shape errors are
//! reported without side effects) and then cast toward each parameter's
//! declared [`Annotation`].

pub mod bind;
pub mod cast;
pub mod signature;
pub mod value;

pub use bind::{Arguments, BindingError, BindingErrorKind, BoundArguments};
pub use cast::{cast, to_bool, Annotation, CastError, Parseable};
pub use signature::{Param, ParamKind, Signature};
pub use value::Value;

use std::collections::HashMap;

/// Casts raw arguments using the annotations of a signature.
#[derive(Debug)]
pub struct ParamsCaster {
    positional: Vec<Option<Annotation>>,
    var_positional: Option<Annotation>,
    keyword: HashMap<String, Option<Annotation>>,
    var_keyword: Option<Annotation>,
}

impl ParamsCaster {
    pub fn new(signature: &Signature) -> Self {
        let positional = signature
            .positional_params()
            .map(Param::resolved_annotation)
            .collect();
        let keyword = signature
            .params()
            .iter()
            .filter(|p| p.kind.accepts_keyword())
            .map(|p| (p.name.clone(), p.resolved_annotation()))
            .collect();

        ParamsCaster {
            positional,
            var_positional: signature.var_positional().and_then(|p| p.annotation.clone()),
            keyword,
            var_keyword: signature.var_keyword().and_then(|p| p.annotation.clone()),
        }
    }

    /// Annotation for the argument at `position`.
    ///
    /// Positions past the named positional parameters belong to the variadic one.
    fn positional_annotation(&self, position: usize) -> Option<&Annotation> {
        match self.positional.get(position) {
            Some(annotation) => annotation.as_ref(),
            None => self.var_positional.as_ref(),
        }
    }

    fn keyword_annotation(&self, name: &str) -> Option<&Annotation> {
        match self.keyword.get(name) {
            Some(annotation) => annotation.as_ref(),
            None => self.var_keyword.as_ref(),
        }
    }

    pub fn cast_positional(&self, position: usize, raw: &str) -> Value {
        cast(raw, self.positional_annotation(position))
    }

    pub fn cast_keyword(&self, name: &str, raw: &str) -> Value {
        cast(raw, self.keyword_annotation(name))
    }

    pub fn cast_all(&self, args: &Arguments<String>) -> Arguments<Value> {
        let mut cast_args = Arguments::new();
        for (position, raw) in args.positional().iter().enumerate() {
            cast_args.push(self.cast_positional(position, raw));
        }
        for (name, raw) in args.keyword() {
            cast_args.insert(name.clone(), self.cast_keyword(name, raw));
        }
        cast_args
    }
}

/// Bind raw arguments to a signature, then cast them.
///
/// Binding errors are reported before any casting happens.
pub fn validate(
    function_name: &str,
    signature: &Signature,
    args: &Arguments<String>,
) -> Result<Arguments<Value>, BindingError> {
    signature.check(function_name, args)?;
    Ok(ParamsCaster::new(signature).cast_all(args))
}
