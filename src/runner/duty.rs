//! Duties
//!
//! A duty is a named function of a [`Context`], with pre and post duties to run
//! around it and options used to build its context.
//!
//! The declaration (name, function, signature, pre/post, options) lives in an
//! immutable [`DutyTemplate`] shared by every registration. A [`Duty`] pairs a
//! template with what belongs to one registration: the collection it was added
//! to, and the options overriding everything it runs.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::{DutyError, Result};
use crate::runner::collection::{Collection, Registry};
use crate::runner::{Cmd, Context, Launcher, Options};
use crate::validation::{Arguments, Signature, Value};

/// Body of a duty: receives the context and already-cast arguments.
pub type DutyFn = Rc<dyn Fn(&mut Context, &Arguments<Value>) -> Result<()>>;

/// A pre/post item taking only the context.
pub type HookFn = Rc<dyn Fn(&mut Context) -> Result<()>>;

/// Something to run before or after a duty.
#[derive(Clone)]
pub enum DutyRef {
    /// Resolved through the owning collection when run
    Name(String),
    Duty(Duty),
    Callable(HookFn),
}

impl DutyRef {
    pub fn callable<F>(f: F) -> Self
    where
        F: Fn(&mut Context) -> Result<()> + 'static,
    {
        DutyRef::Callable(Rc::new(f))
    }
}

impl fmt::Debug for DutyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DutyRef::Name(name) => f.debug_tuple("Name").field(name).finish(),
            DutyRef::Duty(duty) => f.debug_tuple("Duty").field(&duty.name()).finish(),
            DutyRef::Callable(_) => f.write_str("Callable"),
        }
    }
}

impl From<&str> for DutyRef {
    fn from(name: &str) -> Self {
        DutyRef::Name(name.to_string())
    }
}

impl From<String> for DutyRef {
    fn from(name: String) -> Self {
        DutyRef::Name(name)
    }
}

impl From<Duty> for DutyRef {
    fn from(duty: Duty) -> Self {
        DutyRef::Duty(duty)
    }
}

/// The immutable part of a duty declaration.
pub struct DutyTemplate {
    /// Dash-normalized name
    pub name: String,
    /// Name as declared, used in argument error messages
    pub function_name: String,
    pub description: String,
    pub function: DutyFn,
    pub signature: Signature,
    pub aliases: Vec<String>,
    pub pre: Vec<DutyRef>,
    pub post: Vec<DutyRef>,
    pub options: Options,
    /// Set when the body must not run
    pub skip_reason: Option<String>,
    pub launcher: Option<Rc<dyn Launcher>>,
}

/// A registered (or free-standing) duty.
#[derive(Clone)]
pub struct Duty {
    template: Rc<DutyTemplate>,
    options_override: Options,
    collection: Weak<RefCell<Registry>>,
}

impl Duty {
    /// Start declaring a duty.
    pub fn builder<F>(name: impl Into<String>, function: F) -> DutyBuilder
    where
        F: Fn(&mut Context, &Arguments<Value>) -> Result<()> + 'static,
    {
        DutyBuilder::new(name.into(), Rc::new(function))
    }

    pub fn name(&self) -> &str {
        &self.template.name
    }

    pub fn function_name(&self) -> &str {
        &self.template.function_name
    }

    pub fn description(&self) -> &str {
        &self.template.description
    }

    /// First line of the description.
    pub fn summary(&self) -> &str {
        self.template.description.lines().next().unwrap_or("")
    }

    pub fn signature(&self) -> &Signature {
        &self.template.signature
    }

    pub fn aliases(&self) -> &[String] {
        &self.template.aliases
    }

    pub fn pre(&self) -> &[DutyRef] {
        &self.template.pre
    }

    pub fn post(&self) -> &[DutyRef] {
        &self.template.post
    }

    pub fn options(&self) -> &Options {
        &self.template.options
    }

    pub fn skip_reason(&self) -> Option<&str> {
        self.template.skip_reason.as_deref()
    }

    pub fn options_override(&self) -> &Options {
        &self.options_override
    }

    pub fn set_options_override(&mut self, options: Options) {
        self.options_override = options;
    }

    /// The collection this duty was added to, if it still exists.
    pub fn collection(&self) -> Option<Collection> {
        self.collection.upgrade().map(Collection::from_registry)
    }

    pub(crate) fn attach(&self, registry: &Rc<RefCell<Registry>>) -> Duty {
        Duty {
            template: Rc::clone(&self.template),
            options_override: self.options_override.clone(),
            collection: Rc::downgrade(registry),
        }
    }

    /// Whether both duties share the same declaration.
    pub fn same_template(&self, other: &Duty) -> bool {
        Rc::ptr_eq(&self.template, &other.template)
    }

    /// A fresh context built from this duty's options and overrides.
    pub fn context(&self) -> Context {
        let ctx = Context::new(self.template.options.clone(), self.options_override.clone());
        match &self.template.launcher {
            Some(launcher) => ctx.with_launcher(Rc::clone(launcher)),
            None => ctx,
        }
    }

    /// Run pre duties, the body, then post duties, all with `ctx`.
    ///
    /// The first error stops everything and is returned unchanged.
    pub fn call(&self, ctx: &mut Context, args: &Arguments<Value>) -> Result<()> {
        log::debug!("Running duty {}", self.name());
        self.run_duties(ctx, &self.template.pre)?;
        match &self.template.skip_reason {
            Some(reason) => {
                log::debug!("Skipping duty {}: {}", self.name(), reason);
                ctx.run_with(Cmd::callable(|| true), &Options::new().with("title", reason.as_str()))?;
            }
            None => (self.template.function)(ctx, args)?,
        }
        self.run_duties(ctx, &self.template.post)
    }

    /// Run this duty with its own fresh context.
    pub fn run(&self, args: &Arguments<Value>) -> Result<()> {
        let mut ctx = self.context();
        self.call(&mut ctx, args)
    }

    fn run_duties(&self, ctx: &mut Context, duties: &[DutyRef]) -> Result<()> {
        let no_args = Arguments::new();
        for item in duties {
            match item {
                DutyRef::Callable(f) => f(ctx)?,
                DutyRef::Duty(duty) => duty.call(ctx, &no_args)?,
                DutyRef::Name(name) => {
                    let collection = self
                        .collection()
                        .ok_or_else(|| DutyError::NoCollection(name.clone()))?;
                    collection.get(name)?.call(ctx, &no_args)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Duty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Duty")
            .field("name", &self.template.name)
            .field("aliases", &self.template.aliases)
            .field("signature", &self.template.signature.to_string())
            .field("pre", &self.template.pre)
            .field("post", &self.template.post)
            .field("options", &self.template.options)
            .field("options_override", &self.options_override)
            .finish()
    }
}

/// Declares a [`Duty`].
pub struct DutyBuilder {
    name: String,
    description: String,
    function: DutyFn,
    signature: Signature,
    aliases: Vec<String>,
    pre: Vec<DutyRef>,
    post: Vec<DutyRef>,
    options: Options,
    skip: Option<Option<String>>,
    launcher: Option<Rc<dyn Launcher>>,
}

impl DutyBuilder {
    fn new(name: String, function: DutyFn) -> Self {
        DutyBuilder {
            name,
            description: String::new(),
            function,
            signature: Signature::empty(),
            aliases: Vec::new(),
            pre: Vec::new(),
            post: Vec::new(),
            options: Options::new(),
            skip: None,
            launcher: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn signature(mut self, signature: Signature) -> Self {
        self.signature = signature;
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    pub fn pre(mut self, item: impl Into<DutyRef>) -> Self {
        self.pre.push(item.into());
        self
    }

    pub fn post(mut self, item: impl Into<DutyRef>) -> Self {
        self.post.push(item.into());
        self
    }

    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Replace the body by a no-op reporting `reason` when `condition` holds.
    ///
    /// Pre and post duties still run.
    pub fn skip_if(mut self, condition: bool, reason: Option<String>) -> Self {
        self.skip = if condition { Some(reason) } else { None };
        self
    }

    pub fn launcher(mut self, launcher: Rc<dyn Launcher>) -> Self {
        self.launcher = Some(launcher);
        self
    }

    pub fn build(self) -> Duty {
        let name = self.name.replace('_', "-");
        let mut aliases = Vec::new();
        if name != self.name {
            aliases.push(self.name.clone());
        }
        for alias in self.aliases {
            if !aliases.contains(&alias) && alias != name {
                aliases.push(alias);
            }
        }
        let skip_reason = self
            .skip
            .map(|reason| reason.unwrap_or_else(|| format!("{}: skipped", self.name)));

        Duty {
            template: Rc::new(DutyTemplate {
                name,
                function_name: self.name,
                description: self.description,
                function: self.function,
                signature: self.signature,
                aliases,
                pre: self.pre,
                post: self.post,
                options: self.options,
                skip_reason,
                launcher: self.launcher,
            }),
            options_override: Options::new(),
            collection: Weak::new(),
        }
    }
}
