//! Duties declared in a duties file
//!
//! Each declaration becomes a [`Duty`] whose body runs the declared steps
//! through the context, with `${param}` replaced by the bound arguments.

use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use crate::config::{build_signature, CommandLine, DutiesFile, DutyConfig, Step};
use crate::error::Result;
use crate::runner::{
    evaluate_skip_if, interpolate, interpolate_list, Cmd, Context, Duty, DutyBuilder, Launcher, Options,
    ProcessLauncher,
};
use crate::validation::Value;

/// Build every duty of a parsed duties file, in declaration order.
///
/// `path` is the file the duties were read from; skip conditions are
/// evaluated relative to its directory.
pub fn duties_from_file(file: &DutiesFile, path: &Path) -> Result<Vec<Duty>> {
    let base_dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let process = ProcessLauncher::new().with_interpreter(file.interpreter.clone().unwrap_or_default());
    let launcher: Rc<dyn Launcher> = Rc::new(process.clone());

    let mut duties = Vec::with_capacity(file.duties.len());
    for (name, config) in &file.duties {
        let skip = match &config.skip_if {
            Some(skip_if) => evaluate_skip_if(skip_if, base_dir, &process)?,
            None => false,
        };
        let options = config.options.clone().unwrap_or_else(|| file.options.clone());

        let duty = duty_from_config(name, config)?
            .options(options)
            .skip_if(skip, config.skip_reason.clone())
            .launcher(Rc::clone(&launcher))
            .build();
        duties.push(duty);
    }
    Ok(duties)
}

fn duty_from_config(name: &str, config: &DutyConfig) -> Result<DutyBuilder> {
    let signature = build_signature(name, config)?;
    let steps = Rc::new(config.run.clone());
    let function_name = name.to_string();
    let body_signature = signature.clone();

    let builder = Duty::builder(name, move |ctx, args| {
        let bound = body_signature.bind(&function_name, args)?;
        let vars = StepVars {
            plain: bound.to_vars(),
            shell: bound.to_shell_vars(),
        };
        run_steps(ctx, &steps, &vars)
    })
    .description(config.description.clone().unwrap_or_default())
    .signature(signature)
    .aliases(config.aliases.iter().cloned());

    let builder = config.pre.iter().fold(builder, |b, pre| b.pre(pre.as_str()));
    Ok(config.post.iter().fold(builder, |b, post| b.post(post.as_str())))
}

/// Values substituted for `${param}` in steps
#[derive(Debug, Clone, Default)]
pub struct StepVars {
    /// Used in argument vectors and options
    pub plain: HashMap<String, String>,
    /// Quoted, used in shell lines
    pub shell: HashMap<String, String>,
}

/// Run steps in order, stopping at the first failure
pub fn run_steps(ctx: &mut Context, steps: &[Step], vars: &StepVars) -> Result<()> {
    for step in steps {
        match step {
            Step::Shell(line) => {
                ctx.run(interpolate(line, &vars.shell))?;
            }
            Step::Args(args) => {
                ctx.run(interpolate_list(args, &vars.plain))?;
            }
            Step::Command { command, options } => {
                let cmd = match command {
                    CommandLine::Shell(line) => Cmd::Shell(interpolate(line, &vars.shell)),
                    CommandLine::Args(args) => Cmd::Args(interpolate_list(args, &vars.plain)),
                };
                ctx.run_with(cmd, &interpolate_options(options, &vars.plain))?;
            }
            Step::Scoped { options, run } => {
                let mut scoped = ctx.with_options(&interpolate_options(options, &vars.plain));
                run_steps(&mut scoped, run, vars)?;
            }
        }
    }
    Ok(())
}

/// Interpolate string option values, e.g. `workdir: ${dir}`
fn interpolate_options(options: &Options, vars: &HashMap<String, String>) -> Options {
    options
        .iter()
        .map(|(key, value)| match value {
            Value::Str(s) => (key, Value::Str(interpolate(s, vars))),
            other => (key, other.clone()),
        })
        .collect()
}
