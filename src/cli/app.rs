//! Main CLI application

use anyhow::{bail, Context as _};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::cli::args::{add_run_flags, given, parse_args, specified_options, split_args, split_flags};
use crate::cli::completion::{self, detect_shell, format_candidates};
use crate::cli::debug::DebugInfo;
use crate::config::find_duties_file;
use crate::error::DutyError;
use crate::runner::{Collection, Duty, Options};
use crate::validation::{validate, Arguments, Value};
use crate::VERSION;

const USAGE: &str = "duty [GLOBAL_OPTS...] [DUTY [DUTY_OPTS...] [DUTY_PARAMS...]...]";

/// Build the global command line parser
pub fn build_command() -> Command {
    let cmd = Command::new("duty")
        .no_binary_name(true)
        .override_usage(USAGE)
        .about("A simple task runner.")
        .disable_help_flag(true)
        .disable_version_flag(true)
        .next_help_heading("Global options")
        .arg(
            Arg::new("duties_file")
                .short('d')
                .long("duties-file")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("YAML file where the duties are defined"),
        )
        .arg(
            Arg::new("list")
                .short('l')
                .long("list")
                .action(ArgAction::SetTrue)
                .help("List the available duties"),
        )
        .arg(
            Arg::new("help")
                .short('h')
                .long("help")
                .value_name("DUTY")
                .num_args(0..)
                .help("Show this help message and exit. Pass duties names to print their help"),
        )
        .arg(
            Arg::new("version")
                .short('V')
                .long("version")
                .action(ArgAction::SetTrue)
                .help("Show program's version number and exit"),
        )
        .arg(
            Arg::new("debug_info")
                .long("debug-info")
                .action(ArgAction::SetTrue)
                .help("Print debug information"),
        )
        .arg(
            Arg::new("completion")
                .long("completion")
                .value_name("SHELL")
                .num_args(0..=1)
                .value_parser(value_parser!(Shell))
                .hide(true),
        )
        .arg(
            Arg::new("complete")
                .long("complete")
                .value_name("SHELL")
                .num_args(0..=1)
                .value_parser(value_parser!(Shell))
                .hide(true),
        );

    add_run_flags(cmd).arg(
        Arg::new("remainder")
            .num_args(0..)
            .trailing_var_arg(true)
            .allow_hyphen_values(true)
            .hide(true),
    )
}

/// Build the command line parser of one duty
pub fn duty_command(duty: &Duty) -> Command {
    let mut cmd = Command::new(duty.name().to_string())
        .bin_name(format!("duty {}", duty.name()))
        .no_binary_name(true)
        .disable_help_flag(true)
        .disable_version_flag(true)
        .about(duty.description().trim_end().to_string());

    if let Some(details) = duty_details(duty) {
        cmd = cmd.after_help(details);
    }

    add_run_flags(cmd).arg(
        Arg::new("params")
            .value_name("PARAMS")
            .num_args(0..)
            .trailing_var_arg(true)
            .allow_hyphen_values(true),
    )
}

/// Parameters and declared options, aligned
fn duty_details(duty: &Duty) -> Option<String> {
    let mut sections = Vec::new();

    let params: Vec<(String, &str)> = duty
        .signature()
        .params()
        .iter()
        .map(|p| (p.to_string(), p.usage.as_deref().unwrap_or("")))
        .collect();
    if !params.is_empty() {
        let width = params.iter().map(|(p, _)| p.len()).max().unwrap_or(0);
        let lines: Vec<String> = params
            .iter()
            .map(|(p, usage)| format!("  {:width$}  {}", p, usage, width = width).trim_end().to_string())
            .collect();
        sections.push(format!("Parameters:\n{}", lines.join("\n")));
    }

    if !duty.options().is_empty() {
        let lines: Vec<String> = duty
            .options()
            .iter()
            .map(|(key, value)| format!("  {}: {}", key, value))
            .collect();
        sections.push(format!("Default options:\n{}", lines.join("\n")));
    }

    if sections.is_empty() {
        None
    } else {
        Some(sections.join("\n\n"))
    }
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("  {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Print global help with the duty listing, or the help of each named duty
fn print_help(cmd: &mut Command, names: &[String], collection: &Collection) {
    if names.is_empty() {
        println!("{}", cmd.render_help());
        println!("Available duties:");
        println!("{}", indent(&collection.format_help()));
        return;
    }

    for name in names {
        match collection.get(name) {
            Ok(duty) => println!("{}", duty_command(&duty).render_help()),
            Err(_) => println!("> Unknown duty '{}'", name),
        }
    }
}

/// Load the duties file given with `-d`, or the one found from the current directory.
///
/// Without `-d` and without any duties file, the collection is empty.
fn load_collection(path: Option<&PathBuf>) -> anyhow::Result<Collection> {
    let path = match path {
        Some(path) if !path.exists() => bail!("Duties file '{}' does not exist", path.display()),
        Some(path) => path.clone(),
        None => match find_duties_file() {
            Ok(path) => path,
            Err(e) => {
                log::debug!("{}", e);
                return Ok(Collection::default());
            }
        },
    };

    let collection = Collection::new(&path);
    collection
        .load()
        .with_context(|| format!("Failed to load duties from '{}'", path.display()))?;
    Ok(collection)
}

fn values(matches: &ArgMatches, id: &str) -> Vec<String> {
    matches
        .get_many::<String>(id)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

/// Resolve each group, apply its overrides and validate its parameters.
///
/// Nothing runs until every group is valid.
fn parse_commands(
    groups: &[Vec<String>],
    global: &Options,
    collection: &Collection,
) -> anyhow::Result<Vec<(Duty, Arguments<Value>)>> {
    let mut commands = Vec::with_capacity(groups.len());

    for group in groups {
        let Some((name, rest)) = group.split_first() else {
            continue;
        };
        let mut duty = collection.get(name)?;
        let command = duty_command(&duty);
        let (mut argv, params) = split_flags(&command, rest);
        argv.push("--".to_string());
        argv.extend(params);
        let matches = command.try_get_matches_from(argv)?;

        let overrides = global.merged(&specified_options(&matches));
        log::debug!("Options override for {}: {:?}", duty.name(), overrides);
        duty.set_options_override(overrides);

        let raw = parse_args(&values(&matches, "params"));
        let args = validate(duty.function_name(), duty.signature(), &raw)?;
        commands.push((duty, args));
    }

    Ok(commands)
}

/// Run the command line, returning the exit code
pub fn run(args: &[String]) -> anyhow::Result<i32> {
    let mut cmd = build_command();
    let matches = cmd.try_get_matches_from_mut(args)?;

    if matches.get_flag("debug_info") {
        println!("{}", DebugInfo::collect());
        return Ok(0);
    }

    if matches.get_flag("version") {
        println!("duty {}", VERSION);
        return Ok(0);
    }

    if given(&matches, "completion") {
        let shell = matches.get_one::<Shell>("completion").copied().unwrap_or_else(detect_shell);
        print!("{}", completion::script(shell)?);
        return Ok(0);
    }

    let collection = load_collection(matches.get_one::<PathBuf>("duties_file"))?;
    let remainder = values(&matches, "remainder");

    if given(&matches, "complete") {
        let shell = matches.get_one::<Shell>("complete").copied().unwrap_or_else(detect_shell);
        let candidates = completion::candidates(&collection, &cmd, &remainder);
        println!("{}", format_candidates(shell, &candidates));
        return Ok(0);
    }

    if given(&matches, "help") {
        print_help(&mut cmd, &values(&matches, "help"), &collection);
        return Ok(0);
    }

    if matches.get_flag("list") {
        println!("{}", indent(&collection.format_help()));
        return Ok(0);
    }

    let groups = split_args(&remainder, &collection.names())?;
    if groups.is_empty() {
        print_help(&mut cmd, &[], &collection);
        return Ok(1);
    }

    let global = specified_options(&matches);
    let commands = parse_commands(&groups, &global, &collection)?;

    for (duty, args) in commands {
        match duty.run(&args) {
            Ok(()) => {}
            Err(DutyError::Failure(failure)) => return Ok(failure.code),
            Err(e) => return Err(e.into()),
        }
    }

    Ok(0)
}

/// Run the command line and report errors, returning the exit code
pub fn main<I, S>(args: I) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let args: Vec<String> = args.into_iter().map(Into::into).collect();
    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("> {:#}", e);
            1
        }
    }
}
