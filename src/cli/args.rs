//! Command line arguments of duties
//!
//! A command line is split into one group per duty name. Each group starts
//! with the duty name, followed by its run flags and its parameters.

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};
use thiserror::Error;

use crate::runner::Options;
use crate::validation::Arguments;

/// An argument appeared before any duty name
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Missing duty name before argument '{arg}', or unknown duty name")]
pub struct SplitError {
    pub arg: String,
}

/// Split command line arguments into one group per duty.
///
/// Every group starts with a name found in `names`.
pub fn split_args<S: AsRef<str>>(args: &[S], names: &[String]) -> Result<Vec<Vec<String>>, SplitError> {
    let mut groups: Vec<Vec<String>> = Vec::new();

    for arg in args.iter().map(AsRef::<str>::as_ref) {
        if names.iter().any(|name| name == arg) {
            groups.push(vec![arg.to_string()]);
        } else if let Some(current) = groups.last_mut() {
            current.push(arg.to_string());
        } else {
            return Err(SplitError { arg: arg.to_string() });
        }
    }

    Ok(groups)
}

/// Sort raw parameters into positional and keyword arguments.
///
/// `name=value` is a keyword argument unless it starts with `-`.
/// A leading `--` is dropped.
pub fn parse_args<S: AsRef<str>>(args: &[S]) -> Arguments<String> {
    let mut parsed = Arguments::new();
    let args = match args.first() {
        Some(first) if AsRef::<str>::as_ref(first) == "--" => &args[1..],
        _ => args,
    };

    for arg in args.iter().map(AsRef::<str>::as_ref) {
        match arg.split_once('=') {
            Some((name, value)) if !arg.starts_with('-') => {
                parsed.insert(name.to_string(), value.to_string());
            }
            _ => parsed.push(arg.to_string()),
        }
    }

    parsed
}

/// Separate the run flags of a duty from its parameters.
///
/// Flags are recognized anywhere before `--`. Other words, unknown options
/// included, are parameters, and so are `--` and everything after it.
pub fn split_flags<S: AsRef<str>>(cmd: &Command, args: &[S]) -> (Vec<String>, Vec<String>) {
    let mut flags = Vec::new();
    let mut params = Vec::new();
    let mut words = args.iter().map(AsRef::<str>::as_ref);

    while let Some(word) = words.next() {
        if word == "--" {
            params.push(word.to_string());
            params.extend(words.by_ref().map(String::from));
            break;
        }
        match value_follows(cmd, word) {
            Some(value_follows) => {
                flags.push(word.to_string());
                if value_follows {
                    flags.extend(words.next().map(String::from));
                }
            }
            None => params.push(word.to_string()),
        }
    }

    (flags, params)
}

/// `None` if `word` is not a flag of `cmd`, else whether its value is the next word
fn value_follows(cmd: &Command, word: &str) -> Option<bool> {
    let options = || cmd.get_arguments().filter(|arg| !arg.is_positional());

    if let Some(long) = word.strip_prefix("--") {
        let (name, inline) = match long.split_once('=') {
            Some((name, _)) => (name, true),
            None => (long, false),
        };
        let arg = options().find(|arg| {
            arg.get_long() == Some(name)
                || arg.get_all_aliases().is_some_and(|aliases| aliases.contains(&name))
        })?;
        return Some(takes_value(arg) && !inline);
    }

    let shorts = word.strip_prefix('-')?;
    for (i, c) in shorts.char_indices() {
        let arg = options().find(|arg| arg.get_short() == Some(c))?;
        if takes_value(arg) {
            return Some(i + c.len_utf8() == shorts.len());
        }
    }
    (!shorts.is_empty()).then_some(false)
}

fn takes_value(arg: &Arg) -> bool {
    arg.get_action().takes_values()
}

/// Add the flags controlling how commands are run
pub fn add_run_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("capture")
            .short('c')
            .long("capture")
            .value_name("CAPTURE")
            .value_parser(["both", "stdout", "stderr", "none"])
            .help("Which output to capture. Colors are supported with 'both' only"),
    )
    .arg(
        Arg::new("quiet")
            .short('q')
            .long("quiet")
            .action(ArgAction::SetTrue)
            .overrides_with("no_quiet")
            .help("Don't print the command output, even if it failed"),
    )
    .arg(
        Arg::new("no_quiet")
            .short('Q')
            .long("no-quiet")
            .action(ArgAction::SetTrue)
            .overrides_with("quiet")
            .help("Print the command output when it fails"),
    )
    .arg(
        Arg::new("silent")
            .short('s')
            .long("silent")
            .action(ArgAction::SetTrue)
            .overrides_with("no_silent")
            .help("Don't print anything"),
    )
    .arg(
        Arg::new("no_silent")
            .short('S')
            .long("no-silent")
            .action(ArgAction::SetTrue)
            .overrides_with("silent")
            .help("Print output as usual"),
    )
    .arg(
        Arg::new("zero")
            .short('z')
            .long("zero")
            .visible_alias("nofail")
            .action(ArgAction::SetTrue)
            .overrides_with("no_zero")
            .help("Don't fail. Always return a success (0) exit code"),
    )
    .arg(
        Arg::new("no_zero")
            .short('Z')
            .long("no-zero")
            .visible_alias("strict")
            .action(ArgAction::SetTrue)
            .overrides_with("zero")
            .help("Return the original exit code"),
    )
}

pub(crate) fn given(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

fn switch(matches: &ArgMatches, on: &str, off: &str) -> Option<bool> {
    if given(matches, on) {
        Some(true)
    } else if given(matches, off) {
        Some(false)
    } else {
        None
    }
}

/// Options for the run flags actually given on the command line
pub fn specified_options(matches: &ArgMatches) -> Options {
    let mut options = Options::new();

    if given(matches, "capture") {
        if let Some(capture) = matches.get_one::<String>("capture") {
            options.insert("capture", capture.as_str());
        }
    }
    if let Some(quiet) = switch(matches, "quiet", "no_quiet") {
        options.insert("quiet", quiet);
    }
    if let Some(silent) = switch(matches, "silent", "no_silent") {
        options.insert("silent", silent);
    }
    if let Some(nofail) = switch(matches, "zero", "no_zero") {
        options.insert("nofail", nofail);
    }

    options
}
