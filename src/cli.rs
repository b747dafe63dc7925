//! Command-line arguments as a value source.
//!
//! Compiled only when the `clap` Cargo feature is enabled (on by default).
//! The parser is built from the schema at resolution time: every option gets
//! a long flag named after its dotted path, a short flag from its
//! `short_form`, and its doc as help text.
//!
//! ```text
//! --port 3000 --database.pool_size=20 -d
//! ```
//!
//! Boolean options may be given without a value, meaning `true`.
//!
//! Arguments are split against the schema before clap sees them. Flags the
//! schema does not declare are pulled out with their value (or `true` when
//! none follows), so in lenient mode they reach [`Resolved::unused`] and the
//! known flags around them still parse.
//!
//! [`Resolved::unused`]: crate::Resolved::unused

use std::collections::HashMap;
use std::iter::Peekable;

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{Arg, ArgAction, Command};

use crate::error::LayerfigError;
use crate::namespace::Namespace;
use crate::option::ConfigOption;
use crate::source::{ValueMap, ValueSource};
use crate::value::{Value, ValueKind};

const ORIGIN: &str = "command line";

/// Values from command-line arguments (without the program name).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgvSource {
    args: Vec<String>,
}

impl ArgvSource {
    pub fn new<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// The process arguments, minus the program name.
    pub fn from_env() -> Self {
        Self::new(std::env::args().skip(1))
    }

    /// The clap command for `schema`.
    ///
    /// Fails with [`LayerfigError::SchemaConflict`] when two options claim the
    /// same short form.
    pub fn command(schema: &Namespace) -> Result<Command, LayerfigError> {
        let mut command = Command::new("layerfig")
            .no_binary_name(true)
            .disable_help_flag(true)
            .disable_version_flag(true)
            .args_override_self(true);
        let mut shorts: HashMap<char, String> = HashMap::new();

        for entry in schema.leaves() {
            let mut arg = Arg::new(entry.path.clone())
                .long(entry.path.clone())
                .action(ArgAction::Set)
                .allow_negative_numbers(true);

            if let Some(short) = entry.option.short_form() {
                if let Some(previous) = shorts.insert(short, entry.path.clone()) {
                    return Err(LayerfigError::SchemaConflict {
                        key: entry.path,
                        reason: format!("short form '-{short}' is already used by '{previous}'"),
                    });
                }
                arg = arg.short(short);
            }
            if let Some(doc) = entry.option.doc() {
                arg = arg.help(doc.to_string());
            }
            if is_flag(entry.option) {
                arg = arg.num_args(0..=1).default_missing_value("true");
            } else {
                arg = arg.allow_hyphen_values(true);
            }
            command = command.arg(arg);
        }
        Ok(command)
    }
}

fn is_flag(option: &ConfigOption) -> bool {
    option.converter().and_then(|c| c.kind()) == Some(ValueKind::Bool)
}

/// Arguments sorted by whether the schema declares them.
#[derive(Debug, Default)]
struct SplitArgs {
    /// Tokens for clap, in their original order.
    known: Vec<String>,
    /// Undeclared flags and the value each one carried.
    unknown: ValueMap,
    /// Positional tokens no flag claimed.
    stray: Vec<String>,
}

impl ArgvSource {
    fn split(&self, schema: &Namespace) -> SplitArgs {
        let shorts: HashMap<char, &ConfigOption> = schema
            .leaves()
            .filter_map(|entry| entry.option.short_form().map(|c| (c, entry.option)))
            .collect();

        let mut split = SplitArgs::default();
        let mut args = self.args.iter().peekable();
        while let Some(arg) = args.next() {
            if arg == "--" {
                split.stray.extend(args.by_ref().cloned());
                break;
            }

            if let Some(long) = arg.strip_prefix("--") {
                let (name, inline) = match long.split_once('=') {
                    Some((name, value)) => (name, Some(value)),
                    None => (long, None),
                };
                match schema.option(name) {
                    Some(option) => {
                        split.known.push(arg.clone());
                        if inline.is_none() {
                            take_value(option, &mut args, &mut split.known);
                        }
                    }
                    None => {
                        let value = match inline {
                            Some(value) => value.to_string(),
                            None => unknown_value(&mut args),
                        };
                        split.unknown.insert(name.to_string(), Value::Text(value));
                    }
                }
                continue;
            }

            let cluster = match arg.strip_prefix('-') {
                Some(cluster) if !cluster.is_empty() && cluster.parse::<f64>().is_err() => cluster,
                _ => {
                    split.stray.push(arg.clone());
                    continue;
                }
            };

            // The first character names the option; anything after it is that
            // option's value (`-p80`).
            let mut chars = cluster.chars();
            match chars.next().and_then(|c| shorts.get(&c).copied()) {
                Some(option) => {
                    split.known.push(arg.clone());
                    if chars.as_str().is_empty() {
                        take_value(option, &mut args, &mut split.known);
                    }
                }
                None => {
                    let value = unknown_value(&mut args);
                    split.unknown.insert(cluster.to_string(), Value::Text(value));
                }
            }
        }
        split
    }
}

/// Move the value token that follows a known flag, if it has one. Non-flag
/// options always take the next token, so `--port -1` keeps its negative value.
fn take_value<'a, I>(option: &ConfigOption, args: &mut Peekable<I>, known: &mut Vec<String>)
where
    I: Iterator<Item = &'a String>,
{
    let value = if is_flag(option) {
        args.next_if(|next| !next.starts_with('-'))
    } else {
        args.next()
    };
    if let Some(value) = value {
        known.push(value.clone());
    }
}

fn unknown_value<'a, I>(args: &mut Peekable<I>) -> String
where
    I: Iterator<Item = &'a String>,
{
    args.next_if(|next| !next.starts_with('-'))
        .cloned()
        .unwrap_or_else(|| "true".to_string())
}

fn unknown_argument(err: clap::Error) -> LayerfigError {
    if err.kind() == ErrorKind::UnknownArgument
        && let Some(ContextValue::String(arg)) = err.get(ContextKind::InvalidArg)
    {
        let key = arg.trim_start_matches('-');
        let key = key.split_once('=').map_or(key, |(name, _)| name);
        return LayerfigError::UnknownKeys(vec![LayerfigError::UnknownKey {
            key: key.to_string(),
            origin: ORIGIN.into(),
        }]);
    }
    LayerfigError::CommandLine(err)
}

impl ValueSource for ArgvSource {
    fn origin(&self) -> String {
        ORIGIN.into()
    }

    /// With `ignore_mismatches`, undeclared flags are returned alongside the
    /// declared ones and stray positional arguments are dropped. Otherwise
    /// either one is an error.
    fn get_values(
        &self,
        context: &Namespace,
        ignore_mismatches: bool,
    ) -> Result<ValueMap, LayerfigError> {
        let command = Self::command(context)?;
        let SplitArgs {
            mut known,
            unknown,
            stray,
        } = self.split(context);

        if !ignore_mismatches && !unknown.is_empty() {
            return Err(LayerfigError::UnknownKeys(
                unknown
                    .into_keys()
                    .map(|key| LayerfigError::UnknownKey {
                        key,
                        origin: ORIGIN.into(),
                    })
                    .collect(),
            ));
        }
        if ignore_mismatches {
            if !stray.is_empty() {
                tracing::debug!(args = ?stray, "ignoring positional arguments");
            }
        } else {
            known.extend(stray);
        }

        let matches = command
            .try_get_matches_from(&known)
            .map_err(unknown_argument)?;

        let mut values = unknown;
        for entry in context.leaves() {
            if let Some(raw) = matches.get_one::<String>(&entry.path) {
                values.insert(entry.path, Value::Text(raw.clone()));
            }
        }
        Ok(values)
    }
}
