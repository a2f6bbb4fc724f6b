//! Flag parser seam and its clap-backed implementation.
//!
//! The dispatcher decides *which* tokens a parser sees and in what order; the
//! parser only turns them into a [`FlagSet`]. Parsing stops at the first
//! positional token or at `--`, and everything from there on is returned as
//! positional arguments.

use std::collections::BTreeMap;

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use tracing::trace;

use crate::core::partition::TERMINATOR;
use crate::error::ParseError;
use crate::flag::{Flag, FlagKind, FlagSet, FlagValue};

/// Turns an ordered token list into parsed flag values.
pub trait FlagParser: Send + Sync {
    fn parse(&self, name: &str, flags: &[Flag], tokens: &[String]) -> Result<FlagSet, ParseError>;
}

/// [`FlagParser`] built on `clap`.
///
/// Multi-character names become `--long` options, single characters become
/// `-s` short options. clap's own help and version flags are disabled so the
/// dispatcher owns all help output.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClapFlagParser;

const REST_ID: &str = "__cmdtree_rest";

impl FlagParser for ClapFlagParser {
    fn parse(&self, name: &str, flags: &[Flag], tokens: &[String]) -> Result<FlagSet, ParseError> {
        trace!(command = name, ?tokens, "parsing flags");
        let matches = build_command(name, flags)
            .try_get_matches_from(tokens)
            .map_err(|err| ParseError::new(describe(&err)))?;

        let mut set = FlagSet::new(name, flags);
        for flag in flags {
            let id = flag.primary_name();
            if matches.value_source(&id) != Some(ValueSource::CommandLine) {
                continue;
            }
            if let Some(value) = extract(&matches, &id, flag.kind) {
                set.insert_parsed(&id, value);
            }
        }

        let rest: Vec<String> = matches
            .get_many::<String>(REST_ID)
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        let consumed = &tokens[..tokens.len().saturating_sub(rest.len())];
        set.record_seen(seen_forms(flags, consumed));
        set.set_args(rest);
        Ok(set)
    }
}

fn build_command(name: &str, flags: &[Flag]) -> Command {
    Command::new(name.to_string())
        .no_binary_name(true)
        .disable_help_flag(true)
        .disable_version_flag(true)
        .args_override_self(true)
        .args(flags.iter().map(to_arg))
        .arg(
            Arg::new(REST_ID)
                .num_args(0..)
                .action(ArgAction::Append)
                .value_parser(value_parser!(String))
                .trailing_var_arg(true),
        )
}

fn to_arg(flag: &Flag) -> Arg {
    let mut arg = Arg::new(flag.primary_name())
        .help(flag.usage.clone())
        .hide(flag.hidden);
    let (mut has_long, mut has_short) = (false, false);
    for name in flag.names() {
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(short), None) if has_short => arg = arg.short_alias(short),
            (Some(short), None) => {
                arg = arg.short(short);
                has_short = true;
            }
            _ if has_long => arg = arg.alias(name),
            _ => {
                arg = arg.long(name);
                has_long = true;
            }
        }
    }
    match flag.kind {
        FlagKind::Bool => arg.action(ArgAction::SetTrue),
        FlagKind::String => arg
            .action(ArgAction::Set)
            .value_parser(value_parser!(String)),
        FlagKind::Int => arg
            .action(ArgAction::Set)
            .allow_negative_numbers(true)
            .value_parser(value_parser!(i64)),
        FlagKind::StringSlice => arg
            .action(ArgAction::Append)
            .value_parser(value_parser!(String)),
    }
}

fn extract(matches: &ArgMatches, id: &str, kind: FlagKind) -> Option<FlagValue> {
    match kind {
        FlagKind::Bool => Some(FlagValue::Bool(matches.get_flag(id))),
        FlagKind::String => matches.get_one::<String>(id).cloned().map(FlagValue::String),
        FlagKind::Int => matches.get_one::<i64>(id).copied().map(FlagValue::Int),
        FlagKind::StringSlice => matches
            .get_many::<String>(id)
            .map(|values| FlagValue::StringSlice(values.cloned().collect())),
    }
}

/// First line of clap's rendered error without the `error:` prefix.
fn describe(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let first = rendered.lines().next().unwrap_or_default();
    first.trim_start_matches("error:").trim().to_string()
}

/// Names of declared flags as they were spelled in the consumed tokens.
fn seen_forms(flags: &[Flag], tokens: &[String]) -> Vec<String> {
    let mut by_name: BTreeMap<String, &Flag> = BTreeMap::new();
    for flag in flags {
        for name in flag.names() {
            by_name.insert(name, flag);
        }
    }

    let mut seen = Vec::new();
    let mut iter = tokens.iter();
    while let Some(token) = iter.next() {
        if token == TERMINATOR {
            break;
        }
        if let Some(long) = token.strip_prefix("--") {
            let (name, inline) = match long.split_once('=') {
                Some((name, _)) => (name, true),
                None => (long, false),
            };
            if let Some(flag) = by_name.get(name) {
                seen.push(name.to_string());
                if flag.takes_value() && !inline {
                    iter.next();
                }
            }
        } else if let Some(shorts) = token.strip_prefix('-') {
            for (index, short) in shorts.char_indices() {
                let name = short.to_string();
                let Some(flag) = by_name.get(&name) else {
                    break;
                };
                seen.push(name);
                if flag.takes_value() {
                    if index + short.len_utf8() == shorts.len() {
                        iter.next();
                    }
                    break;
                }
            }
        }
    }
    seen
}
