//! Selection of the token order handed to the flag parser.
//!
//! A leaf command picks exactly one mode from its toggles. The mode decides
//! whether flags are moved ahead of positionals, kept in place, or disabled
//! entirely.

use crate::core::partition::{TERMINATOR, partition};
use crate::core::short_opts::expand_short_options;

/// Argument ordering mode, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Treat every token as positional.
    SkipFlagParsing,
    /// Move the flag region ahead of the positional region.
    Reorder,
    /// Keep positionals first; drop to the flag region alone when a
    /// terminator was seen.
    ShortOptionsInPlace,
    /// Keep positionals first, flags after.
    InPlace,
}

impl ParseMode {
    pub fn select(skip_flag_parsing: bool, skip_arg_reorder: bool, short_options: bool) -> Self {
        if skip_flag_parsing {
            Self::SkipFlagParsing
        } else if !skip_arg_reorder {
            Self::Reorder
        } else if short_options {
            Self::ShortOptionsInPlace
        } else {
            Self::InPlace
        }
    }
}

/// Build the token sequence the flag parser receives.
///
/// With `short_options` the flag region is expanded before being placed.
pub fn parser_input(mode: ParseMode, short_options: bool, tokens: &[String]) -> Vec<String> {
    let (indexes, parts) = match mode {
        ParseMode::SkipFlagParsing => {
            return concat(vec![TERMINATOR.to_string()], tokens.to_vec());
        }
        _ => partition(tokens),
    };
    let flags = if short_options {
        expand_short_options(&parts.flags)
    } else {
        parts.flags
    };
    let positionals = parts.positionals;

    match (mode, indexes.first_flag, indexes.terminator) {
        (ParseMode::Reorder, Some(_), _) => concat(flags, positionals),
        (ParseMode::ShortOptionsInPlace, Some(_), None) => concat(positionals, flags),
        (ParseMode::ShortOptionsInPlace, Some(_), Some(_)) => flags,
        (ParseMode::InPlace, _, _) => concat(positionals, flags),
        _ => tokens.to_vec(),
    }
}

fn concat(mut head: Vec<String>, tail: Vec<String>) -> Vec<String> {
    head.extend(tail);
    head
}
