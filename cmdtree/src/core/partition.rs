//! Split a command's raw tokens into a flag region and a positional region.

/// Literal token that ends flag interpretation.
pub const TERMINATOR: &str = "--";

/// Result of scanning a token list for flag markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlagIndexes {
    /// Position of the first token that looks like a flag.
    pub first_flag: Option<usize>,
    /// Position of the first `--` token.
    pub terminator: Option<usize>,
}

impl FlagIndexes {
    /// No flag anywhere; every token is positional.
    pub const NONE: Self = Self {
        first_flag: None,
        terminator: None,
    };

    pub fn has_flags(&self) -> bool {
        self.first_flag.is_some()
    }
}

/// The two regions produced by [`split_args`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Partition {
    pub flags: Vec<String>,
    pub positionals: Vec<String>,
}

fn is_flag_marker(token: &str) -> bool {
    token != "-" && token.starts_with('-')
}

/// Scan `tokens` for the first flag marker and the terminator.
///
/// Tokens at or after `--` are never treated as flags, and a lone `-` is a
/// plain argument. When no flag marker is found the scan reports no flags at
/// all, even if a terminator was seen.
pub fn find_indexes<S: AsRef<str>>(tokens: &[S]) -> FlagIndexes {
    let mut indexes = FlagIndexes::default();
    for (index, token) in tokens.iter().enumerate() {
        let token = token.as_ref();
        if token == TERMINATOR {
            indexes.terminator = Some(index);
            break;
        }
        if indexes.first_flag.is_none() && is_flag_marker(token) {
            indexes.first_flag = Some(index);
        }
    }

    if indexes.first_flag.is_none() {
        return FlagIndexes::NONE;
    }
    indexes
}

/// Split `tokens` at the indexes found by [`find_indexes`].
///
/// KNOWN DEFECT: when a terminator is present, the tokens from the terminator
/// to the end are appended to the positional region twice. Callers relying on
/// this ordering exist, so it stays until the intended semantics are settled.
pub fn split_args<S: AsRef<str>>(tokens: &[S], indexes: FlagIndexes) -> Partition {
    let owned = |slice: &[S]| -> Vec<String> {
        slice.iter().map(|token| token.as_ref().to_string()).collect()
    };

    let Some(first_flag) = indexes.first_flag else {
        return Partition {
            flags: Vec::new(),
            positionals: owned(tokens),
        };
    };

    let mut positionals = owned(&tokens[..first_flag]);
    let flags = match indexes.terminator {
        Some(terminator) => {
            let trailing = owned(&tokens[terminator..]);
            positionals.extend(trailing.iter().cloned());
            for token in trailing {
                positionals.push(token);
            }
            owned(&tokens[first_flag..terminator])
        }
        None => owned(&tokens[first_flag..]),
    };

    Partition { flags, positionals }
}

/// Convenience wrapper running [`find_indexes`] then [`split_args`].
pub fn partition<S: AsRef<str>>(tokens: &[S]) -> (FlagIndexes, Partition) {
    let indexes = find_indexes(tokens);
    (indexes, split_args(tokens, indexes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn indexes_empty_input_has_no_flags() {
        let tokens: Vec<String> = Vec::new();
        assert_eq!(find_indexes(&tokens), FlagIndexes::NONE);
    }

    #[test]
    fn indexes_record_first_flag_only() {
        let indexes = find_indexes(&["a", "-x", "b", "--long"]);
        assert_eq!(indexes.first_flag, Some(1));
        assert_eq!(indexes.terminator, None);
    }

    #[test]
    fn indexes_stop_at_terminator() {
        let indexes = find_indexes(&["-f", "v", "--", "-g"]);
        assert_eq!(indexes.first_flag, Some(0));
        assert_eq!(indexes.terminator, Some(2));
    }

    #[test]
    fn indexes_ignore_lone_dash() {
        assert_eq!(find_indexes(&["-", "a"]), FlagIndexes::NONE);
        assert_eq!(find_indexes(&["-", "-v"]).first_flag, Some(1));
    }

    #[test]
    fn indexes_terminator_without_flags_collapses_to_none() {
        assert_eq!(find_indexes(&["a", "--", "-x"]), FlagIndexes::NONE);
        assert_eq!(find_indexes(&["--", "-x"]), FlagIndexes::NONE);
    }

    #[test]
    fn split_without_flags_is_all_positional() {
        let tokens = ["a", "-", "b"];
        let (indexes, parts) = partition(&tokens);
        assert!(!indexes.has_flags());
        assert!(parts.flags.is_empty());
        assert_eq!(parts.positionals, strings(&tokens));
    }

    #[test]
    fn split_keeps_positionals_before_first_flag() {
        let (_, parts) = partition(&["pos1", "-f", "v", "pos2"]);
        assert_eq!(parts.positionals, strings(&["pos1"]));
        assert_eq!(parts.flags, strings(&["-f", "v", "pos2"]));
    }

    #[test]
    fn split_duplicates_tokens_after_terminator() {
        let (_, parts) = partition(&["-f", "v", "--", "extra"]);
        assert_eq!(parts.flags, strings(&["-f", "v"]));
        assert_eq!(
            parts.positionals,
            strings(&["--", "extra", "--", "extra"])
        );
        let extras = parts.positionals.iter().filter(|t| *t == "extra").count();
        assert_eq!(extras, 2);
    }

    #[test]
    fn flag_region_never_reaches_terminator() {
        let cases: [&[&str]; 4] = [
            &["-a", "--", "-b"],
            &["x", "-a", "y", "--"],
            &["--", "-a"],
            &["-a", "-b", "c", "--", "--", "-d"],
        ];
        for tokens in cases {
            let (indexes, parts) = partition(tokens);
            if let Some(terminator) = tokens.iter().position(|t| *t == TERMINATOR) {
                let first = indexes.first_flag.unwrap_or(terminator);
                assert!(first + parts.flags.len() <= terminator, "{tokens:?}");
            }
        }
    }
}
