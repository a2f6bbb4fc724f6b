//! Expansion of combined single-dash short options.

/// Rewrite `-abc` into `-a -b -c`.
///
/// Only tokens with a single leading dash and more than two characters are
/// split; long options and plain values pass through in order.
pub fn expand_short_options<S: AsRef<str>>(tokens: &[S]) -> Vec<String> {
    let mut expanded = Vec::with_capacity(tokens.len());
    for token in tokens {
        let token = token.as_ref();
        if is_combined(token) {
            expanded.extend(token[1..].chars().map(|c| format!("-{c}")));
        } else {
            expanded.push(token.to_string());
        }
    }
    expanded
}

fn is_combined(token: &str) -> bool {
    token.starts_with('-') && !token.starts_with("--") && token.chars().count() > 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_combined_and_keeps_long() {
        assert_eq!(
            expand_short_options(&["-abc", "--long", "x"]),
            vec!["-a", "-b", "-c", "--long", "x"]
        );
    }

    #[test]
    fn leaves_short_and_double_dash_tokens_alone() {
        let tokens = ["-o", "-", "--", "--verbose", "ab", "-v"];
        assert_eq!(expand_short_options(&tokens), tokens.to_vec());
    }

    #[test]
    fn preserves_order_across_tokens() {
        assert_eq!(
            expand_short_options(&["-ov", "file", "-xy"]),
            vec!["-o", "-v", "file", "-x", "-y"]
        );
    }
}
