//! Name handling shared by commands and flags.

use std::cmp::Ordering;

/// Split a declaration like `"verbose, V"` into its individual names.
pub fn split_names(declaration: &str) -> Vec<String> {
    declaration
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Case-insensitive ordering that breaks ties by code point, then length.
///
/// `"a" < "B" < "b" < "ba"`.
pub fn lexicographic_cmp(a: &str, b: &str) -> Ordering {
    for (ca, cb) in a.chars().zip(b.chars()) {
        let (la, lb) = (fold(ca), fold(cb));
        if la != lb {
            return la.cmp(&lb);
        }
        if ca != cb {
            return ca.cmp(&cb);
        }
    }
    a.cmp(b)
}

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Join an ancestor path and a leaf name with single spaces.
pub fn qualified_name(ancestors: &[String], name: &str) -> String {
    if ancestors.is_empty() {
        return name.to_string();
    }
    let mut parts: Vec<&str> = ancestors.iter().map(String::as_str).collect();
    parts.push(name);
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_names_trims_and_drops_empty() {
        assert_eq!(split_names("help, h"), vec!["help", "h"]);
        assert_eq!(split_names(" a ,, b"), vec!["a", "b"]);
        assert!(split_names("").is_empty());
    }

    #[test]
    fn lexicographic_is_case_insensitive_first() {
        let mut names = vec!["b", "ba", "B", "a", "C"];
        names.sort_by(|a, b| lexicographic_cmp(a, b));
        assert_eq!(names, vec!["a", "B", "b", "ba", "C"]);
    }

    #[test]
    fn qualified_name_joins_path() {
        let path = vec!["root".to_string(), "sub".to_string()];
        assert_eq!(qualified_name(&path, "leaf"), "root sub leaf");
        assert_eq!(qualified_name(&[], "leaf"), "leaf");
    }
}
