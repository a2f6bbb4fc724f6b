//! Flag declarations and parsed flag values.
//!
//! Declarations are opaque to the dispatcher: it only appends the synthetic
//! help flag to a local copy of a command's list and hands the result to the
//! configured [`FlagParser`](crate::parser::FlagParser).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::names::split_names;
use crate::error::{ConfigError, NormalizeError};

/// Value shape of a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    #[default]
    Bool,
    String,
    Int,
    StringSlice,
}

impl fmt::Display for FlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::String => "string",
            Self::Int => "int",
            Self::StringSlice => "string slice",
        };
        f.write_str(name)
    }
}

/// A flag declaration.
///
/// `name` holds every accepted name separated by commas, primary first
/// (`"verbose, V"`). Single-character names are short options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flag {
    pub name: String,
    pub usage: String,
    pub kind: FlagKind,
    pub default: Option<String>,
    pub hidden: bool,
}

impl Flag {
    pub fn new(name: impl Into<String>, kind: FlagKind) -> Self {
        Self {
            name: name.into(),
            usage: String::new(),
            kind,
            default: None,
            hidden: false,
        }
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, FlagKind::Bool)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FlagKind::String)
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, FlagKind::Int)
    }

    pub fn string_slice(name: impl Into<String>) -> Self {
        Self::new(name, FlagKind::StringSlice)
    }

    #[must_use]
    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn names(&self) -> Vec<String> {
        split_names(&self.name)
    }

    /// First declared name; the key values are stored under.
    pub fn primary_name(&self) -> String {
        self.names().into_iter().next().unwrap_or_default()
    }

    pub fn takes_value(&self) -> bool {
        self.kind != FlagKind::Bool
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.names().iter().any(|n| n == name)
    }

    fn default_parsed(&self) -> Result<Option<FlagValue>, ConfigError> {
        let Some(raw) = self.default.as_deref() else {
            return Ok(None);
        };
        let invalid = || ConfigError::InvalidDefault {
            name: self.primary_name(),
            kind: self.kind.to_string(),
            value: raw.to_string(),
        };
        let value = match self.kind {
            FlagKind::Bool => FlagValue::Bool(raw.parse().map_err(|_| invalid())?),
            FlagKind::String => FlagValue::String(raw.to_string()),
            FlagKind::Int => FlagValue::Int(raw.parse().map_err(|_| invalid())?),
            FlagKind::StringSlice => FlagValue::StringSlice(split_names(raw)),
        };
        Ok(Some(value))
    }
}

/// Flags without `hidden`, in declaration order.
pub fn visible_flags(flags: &[Flag]) -> Vec<&Flag> {
    flags.iter().filter(|flag| !flag.hidden).collect()
}

/// Append `flag` unless one of its names is already declared.
pub fn append_flag(flags: &mut Vec<Flag>, flag: &Flag) {
    let names = flag.names();
    if flags
        .iter()
        .any(|existing| names.iter().any(|name| existing.has_name(name)))
    {
        return;
    }
    flags.push(flag.clone());
}

/// Reject declarations no parser could honor.
pub fn check_declarations(flags: &[Flag]) -> Result<(), ConfigError> {
    let mut seen = BTreeSet::new();
    for flag in flags {
        let names = flag.names();
        if names.is_empty() {
            return Err(ConfigError::EmptyFlagName);
        }
        for name in names {
            if !seen.insert(name.clone()) {
                return Err(ConfigError::DuplicateFlag { name });
            }
        }
        flag.default_parsed()?;
    }
    Ok(())
}

/// A parsed flag value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    Bool(bool),
    String(String),
    Int(i64),
    StringSlice(Vec<String>),
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::String(value) => f.write_str(value),
            Self::Int(value) => write!(f, "{value}"),
            Self::StringSlice(values) => f.write_str(&values.join(",")),
        }
    }
}

/// Parsed values for one dispatch level plus the positional remainder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagSet {
    name: String,
    values: BTreeMap<String, FlagValue>,
    aliases: BTreeMap<String, String>,
    set: BTreeSet<String>,
    seen: Vec<String>,
    args: Vec<String>,
}

impl FlagSet {
    /// Empty set for `flags`, pre-filled with declared defaults.
    ///
    /// Invalid defaults are skipped; [`check_declarations`] reports them.
    pub fn new(name: impl Into<String>, flags: &[Flag]) -> Self {
        let mut set = Self {
            name: name.into(),
            ..Self::default()
        };
        for flag in flags {
            let primary = flag.primary_name();
            for alias in flag.names() {
                set.aliases.insert(alias, primary.clone());
            }
            if let Ok(Some(value)) = flag.default_parsed() {
                set.values.insert(primary, value);
            }
        }
        set
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store a value given on the command line under its primary name.
    pub fn insert_parsed(&mut self, name: &str, value: FlagValue) {
        let primary = self.primary(name).to_string();
        self.set.insert(primary.clone());
        self.values.insert(primary, value);
    }

    /// Record the name forms the parser saw, in command-line order.
    pub fn record_seen(&mut self, forms: Vec<String>) {
        self.seen = forms;
    }

    pub fn set_args(&mut self, args: Vec<String>) {
        self.args = args;
    }

    fn primary<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map_or(name, String::as_str)
    }

    pub fn value(&self, name: &str) -> Option<&FlagValue> {
        self.values.get(self.primary(name))
    }

    /// True when `name` (or any alias) is declared in this set.
    pub fn declares(&self, name: &str) -> bool {
        self.aliases.contains_key(name)
    }

    pub fn bool(&self, name: &str) -> bool {
        matches!(self.value(name), Some(FlagValue::Bool(true)))
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        match self.value(name) {
            Some(FlagValue::String(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        match self.value(name) {
            Some(FlagValue::Int(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn string_slice(&self, name: &str) -> &[String] {
        match self.value(name) {
            Some(FlagValue::StringSlice(values)) => values.as_slice(),
            _ => &[],
        }
    }

    /// True when the flag was given on the command line.
    pub fn is_set(&self, name: &str) -> bool {
        self.set.contains(self.primary(name))
    }

    /// Number of distinct flags given on the command line.
    pub fn num_flags(&self) -> usize {
        self.set.len()
    }

    /// Primary names of flags given on the command line, sorted.
    pub fn set_names(&self) -> Vec<&str> {
        self.set.iter().map(String::as_str).collect()
    }

    pub fn seen(&self) -> &[String] {
        &self.seen
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// Post-process a parsed set.
///
/// Values are already reachable through every alias; what remains is
/// rejecting invocations that used two names of the same flag.
pub fn normalize_flags(flags: &[Flag], set: &FlagSet) -> Result<(), NormalizeError> {
    for flag in flags {
        let names = flag.names();
        if names.len() < 2 {
            continue;
        }
        let mut first_form: Option<&str> = None;
        for name in &names {
            if !set.seen().iter().any(|seen| seen == name) {
                continue;
            }
            if let Some(first) = first_form {
                return Err(NormalizeError::TwoForms {
                    first: first.to_string(),
                    second: name.clone(),
                });
            }
            first_form = Some(name);
        }
    }
    Ok(())
}
