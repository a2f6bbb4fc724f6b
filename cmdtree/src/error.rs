//! Typed errors produced by the dispatcher.
//!
//! Everything travels as `anyhow::Error`; these types exist so callers and
//! the exit-code translation can downcast to them.

use std::fmt;

use thiserror::Error;

/// Malformed flag input reported by the flag parser.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Post-parse normalization failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Cannot use two forms of the same flag: {first} {second}")]
    TwoForms { first: String, second: String },
}

/// Invalid declarations discovered before any parsing happens.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("flag declared without a name")]
    EmptyFlagName,
    #[error("flag name {name:?} declared more than once")]
    DuplicateFlag { name: String },
    #[error("default {value:?} for flag {name:?} is not a valid {kind}")]
    InvalidDefault {
        name: String,
        kind: String,
        value: String,
    },
    #[error("command declared without a name")]
    EmptyCommandName,
    #[error("command name {name:?} declared more than once under {parent:?}")]
    DuplicateCommand { parent: String, name: String },
    #[error("command {command:?} refers to unknown action {action:?}")]
    UnknownAction { command: String, action: String },
}

/// An error that asks for a specific process exit status.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ExitError {
    pub message: String,
    pub code: i32,
}

impl ExitError {
    pub fn new(message: impl Into<String>, code: i32) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }
}

/// Two or more errors surfaced from the same dispatch level.
#[derive(Debug)]
pub struct MultiError {
    errors: Vec<anyhow::Error>,
}

impl MultiError {
    pub fn new(errors: Vec<anyhow::Error>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[anyhow::Error] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<anyhow::Error> {
        self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.errors.iter().map(|err| err.to_string()).collect();
        write!(f, "{}", messages.join("\n"))
    }
}

impl std::error::Error for MultiError {}

/// Combine an in-flight result error with a later hook error.
pub fn combine(first: anyhow::Error, second: anyhow::Error) -> anyhow::Error {
    MultiError::new(vec![first, second]).into()
}
