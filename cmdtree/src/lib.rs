//! Hierarchical command dispatch for command-line applications.
//!
//! An [`App`] owns a tree of [`Command`]s. Dispatch walks the tree one level
//! at a time: each level parses its own flags, builds a [`Context`] linked to
//! its parent, and hands the remaining positional arguments to the next
//! command.
//!
//! - **[`core`]**: Pure token handling (flag/positional partitioning, short
//!   option expansion, parser input ordering) and name utilities.
//! - **[`command`]** / **[`app`]**: The dispatcher and its lifecycle
//!   (before, action, guaranteed after).
//! - **[`parser`]**, **[`help`]**, **[`exit`]**: Replaceable collaborators
//!   for flag parsing, help rendering and process exit.
//! - **[`config`]**: Application trees declared in TOML.

pub mod action;
pub mod app;
pub mod command;
pub mod complete;
pub mod config;
pub mod context;
pub mod core;
pub mod error;
pub mod exit;
pub mod exit_codes;
pub mod flag;
pub mod help;
pub mod lifecycle;
pub mod logging;
pub mod output;
pub mod parser;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use action::Action;
pub use app::App;
pub use command::Command;
pub use context::{Args, Context};
pub use error::{ExitError, MultiError};
pub use flag::{Flag, FlagKind};
