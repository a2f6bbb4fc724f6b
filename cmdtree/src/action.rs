//! Callable shapes attached to commands and applications.

use std::fmt;
use std::sync::Arc;

use anyhow::Result;

use crate::context::Context;
use crate::help;

/// Hook run around an action (`before`, `after`).
pub type HookFn = Arc<dyn Fn(&Context<'_>) -> Result<()> + Send + Sync>;

/// Hook run when flag parsing fails. The flag is `true` when the failure
/// happened inside a nested sub-command application.
pub type UsageErrorFn = Arc<dyn Fn(&Context<'_>, anyhow::Error, bool) -> Result<()> + Send + Sync>;

/// Emits completion candidates.
pub type CompleteFn = Arc<dyn Fn(&Context<'_>) + Send + Sync>;

/// Called with a name that matched no command when help was requested.
pub type CommandNotFoundFn = Arc<dyn Fn(&Context<'_>, &str) + Send + Sync>;

/// Replaces the default exit-code translation.
pub type ExitErrHandlerFn = Arc<dyn Fn(&Context<'_>, &anyhow::Error) + Send + Sync>;

/// The action of a command or application.
///
/// The shape is fixed when the action is registered, so dispatch never
/// inspects callables at run time.
#[derive(Clone)]
pub enum Action {
    /// Reports failure through its return value.
    Fallible(HookFn),
    /// Older shape without an error channel.
    Infallible(Arc<dyn Fn(&Context<'_>) + Send + Sync>),
    /// Built-in help: the named command's help, or the current level's.
    Help,
    /// Built-in help: the named command's help, or the application's.
    AppHelp,
}

impl Action {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Context<'_>) -> Result<()> + Send + Sync + 'static,
    {
        Self::Fallible(Arc::new(f))
    }

    pub fn infallible<F>(f: F) -> Self
    where
        F: Fn(&Context<'_>) + Send + Sync + 'static,
    {
        Self::Infallible(Arc::new(f))
    }

    /// Invoke the action with `ctx`, whatever its shape.
    pub fn invoke(&self, ctx: &Context<'_>) -> Result<()> {
        match self {
            Self::Fallible(f) => f(ctx),
            Self::Infallible(f) => {
                f(ctx);
                Ok(())
            }
            Self::Help => match ctx.args().first() {
                Some(name) => help::show_command_help(ctx, name),
                None => help::show_subcommand_help(ctx),
            },
            Self::AppHelp => match ctx.args().first() {
                Some(name) => help::show_command_help(ctx, name),
                None => help::show_app_help(ctx),
            },
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fallible(_) => f.write_str("Action::Fallible"),
            Self::Infallible(_) => f.write_str("Action::Infallible"),
            Self::Help => f.write_str("Action::Help"),
            Self::AppHelp => f.write_str("Action::AppHelp"),
        }
    }
}
