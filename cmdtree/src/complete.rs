//! Shell-completion requests.
//!
//! A completion request is a trailing `--generate-bash-completion` token on
//! an application with completion enabled. The token is removed before
//! parsing and the flag travels on the context instead.

use tracing::debug;

use crate::command::find_command;
use crate::context::Context;

pub const GENERATE_COMPLETION_FLAG: &str = "--generate-bash-completion";

/// Strip a trailing completion request from `args`.
///
/// Returns whether one was present. Nothing is stripped when completion is
/// disabled.
pub fn take_completion_request(args: &mut Vec<String>, enabled: bool) -> bool {
    if !enabled || args.last().map(String::as_str) != Some(GENERATE_COMPLETION_FLAG) {
        return false;
    }
    args.pop();
    true
}

/// Print the application's completion candidates when completion was
/// requested. Returns true when the request was handled.
///
/// A request whose first argument names a command is left to that command.
pub fn check_completions(ctx: &Context<'_>) -> bool {
    if !ctx.shell_complete() {
        return false;
    }
    if let Some(name) = ctx.args().first() {
        if find_command(&ctx.app().commands, name).is_some() {
            debug!(command = name, "completion deferred to command");
            return false;
        }
    }
    match &ctx.app().bash_complete {
        Some(hook) => hook(ctx),
        None => default_app_complete(ctx),
    }
    true
}

/// Run the completion hook of the command called `name` when completion was
/// requested. Returns true when the request was handled, even if the command
/// has no hook.
pub fn check_command_completions(ctx: &Context<'_>, name: &str) -> bool {
    if !ctx.shell_complete() {
        return false;
    }
    if let Some(hook) = find_command(&ctx.app().commands, name).and_then(|c| c.bash_complete.as_ref()) {
        hook(ctx);
    }
    true
}

/// Every name of every visible command, one per line.
pub fn default_app_complete(ctx: &Context<'_>) {
    let app = ctx.app();
    for command in app.commands.iter().filter(|c| !c.hidden) {
        for name in command.names() {
            app.writer.line(name);
        }
    }
}
