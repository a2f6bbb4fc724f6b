//! Command declarations and the leaf-command dispatcher.

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, trace};

use crate::action::{Action, CompleteFn, HookFn, UsageErrorFn};
use crate::complete::check_command_completions;
use crate::context::Context;
use crate::core::names::qualified_name;
use crate::core::order::{ParseMode, parser_input};
use crate::flag::{Flag, FlagSet, append_flag, check_declarations, normalize_flags, visible_flags};
use crate::help::{help_requested, show_command_help_or_log};
use crate::lifecycle::run_guarded;

/// A named node in the dispatch tree.
#[derive(Clone, Default)]
pub struct Command {
    pub name: String,
    /// Typically one character; prefer `aliases`.
    pub short_name: String,
    pub aliases: Vec<String>,
    pub usage: String,
    pub usage_text: String,
    pub description: String,
    pub args_usage: String,
    pub category: String,
    /// Name shown in help; defaults to the parent's help name plus `name`.
    pub help_name: String,
    pub custom_help_template: String,
    pub bash_complete: Option<CompleteFn>,
    pub before: Option<HookFn>,
    pub after: Option<HookFn>,
    pub action: Option<Action>,
    pub on_usage_error: Option<UsageErrorFn>,
    pub subcommands: Vec<Command>,
    pub flags: Vec<Flag>,
    /// Treat every token as a positional argument.
    pub skip_flag_parsing: bool,
    /// Keep flags where they appear instead of moving them ahead of
    /// positionals.
    pub skip_arg_reorder: bool,
    pub hide_help: bool,
    pub hidden: bool,
    /// Accept `-ov` as `-o -v`.
    pub use_short_option_handling: bool,
    ancestors: Vec<String>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn short_name(mut self, short_name: impl Into<String>) -> Self {
        self.short_name = short_name.into();
        self
    }

    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    #[must_use]
    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn args_usage(mut self, args_usage: impl Into<String>) -> Self {
        self.args_usage = args_usage.into();
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    #[must_use]
    pub fn flag(mut self, flag: Flag) -> Self {
        self.flags.push(flag);
        self
    }

    #[must_use]
    pub fn subcommand(mut self, command: Command) -> Self {
        self.subcommands.push(command);
        self
    }

    #[must_use]
    pub fn before<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.before = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn after<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.after = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn action<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.action = Some(Action::new(f));
        self
    }

    #[must_use]
    pub fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    #[must_use]
    pub fn on_usage_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context<'_>, anyhow::Error, bool) -> Result<()> + Send + Sync + 'static,
    {
        self.on_usage_error = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn bash_complete<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context<'_>) + Send + Sync + 'static,
    {
        self.bash_complete = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn skip_flag_parsing(mut self, on: bool) -> Self {
        self.skip_flag_parsing = on;
        self
    }

    #[must_use]
    pub fn skip_arg_reorder(mut self, on: bool) -> Self {
        self.skip_arg_reorder = on;
        self
    }

    #[must_use]
    pub fn use_short_option_handling(mut self, on: bool) -> Self {
        self.use_short_option_handling = on;
        self
    }

    #[must_use]
    pub fn hide_help(mut self, on: bool) -> Self {
        self.hide_help = on;
        self
    }

    #[must_use]
    pub fn hidden(mut self, on: bool) -> Self {
        self.hidden = on;
        self
    }

    /// Names of ancestor commands, outermost first.
    pub fn ancestors(&self) -> &[String] {
        &self.ancestors
    }

    /// Copy of this command with its ancestor path replaced.
    pub(crate) fn stamped(&self, ancestors: Vec<String>) -> Self {
        Self {
            ancestors,
            ..self.clone()
        }
    }

    /// Space-separated path from the outermost ancestor to this command.
    pub fn full_name(&self) -> String {
        qualified_name(&self.ancestors, &self.name)
    }

    /// Name, short name, then aliases.
    pub fn names(&self) -> Vec<&str> {
        let mut names = vec![self.name.as_str()];
        if !self.short_name.is_empty() {
            names.push(self.short_name.as_str());
        }
        names.extend(self.aliases.iter().map(String::as_str));
        names
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.names().contains(&name)
    }

    pub fn visible_flags(&self) -> Vec<&Flag> {
        visible_flags(&self.flags)
    }

    pub fn parse_mode(&self) -> ParseMode {
        ParseMode::select(
            self.skip_flag_parsing,
            self.skip_arg_reorder,
            self.use_short_option_handling,
        )
    }

    /// Declared flags plus the help flag, built fresh for one dispatch.
    fn dispatch_flags(&self, help_flag: Option<&Flag>) -> Vec<Flag> {
        let mut flags = self.flags.clone();
        if let Some(help) = help_flag.filter(|_| !self.hide_help) {
            append_flag(&mut flags, help);
        }
        flags
    }

    /// Run this command against the arguments left in `parent`.
    ///
    /// `parent.args()` starts with this command's own name; the remainder is
    /// what gets partitioned and parsed.
    pub fn run(&self, parent: &Context<'_>) -> Result<()> {
        let app = parent.app();
        if !self.subcommands.is_empty() {
            debug!(command = %self.full_name(), "delegating to sub-commands");
            return app.sub_app(self).run_as_subcommand(parent);
        }

        let flags = self.dispatch_flags(app.help_flag.as_ref());
        check_declarations(&flags)?;

        let mode = self.parse_mode();
        let tokens = parser_input(mode, self.use_short_option_handling, parent.args().tail());
        debug!(command = %self.full_name(), ?mode, "dispatching command");
        trace!(?tokens, "flag parser input");

        let (set, parse_error) = match app.flag_parser.parse(&self.name, &flags, &tokens) {
            Ok(set) => (set, None),
            Err(err) => (FlagSet::new(self.name.as_str(), &flags), Some(err)),
        };

        if let Err(err) = normalize_flags(&flags, &set) {
            app.writer.line(&err);
            app.writer.blank();
            show_command_help_or_log(parent, &self.name);
            return Err(err.into());
        }

        let ctx = Context::new(app, set, Some(parent)).with_command(self);
        if check_command_completions(&ctx, &self.name) {
            return Ok(());
        }

        if let Some(err) = parse_error {
            debug!(command = %self.name, error = %err, "usage error");
            if let Some(on_usage_error) = &self.on_usage_error {
                let result = on_usage_error(&ctx, err.into(), false);
                if let Err(err) = &result {
                    app.handle_exit_coder(&ctx, err);
                }
                return result;
            }
            app.writer.line(format_args!("Incorrect Usage: {err}"));
            app.writer.blank();
            show_command_help_or_log(&ctx, &self.name);
            return Err(err.into());
        }

        if help_requested(&ctx) {
            show_command_help_or_log(&ctx, &self.name);
            return Ok(());
        }

        run_guarded(&ctx, self.after.as_ref(), || {
            if let Some(before) = &self.before {
                if let Err(err) = before(&ctx) {
                    show_command_help_or_log(&ctx, &self.name);
                    app.handle_exit_coder(&ctx, &err);
                    return Err(err);
                }
            }

            let fallback = Action::Help;
            let action = self.action.as_ref().unwrap_or(&fallback);
            let result = action.invoke(&ctx);
            if let Err(err) = &result {
                app.handle_exit_coder(&ctx, err);
            }
            result
        })
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("ancestors", &self.ancestors)
            .field("subcommands", &self.subcommands)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

/// First command in `commands` answering to `name`.
pub fn find_command<'c>(commands: &'c [Command], name: &str) -> Option<&'c Command> {
    commands.iter().find(|command| command.has_name(name))
}
