//! Applications: the root of a dispatch tree and the sub-applications built
//! for commands that have sub-commands.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::action::{
    Action, CommandNotFoundFn, CompleteFn, ExitErrHandlerFn, HookFn, UsageErrorFn,
};
use crate::command::{Command, find_command};
use crate::complete::{check_completions, take_completion_request};
use crate::context::Context;
use crate::core::categories::CommandCategories;
use crate::exit::{self, Exiter};
use crate::flag::{Flag, FlagSet, append_flag, check_declarations, normalize_flags};
use crate::help::{
    HelpPrinter, PlainHelp, help_command, help_requested, show_app_help, show_command_help_or_log,
    show_subcommand_help, show_version, version_requested,
};
use crate::lifecycle::run_guarded;
use crate::output::Output;
use crate::parser::{ClapFlagParser, FlagParser};

/// A command-line application.
#[derive(Clone)]
pub struct App {
    pub name: String,
    /// Name shown in help; defaults to `name`.
    pub help_name: String,
    pub usage: String,
    pub usage_text: String,
    pub args_usage: String,
    pub description: String,
    pub version: String,
    pub hide_version: bool,
    pub hide_help: bool,
    pub compiled: DateTime<Utc>,
    pub author: String,
    pub email: String,
    /// Free-form values shared with every command.
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub custom_help_template: String,
    pub commands: Vec<Command>,
    pub flags: Vec<Flag>,
    pub categories: CommandCategories,
    pub enable_bash_completion: bool,
    pub bash_complete: Option<CompleteFn>,
    pub before: Option<HookFn>,
    pub after: Option<HookFn>,
    pub action: Option<Action>,
    pub on_usage_error: Option<UsageErrorFn>,
    pub command_not_found: Option<CommandNotFoundFn>,
    pub exit_err_handler: Option<ExitErrHandlerFn>,
    pub writer: Output,
    pub err_writer: Output,
    /// Appended to every command's flags unless it hides help.
    pub help_flag: Option<Flag>,
    pub version_flag: Option<Flag>,
    pub flag_parser: Arc<dyn FlagParser>,
    pub help_printer: Arc<dyn HelpPrinter>,
    pub exiter: Exiter,
}

impl App {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help_name: String::new(),
            usage: "A new cli application".to_string(),
            usage_text: String::new(),
            args_usage: String::new(),
            description: String::new(),
            version: "0.0.0".to_string(),
            hide_version: false,
            hide_help: false,
            compiled: Utc::now(),
            author: String::new(),
            email: String::new(),
            metadata: BTreeMap::new(),
            custom_help_template: String::new(),
            commands: Vec::new(),
            flags: Vec::new(),
            categories: CommandCategories::default(),
            enable_bash_completion: false,
            bash_complete: None,
            before: None,
            after: None,
            action: None,
            on_usage_error: None,
            command_not_found: None,
            exit_err_handler: None,
            writer: Output::stdout(),
            err_writer: Output::stderr(),
            help_flag: Some(Flag::bool("help, h").usage("show help")),
            version_flag: Some(Flag::bool("version, v").usage("print the version")),
            flag_parser: Arc::new(ClapFlagParser),
            help_printer: Arc::new(PlainHelp),
            exiter: exit::process_exiter(),
        }
    }

    #[must_use]
    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    #[must_use]
    pub fn flag(mut self, flag: Flag) -> Self {
        self.flags.push(flag);
        self
    }

    #[must_use]
    pub fn writer(mut self, writer: Output) -> Self {
        self.writer = writer;
        self
    }

    #[must_use]
    pub fn err_writer(mut self, err_writer: Output) -> Self {
        self.err_writer = err_writer;
        self
    }

    #[must_use]
    pub fn exiter<F>(mut self, f: F) -> Self
    where
        F: Fn(i32) + Send + Sync + 'static,
    {
        self.exiter = Arc::new(f);
        self
    }

    #[must_use]
    pub fn flag_parser(mut self, parser: Arc<dyn FlagParser>) -> Self {
        self.flag_parser = parser;
        self
    }

    #[must_use]
    pub fn enable_bash_completion(mut self, on: bool) -> Self {
        self.enable_bash_completion = on;
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
    pub fn on_usage_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context<'_>, anyhow::Error, bool) -> Result<()> + Send + Sync + 'static,
    {
        self.on_usage_error = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn command_not_found<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context<'_>, &str) + Send + Sync + 'static,
    {
        self.command_not_found = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn exit_err_handler<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context<'_>, &anyhow::Error) + Send + Sync + 'static,
    {
        self.exit_err_handler = Some(Arc::new(f));
        self
    }

    pub fn display_help_name(&self) -> &str {
        if self.help_name.is_empty() {
            &self.name
        } else {
            &self.help_name
        }
    }

    /// The command answering to `name`.
    pub fn find(&self, name: &str) -> Option<&Command> {
        find_command(&self.commands, name)
    }

    /// Copy ready for dispatch, with the built-in help command and the help
    /// and version flags added.
    ///
    /// A root application appends the help command and indexes categories;
    /// a sub-application prepends it, keeping the index built by
    /// [`App::sub_app`], and never gets the version flag.
    pub(crate) fn prepared(&self, root: bool) -> App {
        let mut app = self.clone();
        let add_help = !app.hide_help
            && (root || !app.commands.is_empty())
            && app.find(help_command().name.as_str()).is_none();
        if add_help {
            if root {
                app.commands.push(help_command());
            } else {
                app.commands.insert(0, help_command());
            }
            if let Some(flag) = &self.help_flag {
                append_flag(&mut app.flags, flag);
            }
        }
        if root {
            if !app.hide_version {
                if let Some(flag) = &self.version_flag {
                    append_flag(&mut app.flags, flag);
                }
            }
            app.categories = CommandCategories::from_commands(&app.commands);
        }
        app
    }

    /// Parse `tokens` against this application's flags.
    ///
    /// Parse failures still yield a flag set (holding defaults only) so a
    /// context can be built to report them.
    fn parse(&self, tokens: &[String]) -> Result<(FlagSet, Option<anyhow::Error>)> {
        check_declarations(&self.flags)?;
        Ok(match self.flag_parser.parse(&self.name, &self.flags, tokens) {
            Ok(set) => (set, None),
            Err(err) => (FlagSet::new(self.name.as_str(), &self.flags), Some(err.into())),
        })
    }

    /// Dispatch `args`, where `args[0]` is the program name.
    pub fn run<I, S>(&self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args: Vec<String> = args.into_iter().map(Into::into).collect();
        let app = self.prepared(true);
        let shell_complete = take_completion_request(&mut args, app.enable_bash_completion);
        let tokens = args.get(1..).unwrap_or_default();
        debug!(app = %app.name, ?tokens, "running application");

        let (set, parse_error) = app.parse(tokens)?;
        if let Err(err) = normalize_flags(&app.flags, &set) {
            app.writer.line(&err);
            app.writer.blank();
            let ctx = Context::new(&app, set, None);
            show_app_help_or_log(&ctx);
            return Err(err.into());
        }

        let ctx = Context::new(&app, set, None).with_shell_complete(shell_complete);
        if check_completions(&ctx) {
            return Ok(());
        }

        if let Some(err) = parse_error {
            debug!(app = %app.name, error = %err, "usage error");
            if let Some(on_usage_error) = &app.on_usage_error {
                let result = on_usage_error(&ctx, err, false);
                if let Err(err) = &result {
                    app.handle_exit_coder(&ctx, err);
                }
                return result;
            }
            app.writer.line(format_args!("Incorrect Usage. {err}"));
            app.writer.blank();
            show_app_help_or_log(&ctx);
            return Err(err);
        }

        if !app.hide_help && help_requested(&ctx) {
            return show_app_help(&ctx);
        }
        if !app.hide_version && version_requested(&ctx) {
            show_version(&ctx);
            return Ok(());
        }

        run_guarded(&ctx, app.after.as_ref(), || {
            if let Some(before) = &app.before {
                if let Err(err) = before(&ctx) {
                    show_app_help_or_log(&ctx);
                    app.handle_exit_coder(&ctx, &err);
                    return Err(err);
                }
            }
            app.dispatch(&ctx, Action::AppHelp)
        })
    }

    /// Run the command named by the first positional argument, or this
    /// application's action.
    fn dispatch(&self, ctx: &Context<'_>, fallback: Action) -> Result<()> {
        if let Some(command) = ctx.args().first().and_then(|name| self.find(name)) {
            return command.run(ctx);
        }
        let action = self.action.as_ref().unwrap_or(&fallback);
        let result = action.invoke(ctx);
        if let Err(err) = &result {
            self.handle_exit_coder(ctx, err);
        }
        result
    }

    /// Build the application that runs `command`'s sub-commands.
    pub fn sub_app(&self, command: &Command) -> App {
        let name = format!("{} {}", self.name, command.name);
        let mut path = command.ancestors().to_vec();
        path.push(command.name.clone());
        let commands: Vec<Command> = command
            .subcommands
            .iter()
            .map(|child| child.stamped(path.clone()))
            .collect();

        App {
            help_name: if command.help_name.is_empty() {
                name.clone()
            } else {
                command.help_name.clone()
            },
            name,
            usage: command.usage.clone(),
            usage_text: command.usage_text.clone(),
            args_usage: command.args_usage.clone(),
            description: command.description.clone(),
            custom_help_template: command.custom_help_template.clone(),
            categories: CommandCategories::from_commands(&commands),
            commands,
            flags: command.flags.clone(),
            hide_help: command.hide_help,
            bash_complete: command.bash_complete.clone(),
            before: command.before.clone(),
            after: command.after.clone(),
            action: Some(command.action.clone().unwrap_or(Action::Help)),
            on_usage_error: command.on_usage_error.clone(),
            ..self.clone()
        }
    }

    /// Run this sub-application against the arguments left in `parent`,
    /// whose first argument is the command that produced it.
    pub fn run_as_subcommand(&self, parent: &Context<'_>) -> Result<()> {
        let app = self.prepared(false);
        let tokens = parent.args().tail();
        debug!(app = %app.name, ?tokens, "running sub-application");

        let (set, parse_error) = app.parse(tokens)?;
        if let Err(err) = normalize_flags(&app.flags, &set) {
            app.writer.line(&err);
            app.writer.blank();
            let ctx = Context::new(&app, set, Some(parent));
            if app.commands.is_empty() {
                show_command_help_or_log(&ctx, ctx.args().first().unwrap_or_default());
            } else {
                show_subcommand_help_or_log(&ctx);
            }
            return Err(err.into());
        }

        let ctx = Context::new(&app, set, Some(parent));
        if check_completions(&ctx) {
            return Ok(());
        }

        if let Some(err) = parse_error {
            debug!(app = %app.name, error = %err, "usage error");
            if let Some(on_usage_error) = &app.on_usage_error {
                let result = on_usage_error(&ctx, err, true);
                if let Err(err) = &result {
                    app.handle_exit_coder(&ctx, err);
                }
                return result;
            }
            app.writer.line(format_args!("Incorrect Usage. {err}"));
            app.writer.blank();
            show_subcommand_help_or_log(&ctx);
            return Err(err);
        }

        if app.commands.is_empty() {
            if help_requested(parent) {
                show_command_help_or_log(parent, ctx.args().first().unwrap_or_default());
                return Ok(());
            }
        } else if help_requested(&ctx) {
            show_subcommand_help_or_log(&ctx);
            return Ok(());
        }

        run_guarded(&ctx, app.after.as_ref(), || {
            if let Some(before) = &app.before {
                if let Err(err) = before(&ctx) {
                    app.handle_exit_coder(&ctx, &err);
                    return Err(err);
                }
            }
            app.dispatch(&ctx, Action::Help)
        })
    }

    /// Translate `err` into a process exit when it carries an exit status.
    ///
    /// A configured `exit_err_handler` replaces the default translation.
    pub fn handle_exit_coder(&self, ctx: &Context<'_>, err: &anyhow::Error) {
        if let Some(handler) = &self.exit_err_handler {
            handler(ctx, err);
            return;
        }
        self.writer.flush();
        exit::handle_exit_coder(err, &self.err_writer, &self.exiter);
    }
}

fn show_app_help_or_log(ctx: &Context<'_>) {
    if let Err(err) = show_app_help(ctx) {
        debug!(error = %err, "help display failed");
    }
}

fn show_subcommand_help_or_log(ctx: &Context<'_>) {
    if let Err(err) = show_subcommand_help(ctx) {
        debug!(error = %err, "help display failed");
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("commands", &self.commands)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::bail;

    use super::*;
    use crate::error::ExitError;
    use crate::output::Buffer;

    fn quiet(app: App) -> (App, Buffer) {
        let buffer = Buffer::new();
        let app = app
            .writer(buffer.output())
            .err_writer(buffer.output())
            .exiter(|_| {});
        (app, buffer)
    }

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) + Clone + Send + Sync + 'static) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        (log, move |entry: &str| sink.lock().expect("lock").push(entry.to_string()))
    }

    #[test]
    fn prepared_root_adds_help_command_and_flags() {
        let app = App::new("tool").command(Command::new("build"));
        let prepared = app.prepared(true);
        let names: Vec<&str> = prepared.commands.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["build", "help"]);
        let flags: Vec<&str> = prepared.flags.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(flags, vec!["help, h", "version, v"]);
        assert_eq!(prepared.categories.len(), 1);
    }

    #[test]
    fn prepared_respects_existing_help_and_hidden_flags() {
        let mut app = App::new("tool").command(Command::new("help"));
        app.hide_version = true;
        let prepared = app.prepared(true);
        assert_eq!(prepared.commands.len(), 1);
        assert!(prepared.flags.is_empty());

        let sub = App::new("tool sub").command(Command::new("leaf")).prepared(false);
        let names: Vec<&str> = sub.commands.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["help", "leaf"]);
        assert_eq!(sub.flags.len(), 1);
    }

    #[test]
    fn sub_app_inherits_environment_and_substitutes_identity() {
        let (log, record) = recorder();
        let parent = App::new("git")
            .version("2.0")
            .command_not_found(move |_ctx, name| record(name));
        let remote = Command::new("remote")
            .usage("manage remotes")
            .flag(Flag::bool("verbose, V"))
            .subcommand(Command::new("add").category("edit"))
            .subcommand(Command::new("show"));

        let sub = parent.sub_app(&remote);
        assert_eq!(sub.name, "git remote");
        assert_eq!(sub.help_name, "git remote");
        assert_eq!(sub.usage, "manage remotes");
        assert_eq!(sub.version, "2.0");
        assert_eq!(sub.flags.len(), 1);
        assert!(matches!(sub.action, Some(Action::Help)));
        assert_eq!(sub.categories.len(), 2);
        assert!(sub.commands.iter().all(|c| c.ancestors() == ["remote".to_string()]));
        assert_eq!(sub.commands[0].full_name(), "remote add");

        let ctx = Context::new(&sub, FlagSet::default(), None);
        sub.command_not_found.as_ref().expect("inherited")(&ctx, "x");
        assert_eq!(*log.lock().expect("lock"), vec!["x".to_string()]);
    }

    #[test]
    fn sub_app_help_name_prefers_command_setting() {
        let mut command = Command::new("remote").subcommand(Command::new("add"));
        command.help_name = "git-remote".to_string();
        assert_eq!(App::new("git").sub_app(&command).help_name, "git-remote");
    }

    #[test]
    fn run_dispatches_first_positional_to_command() {
        let (log, record) = recorder();
        let (app, _buffer) = quiet(App::new("tool").flag(Flag::bool("debug")).command(
            Command::new("build").flag(Flag::string("target, t")).action(move |ctx| {
                record(&format!(
                    "target={} debug={} args={:?}",
                    ctx.string("target").unwrap_or_default(),
                    ctx.global_bool("debug"),
                    ctx.args().as_slice()
                ));
                Ok(())
            }),
        ));

        app.run(["tool", "--debug", "build", "src", "-t", "x86"])
            .expect("dispatch succeeds");
        assert_eq!(
            *log.lock().expect("lock"),
            vec!["target=x86 debug=true args=[\"src\"]".to_string()]
        );
    }

    #[test]
    fn run_without_command_shows_app_help() {
        let (app, buffer) = quiet(App::new("tool").command(Command::new("build")));
        app.run(["tool"]).expect("help");
        assert!(buffer.contents().contains("COMMANDS:"));
    }

    #[test]
    fn version_flag_prints_version() {
        let (app, buffer) = quiet(App::new("tool").version("9.9"));
        app.run(["tool", "--version"]).expect("version");
        assert_eq!(buffer.contents(), "tool version 9.9\n");
    }

    #[test]
    fn app_usage_error_prints_incorrect_usage() {
        let (app, buffer) = quiet(App::new("tool"));
        let err = app.run(["tool", "--nope"]).expect_err("unknown flag");
        assert!(!err.to_string().is_empty());
        assert!(buffer.contents().starts_with("Incorrect Usage. "));
    }

    #[test]
    fn app_before_failure_skips_action_but_runs_after() {
        let (log, record) = recorder();
        let after_record = record.clone();
        let action_record = record.clone();
        let (app, _buffer) = quiet(
            App::new("tool")
                .before(|_| bail!("not ready"))
                .after(move |_| {
                    after_record("after");
                    Ok(())
                })
                .action(move |_| {
                    action_record("action");
                    Ok(())
                }),
        );
        let err = app.run(["tool"]).expect_err("before fails");
        assert_eq!(err.to_string(), "not ready");
        assert_eq!(*log.lock().expect("lock"), vec!["after".to_string()]);
    }

    #[test]
    fn exit_errors_reach_the_exiter() {
        let codes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&codes);
        let buffer = Buffer::new();
        let app = App::new("tool")
            .writer(buffer.output())
            .err_writer(buffer.output())
            .exiter(move |code| sink.lock().expect("lock").push(code))
            .action(|_| Err(ExitError::new("nope", 42).into()));
        let err = app.run(["tool"]).expect_err("exit error");
        assert_eq!(err.to_string(), "nope");
        assert_eq!(*codes.lock().expect("lock"), vec![42]);
        assert_eq!(buffer.contents(), "nope\n");
    }

    #[test]
    fn custom_exit_handler_replaces_translation() {
        let (log, record) = recorder();
        let (app, buffer) = quiet(
            App::new("tool")
                .exit_err_handler(move |_ctx, err| record(&err.to_string()))
                .action(|_| Err(ExitError::new("nope", 42).into())),
        );
        app.run(["tool"]).expect_err("exit error");
        assert_eq!(*log.lock().expect("lock"), vec!["nope".to_string()]);
        assert_eq!(buffer.contents(), "");
    }

    #[test]
    fn completion_request_lists_commands() {
        let (app, buffer) = quiet(
            App::new("tool")
                .enable_bash_completion(true)
                .command(Command::new("build").alias("b"))
                .command(Command::new("secret").hidden(true)),
        );
        app.run(["tool", "--generate-bash-completion"]).expect("completion");
        assert_eq!(buffer.contents(), "build\nb\nhelp\nh\n");
    }
}
