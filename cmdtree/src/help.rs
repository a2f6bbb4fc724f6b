//! Help rendering and the built-in help command.

use anyhow::Result;
use tracing::debug;

use crate::action::Action;
use crate::app::App;
use crate::command::{Command, find_command};
use crate::context::Context;
use crate::error::ExitError;
use crate::exit_codes;
use crate::flag::{Flag, visible_flags};
use crate::output::Output;

/// Renders help and version text.
pub trait HelpPrinter: Send + Sync {
    fn app_help(&self, out: &Output, app: &App);
    fn command_help(&self, out: &Output, app: &App, command: &Command);
    fn version(&self, out: &Output, app: &App);
}

/// Plain-text sections in the classic `NAME:` / `USAGE:` layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainHelp;

const INDENT: &str = "   ";

impl HelpPrinter for PlainHelp {
    fn app_help(&self, out: &Output, app: &App) {
        if !app.custom_help_template.is_empty() {
            out.line(&app.custom_help_template);
            return;
        }
        let help_name = app.display_help_name();
        let mut lines = Vec::new();

        section(&mut lines, "NAME", vec![title_line(help_name, &app.usage)]);
        let usage = if app.usage_text.is_empty() {
            let mut usage = help_name.to_string();
            if !app.flags.is_empty() {
                usage.push_str(" [global options]");
            }
            if !app.commands.is_empty() {
                usage.push_str(" command [command options]");
            }
            let args = if app.args_usage.is_empty() {
                "[arguments...]"
            } else {
                app.args_usage.as_str()
            };
            format!("{usage} {args}")
        } else {
            app.usage_text.clone()
        };
        section(&mut lines, "USAGE", vec![usage]);
        if !app.hide_version && !app.version.is_empty() {
            section(&mut lines, "VERSION", vec![app.version.clone()]);
        }
        if !app.description.is_empty() {
            section(&mut lines, "DESCRIPTION", vec![app.description.clone()]);
        }
        if !app.author.is_empty() {
            let author = if app.email.is_empty() {
                app.author.clone()
            } else {
                format!("{} <{}>", app.author, app.email)
            };
            section(&mut lines, "AUTHOR", vec![author]);
        }

        let mut commands = Vec::new();
        for category in app.categories.iter() {
            let visible = category.visible_commands();
            if visible.is_empty() {
                continue;
            }
            if !category.name.is_empty() {
                commands.push(format!("{}:", category.name));
            }
            commands.extend(visible.into_iter().map(command_line));
        }
        if !commands.is_empty() {
            section(&mut lines, "COMMANDS", commands);
        }

        let flags = flag_lines(&app.flags);
        if !flags.is_empty() {
            section(&mut lines, "GLOBAL OPTIONS", flags);
        }
        emit(out, &lines);
    }

    fn command_help(&self, out: &Output, app: &App, command: &Command) {
        if !command.custom_help_template.is_empty() {
            out.line(&command.custom_help_template);
            return;
        }
        let help_name = command_help_name(app, command);
        let mut lines = Vec::new();

        section(&mut lines, "NAME", vec![title_line(&help_name, &command.usage)]);
        let usage = if command.usage_text.is_empty() {
            let mut usage = help_name.clone();
            if !command.flags.is_empty() {
                usage.push_str(" [command options]");
            }
            if command.args_usage.is_empty() {
                usage.push_str(" [arguments...]");
            } else {
                usage.push(' ');
                usage.push_str(&command.args_usage);
            }
            usage
        } else {
            command.usage_text.clone()
        };
        section(&mut lines, "USAGE", vec![usage]);
        if !command.category.is_empty() {
            section(&mut lines, "CATEGORY", vec![command.category.clone()]);
        }
        if !command.description.is_empty() {
            section(&mut lines, "DESCRIPTION", vec![command.description.clone()]);
        }
        let flags = flag_lines(&command.flags);
        if !flags.is_empty() {
            section(&mut lines, "OPTIONS", flags);
        }
        emit(out, &lines);
    }

    fn version(&self, out: &Output, app: &App) {
        out.line(format_args!("{} version {}", app.name, app.version));
    }
}

fn title_line(name: &str, usage: &str) -> String {
    if usage.is_empty() {
        name.to_string()
    } else {
        format!("{name} - {usage}")
    }
}

fn section(lines: &mut Vec<String>, title: &str, body: Vec<String>) {
    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!("{title}:"));
    lines.extend(body.into_iter().map(|line| format!("{INDENT}{line}")));
}

fn emit(out: &Output, lines: &[String]) {
    for line in lines {
        out.line(line);
    }
}

fn command_line(command: &Command) -> String {
    let names = command.names().join(", ");
    if command.usage.is_empty() {
        names
    } else {
        format!("{names}\t{}", command.usage)
    }
}

fn flag_lines(flags: &[Flag]) -> Vec<String> {
    visible_flags(flags).into_iter().map(flag_line).collect()
}

/// `--name, -n value\tusage (default: x)`
pub fn flag_line(flag: &Flag) -> String {
    let mut line = flag
        .names()
        .iter()
        .map(|name| {
            if name.chars().count() == 1 {
                format!("-{name}")
            } else {
                format!("--{name}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ");
    if flag.takes_value() {
        line.push_str(" value");
    }
    if !flag.usage.is_empty() {
        line.push('\t');
        line.push_str(&flag.usage);
    }
    if let Some(default) = flag.default.as_deref().filter(|d| !d.is_empty()) {
        line.push_str(&format!(" (default: {default})"));
    }
    line
}

/// Name a command is shown under: its own `help_name`, else the
/// application's help name followed by the command name.
pub fn command_help_name(app: &App, command: &Command) -> String {
    if command.help_name.is_empty() {
        format!("{} {}", app.display_help_name(), command.name)
    } else {
        command.help_name.clone()
    }
}

/// The `help` command added to applications that do not define one.
pub fn help_command() -> Command {
    Command::new("help")
        .alias("h")
        .usage("Shows a list of commands or help for one command")
        .args_usage("[command]")
        .with_action(Action::AppHelp)
}

pub fn show_app_help(ctx: &Context<'_>) -> Result<()> {
    let app = ctx.app();
    app.help_printer.app_help(&app.writer, app);
    Ok(())
}

/// Help for the command `ctx` runs, or for its application when there is
/// none.
pub fn show_subcommand_help(ctx: &Context<'_>) -> Result<()> {
    match ctx.command() {
        Some(command) => show_command_help(ctx, &command.name),
        None => show_app_help(ctx),
    }
}

/// Help for the command called `name` in the context's application.
///
/// An empty name shows the application's help. An unknown name goes to the
/// `command_not_found` hook when one is installed and otherwise fails with
/// an exit error.
pub fn show_command_help(ctx: &Context<'_>, name: &str) -> Result<()> {
    let app = ctx.app();
    if name.is_empty() {
        return show_app_help(ctx);
    }
    if let Some(command) = find_command(&app.commands, name) {
        app.help_printer.command_help(&app.writer, app, command);
        return Ok(());
    }
    debug!(name, "no help topic");
    match &app.command_not_found {
        Some(hook) => {
            hook(ctx, name);
            Ok(())
        }
        None => Err(ExitError::new(
            format!("No help topic for '{name}'"),
            exit_codes::NO_HELP_TOPIC,
        )
        .into()),
    }
}

/// Like [`show_command_help`] for paths where a help failure must not mask
/// the error being reported.
pub fn show_command_help_or_log(ctx: &Context<'_>, name: &str) {
    if let Err(err) = show_command_help(ctx, name) {
        debug!(name, error = %err, "help display failed");
    }
}

pub fn show_version(ctx: &Context<'_>) {
    let app = ctx.app();
    app.help_printer.version(&app.writer, app);
}

/// True when any name of the application's help flag was given.
pub fn help_requested(ctx: &Context<'_>) -> bool {
    flag_requested(ctx, ctx.app().help_flag.as_ref())
}

pub fn version_requested(ctx: &Context<'_>) -> bool {
    flag_requested(ctx, ctx.app().version_flag.as_ref())
}

fn flag_requested(ctx: &Context<'_>, flag: Option<&Flag>) -> bool {
    flag.is_some_and(|flag| flag.names().iter().any(|name| ctx.bool(name)))
}
