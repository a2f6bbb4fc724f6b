//! Application trees declared in a TOML manifest.
//!
//! A manifest names its actions instead of holding code; an
//! [`ActionRegistry`] supplies the callables when the manifest is built into
//! an [`App`].

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};

use crate::action::{Action, HookFn};
use crate::app::App;
use crate::command::Command;
use crate::context::Context;
use crate::error::{ConfigError, ExitError};
use crate::exit_codes;
use crate::flag::{Flag, FlagKind, check_declarations};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppManifest {
    pub name: String,
    pub usage: String,
    pub usage_text: String,
    pub args_usage: String,
    pub description: String,
    pub version: String,
    pub author: String,
    pub email: String,
    pub hide_help: bool,
    pub hide_version: bool,
    pub enable_bash_completion: bool,
    /// Action run when no command matches. Defaults to help.
    pub action: Option<String>,
    pub before: Option<String>,
    pub after: Option<String>,
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub flags: Vec<FlagManifest>,
    pub commands: Vec<CommandManifest>,
}

impl Default for AppManifest {
    fn default() -> Self {
        Self {
            name: "app".to_string(),
            usage: String::new(),
            usage_text: String::new(),
            args_usage: String::new(),
            description: String::new(),
            version: "0.0.0".to_string(),
            author: String::new(),
            email: String::new(),
            hide_help: false,
            hide_version: false,
            enable_bash_completion: false,
            action: None,
            before: None,
            after: None,
            metadata: BTreeMap::new(),
            flags: Vec::new(),
            commands: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CommandManifest {
    pub name: String,
    pub short_name: String,
    pub aliases: Vec<String>,
    pub usage: String,
    pub usage_text: String,
    pub description: String,
    pub args_usage: String,
    pub category: String,
    pub help_name: String,
    pub action: Option<String>,
    pub before: Option<String>,
    pub after: Option<String>,
    pub skip_flag_parsing: bool,
    pub skip_arg_reorder: bool,
    pub use_short_option_handling: bool,
    pub hide_help: bool,
    pub hidden: bool,
    pub flags: Vec<FlagManifest>,
    pub commands: Vec<CommandManifest>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FlagManifest {
    /// Comma-separated names, primary first.
    pub name: String,
    pub kind: FlagKind,
    pub usage: String,
    pub default: Option<String>,
    pub hidden: bool,
}

impl FlagManifest {
    pub fn to_flag(&self) -> Flag {
        Flag {
            name: self.name.clone(),
            usage: self.usage.clone(),
            kind: self.kind,
            default: self.default.clone(),
            hidden: self.hidden,
        }
    }
}

fn to_flags(flags: &[FlagManifest]) -> Vec<Flag> {
    flags.iter().map(FlagManifest::to_flag).collect()
}

impl AppManifest {
    /// Check names and flag declarations across the whole tree.
    pub fn validate(&self) -> Result<()> {
        check_declarations(&to_flags(&self.flags))
            .with_context(|| format!("flags of {}", self.name))?;
        validate_siblings(&self.name, &self.commands)
    }

    /// Every action name referenced anywhere in the tree.
    pub fn action_names(&self) -> BTreeSet<&str> {
        let mut names: BTreeSet<&str> = [&self.action, &self.before, &self.after]
            .into_iter()
            .filter_map(|name| name.as_deref())
            .collect();
        for command in &self.commands {
            command.collect_action_names(&mut names);
        }
        names
    }

    /// Build the application, resolving action names through `registry`.
    pub fn build(&self, registry: &ActionRegistry) -> Result<App> {
        self.validate()?;
        let mut app = App::new(self.name.clone());
        app.usage = self.usage.clone();
        app.usage_text = self.usage_text.clone();
        app.args_usage = self.args_usage.clone();
        app.description = self.description.clone();
        app.version = self.version.clone();
        app.author = self.author.clone();
        app.email = self.email.clone();
        app.hide_help = self.hide_help;
        app.hide_version = self.hide_version;
        app.enable_bash_completion = self.enable_bash_completion;
        app.metadata = self.metadata.clone();
        app.flags = to_flags(&self.flags);
        app.action = registry.resolve(&self.name, self.action.as_deref())?;
        app.before = registry.resolve_hook(&self.name, self.before.as_deref())?;
        app.after = registry.resolve_hook(&self.name, self.after.as_deref())?;
        app.commands = self
            .commands
            .iter()
            .map(|command| command.build(registry))
            .collect::<Result<_>>()?;
        Ok(app)
    }
}

impl CommandManifest {
    fn collect_action_names<'a>(&'a self, names: &mut BTreeSet<&'a str>) {
        names.extend(
            [&self.action, &self.before, &self.after]
                .into_iter()
                .filter_map(|name| name.as_deref()),
        );
        for command in &self.commands {
            command.collect_action_names(names);
        }
    }

    fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str())
            .chain((!self.short_name.is_empty()).then_some(self.short_name.as_str()))
            .chain(self.aliases.iter().map(String::as_str))
    }

    pub fn build(&self, registry: &ActionRegistry) -> Result<Command> {
        let mut command = Command::new(self.name.clone());
        command.short_name = self.short_name.clone();
        command.aliases = self.aliases.clone();
        command.usage = self.usage.clone();
        command.usage_text = self.usage_text.clone();
        command.description = self.description.clone();
        command.args_usage = self.args_usage.clone();
        command.category = self.category.clone();
        command.help_name = self.help_name.clone();
        command.skip_flag_parsing = self.skip_flag_parsing;
        command.skip_arg_reorder = self.skip_arg_reorder;
        command.use_short_option_handling = self.use_short_option_handling;
        command.hide_help = self.hide_help;
        command.hidden = self.hidden;
        command.flags = to_flags(&self.flags);
        command.action = registry.resolve(&self.name, self.action.as_deref())?;
        command.before = registry.resolve_hook(&self.name, self.before.as_deref())?;
        command.after = registry.resolve_hook(&self.name, self.after.as_deref())?;
        command.subcommands = self
            .commands
            .iter()
            .map(|child| child.build(registry))
            .collect::<Result<_>>()?;
        Ok(command)
    }
}

fn validate_siblings(parent: &str, commands: &[CommandManifest]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for command in commands {
        if command.name.trim().is_empty() {
            return Err(ConfigError::EmptyCommandName)
                .with_context(|| format!("commands of {parent}"));
        }
        for name in command.names() {
            if !seen.insert(name) {
                return Err(ConfigError::DuplicateCommand {
                    parent: parent.to_string(),
                    name: name.to_string(),
                }
                .into());
            }
        }
        check_declarations(&to_flags(&command.flags))
            .with_context(|| format!("flags of {}", command.name))?;
        validate_siblings(&command.name, &command.commands)?;
    }
    Ok(())
}

/// Load and validate a manifest from a TOML file.
pub fn load_manifest(path: &Path) -> Result<AppManifest> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let manifest: AppManifest =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    manifest.validate()?;
    Ok(manifest)
}

/// Named actions a manifest can refer to.
#[derive(Debug, Clone, Default)]
pub struct ActionRegistry {
    actions: BTreeMap<String, Action>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `echo`, `fail`, `noop` and `help`.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("echo", Action::new(echo));
        registry.register(
            "fail",
            Action::new(|ctx| {
                let message = match ctx.args().first() {
                    Some(message) => message.to_string(),
                    None => format!("{} failed", describe(ctx)),
                };
                Err(ExitError::new(message, exit_codes::FAILURE).into())
            }),
        );
        registry.register("noop", Action::infallible(|_| {}));
        registry.register("help", Action::Help);
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, action: Action) -> &mut Self {
        self.actions.insert(name.into(), action);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    fn lookup(&self, owner: &str, name: &str) -> Result<Action> {
        self.get(name).cloned().ok_or_else(|| {
            ConfigError::UnknownAction {
                command: owner.to_string(),
                action: name.to_string(),
            }
            .into()
        })
    }

    fn resolve(&self, owner: &str, name: Option<&str>) -> Result<Option<Action>> {
        name.map(|name| self.lookup(owner, name)).transpose()
    }

    /// Registered actions double as `before` / `after` hooks.
    fn resolve_hook(&self, owner: &str, name: Option<&str>) -> Result<Option<HookFn>> {
        Ok(self.resolve(owner, name)?.map(|action| {
            let hook: HookFn = Arc::new(move |ctx: &Context<'_>| action.invoke(ctx));
            hook
        }))
    }
}

fn describe(ctx: &Context<'_>) -> String {
    match ctx.command() {
        Some(command) => command.full_name(),
        None => ctx.app().name.clone(),
    }
}

/// Print the dispatched command, its arguments and every flag given.
fn echo(ctx: &Context<'_>) -> Result<()> {
    let out = &ctx.app().writer;
    out.line(format_args!("{} {:?}", describe(ctx), ctx.args().as_slice()));
    for name in ctx.flags().set_names() {
        if let Some(value) = ctx.flags().value(name) {
            out.line(format_args!("  {name}={value}"));
        }
    }
    Ok(())
}
