//! Execution record for one dispatch level.

use crate::app::App;
use crate::command::Command;
use crate::flag::FlagSet;

/// Positional arguments left after flag parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args(Vec<String>);

impl Args {
    pub fn new(args: Vec<String>) -> Self {
        Self(args)
    }

    pub fn get(&self, n: usize) -> Option<&str> {
        self.0.get(n).map(String::as_str)
    }

    pub fn first(&self) -> Option<&str> {
        self.get(0)
    }

    /// Everything after the first argument.
    pub fn tail(&self) -> &[String] {
        self.0.get(1..).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn present(&self) -> bool {
        !self.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// State for one level of the dispatch chain.
///
/// Contexts borrow their parent, so the chain mirrors the recursion and is
/// dropped level by level as dispatch returns.
#[derive(Debug)]
pub struct Context<'a> {
    app: &'a App,
    command: Option<&'a Command>,
    flags: FlagSet,
    args: Args,
    parent: Option<&'a Context<'a>>,
    shell_complete: bool,
}

impl<'a> Context<'a> {
    pub fn new(app: &'a App, flags: FlagSet, parent: Option<&'a Context<'a>>) -> Self {
        let args = Args::new(flags.args().to_vec());
        let shell_complete = parent.is_some_and(|p| p.shell_complete);
        Self {
            app,
            command: None,
            flags,
            args,
            parent,
            shell_complete,
        }
    }

    #[must_use]
    pub fn with_command(mut self, command: &'a Command) -> Self {
        self.command = Some(command);
        self
    }

    #[must_use]
    pub(crate) fn with_shell_complete(mut self, shell_complete: bool) -> Self {
        self.shell_complete = shell_complete;
        self
    }

    pub fn app(&self) -> &'a App {
        self.app
    }

    pub fn command(&self) -> Option<&'a Command> {
        self.command
    }

    pub fn parent(&self) -> Option<&'a Context<'a>> {
        self.parent
    }

    pub fn flags(&self) -> &FlagSet {
        &self.flags
    }

    pub fn args(&self) -> &Args {
        &self.args
    }

    pub fn narg(&self) -> usize {
        self.args.len()
    }

    /// True when the invocation asked for completion candidates.
    pub fn shell_complete(&self) -> bool {
        self.shell_complete
    }

    pub fn bool(&self, name: &str) -> bool {
        self.flags.bool(name)
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        self.flags.string(name)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.flags.int(name)
    }

    pub fn string_slice(&self, name: &str) -> &[String] {
        self.flags.string_slice(name)
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.flags.is_set(name)
    }

    pub fn num_flags(&self) -> usize {
        self.flags.num_flags()
    }

    /// This context followed by each ancestor, innermost first.
    pub fn lineage(&self) -> impl Iterator<Item = &Context<'a>> {
        std::iter::successors(Some(self), |ctx| ctx.parent)
    }

    /// Nearest ancestor context that declares `name`.
    fn global(&self, name: &str) -> Option<&Context<'a>> {
        self.parent
            .and_then(|parent| parent.lineage().find(|ctx| ctx.flags.declares(name)))
    }

    pub fn global_bool(&self, name: &str) -> bool {
        self.global(name).is_some_and(|ctx| ctx.bool(name))
    }

    pub fn global_string(&self, name: &str) -> Option<&str> {
        self.global(name).and_then(|ctx| ctx.string(name))
    }

    pub fn global_int(&self, name: &str) -> Option<i64> {
        self.global(name).and_then(|ctx| ctx.int(name))
    }

    pub fn global_is_set(&self, name: &str) -> bool {
        self.global(name).is_some_and(|ctx| ctx.is_set(name))
    }
}
