//! Test-only helpers for observing dispatch.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Result, bail};

use crate::action::HookFn;
use crate::app::App;
use crate::context::Context;
use crate::error::ParseError;
use crate::flag::{Flag, FlagSet};
use crate::output::Buffer;
use crate::parser::{ClapFlagParser, FlagParser};

/// Ordered record of hook and action invocations.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: impl Into<String>) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Hook that records `label` and succeeds.
    pub fn hook(&self, label: &str) -> HookFn {
        let log = self.clone();
        let label = label.to_string();
        Arc::new(move |_ctx: &Context<'_>| {
            log.push(label.clone());
            Ok(())
        })
    }

    /// Hook that records `label` and fails with `label` as the message.
    pub fn failing_hook(&self, label: &str) -> HookFn {
        let log = self.clone();
        let label = label.to_string();
        Arc::new(move |_ctx: &Context<'_>| -> Result<()> {
            log.push(label.clone());
            bail!("{label}")
        })
    }
}

/// [`FlagParser`] that records every token list it is handed, then
/// delegates to [`ClapFlagParser`].
#[derive(Debug, Clone, Default)]
pub struct RecordingParser {
    calls: Arc<Mutex<Vec<(String, Vec<String>)>>>,
}

impl RecordingParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(name, tokens)` for each parse, in call order.
    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Tokens of the last parse for `name`.
    pub fn tokens_for(&self, name: &str) -> Option<Vec<String>> {
        self.calls()
            .into_iter()
            .rev()
            .find(|(called, _)| called == name)
            .map(|(_, tokens)| tokens)
    }
}

impl FlagParser for RecordingParser {
    fn parse(&self, name: &str, flags: &[Flag], tokens: &[String]) -> Result<FlagSet, ParseError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((name.to_string(), tokens.to_vec()));
        ClapFlagParser.parse(name, flags, tokens)
    }
}

/// Output streams and exit statuses captured from an [`App`].
#[derive(Debug, Clone, Default)]
pub struct Captured {
    pub out: Buffer,
    pub err: Buffer,
    codes: Arc<Mutex<Vec<i32>>>,
}

impl Captured {
    pub fn exit_codes(&self) -> Vec<i32> {
        self.codes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// `app` with its output streams captured and process exit replaced by a
/// recorder.
pub fn captured(app: App) -> (App, Captured) {
    let captured = Captured::default();
    let codes = Arc::clone(&captured.codes);
    let app = app
        .writer(captured.out.output())
        .err_writer(captured.err.output())
        .exiter(move |code| {
            codes
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(code);
        });
    (app, captured)
}

/// Write `contents` to `app.toml` in a fresh temporary directory.
pub fn temp_manifest(contents: &str) -> (tempfile::TempDir, PathBuf) {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("app.toml");
    std::fs::write(&path, contents).expect("write manifest");
    (temp, path)
}

/// Convert string literals into owned tokens.
pub fn tokens(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}
