//! Run command trees declared in TOML manifests.
//!
//! Manifests refer to the built-in actions `echo`, `fail`, `noop` and
//! `help`, which makes the binary a harness for trying out dispatch
//! behavior without writing Rust.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use cmdtree::command::Command as TreeCommand;
use cmdtree::config::{ActionRegistry, AppManifest, load_manifest};
use cmdtree::core::names::qualified_name;
use cmdtree::{App, exit_codes, logging};

#[derive(Parser)]
#[command(name = "cmdtree", version, about = "Dispatch arguments through a declared command tree")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Dispatch ARGS through the manifest's application.
    Run {
        manifest: PathBuf,
        /// Arguments after the program name.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Validate a manifest and resolve its actions.
    Check { manifest: PathBuf },
    /// Print the fully qualified name of every command.
    Tree { manifest: PathBuf },
}

fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();
    let app = match &cli.command {
        Command::Run { manifest, .. } | Command::Check { manifest } | Command::Tree { manifest } => {
            build_app(manifest)
        }
    };
    let app = match app {
        Ok(app) => app,
        Err(err) => {
            eprintln!("{err:#}");
            return exit_code(exit_codes::INVALID_MANIFEST);
        }
    };

    let result = match cli.command {
        Command::Run { args, .. } => cmd_run(&app, args),
        Command::Check { .. } => cmd_check(&app),
        Command::Tree { .. } => cmd_tree(&app),
    };
    match result {
        Ok(()) => exit_code(exit_codes::OK),
        Err(err) => {
            eprintln!("{err:#}");
            exit_code(exit_codes::FAILURE)
        }
    }
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

fn build_app(path: &Path) -> Result<App> {
    let manifest: AppManifest = load_manifest(path)?;
    manifest
        .build(&ActionRegistry::builtin())
        .with_context(|| format!("build {}", path.display()))
}

fn cmd_run(app: &App, args: Vec<String>) -> Result<()> {
    debug!(app = %app.name, ?args, "dispatching");
    let argv = std::iter::once(app.name.clone()).chain(args);
    let result = app.run(argv);
    app.writer.flush();
    result
}

fn cmd_check(app: &App) -> Result<()> {
    let count = count_commands(&app.commands);
    println!("{}: {count} commands", app.name);
    Ok(())
}

fn count_commands(commands: &[TreeCommand]) -> usize {
    commands
        .iter()
        .map(|command| 1 + count_commands(&command.subcommands))
        .sum()
}

fn cmd_tree(app: &App) -> Result<()> {
    let mut lines = Vec::new();
    collect_names(&app.commands, &[], &mut lines);
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

fn collect_names(commands: &[TreeCommand], ancestors: &[String], lines: &mut Vec<String>) {
    for command in commands {
        let mut line = qualified_name(ancestors, &command.name);
        let names = command.names();
        if let Some(other_names) = names.get(1..).filter(|rest| !rest.is_empty()) {
            line.push_str(&format!(" ({})", other_names.join(", ")));
        }
        lines.push(line);

        let mut path = ancestors.to_vec();
        path.push(command.name.clone());
        collect_names(&command.subcommands, &path, lines);
    }
}
