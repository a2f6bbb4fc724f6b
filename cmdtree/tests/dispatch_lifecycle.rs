//! End-to-end dispatch through `App::run`.
//!
//! These tests drive whole applications with captured output and a recording
//! exiter to verify hook ordering, the guaranteed `after` hook, usage-error
//! handling and exit-code translation.

use std::sync::Arc;

use cmdtree::error::MultiError;
use cmdtree::test_support::{EventLog, captured};
use cmdtree::{Action, App, Command, ExitError, Flag};

fn traced_command(log: &EventLog, name: &str) -> Command {
    let action_log = log.clone();
    let mut command = Command::new(name).action(move |_ctx| {
        action_log.push("action");
        Ok(())
    });
    command.before = Some(log.hook("before"));
    command.after = Some(log.hook("after"));
    command
}

/// Before, action and after run once each, in that order.
#[test]
fn hooks_run_in_order() {
    let log = EventLog::new();
    let (app, out) = captured(App::new("tool").command(traced_command(&log, "build")));

    app.run(["tool", "build"]).expect("run");

    assert_eq!(log.events(), vec!["before", "action", "after"]);
    assert!(out.exit_codes().is_empty());
}

/// A failing `before` skips the action, shows the command's help, and still
/// runs `after` exactly once.
#[test]
fn before_failure_skips_action_and_runs_after() {
    let log = EventLog::new();
    let mut command = traced_command(&log, "build").usage("compile things");
    command.before = Some(log.failing_hook("before"));
    let (app, out) = captured(App::new("tool").command(command));

    let err = app.run(["tool", "build"]).expect_err("before fails");

    assert_eq!(err.to_string(), "before");
    assert_eq!(log.events(), vec!["before", "after"]);
    assert!(out.out.contents().contains("tool build - compile things"));
    assert!(out.exit_codes().is_empty());
}

/// An `after` failure on top of an action failure yields both errors, and the
/// combined error goes through exit-code translation.
#[test]
fn after_failure_is_combined_with_action_failure() {
    let log = EventLog::new();
    let mut command = Command::new("build").action(|_ctx| Err(ExitError::new("broken", 9).into()));
    command.after = Some(log.failing_hook("after"));
    let (app, out) = captured(App::new("tool").command(command));

    let err = app.run(["tool", "build"]).expect_err("both fail");

    let multi = err.downcast_ref::<MultiError>().expect("multi error");
    assert_eq!(multi.len(), 2);
    assert_eq!(multi.errors()[0].to_string(), "broken");
    assert_eq!(multi.errors()[1].to_string(), "after");
    // Once for the action error alone, once for the combined error.
    assert_eq!(out.exit_codes(), vec![9, 9]);
    assert_eq!(out.err.contents(), "broken\nbroken\nafter\n");
}

/// An `after` failure turns a successful action into an error.
#[test]
fn after_failure_alone_becomes_the_result() {
    let log = EventLog::new();
    let mut command = traced_command(&log, "build");
    command.after = Some(log.failing_hook("after"));
    let (app, out) = captured(App::new("tool").command(command));

    let err = app.run(["tool", "build"]).expect_err("after fails");

    assert_eq!(err.to_string(), "after");
    assert_eq!(log.events(), vec!["before", "action", "after"]);
    assert!(out.exit_codes().is_empty());
}

/// Flags parse from anywhere after the command name and positionals keep
/// their relative order.
#[test]
fn flags_and_positionals_reach_the_action() {
    let log = EventLog::new();
    let sink = log.clone();
    let command = Command::new("cp")
        .flag(Flag::bool("force, f"))
        .flag(Flag::string("mode, m").default_value("0644"))
        .action(move |ctx| {
            sink.push(format!(
                "force={} mode={} args={}",
                ctx.bool("f"),
                ctx.string("mode").unwrap_or_default(),
                ctx.args().as_slice().join(" ")
            ));
            Ok(())
        });
    let (app, _out) = captured(App::new("tool").command(command));

    app.run(["tool", "cp", "src", "--force", "dst"]).expect("run");
    app.run(["tool", "cp", "src", "dst"]).expect("run without flags");

    assert_eq!(
        log.events(),
        vec!["force=true mode=0644 args=dst src", "force=false mode=0644 args=src dst"]
    );
}

/// Using two names of one flag in a single invocation is rejected before the
/// action runs.
#[test]
fn two_forms_of_one_flag_are_rejected() {
    let log = EventLog::new();
    let command = traced_command(&log, "build").flag(Flag::bool("verbose, V"));
    let (app, out) = captured(App::new("tool").command(command));

    let err = app
        .run(["tool", "build", "--verbose", "-V"])
        .expect_err("two forms");

    assert_eq!(
        err.to_string(),
        "Cannot use two forms of the same flag: verbose V"
    );
    assert!(log.events().is_empty());
    assert!(
        out.out
            .contents()
            .starts_with("Cannot use two forms of the same flag: verbose V\n\n")
    );
}

/// Unknown flags print `Incorrect Usage` with the command's help, unless an
/// `on_usage_error` hook takes over.
#[test]
fn usage_errors_go_to_hook_or_help() {
    let (app, out) = captured(App::new("tool").command(Command::new("build")));
    app.run(["tool", "build", "--bogus"]).expect_err("usage error");
    assert!(out.out.contents().starts_with("Incorrect Usage: "));

    let log = EventLog::new();
    let sink = log.clone();
    let command = Command::new("build").on_usage_error(move |_ctx, err, is_subcommand| {
        sink.push(format!("usage error (nested={is_subcommand}): {}", !err.to_string().is_empty()));
        Ok(())
    });
    let (app, out) = captured(App::new("tool").command(command));
    app.run(["tool", "build", "--bogus"]).expect("hook swallows");
    assert_eq!(log.events(), vec!["usage error (nested=false): true"]);
    assert_eq!(out.out.contents(), "");
}

/// `--help` on a leaf shows its help and skips every hook.
#[test]
fn help_flag_short_circuits() {
    let log = EventLog::new();
    let (app, out) = captured(
        App::new("tool").command(traced_command(&log, "build").usage("compile")),
    );

    app.run(["tool", "build", "--help"]).expect("help");

    assert!(log.events().is_empty());
    assert!(out.out.contents().contains("NAME:\n   tool build - compile"));
}

/// A command without an action shows its own help.
#[test]
fn missing_action_falls_back_to_help() {
    let (app, out) = captured(App::new("tool").command(Command::new("build").usage("compile")));
    app.run(["tool", "build"]).expect("help");
    assert!(out.out.contents().contains("tool build - compile"));
}

/// The legacy action shape runs and always succeeds.
#[test]
fn infallible_actions_run() {
    let log = EventLog::new();
    let sink = log.clone();
    let command = Command::new("ping").with_action(Action::infallible(move |_ctx| sink.push("pong")));
    let (app, _out) = captured(App::new("tool").command(command));
    app.run(["tool", "ping"]).expect("run");
    assert_eq!(log.events(), vec!["pong"]);
}

/// `help <name>` and `help` with an unknown topic.
#[test]
fn help_command_shows_topics() {
    let (app, out) = captured(App::new("tool").command(Command::new("build").usage("compile")));
    app.run(["tool", "help", "build"]).expect("topic");
    assert!(out.out.contents().contains("tool build - compile"));

    let err = app.run(["tool", "help", "nope"]).expect_err("unknown topic");
    assert_eq!(err.to_string(), "No help topic for 'nope'");
    assert_eq!(out.exit_codes(), vec![3]);
    assert_eq!(out.err.contents(), "No help topic for 'nope'\n");
}

/// A definition can be dispatched repeatedly and from several threads.
#[test]
fn definitions_are_reusable_across_threads() {
    let log = EventLog::new();
    let (app, _out) = captured(App::new("tool").command(traced_command(&log, "build")));
    let app = Arc::new(app);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let app = Arc::clone(&app);
            std::thread::spawn(move || app.run(["tool", "build"]))
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread").expect("run");
    }

    assert_eq!(log.events().len(), 12);
}
