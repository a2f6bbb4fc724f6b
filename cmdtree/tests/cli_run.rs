//! CLI tests for the `cmdtree` binary.
//!
//! Spawns the binary against temporary manifests and checks output and exit
//! codes.

use std::process::{Command, Output};

use cmdtree::exit_codes;
use cmdtree::test_support::temp_manifest;

const MANIFEST: &str = r#"
name = "tool"
usage = "demo tool"

[[flags]]
name = "debug, d"

[[commands]]
name = "build"
aliases = ["b"]
usage = "compile"
action = "echo"

[[commands.flags]]
name = "target, t"
kind = "string"

[[commands]]
name = "remote"
usage = "manage remotes"

[[commands.commands]]
name = "add"
action = "echo"

[[commands]]
name = "explode"
action = "fail"
"#;

fn cmdtree(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cmdtree"))
        .args(args)
        .output()
        .expect("spawn cmdtree")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn run_dispatches_through_manifest() {
    let (_temp, path) = temp_manifest(MANIFEST);
    let path = path.to_str().expect("utf-8 path");

    let output = cmdtree(&["run", path, "-d", "b", "src", "--target", "arm"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(stdout(&output), "build [\"src\"]\n  target=arm\n");

    let output = cmdtree(&["run", path, "remote", "add", "origin"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(stdout(&output), "remote add [\"origin\"]\n");
}

#[test]
fn run_without_arguments_prints_help() {
    let (_temp, path) = temp_manifest(MANIFEST);
    let output = cmdtree(&["run", path.to_str().expect("utf-8 path")]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let text = stdout(&output);
    assert!(text.starts_with("NAME:\n   tool - demo tool\n"), "{text}");
    assert!(text.contains("build, b\tcompile"), "{text}");
}

#[test]
fn failing_action_exits_with_its_code() {
    let (_temp, path) = temp_manifest(MANIFEST);
    let output = cmdtree(&["run", path.to_str().expect("utf-8 path"), "explode", "kaboom"]);
    assert_eq!(output.status.code(), Some(exit_codes::FAILURE));
    assert_eq!(String::from_utf8_lossy(&output.stderr), "kaboom\n");
}

#[test]
fn unknown_help_topic_exits_with_code_three() {
    let (_temp, path) = temp_manifest(MANIFEST);
    let output = cmdtree(&["run", path.to_str().expect("utf-8 path"), "help", "nope"]);
    assert_eq!(output.status.code(), Some(exit_codes::NO_HELP_TOPIC));
}

#[test]
fn check_and_tree_describe_the_manifest() {
    let (_temp, path) = temp_manifest(MANIFEST);
    let path = path.to_str().expect("utf-8 path");

    let output = cmdtree(&["check", path]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(stdout(&output), "tool: 4 commands\n");

    let output = cmdtree(&["tree", path]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(stdout(&output), "build (b)\nremote\nremote add\nexplode\n");
}

#[test]
fn invalid_manifest_is_rejected() {
    let (_temp, path) = temp_manifest(
        r#"
[[commands]]
name = "deploy"
action = "ship"
"#,
    );
    let output = cmdtree(&["check", path.to_str().expect("utf-8 path")]);
    assert_eq!(output.status.code(), Some(exit_codes::INVALID_MANIFEST));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown action"));
}
