//! Translation of errors into process exit statuses.

use std::process;
use std::sync::Arc;

use tracing::debug;

use crate::error::{ExitError, MultiError};
use crate::exit_codes;
use crate::output::Output;

/// Terminates the process with a status. Replaceable so tests can observe
/// the status instead of exiting.
pub type Exiter = Arc<dyn Fn(i32) + Send + Sync>;

pub fn process_exiter() -> Exiter {
    Arc::new(exit_process)
}

fn exit_process(code: i32) {
    process::exit(code);
}

/// Exit when `err` carries an exit status.
///
/// An [`ExitError`] prints its message (when non-empty) to `err_writer` and
/// exits with its code. A [`MultiError`] prints every constituent and exits
/// with the code of the last [`ExitError`] among them, or
/// [`exit_codes::FAILURE`] when there is none. Other errors are left for the
/// caller. Returns the status handed to `exiter`.
pub fn handle_exit_coder(err: &anyhow::Error, err_writer: &Output, exiter: &Exiter) -> Option<i32> {
    let code = if let Some(exit) = err.downcast_ref::<ExitError>() {
        if !exit.message.is_empty() {
            err_writer.line(&exit.message);
        }
        exit.code
    } else if let Some(multi) = err.downcast_ref::<MultiError>() {
        multi_error_code(multi, err_writer)
    } else {
        return None;
    };
    debug!(code, "exiting");
    err_writer.flush();
    exiter(code);
    Some(code)
}

fn multi_error_code(multi: &MultiError, err_writer: &Output) -> i32 {
    let mut code = exit_codes::FAILURE;
    for err in multi.errors() {
        if let Some(nested) = err.downcast_ref::<MultiError>() {
            code = multi_error_code(nested, err_writer);
            continue;
        }
        match err.downcast_ref::<ExitError>() {
            Some(exit) => {
                if !exit.message.is_empty() {
                    err_writer.line(&exit.message);
                }
                code = exit.code;
            }
            None => err_writer.line(err),
        }
    }
    code
}
