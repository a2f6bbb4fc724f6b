//! Guaranteed execution of the `after` hook.

use anyhow::Result;
use scopeguard::ScopeGuard;
use tracing::warn;

use crate::action::HookFn;
use crate::context::Context;
use crate::error::combine;

/// Run `body`, then `after` on every exit path.
///
/// On a normal return the `after` error is merged into the result: it
/// becomes the result when `body` succeeded and joins a [`MultiError`] when
/// `body` failed. Any merged error goes through exit-code translation. When
/// `body` unwinds, `after` still runs; its error is logged because there is
/// no result left to attach it to.
///
/// [`MultiError`]: crate::error::MultiError
pub fn run_guarded<F>(ctx: &Context<'_>, after: Option<&HookFn>, body: F) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    let Some(after) = after else {
        return body();
    };

    let guard = scopeguard::guard_on_unwind((), |()| {
        if let Err(err) = after(ctx) {
            warn!(error = %err, "after hook failed while unwinding");
        }
    });
    let result = body();
    ScopeGuard::into_inner(guard);

    let Err(after_err) = after(ctx) else {
        return result;
    };
    let merged = match result {
        Ok(()) => after_err,
        Err(err) => combine(err, after_err),
    };
    ctx.app().handle_exit_coder(ctx, &merged);
    Err(merged)
}
