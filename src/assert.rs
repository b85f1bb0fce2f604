//! The checks themselves.
//!
//! Every check is `#[track_caller]`: the location in the diagnostic is the
//! line of the test calling it. On failure the message is logged, then handed
//! to the [`TestContext`].

use crate::context::TestContext;
use crate::shape::deep_equal;
use crate::test_framework::{CallerLocation, TestError, TestResult};
use log::{debug, error, trace};
use serde::Serialize;
use std::any::Any;
use std::fmt::{Debug, Display};
use std::panic::{self, AssertUnwindSafe};

#[track_caller]
fn failure<C: TestContext + ?Sized>(ctx: &C, text: String) -> TestError {
    let error = TestError::at(CallerLocation::here(), text);
    error!("[{}] {error}", ctx.name());
    error
}

/// Fails the test if `condition` is false. `msg` should explain the condition.
///
/// See [`condition!`](crate::condition) for a message with format arguments.
#[track_caller]
pub fn assert_condition<C: TestContext + ?Sized>(
    ctx: &mut C,
    condition: bool,
    msg: impl Display,
) -> TestResult {
    if !condition {
        let error = failure(ctx, msg.to_string());
        return ctx.fail_now(error);
    }
    Ok(())
}

/// Fails the test if `result` holds an error, gives back the value otherwise.
#[track_caller]
pub fn assert_ok<C, T, E>(ctx: &mut C, result: Result<T, E>) -> Result<T, TestError>
where
    C: TestContext + ?Sized,
    E: Display,
{
    match result {
        Ok(value) => Ok(value),
        Err(err) => {
            let error = failure(ctx, format!("unexpected error: {err}"));
            ctx.fail_now(error.clone())?;
            Err(error)
        }
    }
}

/// Fails the test if `result` isn't an error, gives back the error otherwise.
#[track_caller]
pub fn assert_err<C, T, E>(ctx: &mut C, result: Result<T, E>) -> Result<E, TestError>
where
    C: TestContext + ?Sized,
    T: Debug,
{
    match result {
        Err(err) => Ok(err),
        Ok(value) => {
            let error = failure(ctx, format!("expected error but got Ok({value:?})"));
            ctx.fail_now(error.clone())?;
            Err(error)
        }
    }
}

#[track_caller]
fn compare<C, E, A>(ctx: &mut C, expected: &E, actual: &A) -> Result<bool, TestError>
where
    C: TestContext + ?Sized,
    E: Serialize + ?Sized,
    A: Serialize + ?Sized,
{
    match deep_equal(expected, actual) {
        Ok(equal) => Ok(equal),
        Err(e) => {
            let error = failure(ctx, format!("values can't be compared: {e}"));
            ctx.fail_now(error)?;
            Ok(false)
        }
    }
}

/// Fails the test if `expected` and `actual` differ in structure or content.
///
/// Both values are dumped with `{:#?}` on failure.
#[track_caller]
pub fn assert_equal<C, E, A>(ctx: &mut C, expected: E, actual: A) -> TestResult
where
    C: TestContext + ?Sized,
    E: Serialize + Debug,
    A: Serialize + Debug,
{
    if compare(ctx, &expected, &actual)? {
        trace!("[{}] equality holds", ctx.name());
        return Ok(());
    }
    let error = failure(
        ctx,
        format!("\n\texp: {expected:#?}\n\n\tgot: {actual:#?}"),
    );
    ctx.fail_now(error)
}

/// Fails the test if `control` and `obtained` are structurally equal.
#[track_caller]
pub fn assert_not_equal<C, E, A>(ctx: &mut C, control: E, obtained: A) -> TestResult
where
    C: TestContext + ?Sized,
    E: Serialize + Debug,
    A: Serialize + Debug,
{
    if !compare(ctx, &control, &obtained)? {
        return Ok(());
    }
    let error = failure(
        ctx,
        format!("\n\tcontrol: {control:#?}\n\n\tobtained: {obtained:#?}\n\tshould differ"),
    );
    ctx.fail_now(error)
}

/// Message carried by a panic payload, if it is a string.
pub fn panic_message(payload: &(dyn Any + Send)) -> Option<&str> {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        return Some(*message);
    }
    payload.downcast_ref::<String>().map(String::as_str)
}

/// Runs `f`, expecting it to panic.
///
/// The panic is caught and the test goes on; its message is returned. If `f`
/// returns normally the failure is reported but the test is not stopped.
#[track_caller]
pub fn assert_panics<C, F, R>(ctx: &mut C, f: F) -> Option<String>
where
    C: TestContext + ?Sized,
    F: FnOnce() -> R,
{
    let location = CallerLocation::here();
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(_) => {
            let error = TestError::at(location, "the code did not panic");
            error!("[{}] {error}", ctx.name());
            ctx.fail(error);
            None
        }
        Err(payload) => {
            let message = panic_message(&*payload)
                .unwrap_or("<non-string panic payload>")
                .to_string();
            debug!("[{}] {location}: expected panic: {message}", ctx.name());
            Some(message)
        }
    }
}
