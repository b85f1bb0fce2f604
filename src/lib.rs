#![warn(clippy::all, rust_2018_idioms)]
//! Assertion helpers for tests: fewer hand written `if !ok { fail }` blocks,
//! and failure messages pointing at the test line.
//!
//! ```
//! use assert_utils::{assert_equal, condition, Recorder, TestResult};
//!
//! fn checks() -> TestResult {
//!     let mut t = Recorder::new("checks");
//!     condition!(&mut t, 1 + 1 == 2, "math broken: {}", 1 + 1)?;
//!     assert_equal(&mut t, vec![1, 2, 3], vec![1, 2, 3])?;
//!     t.finish()
//! }
//! # checks().unwrap();
//! ```

pub mod assert;
pub mod context;
pub mod shape;
pub mod test_framework;
pub mod utils;

pub use assert::{
    assert_condition, assert_equal, assert_err, assert_not_equal, assert_ok, assert_panics,
    panic_message,
};
pub use context::{Recorder, Strict, TestContext};
pub use shape::{deep_equal, Shape, ShapeError};
pub use test_framework::{CallerLocation, TestError, TestResult};

/// [`assert_condition`] with a formatted message.
///
/// `condition!(ctx, cond, "template {}", args...)`
#[macro_export]
macro_rules! condition {
    ($ctx:expr, $cond:expr, $($arg:tt)+) => {
        $crate::assert::assert_condition($ctx, $cond, ::core::format_args!($($arg)+))
    };
}
