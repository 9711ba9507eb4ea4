//! Evaluation of the AST.
//!
//! Every expression and statement evaluates to an [`EvalResult`]: a [`Completion`] for
//! everything the language can observe, `Err` only for host level faults. The macros below
//! keep the early-return plumbing for abrupt completions short.

/// Evaluates an `EvalResult` and yields its value, returning early from the enclosing
/// function when the completion is abrupt. With `, abrupt` the enclosing function returns a
/// `ValueResult`.
macro_rules! completion_value {
    ($e:expr) => {{
        let completion = $e?;
        if completion.is_abrupt() {
            return Ok(completion);
        }
        completion.get_value()
    }};
    ($e:expr, abrupt) => {{
        let completion = $e?;
        if completion.is_abrupt() {
            return Ok(Err(completion));
        }
        completion.get_value()
    }};
}

/// Unwraps a `ValueResult`, returning the abrupt completion early.
macro_rules! try_value {
    ($e:expr) => {
        match $e? {
            Ok(v) => v,
            Err(completion) => return Ok(completion),
        }
    };
    ($e:expr, abrupt) => {
        match $e? {
            Ok(v) => v,
            Err(completion) => return Ok(Err(completion)),
        }
    };
}

/// Unwraps a `Result<_, JErrorType>`, turning the error into a throw completion in the
/// current realm.
macro_rules! throw_on_err {
    ($ctx:expr, $e:expr) => {
        match $e {
            Ok(v) => v,
            Err(err) => return $ctx.throw_error(err),
        }
    };
    ($ctx:expr, $e:expr, abrupt) => {
        match $e {
            Ok(v) => v,
            Err(err) => return $ctx.throw_error(err).map(Err),
        }
    };
}

pub mod context;
pub mod declaration;
pub mod expression;
pub mod function;
pub mod script;
pub mod statement;
pub mod types;

pub use context::EvalContext;
pub use types::{Completion, CompletionType, EvalResult, Reference, ReferenceBase, ValueResult};
