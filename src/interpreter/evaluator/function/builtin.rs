use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::core::{Context, EvalResult},
        value::core::Value,
    },
    util::num::{NADBL, is_na, obs_at},
};

/// Applies an element-wise math function to a numeric value.
///
/// - A missing scalar or observation stays missing; `f` is never called on
///   it.
/// - A series is computed over the current sample.
/// - A matrix is mapped cell by cell; missing cells are `NaN` and stay so.
///
/// Results that are not finite (such as `log(0)`) are returned as they are;
/// they become missing values when stored.
///
/// # Parameters
/// - `ctx`: Evaluation context, for the sample and the auxiliary pool.
/// - `args`: Slice containing one numeric argument.
/// - `line`: Line number for error reporting.
/// - `f`: The function to apply.
///
/// # Returns
/// A value of the same kind as the argument.
///
/// # Example
/// ```
/// use genr::{interpreter::{evaluator::{core::Context, function::builtin::apply},
///                          value::core::Value},
///            util::num::NADBL};
///
/// let mut ctx = Context::new();
/// assert_eq!(apply(&mut ctx, &[Value::Scalar(16.0)], 1, f64::sqrt).unwrap(), Value::Scalar(4.0));
/// assert_eq!(apply(&mut ctx, &[Value::Scalar(NADBL)], 1, f64::sqrt).unwrap(),
///            Value::Scalar(NADBL));
/// ```
pub fn apply(ctx: &mut Context,
             args: &[Value],
             line: usize,
             f: fn(f64) -> f64)
             -> EvalResult<Value> {
    match &args[0] {
        Value::Scalar(x) => Ok(Value::Scalar(if is_na(*x) { NADBL } else { f(*x) })),
        Value::Series(s) => {
            let data = s.data.clone();
            ctx.series_from_fn(line, |t| {
                   let x = obs_at(&data, t);
                   if is_na(x) { NADBL } else { f(x) }
               })
        },
        Value::Matrix(m) => {
            let m = m.clone();
            Ok(Value::Matrix(ctx.matrix_from_fn(m.rows(), m.cols(), |i, j| f(m.get(i, j)))))
        },
        other => Err(RuntimeError::type_error(format!("expected a number, found {}",
                                                      other.type_name()),
                                              line)),
    }
}

/// Sign of `x`: -1, 0 or 1. Zero keeps its value rather than its sign bit.
#[must_use]
pub fn sgn(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        x
    }
}

/// Asserts that a scalar argument is true.
///
/// A zero or a missing value fails; anything else passes and the function
/// returns nothing, so `assert(x > 0)` is a statement of its own.
///
/// # Errors
/// Returns `RuntimeError::AssertionFailed` if the assertion fails.
///
/// # Example
/// ```
/// use genr::interpreter::{evaluator::{core::Context, function::builtin::assert_fn},
///                         value::core::Value};
///
/// let mut ctx = Context::new();
/// assert_eq!(assert_fn(&mut ctx, &[Value::Scalar(1.0)], 1).unwrap(), Value::Null);
/// assert!(assert_fn(&mut ctx, &[Value::Scalar(0.0)], 1).is_err());
/// ```
#[allow(clippy::float_cmp)]
pub fn assert_fn(_ctx: &mut Context, args: &[Value], line: usize) -> EvalResult<Value> {
    let x = args[0].as_scalar(line)?;
    if x == 0.0 || is_na(x) {
        return Err(RuntimeError::AssertionFailed { line });
    }
    Ok(Value::Null)
}
