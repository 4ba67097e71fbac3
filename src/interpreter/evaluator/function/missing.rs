use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::core::{Context, EvalResult},
        value::core::Value,
    },
    util::num::{MATRIX_NA, NADBL, is_na, obs_at, truth},
};

/// Maps every element through `f`, which also receives the missing-value
/// marker of the argument's kind: [`NADBL`] for scalars and series,
/// [`MATRIX_NA`] for matrices.
fn map_marked(ctx: &mut Context,
              args: &[Value],
              line: usize,
              f: fn(f64, f64) -> f64)
              -> EvalResult<Value> {
    match &args[0] {
        Value::Scalar(x) => Ok(Value::Scalar(f(*x, NADBL))),
        Value::Series(s) => {
            let data = s.data.clone();
            ctx.series_from_fn(line, |t| f(obs_at(&data, t), NADBL))
        },
        Value::Matrix(m) => {
            let m = m.clone();
            Ok(Value::Matrix(ctx.matrix_from_fn(m.rows(), m.cols(), |i, j| {
                                    f(m.get(i, j), MATRIX_NA)
                                })))
        },
        other => Err(RuntimeError::type_error(format!("expected a number, found {}",
                                                      other.type_name()),
                                              line)),
    }
}

/// `1` where the argument is missing, `0` elsewhere.
///
/// # Example
/// ```
/// use genr::{interpreter::{evaluator::{core::Context, function::missing::missing},
///                          value::core::Value},
///            util::num::NADBL};
///
/// let mut ctx = Context::new();
/// assert_eq!(missing(&mut ctx, &[Value::Scalar(NADBL)], 1).unwrap(), Value::Scalar(1.0));
/// assert_eq!(missing(&mut ctx, &[Value::Scalar(3.0)], 1).unwrap(), Value::Scalar(0.0));
/// ```
pub fn missing(ctx: &mut Context, args: &[Value], line: usize) -> EvalResult<Value> {
    map_marked(ctx, args, line, |x, _| truth(is_na(x)))
}

/// `1` where the argument is present, `0` where it is missing.
pub fn ok(ctx: &mut Context, args: &[Value], line: usize) -> EvalResult<Value> {
    map_marked(ctx, args, line, |x, _| truth(!is_na(x)))
}

/// Replaces missing values with zero.
pub fn misszero(ctx: &mut Context, args: &[Value], line: usize) -> EvalResult<Value> {
    map_marked(ctx, args, line, |x, _| if is_na(x) { 0.0 } else { x })
}

/// Replaces zeros with the missing value.
#[allow(clippy::float_cmp)]
pub fn zeromiss(ctx: &mut Context, args: &[Value], line: usize) -> EvalResult<Value> {
    map_marked(ctx, args, line, |x, na| if x == 0.0 { na } else { x })
}
