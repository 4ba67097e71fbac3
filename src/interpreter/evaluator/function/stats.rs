use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::core::{Context, EvalResult},
        value::{core::Value, matrix::Matrix},
    },
    util::num::{MATRIX_NA, NADBL, count_to_f64, f64_to_i64_checked, is_na, obs_at},
};

/// A summary statistic computed over the valid (non-missing) values of its
/// argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Summary {
    /// Sum of the values.
    Sum,
    /// Arithmetic mean.
    Mean,
    /// Sample standard deviation.
    Sd,
    /// Sample variance, with `n - 1` in the denominator.
    Var,
    /// Smallest value.
    Min,
    /// Largest value.
    Max,
    /// Number of valid values.
    Count,
}

impl Summary {
    /// Computes the statistic. Returns the missing value if there are too
    /// few observations, except for `Count`, which is then zero.
    ///
    /// # Example
    /// ```
    /// use genr::{interpreter::evaluator::function::stats::Summary, util::num::NADBL};
    ///
    /// assert_eq!(Summary::Mean.compute(&[1.0, 2.0, 3.0]), 2.0);
    /// assert_eq!(Summary::Var.compute(&[1.0, 2.0, 3.0]), 1.0);
    /// assert_eq!(Summary::Var.compute(&[1.0]), NADBL);
    /// assert_eq!(Summary::Count.compute(&[]), 0.0);
    /// ```
    #[must_use]
    pub fn compute(self, values: &[f64]) -> f64 {
        let n = count_to_f64(values.len());
        if self == Self::Count {
            return n;
        }
        if values.is_empty() {
            return NADBL;
        }
        let sum: f64 = values.iter().sum();
        match self {
            Self::Sum => sum,
            Self::Mean => sum / n,
            Self::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Self::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Self::Var | Self::Sd => {
                if values.len() < 2 {
                    return NADBL;
                }
                let mean = sum / n;
                let var = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
                if self == Self::Sd { var.sqrt() } else { var }
            },
            Self::Count => n,
        }
    }
}

/// Computes a summary statistic of a scalar, a series or a matrix.
///
/// A series contributes the observations of the current sample, a matrix
/// all of its cells. Missing values are skipped.
///
/// # Errors
/// A type error for non-numeric arguments.
///
/// # Example
/// ```
/// use genr::{interpreter::{evaluator::core::Context, value::core::Value}, run_with_context};
///
/// let mut ctx = Context::with_observations(4);
/// run_with_context(&mut ctx, "series x = {1; 2; 3; 4}\nscalar m = mean(x)").unwrap();
///
/// assert_eq!(ctx.store.lookup("m", 0), Some(&Value::Scalar(2.5)));
/// ```
pub fn summary(ctx: &mut Context,
               args: &[Value],
               line: usize,
               stat: Summary)
               -> EvalResult<Value> {
    let values: Vec<f64> = match &args[0] {
        Value::Scalar(x) => vec![*x],
        Value::Series(s) => s.data
                              .get(ctx.dataset.t1()..=ctx.dataset.t2())
                              .map(<[f64]>::to_vec)
                              .unwrap_or_default(),
        Value::Matrix(m) => m.data().to_vec(),
        other => {
            return Err(RuntimeError::type_error(format!("cannot summarize a {}",
                                                        other.type_name()),
                                                line));
        },
    };
    let valid: Vec<f64> = values.into_iter().filter(|&x| !is_na(x)).collect();
    Ok(Value::Scalar(stat.compute(&valid)))
}

/// Reads `data[t + offset]`, or the missing value if that falls outside the
/// dataset.
#[must_use]
pub(crate) fn shifted(data: &[f64], t: usize, offset: i64) -> f64 {
    i64::try_from(t).ok()
                    .and_then(|t| t.checked_add(offset))
                    .and_then(|s| usize::try_from(s).ok())
                    .and_then(|s| data.get(s).copied())
                    .unwrap_or(NADBL)
}

/// First difference.
///
/// For a series, `x[t] - x[t-1]`, missing at the first observation of the
/// dataset. For a matrix, the difference between consecutive rows; the first
/// row is missing.
pub fn diff(ctx: &mut Context, args: &[Value], line: usize) -> EvalResult<Value> {
    match &args[0] {
        Value::Series(s) => {
            let data = s.data.clone();
            ctx.series_from_fn(line, |t| {
                   let (x, prev) = (obs_at(&data, t), shifted(&data, t, -1));
                   if is_na(x) || is_na(prev) { NADBL } else { x - prev }
               })
        },
        Value::Matrix(m) => {
            let m = m.clone();
            Ok(Value::Matrix(ctx.matrix_from_fn(m.rows(), m.cols(), |i, j| {
                                    if i == 0 { MATRIX_NA } else { m.get(i, j) - m.get(i - 1, j) }
                                })))
        },
        other => Err(RuntimeError::type_error(format!("cannot difference a {}",
                                                      other.type_name()),
                                              line)),
    }
}

/// Cumulative sum.
///
/// A series accumulates from the start of the current sample; once a
/// missing value is met the rest of the result is missing. A matrix
/// accumulates down each column.
pub fn cum(ctx: &mut Context, args: &[Value], line: usize) -> EvalResult<Value> {
    match &args[0] {
        Value::Series(s) => {
            let (t1, t2) = (ctx.dataset.t1(), ctx.dataset.t2());
            let mut running = vec![NADBL; ctx.dataset.n()];
            let mut acc = 0.0;
            for t in t1..=t2 {
                let x = obs_at(&s.data, t);
                if is_na(x) || is_na(acc) {
                    acc = NADBL;
                } else {
                    acc += x;
                }
                running[t] = acc;
            }
            ctx.series_from_fn(line, |t| obs_at(&running, t))
        },
        Value::Matrix(m) => {
            let mut out = Matrix::zeros(m.rows(), m.cols());
            for j in 0..m.cols() {
                let mut acc = 0.0;
                for i in 0..m.rows() {
                    acc += m.get(i, j);
                    out.set(i, j, acc);
                }
            }
            Ok(Value::Matrix(ctx.aux.adopt_matrix(out)))
        },
        other => Err(RuntimeError::type_error(format!("cannot accumulate a {}",
                                                      other.type_name()),
                                              line)),
    }
}

/// `lag(x, k)`: the series `x` shifted `k` observations into the future, so
/// that observation `t` holds `x[t-k]`. `k` defaults to 1 and may be
/// negative (a lead).
pub fn lag(ctx: &mut Context, args: &[Value], line: usize) -> EvalResult<Value> {
    let Value::Series(s) = &args[0] else {
        return Err(RuntimeError::type_error("lag() needs a series", line));
    };
    let k = match args.get(1) {
        Some(k) => f64_to_i64_checked(k.as_scalar(line)?, line)?,
        None => 1,
    };
    let data = s.data.clone();
    ctx.series_from_fn(line, |t| shifted(&data, t, -k))
}
