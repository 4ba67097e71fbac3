use std::ops::RangeInclusive;

use crate::{
    ast::{BinaryOperator, Expr},
    error::RuntimeError,
    interpreter::{
        evaluator::{
            core::{Context, EvalResult},
            utils::value_at,
        },
        value::core::Value,
    },
    util::num::{NADBL, is_na, matrix_to_na, obs_at},
};

/// Which branches of a conditional have to be evaluated.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Branch {
    /// Only the `then` branch.
    Then,
    /// Only the `else` branch.
    Else,
    /// Both, combined observation by observation.
    Both,
    /// Neither: the condition is a missing scalar, so the result is missing.
    Missing,
}

/// Decides whether the right operand of `&&` or `||` can be skipped.
///
/// Returns the result of the whole operation when the left operand alone
/// determines it: a scalar zero for `&&`, or a non-missing nonzero scalar
/// for `||`. In every other case the right operand must be evaluated.
///
/// # Example
/// ```
/// use genr::{
///     ast::BinaryOperator,
///     interpreter::{evaluator::lazy::short_circuit, value::core::Value},
///     util::num::NADBL,
/// };
///
/// assert_eq!(short_circuit(BinaryOperator::And, &Value::Scalar(0.0)), Some(0.0));
/// assert_eq!(short_circuit(BinaryOperator::Or, &Value::Scalar(2.0)), Some(1.0));
/// assert_eq!(short_circuit(BinaryOperator::Or, &Value::Scalar(NADBL)), None);
/// assert_eq!(short_circuit(BinaryOperator::Add, &Value::Scalar(0.0)), None);
/// ```
#[must_use]
#[allow(clippy::float_cmp)]
pub fn short_circuit(op: BinaryOperator, left: &Value) -> Option<f64> {
    let Value::Scalar(x) = left else {
        return None;
    };
    if is_na(*x) {
        return None;
    }
    match op {
        BinaryOperator::And if *x == 0.0 => Some(0.0),
        BinaryOperator::Or if *x != 0.0 => Some(1.0),
        _ => None,
    }
}

/// Decides which branches of `cond ? a : b` must be evaluated.
///
/// A scalar condition selects exactly one branch, or none when it is
/// missing. A series condition that is nonzero at every observation of
/// `range` selects the `then` branch alone, one that is zero throughout
/// selects the `else` branch alone, and anything else (including any
/// missing observation) needs both.
///
/// # Errors
/// Returns a type error if the condition is not a scalar, a series or a
/// 1 x 1 matrix.
///
/// # Example
/// ```
/// use std::rc::Rc;
///
/// use genr::interpreter::{
///     evaluator::lazy::{Branch, ternary_branch},
///     value::core::{Series, Value},
/// };
///
/// let cond = Value::Series(Series::temporary(Rc::new(vec![1.0, 0.0, 1.0])));
///
/// assert_eq!(ternary_branch(&cond, 0..=2, 1).unwrap(), Branch::Both);
/// assert_eq!(ternary_branch(&cond, 2..=2, 1).unwrap(), Branch::Then);
/// assert_eq!(ternary_branch(&cond, 1..=1, 1).unwrap(), Branch::Else);
/// ```
#[allow(clippy::float_cmp)]
pub fn ternary_branch(cond: &Value,
                      range: RangeInclusive<usize>,
                      line: usize)
                      -> EvalResult<Branch> {
    let scalar = |x: f64| {
        if is_na(x) {
            Branch::Missing
        } else if x != 0.0 {
            Branch::Then
        } else {
            Branch::Else
        }
    };
    match cond {
        Value::Scalar(x) => Ok(scalar(*x)),
        Value::Matrix(m) if m.is_scalar() => Ok(scalar(matrix_to_na(m.get(0, 0)))),
        Value::Series(s) => {
            let mut all_true = true;
            let mut all_false = true;
            for t in range {
                let x = s.data.get(t).copied().unwrap_or(NADBL);
                if is_na(x) {
                    return Ok(Branch::Both);
                }
                if x == 0.0 {
                    all_true = false;
                } else {
                    all_false = false;
                }
            }
            Ok(match (all_true, all_false) {
                   (true, _) => Branch::Then,
                   (false, true) => Branch::Else,
                   (false, false) => Branch::Both,
               })
        },
        other => Err(RuntimeError::type_error(format!("a {} cannot be a condition",
                                                      other.type_name()),
                                              line)),
    }
}

impl Context {
    /// Evaluates `cond ? a : b`, evaluating only the branches that
    /// [`ternary_branch`] says are needed.
    ///
    /// When both are needed the result is a series taking each observation
    /// from the selected branch, and missing where the condition is.
    #[allow(clippy::float_cmp)]
    pub(crate) fn eval_ternary(&mut self,
                               condition: &Expr,
                               then_branch: &Expr,
                               else_branch: &Expr,
                               line: usize)
                               -> EvalResult<Value> {
        let cond = self.eval(condition)?;
        match ternary_branch(&cond, self.obs_range(), line)? {
            Branch::Then => self.eval(then_branch),
            Branch::Else => self.eval(else_branch),
            Branch::Missing => Ok(Value::Scalar(NADBL)),
            Branch::Both => {
                let a = self.eval(then_branch)?;
                let b = self.eval(else_branch)?;
                for branch in [&a, &b] {
                    value_at(branch, 0, line)?;
                }
                let Value::Series(c) = cond else {
                    return Ok(Value::Scalar(NADBL));
                };
                self.series_from_fn(line, |t| {
                        let x = obs_at(&c.data, t);
                        if is_na(x) {
                            NADBL
                        } else if x == 0.0 {
                            value_at(&b, t, line).unwrap_or(NADBL)
                        } else {
                            value_at(&a, t, line).unwrap_or(NADBL)
                        }
                    })
            },
        }
    }

    /// Evaluates a binary operation, skipping the right operand of `&&` and
    /// `||` when the left one already decides the result.
    pub(crate) fn eval_binary_op(&mut self,
                                 left: &Expr,
                                 op: BinaryOperator,
                                 right: &Expr,
                                 line: usize)
                                 -> EvalResult<Value> {
        let lhs = self.eval(left)?;
        if let Some(result) = short_circuit(op, &lhs) {
            return Ok(Value::Scalar(result));
        }
        let rhs = self.eval(right)?;
        self.eval_binary(op, &lhs, &rhs, line)
    }
}
