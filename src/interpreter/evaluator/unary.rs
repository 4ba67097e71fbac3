use std::rc::Rc;

use crate::{
    ast::{Expr, UnaryOperator},
    error::RuntimeError,
    interpreter::{
        evaluator::core::{Context, EvalResult},
        value::core::Value,
    },
    util::num::{NADBL, is_na, truth},
};

/// Applies a unary operator to one scalar, propagating NA.
///
/// # Example
/// ```
/// use genr::{ast::UnaryOperator, interpreter::evaluator::unary::scalar_unary, util::num::NADBL};
///
/// assert_eq!(scalar_unary(UnaryOperator::Negate, 2.0), -2.0);
/// assert_eq!(scalar_unary(UnaryOperator::Not, 0.0), 1.0);
/// assert_eq!(scalar_unary(UnaryOperator::Not, NADBL), NADBL);
/// ```
#[must_use]
#[allow(clippy::float_cmp)]
pub fn scalar_unary(op: UnaryOperator, x: f64) -> f64 {
    if is_na(x) {
        return NADBL;
    }
    match op {
        UnaryOperator::Negate => -x,
        UnaryOperator::Plus => x,
        UnaryOperator::Not => truth(x == 0.0),
    }
}

/// The matrix version of [`scalar_unary`]: `NaN` stays `NaN`.
#[allow(clippy::float_cmp)]
fn cell_unary(op: UnaryOperator, x: f64) -> f64 {
    match op {
        UnaryOperator::Negate => -x,
        UnaryOperator::Plus => x,
        UnaryOperator::Not if x.is_nan() => x,
        UnaryOperator::Not => truth(x == 0.0),
    }
}

impl Context {
    /// Evaluates the operand and applies a unary operator to it.
    ///
    /// Scalars and series follow the missing-value rules of
    /// [`scalar_unary`]; matrices are handled cell by cell.
    ///
    /// # Errors
    /// Returns a type error for strings, lists, bundles and null.
    pub(crate) fn eval_unary_op(&mut self,
                                op: UnaryOperator,
                                expr: &Expr,
                                line: usize)
                                -> EvalResult<Value> {
        let value = self.eval(expr)?;
        self.eval_unary(op, &value, line)
    }

    /// Applies a unary operator to an evaluated value.
    ///
    /// # Example
    /// ```
    /// use genr::{
    ///     ast::UnaryOperator,
    ///     interpreter::{evaluator::core::Context, value::core::Value},
    /// };
    ///
    /// let mut ctx = Context::new();
    /// let v = ctx.eval_unary(UnaryOperator::Negate, &Value::Scalar(5.0), 1).unwrap();
    /// assert_eq!(v, Value::Scalar(-5.0));
    ///
    /// assert!(ctx.eval_unary(UnaryOperator::Not, &Value::from("s"), 1).is_err());
    /// ```
    pub fn eval_unary(&mut self, op: UnaryOperator, value: &Value, line: usize) -> EvalResult<Value> {
        match value {
            Value::Scalar(x) => Ok(Value::Scalar(scalar_unary(op, *x))),
            Value::Series(s) => {
                let data = Rc::clone(&s.data);
                self.series_from_fn(line, |t| scalar_unary(op, data.get(t).copied().unwrap_or(NADBL)))
            },
            Value::Matrix(m) => {
                let m = Rc::clone(m);
                let out = self.aux.fill_matrix(m.rows(), m.cols(), |out| {
                                      for (dst, &src) in out.data_mut().iter_mut().zip(m.data()) {
                                          *dst = cell_unary(op, src);
                                      }
                                      out.obs = m.obs;
                                  });
                Ok(Value::Matrix(out))
            },
            other => Err(RuntimeError::type_error(format!("unary operator not defined for {}",
                                                          other.type_name()),
                                                  line)),
        }
    }

    /// Evaluates a postfix transpose `A'`.
    ///
    /// A scalar is its own transpose; a series is first cast to a column
    /// over the sample, giving a row vector.
    ///
    /// # Errors
    /// Returns a type error for non-numeric operands.
    pub(crate) fn eval_transpose(&mut self, expr: &Expr, line: usize) -> EvalResult<Value> {
        let value = self.eval(expr)?;
        if let Value::Scalar(_) = value {
            return Ok(value);
        }
        let m = self.value_to_matrix(&value, line)?;
        Ok(Value::Matrix(self.aux.adopt_matrix(m.transpose())))
    }
}
