use std::rc::Rc;

use crate::{
    ast::BinaryOperator,
    error::RuntimeError,
    interpreter::{
        evaluator::{
            binary::scalar::scalar_op,
            core::{Context, EvalResult},
        },
        value::core::Value,
    },
    util::num::NADBL,
};

/// A scalar or series operand, readable at any observation.
#[derive(Debug, Clone)]
pub enum Operand {
    /// The same value at every observation.
    Const(f64),
    /// One value per observation.
    Data(Rc<Vec<f64>>),
}

impl Operand {
    /// Wraps a scalar or series value.
    ///
    /// # Errors
    /// Returns a type error for any other kind.
    pub fn from_value(value: &Value, line: usize) -> EvalResult<Self> {
        match value {
            Value::Scalar(x) => Ok(Self::Const(*x)),
            Value::Series(s) => Ok(Self::Data(Rc::clone(&s.data))),
            other => Err(RuntimeError::type_error(format!("expected a scalar or series, found \
                                                           {}",
                                                          other.type_name()),
                                                  line)),
        }
    }

    /// The value at observation `t`.
    #[must_use]
    pub fn at(&self, t: usize) -> f64 {
        match self {
            Self::Const(x) => *x,
            Self::Data(d) => d.get(t).copied().unwrap_or(NADBL),
        }
    }
}

impl Context {
    /// Applies `op` observation by observation to scalar and series
    /// operands, over the current sample (or the current observation in
    /// autoregressive mode).
    ///
    /// # Errors
    /// Returns `RuntimeError::NoData` without a dataset.
    pub(crate) fn eval_series_op(&mut self,
                                 op: BinaryOperator,
                                 left: &Value,
                                 right: &Value,
                                 line: usize)
                                 -> EvalResult<Value> {
        let a = Operand::from_value(left, line)?;
        let b = Operand::from_value(right, line)?;
        self.series_from_fn(line, |t| scalar_op(op, a.at(t), b.at(t)))
    }
}
