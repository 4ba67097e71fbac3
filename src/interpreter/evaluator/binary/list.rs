use std::rc::Rc;

use crate::{
    ast::BinaryOperator,
    error::RuntimeError,
    interpreter::{
        evaluator::{
            binary::{scalar::scalar_op, series::Operand},
            core::{Context, EvalResult},
        },
        value::core::Value,
    },
    util::num::{NADBL, is_na, matrix_to_na},
};

impl Context {
    /// Combines two lists as sets of series, keeping the order of the left
    /// operand.
    ///
    /// - `||`: union, the left members followed by new right members,
    /// - `&&`: intersection,
    /// - `-`: difference.
    ///
    /// # Errors
    /// Returns a type error for any other operator.
    ///
    /// # Example
    /// ```
    /// use std::rc::Rc;
    ///
    /// use genr::{
    ///     ast::BinaryOperator,
    ///     interpreter::{evaluator::core::Context, value::core::Value},
    /// };
    ///
    /// let a = Rc::new(vec![1, 2, 3]);
    /// let b = Rc::new(vec![3, 4]);
    ///
    /// let union = Context::eval_list_list(BinaryOperator::Or, &a, &b, 1).unwrap();
    /// assert_eq!(union, Value::List(Rc::new(vec![1, 2, 3, 4])));
    ///
    /// let diff = Context::eval_list_list(BinaryOperator::Sub, &a, &b, 1).unwrap();
    /// assert_eq!(diff, Value::List(Rc::new(vec![1, 2])));
    /// ```
    pub fn eval_list_list(op: BinaryOperator,
                          a: &[usize],
                          b: &[usize],
                          line: usize)
                          -> EvalResult<Value> {
        let members: Vec<usize> = match op {
            BinaryOperator::Or => {
                let mut out = a.to_vec();
                out.extend(b.iter().filter(|id| !a.contains(id)));
                out
            },
            BinaryOperator::And => a.iter().copied().filter(|id| b.contains(id)).collect(),
            BinaryOperator::Sub => a.iter().copied().filter(|id| !b.contains(id)).collect(),
            _ => {
                return Err(RuntimeError::type_error(format!("'{op}' is not defined for lists"),
                                                    line));
            },
        };
        Ok(Value::List(Rc::new(members)))
    }

    /// Compares every member of a list with a scalar or series.
    ///
    /// The result is a series that is 1 where the comparison holds for all
    /// members, 0 where some member fails it, and missing where a member is
    /// missing before any member has failed. Members are checked in list
    /// order and checking stops at the first failure.
    ///
    /// # Errors
    /// Returns a type error for a non-comparison operator or an operand that
    /// is not a scalar or series.
    #[allow(clippy::float_cmp)]
    pub(crate) fn eval_list_compare(&mut self,
                                    op: BinaryOperator,
                                    list: &[usize],
                                    other: &Value,
                                    line: usize)
                                    -> EvalResult<Value> {
        if !op.is_comparison() {
            return Err(RuntimeError::type_error(format!("'{op}' cannot combine a list with a {}",
                                                        other.type_name()),
                                                line));
        }
        let other = match other {
            Value::Matrix(m) if m.is_scalar() => Operand::Const(matrix_to_na(m.get(0, 0))),
            v => Operand::from_value(v, line)?,
        };
        let members = list.iter()
                          .map(|&id| {
                              self.dataset.data(id).ok_or_else(|| {
                                                       RuntimeError::InvalidArgument {
                                    details: format!("list member {id} no longer exists"),
                                    line,
                                }
                                                   })
                          })
                          .collect::<EvalResult<Vec<_>>>()?;

        self.series_from_fn(line, |t| {
                let rhs = other.at(t);
                for data in &members {
                    let v = scalar_op(op, data.get(t).copied().unwrap_or(NADBL), rhs);
                    if is_na(v) {
                        return NADBL;
                    }
                    if v == 0.0 {
                        return 0.0;
                    }
                }
                1.0
            })
    }
}
