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
    util::num::matrix_to_na,
};

impl Context {
    /// Evaluates a binary operation between two values.
    ///
    /// This function routes the operation to specialized handlers depending on
    /// the operand kinds:
    /// - strings go to `eval_string_op`, bundles to `eval_bundle_op`,
    /// - two lists go to `eval_list_list`; a list against a scalar or series
    ///   is a comparison handled by `eval_list_compare`,
    /// - scalars and series combine element-wise through `eval_series_op`,
    /// - anything involving a matrix, and all concatenation, goes to
    ///   `eval_matrix_op`. A 1 x 1 matrix meeting a series acts as a scalar.
    ///
    /// # Parameters
    /// - `op`: The operator.
    /// - `left`: Left operand.
    /// - `right`: Right operand.
    /// - `line`: Line number for error reporting.
    ///
    /// # Returns
    /// An `EvalResult<Value>` containing the evaluated result.
    ///
    /// # Example
    /// ```
    /// use genr::{
    ///     ast::BinaryOperator,
    ///     interpreter::{evaluator::core::Context, value::core::Value},
    /// };
    ///
    /// let mut context = Context::new();
    /// let left = Value::Scalar(3.0);
    /// let right = Value::Scalar(4.0);
    ///
    /// let result = context.eval_binary(BinaryOperator::Add, &left, &right, 1);
    /// assert_eq!(result.unwrap(), Value::Scalar(7.0));
    /// ```
    pub fn eval_binary(&mut self,
                       op: BinaryOperator,
                       left: &Value,
                       right: &Value,
                       line: usize)
                       -> EvalResult<Value> {
        use Value::{Bundle, List, Matrix, Null, Scalar, Series, Str};

        match (left, right) {
            (Null, _) | (_, Null) => Err(RuntimeError::type_error(format!("cannot apply \
                                                                           '{op}' to null"),
                                                                  line)),
            (Str(_), _) | (_, Str(_)) => Self::eval_string_op(op, left, right, line),
            (Bundle(a), Bundle(b)) => Self::eval_bundle_op(op, a, b, line),
            (Bundle(_), _) | (_, Bundle(_)) => {
                Err(RuntimeError::type_error(format!("cannot apply '{op}' to {} and {}",
                                                     left.type_name(),
                                                     right.type_name()),
                                             line))
            },
            (List(a), List(b)) => Self::eval_list_list(op, a, b, line),
            (List(l), other) => self.eval_list_compare(op, l, other, line),
            (other, List(l)) => self.eval_list_compare(op.flipped(), l, other, line),
            (Scalar(a), Scalar(b)) if !is_concat(op) => Ok(Scalar(scalar_op(op, *a, *b))),
            (Series(_), Matrix(m)) if m.is_scalar() && !is_concat(op) => {
                self.eval_series_op(op, left, &Scalar(matrix_to_na(m.get(0, 0))), line)
            },
            (Matrix(m), Series(_)) if m.is_scalar() && !is_concat(op) => {
                self.eval_series_op(op, &Scalar(matrix_to_na(m.get(0, 0))), right, line)
            },
            (Scalar(_) | Series(_), Scalar(_) | Series(_)) if !is_concat(op) => {
                self.eval_series_op(op, left, right, line)
            },
            _ => self.eval_matrix_op(op, left, right, line),
        }
    }
}

/// `true` for `~` and `|`, which always build matrices from numeric
/// operands.
const fn is_concat(op: BinaryOperator) -> bool {
    matches!(op, BinaryOperator::HCat | BinaryOperator::VCat)
}
