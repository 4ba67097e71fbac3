use crate::{
    ast::BinaryOperator,
    error::RuntimeError,
    interpreter::{
        evaluator::core::{Context, EvalResult},
        value::core::Value,
    },
    util::num::{f64_to_i64_checked, truth},
};

impl Context {
    /// Evaluates a binary operation with a string operand.
    ///
    /// - `s ~ t` concatenates,
    /// - `s == t` and `s != t` compare,
    /// - `s + n` skips the first `n` characters of `s`.
    ///
    /// # Errors
    /// Returns a type error for any other combination, and an invalid
    /// argument error for a negative offset.
    ///
    /// # Example
    /// ```
    /// use genr::{
    ///     ast::BinaryOperator,
    ///     interpreter::{evaluator::core::Context, value::core::Value},
    /// };
    ///
    /// let s = Value::from("genr");
    /// let joined = Context::eval_string_op(BinaryOperator::HCat, &s, &Value::from("!"), 1);
    /// assert_eq!(joined.unwrap(), Value::from("genr!"));
    ///
    /// let tail = Context::eval_string_op(BinaryOperator::Add, &s, &Value::Scalar(2.0), 1);
    /// assert_eq!(tail.unwrap(), Value::from("nr"));
    /// ```
    pub fn eval_string_op(op: BinaryOperator,
                          left: &Value,
                          right: &Value,
                          line: usize)
                          -> EvalResult<Value> {
        match (op, left, right) {
            (BinaryOperator::HCat, Value::Str(a), Value::Str(b)) => {
                Ok(Value::from(format!("{a}{b}")))
            },
            (BinaryOperator::Equal, Value::Str(a), Value::Str(b)) => Ok(Value::Scalar(truth(a == b))),
            (BinaryOperator::NotEqual, Value::Str(a), Value::Str(b)) => {
                Ok(Value::Scalar(truth(a != b)))
            },
            (BinaryOperator::Add, Value::Str(s), Value::Scalar(n)) => {
                let skip = usize::try_from(f64_to_i64_checked(*n, line)?).map_err(|_| {
                               RuntimeError::InvalidArgument { details:
                                                                   "string offset must not be \
                                                                    negative"
                                                                            .to_string(),
                                                               line }
                           })?;
                Ok(Value::from(s.chars().skip(skip).collect::<String>()))
            },
            _ => Err(RuntimeError::type_error(format!("cannot apply '{op}' to {} and {}",
                                                      left.type_name(),
                                                      right.type_name()),
                                              line)),
        }
    }
}
