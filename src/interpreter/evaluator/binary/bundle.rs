use std::rc::Rc;

use crate::{
    ast::BinaryOperator,
    error::RuntimeError,
    interpreter::{
        evaluator::core::{Context, EvalResult},
        value::{bundle::Bundle, core::Value},
    },
};

impl Context {
    /// Evaluates a binary operation on two bundles.
    ///
    /// Only `+` is defined: the union of both, where a key present in both
    /// keeps the left operand's value.
    ///
    /// # Errors
    /// Returns a type error for any other operator.
    pub fn eval_bundle_op(op: BinaryOperator,
                          a: &Bundle,
                          b: &Bundle,
                          line: usize)
                          -> EvalResult<Value> {
        if op != BinaryOperator::Add {
            return Err(RuntimeError::type_error(format!("'{op}' is not defined for bundles"),
                                                line));
        }
        Ok(Value::Bundle(Rc::new(a.union(b))))
    }
}
