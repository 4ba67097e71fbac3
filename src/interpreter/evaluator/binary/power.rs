use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::core::{Context, EvalResult},
        value::{core::Value, matrix::Matrix},
    },
    util::num::f64_to_i64_checked,
};

impl Context {
    /// Raises a square matrix to an integer power.
    ///
    /// Uses exponentiation by squaring. A zero power gives the identity and a
    /// negative power inverts first.
    ///
    /// # Parameters
    /// - `m`: The square base matrix.
    /// - `k`: The exponent, which must be integral.
    /// - `line`: Line number for error reporting.
    ///
    /// # Errors
    /// Returns `RuntimeError::Singular` for a negative power of a singular
    /// matrix.
    ///
    /// # Example
    /// ```
    /// use genr::interpreter::{
    ///     evaluator::core::Context,
    ///     value::{core::Value, matrix::Matrix},
    /// };
    ///
    /// let mut ctx = Context::new();
    /// let m = Matrix::from_rows(&[vec![1.0, 1.0], vec![0.0, 1.0]]).unwrap();
    ///
    /// let Value::Matrix(p) = ctx.eval_matrix_power(&m, 3.0, 1).unwrap() else {
    ///     panic!("expected a matrix");
    /// };
    /// assert_eq!(p.get(0, 1), 3.0);
    /// ```
    pub fn eval_matrix_power(&mut self, m: &Matrix, k: f64, line: usize) -> EvalResult<Value> {
        let k = f64_to_i64_checked(k, line)?;
        let mut base = if k < 0 {
            m.inverse().ok_or(RuntimeError::Singular { line })?
        } else {
            m.clone()
        };
        base.rownames = None;
        base.colnames = None;
        base.obs = None;

        let mut result = Matrix::identity(m.rows());
        let mut e = k.unsigned_abs();
        while e > 0 {
            if e & 1 == 1 {
                result = result.matmul(&base)
                               .ok_or_else(|| RuntimeError::nonconformable("matrix power", line))?;
            }
            e >>= 1;
            if e > 0 {
                base = base.matmul(&base)
                           .ok_or_else(|| RuntimeError::nonconformable("matrix power", line))?;
            }
        }
        Ok(Value::Matrix(self.aux.adopt_matrix(result)))
    }
}
