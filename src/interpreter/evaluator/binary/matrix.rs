use std::rc::Rc;

use crate::{
    ast::BinaryOperator,
    error::RuntimeError,
    interpreter::{
        evaluator::{
            binary::scalar::cell_op,
            core::{Context, EvalResult},
        },
        value::{core::Value, matrix::Matrix},
    },
    util::num::truth,
};

impl Context {
    /// Evaluates a binary operation with at least one matrix operand, or a
    /// concatenation of numeric operands.
    ///
    /// Scalars become 1 x 1 matrices and series become columns over the
    /// current sample before the operator is applied. Then:
    /// - `+ - % .* ./ .^` work element-wise on equal shapes, or broadcast a
    ///   1 x 1 operand,
    /// - `*` is the matrix product, or scaling when either side is 1 x 1,
    /// - `/` and `\` are right and left division, or element-wise division
    ///   when either side is 1 x 1,
    /// - `^` raises a square matrix to an integer scalar power, and is
    ///   element-wise otherwise,
    /// - `~` and `|` concatenate horizontally and vertically,
    /// - comparisons yield a scalar that is 1 only if the comparison holds
    ///   for every element,
    /// - `&&` and `||` yield an element-wise 0/1 matrix.
    ///
    /// # Errors
    /// Returns `RuntimeError::Nonconformable` for incompatible shapes and
    /// `RuntimeError::Singular` when a division needs to invert a singular
    /// matrix.
    ///
    /// # Example
    /// ```
    /// use genr::{
    ///     ast::BinaryOperator,
    ///     error::RuntimeError,
    ///     interpreter::{
    ///         evaluator::core::Context,
    ///         value::{core::Value, matrix::Matrix},
    ///     },
    /// };
    ///
    /// let mut ctx = Context::new();
    /// let a = Value::from(Matrix::zeros(2, 3));
    /// let b = Value::from(Matrix::zeros(3, 2));
    ///
    /// let Value::Matrix(p) = ctx.eval_matrix_op(BinaryOperator::Mul, &a, &b, 1).unwrap() else {
    ///     panic!("expected a matrix");
    /// };
    /// assert_eq!((p.rows(), p.cols()), (2, 2));
    ///
    /// let err = ctx.eval_matrix_op(BinaryOperator::Add, &a, &b, 1).unwrap_err();
    /// assert!(matches!(err, RuntimeError::Nonconformable { .. }));
    /// ```
    #[allow(clippy::float_cmp)]
    pub fn eval_matrix_op(&mut self,
                          op: BinaryOperator,
                          left: &Value,
                          right: &Value,
                          line: usize)
                          -> EvalResult<Value> {
        use BinaryOperator::{
            Add, And, Div, DotDiv, DotMul, DotPow, Equal, Greater, GreaterEqual, HCat, LDiv, Less,
            LessEqual, Mod, Mul, NotEqual, Or, Pow, Sub, VCat,
        };

        if op == Pow
           && let (Value::Matrix(m), Value::Scalar(k)) = (left, right)
           && m.is_square()
           && !m.is_scalar()
           && k.fract() == 0.0
        {
            return self.eval_matrix_power(m, *k, line);
        }

        let a = self.value_to_matrix(left, line)?;
        let b = self.value_to_matrix(right, line)?;
        let either_scalar = a.is_scalar() || b.is_scalar();

        let result = match op {
            HCat => self.adopt(a.hcat(&b), op, &a, &b, line)?,
            VCat => self.adopt(a.vcat(&b), op, &a, &b, line)?,
            Mul if !either_scalar => self.adopt(a.matmul(&b), op, &a, &b, line)?,
            Div if !either_scalar => self.right_divide(&a, &b, line)?,
            LDiv if !either_scalar => self.left_divide(&a, &b, line)?,
            Less | Greater | LessEqual | GreaterEqual | Equal | NotEqual => {
                let cmp = self.elementwise(op, &a, &b, line)?;
                return Ok(Value::Scalar(truth(cmp.data().iter().all(|&x| x == 1.0))));
            },
            Add | Sub | Mul | Div | LDiv | Mod | Pow | DotMul | DotDiv | DotPow | And | Or => {
                self.elementwise(op, &a, &b, line)?
            },
        };
        Ok(Value::Matrix(result))
    }

    /// Applies `op` cell by cell, broadcasting a 1 x 1 operand.
    ///
    /// The result keeps the observation range of an operand of the same
    /// shape.
    fn elementwise(&mut self,
                   op: BinaryOperator,
                   a: &Rc<Matrix>,
                   b: &Rc<Matrix>,
                   line: usize)
                   -> EvalResult<Rc<Matrix>> {
        let (rows, cols) = if a.rows() == b.rows() && a.cols() == b.cols() {
            (a.rows(), a.cols())
        } else if a.is_scalar() {
            (b.rows(), b.cols())
        } else if b.is_scalar() {
            (a.rows(), a.cols())
        } else {
            return Err(mismatch(op, a, b, line));
        };
        let obs = [a, b].iter()
                        .find(|m| m.rows() == rows && m.cols() == cols)
                        .and_then(|m| m.obs);
        let cell = |m: &Matrix, i: usize, j: usize| {
            if m.is_scalar() { m.get(0, 0) } else { m.get(i, j) }
        };
        Ok(self.aux.fill_matrix(rows, cols, |out| {
                       for j in 0..cols {
                           for i in 0..rows {
                               out.set(i, j, cell_op(op, cell(a, i, j), cell(b, i, j)));
                           }
                       }
                       out.obs = obs;
                   }))
    }

    fn adopt(&mut self,
             m: Option<Matrix>,
             op: BinaryOperator,
             a: &Matrix,
             b: &Matrix,
             line: usize)
             -> EvalResult<Rc<Matrix>> {
        m.map(|m| self.aux.adopt_matrix(m))
         .ok_or_else(|| mismatch(op, a, b, line))
    }

    /// `A / B`, solving `X * B = A`.
    fn right_divide(&mut self, a: &Matrix, b: &Matrix, line: usize) -> EvalResult<Rc<Matrix>> {
        if !b.is_square() || a.cols() != b.rows() {
            return Err(mismatch(BinaryOperator::Div, a, b, line));
        }
        let x = b.transpose()
                 .solve(&a.transpose())
                 .ok_or(RuntimeError::Singular { line })?;
        Ok(self.aux.adopt_matrix(x.transpose()))
    }

    /// `A \ B`, solving `A * X = B`.
    fn left_divide(&mut self, a: &Matrix, b: &Matrix, line: usize) -> EvalResult<Rc<Matrix>> {
        if !a.is_square() || a.rows() != b.rows() {
            return Err(mismatch(BinaryOperator::LDiv, a, b, line));
        }
        let x = a.solve(b).ok_or(RuntimeError::Singular { line })?;
        Ok(self.aux.adopt_matrix(x))
    }
}

fn mismatch(op: BinaryOperator, a: &Matrix, b: &Matrix, line: usize) -> RuntimeError {
    RuntimeError::nonconformable(format!("'{op}' on {} x {} and {} x {}",
                                         a.rows(),
                                         a.cols(),
                                         b.rows(),
                                         b.cols()),
                                 line)
}
