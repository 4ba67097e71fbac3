use std::{ops::RangeInclusive, rc::Rc};

use crate::{
    ast::Expr,
    error::RuntimeError,
    interpreter::{
        evaluator::core::{Context, EvalResult},
        value::{
            core::{Series, Value},
            matrix::Matrix,
        },
    },
    util::num::{NADBL, matrix_to_na, na_to_matrix},
};

/// Reserved identifiers that are not builtin function names.
pub const EXTRA_RESERVED: &[&str] = &["const"];

impl Context {
    /// The observations a series operation computes: the current sample, or
    /// only the current observation in autoregressive mode.
    #[must_use]
    pub(crate) fn obs_range(&self) -> RangeInclusive<usize> {
        self.obs
            .map_or_else(|| self.dataset.t1()..=self.dataset.t2(), |t| t..=t)
    }

    /// Builds a series by evaluating `f` at every observation of
    /// [`Context::obs_range`].
    ///
    /// The buffer comes from the auxiliary pool. Outside the range it holds
    /// missing values, except when a reused buffer is refilled for a single
    /// observation, where only that observation is touched.
    ///
    /// # Errors
    /// Returns `RuntimeError::NoData` if the dataset is empty.
    pub(crate) fn series_from_fn(&mut self,
                                 line: usize,
                                 f: impl Fn(usize) -> f64)
                                 -> EvalResult<Value> {
        self.dataset.require_data(line)?;
        let n = self.dataset.n();
        let range = self.obs_range();
        let single = self.obs.is_some();

        let data = self.aux.fill_series(n, |buf, fresh| {
                               if single && !fresh {
                                   for t in range.clone() {
                                       buf[t] = f(t);
                                   }
                                   return;
                               }
                               for (t, x) in buf.iter_mut().enumerate() {
                                   *x = if range.contains(&t) { f(t) } else { NADBL };
                               }
                           });
        Ok(Value::Series(Series::temporary(data)))
    }

    /// A series equal to `x` at every observation in range.
    pub(crate) fn broadcast_series(&mut self, x: f64, line: usize) -> EvalResult<Value> {
        self.series_from_fn(line, |_| x)
    }

    /// Builds a matrix from `f(i, j)` using the auxiliary pool.
    pub(crate) fn matrix_from_fn(&mut self,
                                 rows: usize,
                                 cols: usize,
                                 f: impl Fn(usize, usize) -> f64)
                                 -> Rc<Matrix> {
        self.aux.fill_matrix(rows, cols, |m| {
                    for j in 0..cols {
                        for i in 0..rows {
                            m.set(i, j, f(i, j));
                        }
                    }
                })
    }

    /// [`Context::matrix_from_fn`] for a shape taken from the script.
    ///
    /// # Errors
    /// Returns `RuntimeError::Allocation` if the matrix is too large to
    /// allocate.
    pub(crate) fn try_matrix_from_fn(&mut self,
                                     rows: usize,
                                     cols: usize,
                                     line: usize,
                                     f: impl Fn(usize, usize) -> f64)
                                     -> EvalResult<Rc<Matrix>> {
        self.aux
            .try_fill_matrix(rows, cols, |m| {
                for j in 0..cols {
                    for i in 0..rows {
                        m.set(i, j, f(i, j));
                    }
                }
            })
            .ok_or_else(|| RuntimeError::Allocation { details: format!("a {rows} x {cols} \
                                                                        matrix"),
                                                      line })
    }

    /// Evaluates a matrix literal such as `{1, 2; 3, 4}`.
    ///
    /// Elements may be scalars, matrices or series; the elements of a row
    /// are joined horizontally and the rows vertically, so `{A, B}` places
    /// two matrices side by side.
    ///
    /// # Errors
    /// Returns `RuntimeError::Nonconformable` if the pieces do not fit, or a
    /// type error for strings, lists and bundles.
    ///
    /// # Example
    /// ```
    /// use genr::{ast::Expr, interpreter::{evaluator::core::Context, value::core::Value}};
    ///
    /// let num = |value| Expr::Number { value, line: 1 };
    /// let mut ctx = Context::new();
    ///
    /// let Value::Matrix(m) = ctx.eval_matrix_literal(&[vec![num(1.0), num(2.0)],
    ///                                                  vec![num(3.0), num(4.0)]],
    ///                                                1)
    ///                           .unwrap()
    /// else {
    ///     panic!("expected a matrix");
    /// };
    /// assert_eq!(m.get(1, 0), 3.0);
    /// ```
    pub fn eval_matrix_literal(&mut self, rows: &[Vec<Expr>], line: usize) -> EvalResult<Value> {
        let mut result = Matrix::zeros(0, 0);
        for row in rows {
            let mut joined = Matrix::zeros(0, 0);
            for element in row {
                let value = self.eval(element)?;
                let piece = match value {
                    Value::Scalar(x) => Matrix::scalar(na_to_matrix(x)),
                    Value::Matrix(m) => (*m).clone(),
                    Value::Series(_) => (*self.value_to_matrix(&value, line)?).clone(),
                    other => {
                        return Err(RuntimeError::type_error(format!("a {} cannot be a matrix \
                                                                     element",
                                                                    other.type_name()),
                                                            line));
                    },
                };
                joined = joined.hcat(&piece).ok_or_else(|| {
                             RuntimeError::nonconformable("matrix literal row pieces have \
                                                           different heights",
                                                          line)
                         })?;
            }
            result = result.vcat(&joined).ok_or_else(|| {
                         RuntimeError::nonconformable("matrix literal rows have different \
                                                       lengths",
                                                      line)
                     })?;
        }
        Ok(Value::Matrix(self.aux.adopt_matrix(result)))
    }

    /// Evaluates the space-separated names of a list declaration.
    ///
    /// Each name must be a series visible at the current level or a list,
    /// whose members are spliced in.
    pub fn eval_list_literal(&mut self, names: &[String], line: usize) -> EvalResult<Value> {
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            match self.eval_variable(name, line)? {
                Value::Series(Series { id: Some(id), .. }) => ids.push(id),
                Value::List(members) => ids.extend(members.iter().copied()),
                other => {
                    return Err(RuntimeError::type_error(format!("'{name}' is a {}, not a series",
                                                                other.type_name()),
                                                        line));
                },
            }
        }
        Ok(Value::List(Rc::new(ids)))
    }
}

/// Reads a scalar-or-series value at observation `t`.
///
/// A 1 x 1 matrix counts as a scalar.
///
/// # Errors
/// Returns a type error for any other kind.
pub fn value_at(value: &Value, t: usize, line: usize) -> EvalResult<f64> {
    match value {
        Value::Scalar(x) => Ok(*x),
        Value::Series(s) => Ok(s.data.get(t).copied().unwrap_or(NADBL)),
        Value::Matrix(m) if m.is_scalar() => Ok(matrix_to_na(m.get(0, 0))),
        other => Err(RuntimeError::type_error(format!("expected a scalar or series, found {}",
                                                      other.type_name()),
                                              line)),
    }
}

/// Checks if an identifier is reserved.
///
/// Reserved identifiers cannot be used as names for variables or user
/// functions: the builtin function names, plus the constant series.
///
/// # Example
/// ```
/// use genr::interpreter::evaluator::utils::is_reserved_identifier;
///
/// assert!(is_reserved_identifier("sqrt"));
/// assert!(is_reserved_identifier("const"));
/// assert!(!is_reserved_identifier("my_function"));
/// ```
#[must_use]
pub fn is_reserved_identifier(name: &str) -> bool {
    use crate::interpreter::evaluator::function::core::BUILTIN_FUNCTIONS;

    BUILTIN_FUNCTIONS.contains(&name) || EXTRA_RESERVED.contains(&name)
}
