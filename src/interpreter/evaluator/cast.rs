use std::rc::Rc;

use crate::{
    ast::TypeKind,
    error::RuntimeError,
    interpreter::{
        evaluator::core::{Context, EvalResult},
        value::{
            core::{Series, Value},
            matrix::Matrix,
        },
    },
    util::num::{NADBL, is_na, matrix_to_na, na_to_matrix, obs_at},
};

impl Context {
    /// Pads or truncates a series taken out of a bundle to the current
    /// dataset length. Bundles outlive `nulldata`, so their series may have
    /// been stored against a dataset of another size.
    ///
    /// # Example
    /// ```
    /// use std::rc::Rc;
    ///
    /// use genr::{
    ///     interpreter::{evaluator::core::Context, value::core::{Series, Value}},
    ///     util::num::NADBL,
    /// };
    ///
    /// let ctx = Context::with_observations(3);
    /// let short = Value::Series(Series::temporary(Rc::new(vec![5.0])));
    ///
    /// let Value::Series(s) = ctx.fit_to_dataset(short) else {
    ///     panic!("expected a series");
    /// };
    /// assert_eq!(*s.data, vec![5.0, NADBL, NADBL]);
    /// ```
    #[must_use]
    pub fn fit_to_dataset(&self, value: Value) -> Value {
        match value {
            Value::Series(s) if s.data.len() != self.dataset.n() => {
                let mut data = s.data.to_vec();
                data.resize(self.dataset.n(), NADBL);
                Value::Series(Series::temporary(Rc::new(data)))
            },
            other => other,
        }
    }

    /// Converts a value for use where a matrix is required.
    ///
    /// - a scalar becomes 1 x 1 (NA becomes `NaN`),
    /// - a series becomes a column over the current sample and remembers
    ///   that range,
    /// - a list becomes one column per member over the current sample.
    ///
    /// # Errors
    /// Returns `RuntimeError::MissingData` if a series or list holds a
    /// missing value in the sample, and a type error for strings, bundles
    /// and null.
    pub fn value_to_matrix(&mut self, value: &Value, line: usize) -> EvalResult<Rc<Matrix>> {
        match value {
            Value::Matrix(m) => Ok(Rc::clone(m)),
            Value::Scalar(x) => {
                let x = na_to_matrix(*x);
                Ok(self.aux.fill_matrix(1, 1, |m| m.set(0, 0, x)))
            },
            Value::Series(s) => {
                let columns = [Rc::clone(&s.data)];
                self.columns_to_matrix(&columns, line)
            },
            Value::List(ids) => {
                let columns = ids.iter()
                                 .map(|&id| {
                                     self.dataset.data(id).ok_or_else(|| {
                                                              RuntimeError::InvalidArgument {
                                        details: format!("list member {id} no longer exists"),
                                        line,
                                    }
                                                          })
                                 })
                                 .collect::<EvalResult<Vec<_>>>()?;
                self.columns_to_matrix(&columns, line)
            },
            other => Err(RuntimeError::type_error(format!("a {} cannot be used as a matrix",
                                                          other.type_name()),
                                                  line)),
        }
    }

    fn columns_to_matrix(&mut self, columns: &[Rc<Vec<f64>>], line: usize) -> EvalResult<Rc<Matrix>> {
        self.dataset.require_data(line)?;
        let (t1, t2) = (self.dataset.t1(), self.dataset.t2());
        if columns.iter().any(|c| (t1..=t2).any(|t| is_na(obs_at(c, t)))) {
            return Err(RuntimeError::MissingData { details: "series data in the sample contain \
                                                             missing values"
                                                                            .to_string(),
                                                   line });
        }
        let rows = t2 - t1 + 1;
        Ok(self.aux.fill_matrix(rows, columns.len(), |m| {
                       for (j, col) in columns.iter().enumerate() {
                           for i in 0..rows {
                               m.set(i, j, obs_at(col, t1 + i));
                           }
                       }
                       m.obs = Some((t1, t2));
                   }))
    }

    /// Converts a matrix for use where a series is required.
    ///
    /// The first rule that applies wins:
    /// 1. a 1 x 1 matrix is a scalar, broadcast over the sample;
    /// 2. a vector carrying an observation range of its own length is placed
    ///    at that range;
    /// 3. a vector as long as the current sample is placed at the sample;
    /// 4. a vector as long as the dataset is placed at every observation.
    ///
    /// Anything else is not conformable. Cells outside the placed range
    /// are missing.
    ///
    /// # Errors
    /// Returns `RuntimeError::Nonconformable` when no rule applies.
    pub fn matrix_to_series(&mut self, m: &Matrix, line: usize) -> EvalResult<Value> {
        self.dataset.require_data(line)?;
        if m.is_scalar() {
            return self.broadcast_series(matrix_to_na(m.get(0, 0)), line);
        }
        let len = m.len();
        let start = if !m.is_vector() {
            None
        } else if let Some((a, b)) = m.obs
                  && b >= a
                  && b - a + 1 == len
                  && b < self.dataset.n()
        {
            Some(a)
        } else if len == self.dataset.sample_len() {
            Some(self.dataset.t1())
        } else if len == self.dataset.n() {
            Some(0)
        } else {
            None
        };
        let Some(start) = start else {
            return Err(RuntimeError::nonconformable(format!("a {} x {} matrix does not match \
                                                             the {} observations in the sample",
                                                            m.rows(),
                                                            m.cols(),
                                                            self.dataset.sample_len()),
                                                    line));
        };
        let data = m.data();
        self.series_from_fn(line, |t| {
                t.checked_sub(start)
                 .and_then(|i| data.get(i))
                 .map_or(NADBL, |&x| matrix_to_na(x))
            })
    }

    /// Converts a value for use where a series is required: scalars are
    /// broadcast and matrices go through [`Context::matrix_to_series`].
    ///
    /// # Errors
    /// Returns a type error for strings, lists, bundles and null.
    pub fn value_to_series(&mut self, value: &Value, line: usize) -> EvalResult<Value> {
        match value {
            Value::Series(_) => Ok(value.clone()),
            Value::Scalar(x) => self.broadcast_series(*x, line),
            Value::Matrix(m) => self.matrix_to_series(m, line),
            other => Err(RuntimeError::type_error(format!("a {} cannot be used as a series",
                                                          other.type_name()),
                                                  line)),
        }
    }

    /// Converts a value for use where a list is required: a named series
    /// becomes a one-member list and null becomes the empty list.
    ///
    /// # Errors
    /// Returns a type error for anything else.
    pub fn value_to_list(value: &Value, line: usize) -> EvalResult<Rc<Vec<usize>>> {
        match value {
            Value::List(l) => Ok(Rc::clone(l)),
            Value::Series(Series { id: Some(id), .. }) => Ok(Rc::new(vec![*id])),
            Value::Null => Ok(Rc::new(Vec::new())),
            other => Err(RuntimeError::type_error(format!("a {} cannot be used as a list",
                                                          other.type_name()),
                                                  line)),
        }
    }

    /// Converts a value to the given kind, applying the implicit
    /// conversions allowed on assignment and argument passing.
    ///
    /// Scalars and 1 x 1 matrices are interchangeable, scalars broadcast to
    /// series, matrices and series convert into each other, and a named
    /// series converts to a list. Nothing converts to or from a string or a
    /// bundle.
    ///
    /// # Errors
    /// Returns a type error for any other combination.
    ///
    /// # Example
    /// ```
    /// use genr::{
    ///     ast::TypeKind,
    ///     interpreter::{evaluator::core::Context, value::core::Value},
    /// };
    ///
    /// let mut ctx = Context::new();
    ///
    /// let m = ctx.coerce(Value::Scalar(2.0), TypeKind::Matrix, 1).unwrap();
    /// assert_eq!(m.kind(), Some(TypeKind::Matrix));
    ///
    /// assert!(ctx.coerce(Value::from("x"), TypeKind::Scalar, 1).is_err());
    /// ```
    pub fn coerce(&mut self, value: Value, kind: TypeKind, line: usize) -> EvalResult<Value> {
        if value.kind() == Some(kind) {
            return Ok(value);
        }
        match (kind, &value) {
            (TypeKind::Scalar, Value::Matrix(m)) if m.is_scalar() => {
                Ok(Value::Scalar(matrix_to_na(m.get(0, 0))))
            },
            (TypeKind::Series, Value::Scalar(_) | Value::Matrix(_)) => {
                self.value_to_series(&value, line)
            },
            (TypeKind::Matrix, Value::Scalar(_) | Value::Series(_) | Value::List(_)) => {
                Ok(Value::Matrix(self.value_to_matrix(&value, line)?))
            },
            (TypeKind::List, Value::Series(_) | Value::Null) => {
                Ok(Value::List(Self::value_to_list(&value, line)?))
            },
            _ => Err(RuntimeError::type_error(format!("expected a {kind}, found {}",
                                                      value.type_name()),
                                              line)),
        }
    }
}
