use std::rc::Rc;

use tracing::trace;

use crate::{
    ast::{AssignOp, TypeKind},
    error::{RuntimeError, Warning},
    interpreter::{
        evaluator::{
            binary::scalar::{cell_op, scalar_op},
            core::{Context, EvalResult},
            slice::{Block, Slice, bundle_key},
            utils::value_at,
        },
        output::render,
        value::{
            core::{Series, Value},
            matrix::Matrix,
        },
    },
    util::num::{NADBL, is_bad, na_to_matrix},
};

/// Replaces every non-finite value that is not already the missing marker
/// with it, returning how many were replaced.
///
/// # Example
/// ```
/// use genr::{interpreter::evaluator::assign::sanitize_series, util::num::NADBL};
///
/// let mut data = vec![1.0, f64::INFINITY, NADBL, f64::NAN];
/// assert_eq!(sanitize_series(&mut data), 2);
/// assert_eq!(data, vec![1.0, NADBL, NADBL, NADBL]);
/// ```
#[allow(clippy::float_cmp)]
pub fn sanitize_series(data: &mut [f64]) -> usize {
    let mut count = 0;
    for x in data.iter_mut().filter(|x| is_bad(**x)) {
        if *x != NADBL {
            count += 1;
        }
        *x = NADBL;
    }
    count
}

/// Converts infinite cells to the matrix missing marker, returning how many
/// were converted. Cells holding the series marker become `NaN` without
/// being counted.
pub fn sanitize_matrix(m: &mut Matrix) -> usize {
    let mut count = 0;
    for x in m.data_mut() {
        if x.is_infinite() {
            count += 1;
        }
        if is_bad(*x) {
            *x = f64::NAN;
        }
    }
    count
}

impl Context {
    /// Writes a whole variable: `name op= rhs`.
    ///
    /// An inflected operator first combines the current value with `rhs`.
    /// The result is then converted to the target kind: the declared kind,
    /// else the kind of the existing variable, else the kind of the result.
    /// Series are written over the current sample only; observations
    /// outside it keep their values, or are missing for a new series.
    ///
    /// Non-finite results are replaced by missing values and reported with
    /// a [`Warning::MissingGenerated`].
    ///
    /// # Errors
    /// Returns a type error when the result cannot be converted to the
    /// target kind, in which case the target is left untouched.
    pub(crate) fn assign_whole(&mut self,
                               name: &str,
                               declared: Option<TypeKind>,
                               op: AssignOp,
                               rhs: Value,
                               line: usize)
                               -> EvalResult<Value> {
        let existing = match self.kind_of(name) {
            Some(_) => Some(self.eval_variable(name, line)?),
            None => None,
        };
        let combined = match (op.binary(), &existing) {
            _ if op == AssignOp::Fill => {
                let Some(Value::Matrix(m)) = &existing else {
                    return Err(RuntimeError::type_error(format!("'.=' needs an existing matrix, \
                                                                 '{name}' is not one"),
                                                        line));
                };
                let x = na_to_matrix(rhs.as_scalar(line)?);
                Value::from(Matrix::filled(m.rows(), m.cols(), x))
            },
            (Some(bop), Some(old)) => self.eval_binary(bop, old, &rhs, line)?,
            (Some(_), None) => {
                return Err(RuntimeError::UnknownVariable { name: name.to_string(),
                                                           line });
            },
            (None, _) => rhs,
        };
        let kind = declared.or_else(|| existing.as_ref().and_then(Value::kind))
                           .or_else(|| combined.kind())
                           .ok_or_else(|| {
                               RuntimeError::type_error(format!("cannot assign null to \
                                                                 '{name}'"),
                                                        line)
                           })?;
        drop(existing);
        let value = self.coerce(combined, kind, line)?;
        let stored = self.store_value(name, value, line)?;
        if self.settings.echo {
            let text = render(Some(name), &stored, &self.dataset);
            self.printer.emit(&text, line)?;
        }
        Ok(stored)
    }

    /// Installs an already converted value under `name` at the current
    /// level.
    #[allow(clippy::float_cmp)]
    fn store_value(&mut self, name: &str, value: Value, line: usize) -> EvalResult<Value> {
        match value {
            Value::Series(s) => self.store_series(name, &s.data, line),
            Value::Scalar(x) => {
                let x = if is_bad(x) && x != NADBL {
                    self.raise_warning(Warning::MissingGenerated { target: name.to_string(),
                                                                   count:  1,
                                                                   line, },
                                       line)?;
                    NADBL
                } else {
                    x
                };
                self.store.add(name, Value::Scalar(x), self.level, line)?;
                Ok(Value::Scalar(x))
            },
            Value::Matrix(mut m) => {
                if m.data().iter().any(|&x| is_bad(x) && !x.is_nan()) {
                    let count = sanitize_matrix(Rc::make_mut(&mut m));
                    if count > 0 {
                        self.raise_warning(Warning::MissingGenerated { target: name.to_string(),
                                                                       count,
                                                                       line },
                                           line)?;
                    }
                }
                if let Some(owner) = self.store.lookup_by_identity(&m) {
                    trace!(name, owner = %owner.name, "matrix shared with another variable");
                }
                self.store.add(name, Value::Matrix(Rc::clone(&m)), self.level, line)?;
                Ok(Value::Matrix(m))
            },
            other => {
                self.store.add(name, other.clone(), self.level, line)?;
                Ok(other)
            },
        }
    }

    /// Writes series data over the current sample, creating the column if
    /// `name` is new.
    fn store_series(&mut self, name: &str, data: &[f64], line: usize) -> EvalResult<Value> {
        self.dataset.require_data(line)?;
        let (t1, t2) = (self.dataset.t1(), self.dataset.t2());
        let mut sample: Vec<f64> = (t1..=t2).map(|t| data.get(t).copied().unwrap_or(NADBL))
                                            .collect();
        let count = sanitize_series(&mut sample);
        if count > 0 {
            self.raise_warning(Warning::MissingGenerated { target: name.to_string(),
                                                           count,
                                                           line },
                               line)?;
        }

        let id = match self.dataset.series_id(name, self.level) {
            Some(id) => id,
            None => self.dataset.add_series(name, vec![NADBL; self.dataset.n()], self.level),
        };
        let column = self.dataset.data_mut(id).ok_or_else(|| {
                                                  RuntimeError::InvalidArgument {
                details: format!("series '{name}' no longer exists"),
                line,
            }
                                              })?;
        column[t1..=t2].copy_from_slice(&sample);
        let data = self.dataset.data(id).unwrap_or_default();
        Ok(Value::Series(Series { data, id: Some(id) }))
    }

    /// Writes into part of an existing variable: `name[...] op= rhs`.
    ///
    /// - a matrix block is checked against the matrix's current shape and
    ///   receives either a broadcast scalar or a matrix of exactly the
    ///   block's shape,
    /// - a series observation receives a scalar,
    /// - a bundle key receives any value, whatever it held before.
    ///
    /// # Errors
    /// Returns `RuntimeError::IndexOutOfBounds` for a subscript outside the
    /// target, `RuntimeError::Nonconformable` for a block of the wrong
    /// shape, and a type error for targets that cannot be written this
    /// way.
    pub(crate) fn assign_index(&mut self,
                               name: &str,
                               rows: &Slice,
                               cols: Option<&Slice>,
                               op: AssignOp,
                               rhs: Value,
                               line: usize)
                               -> EvalResult<Value> {
        if matches!(op, AssignOp::HCat | AssignOp::VCat) {
            return Err(RuntimeError::type_error(format!("'{op}' cannot write into '{name}[...]'"),
                                                line));
        }
        match self.eval_variable(name, line)? {
            Value::Matrix(m) => self.assign_block(name, &m, rows, cols, op, &rhs, line),
            Value::Series(Series { id: Some(id), .. }) => {
                let t = self.observation(rows, cols, line)?;
                self.assign_observation(name, id, t, op, &rhs, line)
            },
            Value::Bundle(_) => {
                let key = bundle_key(rows, cols, line)?;
                self.assign_member(name, &key, op, rhs, line)
            },
            other => Err(RuntimeError::type_error(format!("cannot write into part of a {}",
                                                          other.type_name()),
                                                  line)),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn assign_block(&mut self,
                    name: &str,
                    current: &Matrix,
                    rows: &Slice,
                    cols: Option<&Slice>,
                    op: AssignOp,
                    rhs: &Value,
                    line: usize)
                    -> EvalResult<Value> {
        let block = Block::resolve(rows, cols, current.rows(), current.cols(), line)?;
        let source = match rhs {
            Value::Scalar(_) => None,
            Value::Matrix(r) if r.is_scalar() => None,
            other => Some(self.value_to_matrix(other, line)?),
        };
        let fill = match (&source, rhs) {
            (None, Value::Matrix(r)) => r.get(0, 0),
            (None, v) => na_to_matrix(v.as_scalar(line)?),
            (Some(_), _) => 0.0,
        };
        if let Some(src) = &source
           && (src.rows(), src.cols()) != block.shape()
        {
            let (r, c) = block.shape();
            return Err(RuntimeError::nonconformable(format!("cannot write a {} x {} matrix \
                                                             into a {r} x {c} block",
                                                            src.rows(),
                                                            src.cols()),
                                                    line));
        }

        let nrows = current.rows();
        let Some(Value::Matrix(stored)) = self.store.lookup_mut(name, self.level) else {
            return Err(RuntimeError::UnknownVariable { name: name.to_string(),
                                                       line });
        };
        let target = Rc::make_mut(stored);
        let mut generated = 0;
        for (k, (i, j)) in block.cells(nrows).into_iter().enumerate() {
            let new = source.as_ref().map_or(fill, |s| s.data()[k]);
            let x = match op.binary() {
                Some(bop) => cell_op(bop, target.get(i, j), new),
                None => new,
            };
            if x.is_infinite() {
                generated += 1;
            }
            target.set(i, j, if is_bad(x) { f64::NAN } else { x });
        }
        let result = Value::Matrix(Rc::clone(stored));
        if generated > 0 {
            self.raise_warning(Warning::MissingGenerated { target: name.to_string(),
                                                           count: generated,
                                                           line },
                               line)?;
        }
        Ok(result)
    }

    #[allow(clippy::float_cmp)]
    fn assign_observation(&mut self,
                          name: &str,
                          id: usize,
                          t: usize,
                          op: AssignOp,
                          rhs: &Value,
                          line: usize)
                          -> EvalResult<Value> {
        let new = value_at(rhs, t, line)?;
        let column = self.dataset.data_mut(id).ok_or_else(|| {
                                                  RuntimeError::InvalidArgument {
                details: format!("series '{name}' no longer exists"),
                line,
            }
                                              })?;
        let x = match op.binary() {
            Some(bop) => scalar_op(bop, column[t], new),
            None => new,
        };
        let generated = is_bad(x) && x != NADBL;
        column[t] = if is_bad(x) { NADBL } else { x };
        let stored = column[t];
        if generated {
            self.raise_warning(Warning::MissingGenerated { target: name.to_string(),
                                                           count:  1,
                                                           line, },
                               line)?;
        }
        Ok(Value::Scalar(stored))
    }

    /// Writes `b.key op= rhs` (or `b["key"] op= rhs`).
    ///
    /// A plain `=` replaces the member whatever its kind, or adds it. An
    /// inflected operator combines with the current member, which must
    /// exist. Series are stored detached from the dataset.
    ///
    /// # Errors
    /// Returns a type error if `name` is not a bundle.
    pub(crate) fn assign_member(&mut self,
                                name: &str,
                                key: &str,
                                op: AssignOp,
                                rhs: Value,
                                line: usize)
                                -> EvalResult<Value> {
        let Value::Bundle(bundle) = self.eval_variable(name, line)? else {
            return Err(RuntimeError::type_error(format!("'{name}' is not a bundle"), line));
        };
        let value = match op.binary() {
            Some(bop) => {
                let old = bundle.get(key).cloned().ok_or_else(|| {
                                                      RuntimeError::InvalidArgument {
                        details: format!("no key '{key}' in bundle"),
                        line,
                    }
                                                  })?;
                self.eval_binary(bop, &old, &rhs, line)?
            },
            None => rhs,
        };
        let value = match value {
            Value::Series(s) => Value::Series(Series::temporary(s.data)),
            Value::Null => {
                return Err(RuntimeError::type_error("cannot store null in a bundle", line));
            },
            other => other,
        };
        drop(bundle);
        let Some(Value::Bundle(stored)) = self.store.lookup_mut(name, self.level) else {
            return Err(RuntimeError::UnknownVariable { name: name.to_string(),
                                                       line });
        };
        Rc::make_mut(stored).insert(key, value.clone());
        trace!(name, key, "bundle member written");
        Ok(value)
    }
}
