use std::rc::Rc;

use crate::{
    ast::{Expr, IndexExpr, SliceExpr},
    error::RuntimeError,
    interpreter::{
        evaluator::core::{Context, EvalResult},
        value::{
            core::{Series, Value},
            matrix::Matrix,
        },
    },
    util::num::{NADBL, matrix_to_na, position_to_index},
};

/// One dimension of a subscript after its expressions have been evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum Slice {
    /// Every row or every column.
    All,
    /// An inclusive `a:b` range of 1-based positions.
    Range(f64, f64),
    /// A position, a vector of positions, or a 0/1 mask.
    Value(Value),
}

impl Slice {
    /// Resolves this slice against a dimension of length `dim` into 0-based
    /// positions.
    ///
    /// A vector whose length equals `dim` and whose entries are all 0 or 1 is
    /// a mask; any other vector lists 1-based positions. So on a 2-row
    /// matrix `{1, 1}` selects both rows, not the first row twice.
    ///
    /// # Errors
    /// Returns `RuntimeError::IndexOutOfBounds` if a position falls outside
    /// `1..=dim`, and a type error for non-numeric selectors.
    ///
    /// # Example
    /// ```
    /// use genr::interpreter::{
    ///     evaluator::slice::Slice,
    ///     value::{core::Value, matrix::Matrix},
    /// };
    ///
    /// let mask = Slice::Value(Value::from(Matrix::row(vec![1.0, 0.0, 1.0])));
    /// assert_eq!(mask.positions(3, 1).unwrap(), vec![0, 2]);
    ///
    /// let picks = Slice::Value(Value::from(Matrix::row(vec![3.0, 1.0])));
    /// assert_eq!(picks.positions(3, 1).unwrap(), vec![2, 0]);
    ///
    /// assert!(Slice::Range(2.0, 4.0).positions(3, 1).is_err());
    /// ```
    #[allow(clippy::float_cmp)]
    pub fn positions(&self, dim: usize, line: usize) -> EvalResult<Vec<usize>> {
        let positions = match self {
            Self::All => return Ok((0..dim).collect()),
            Self::Range(a, b) => {
                let (a, b) = (position_to_index(*a, line)?, position_to_index(*b, line)?);
                if b >= dim {
                    return Err(out_of_bounds(b, dim, line));
                }
                (a..=b).collect()
            },
            Self::Value(Value::Scalar(x)) => vec![position_to_index(*x, line)?],
            Self::Value(Value::Matrix(m)) if m.is_vector() || m.is_empty() => {
                let data = m.data();
                if data.len() == dim && data.iter().all(|&x| x == 0.0 || x == 1.0) {
                    return Ok(data.iter()
                                  .enumerate()
                                  .filter(|&(_, &x)| x == 1.0)
                                  .map(|(i, _)| i)
                                  .collect());
                }
                data.iter()
                    .map(|&x| position_to_index(x, line))
                    .collect::<EvalResult<Vec<_>>>()?
            },
            Self::Value(other) => {
                return Err(RuntimeError::type_error(format!("a {} cannot select positions",
                                                            other.type_name()),
                                                    line));
            },
        };
        if let Some(&bad) = positions.iter().find(|&&p| p >= dim) {
            return Err(out_of_bounds(bad, dim, line));
        }
        Ok(positions)
    }

    /// Resolves a slice that must name exactly one position.
    fn single(&self, dim: usize, line: usize) -> EvalResult<usize> {
        match self.positions(dim, line)?.as_slice() {
            [p] => Ok(*p),
            _ => Err(RuntimeError::type_error("expected a single position", line)),
        }
    }
}

/// The cells of a matrix addressed by a subscript.
///
/// Reads (`x = M[...]`) and writes (`M[...] = x`) both resolve their
/// subscript into a `Block` and then visit [`Block::cells`], so both sides
/// agree on what a subscript means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// The cross product of row and column positions.
    Grid {
        /// 0-based rows, in selection order.
        rows: Vec<usize>,
        /// 0-based columns, in selection order.
        cols: Vec<usize>,
    },
    /// Column-major positions picked by a single subscript on a matrix
    /// that is not a vector. Reads as a column.
    Cells(Vec<usize>),
}

impl Block {
    /// Resolves a subscript against an `nrows x ncols` matrix.
    ///
    /// With two dimensions rows and columns are resolved separately. A
    /// single subscript on a row or column vector selects along that vector;
    /// on any other matrix it counts cells in column-major order.
    ///
    /// # Errors
    /// Returns `RuntimeError::IndexOutOfBounds` if any position is outside
    /// the matrix.
    ///
    /// # Example
    /// ```
    /// use genr::interpreter::{evaluator::slice::{Block, Slice}, value::core::Value};
    ///
    /// let block = Block::resolve(&Slice::Value(Value::Scalar(1.0)), Some(&Slice::All), 3, 3, 1)
    ///     .unwrap();
    /// assert_eq!(block.shape(), (1, 3));
    /// assert_eq!(block.cells(3), vec![(0, 0), (0, 1), (0, 2)]);
    /// ```
    pub fn resolve(rows: &Slice,
                   cols: Option<&Slice>,
                   nrows: usize,
                   ncols: usize,
                   line: usize)
                   -> EvalResult<Self> {
        Ok(match cols {
            Some(cols) => Self::Grid { rows: rows.positions(nrows, line)?,
                                       cols: cols.positions(ncols, line)? },
            None if nrows == 1 => Self::Grid { rows: vec![0],
                                               cols: rows.positions(ncols, line)? },
            None if ncols == 1 => Self::Grid { rows: rows.positions(nrows, line)?,
                                               cols: vec![0] },
            None => Self::Cells(rows.positions(nrows * ncols, line)?),
        })
    }

    /// Rows and columns of the addressed block.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        match self {
            Self::Grid { rows, cols } => (rows.len(), cols.len()),
            Self::Cells(cells) => (cells.len(), 1),
        }
    }

    /// `true` if exactly one cell is addressed.
    #[must_use]
    pub fn is_single(&self) -> bool {
        self.shape() == (1, 1)
    }

    /// The addressed `(row, col)` cells of a matrix with `nrows` rows, in
    /// column-major order of the block.
    #[must_use]
    pub fn cells(&self, nrows: usize) -> Vec<(usize, usize)> {
        match self {
            Self::Grid { rows, cols } => {
                cols.iter()
                    .flat_map(|&j| rows.iter().map(move |&i| (i, j)))
                    .collect()
            },
            Self::Cells(cells) => cells.iter().map(|&p| (p % nrows, p / nrows)).collect(),
        }
    }

    /// Copies the addressed cells out of `m`.
    #[must_use]
    pub fn read(&self, m: &Matrix) -> Matrix {
        match self {
            Self::Grid { rows, cols } => m.select(rows, cols),
            Self::Cells(_) => {
                Matrix::column(self.cells(m.rows())
                                   .into_iter()
                                   .map(|(i, j)| m.get(i, j))
                                   .collect())
            },
        }
    }
}

impl Context {
    /// Evaluates the expressions of one subscript dimension.
    pub(crate) fn eval_slice(&mut self, slice: &SliceExpr) -> EvalResult<Slice> {
        Ok(match slice {
            SliceExpr::All => Slice::All,
            SliceExpr::Range(a, b) => {
                let line = a.line_number();
                Slice::Range(self.eval(a)?.as_scalar(line)?, self.eval(b)?.as_scalar(line)?)
            },
            SliceExpr::Expr(e) => Slice::Value(self.eval(e)?),
        })
    }

    /// Evaluates both dimensions of a subscript, rows first.
    pub(crate) fn eval_index_slices(&mut self,
                                    index: &IndexExpr)
                                    -> EvalResult<(Slice, Option<Slice>)> {
        let rows = self.eval_slice(&index.rows)?;
        let cols = index.cols
                        .as_ref()
                        .map(|c| self.eval_slice(c))
                        .transpose()?;
        Ok((rows, cols))
    }

    /// Resolves a subscript naming one observation of a series, as in
    /// `x[t]`. Observations are 1-based and may lie outside the sample.
    pub(crate) fn observation(&self,
                              rows: &Slice,
                              cols: Option<&Slice>,
                              line: usize)
                              -> EvalResult<usize> {
        if cols.is_some() {
            return Err(RuntimeError::type_error("a series takes a single subscript", line));
        }
        self.dataset.require_data(line)?;
        rows.single(self.dataset.n(), line)
    }

    /// Evaluates `target[index]`.
    ///
    /// - `M[...]` gives the addressed block, or a scalar for a single cell,
    /// - `x[t]` gives observation `t` of a series,
    /// - `L[k]` gives the `k`-th member of a list,
    /// - `b["key"]` gives a bundle member,
    /// - `s[a:b]` gives characters `a` through `b` of a string.
    ///
    /// # Errors
    /// Returns `RuntimeError::IndexOutOfBounds` for positions outside the
    /// target and a type error for targets that cannot be indexed.
    pub(crate) fn eval_index(&mut self,
                             target: &Expr,
                             index: &IndexExpr,
                             line: usize)
                             -> EvalResult<Value> {
        let value = self.eval(target)?;
        let (rows, cols) = self.eval_index_slices(index)?;
        self.index_value(&value, &rows, cols.as_ref(), line)
    }

    /// Applies an evaluated subscript to a value.
    pub(crate) fn index_value(&mut self,
                              value: &Value,
                              rows: &Slice,
                              cols: Option<&Slice>,
                              line: usize)
                              -> EvalResult<Value> {
        match value {
            Value::Matrix(m) => {
                let block = Block::resolve(rows, cols, m.rows(), m.cols(), line)?;
                if block.is_single() {
                    let (i, j) = block.cells(m.rows())[0];
                    return Ok(Value::Scalar(matrix_to_na(m.get(i, j))));
                }
                Ok(Value::Matrix(self.aux.adopt_matrix(block.read(m))))
            },
            Value::Series(s) => {
                let t = self.observation(rows, cols, line)?;
                Ok(Value::Scalar(s.data.get(t).copied().unwrap_or(NADBL)))
            },
            Value::List(ids) => {
                if cols.is_some() {
                    return Err(RuntimeError::type_error("a list takes a single subscript", line));
                }
                let id = ids[rows.single(ids.len(), line)?];
                let data = self.dataset.data(id).ok_or_else(|| {
                                                    RuntimeError::InvalidArgument {
                        details: format!("list member {id} no longer exists"),
                        line,
                    }
                                                })?;
                Ok(Value::Series(Series { data, id: Some(id) }))
            },
            Value::Bundle(b) => {
                let key = bundle_key(rows, cols, line)?;
                b.get(&key)
                 .cloned()
                 .map(|v| self.fit_to_dataset(v))
                 .ok_or_else(|| RuntimeError::InvalidArgument { details:
                                                                    format!("no key '{key}' in \
                                                                             bundle"),
                                                                line })
            },
            Value::Str(s) => {
                if cols.is_some() {
                    return Err(RuntimeError::type_error("a string takes a single subscript",
                                                        line));
                }
                let chars: Vec<char> = s.chars().collect();
                let picked: String = rows.positions(chars.len(), line)?
                                         .into_iter()
                                         .map(|p| chars[p])
                                         .collect();
                Ok(Value::Str(Rc::from(picked)))
            },
            other => Err(RuntimeError::type_error(format!("a {} cannot be indexed",
                                                          other.type_name()),
                                                  line)),
        }
    }

    /// Evaluates `b.key`.
    ///
    /// # Errors
    /// Returns a type error if the target is not a bundle, and an invalid
    /// argument error if the key is absent.
    pub(crate) fn eval_member(&mut self, target: &Expr, key: &str, line: usize) -> EvalResult<Value> {
        match self.eval(target)? {
            Value::Bundle(b) => {
                b.get(key)
                 .cloned()
                 .map(|v| self.fit_to_dataset(v))
                 .ok_or_else(|| RuntimeError::InvalidArgument { details:
                                                                    format!("no key '{key}' in \
                                                                             bundle"),
                                                                line })
            },
            other => Err(RuntimeError::type_error(format!("'.{key}' applied to a {}",
                                                          other.type_name()),
                                                  line)),
        }
    }
}

/// The key of a `b["key"]` subscript.
pub(crate) fn bundle_key(rows: &Slice, cols: Option<&Slice>, line: usize) -> EvalResult<String> {
    match (rows, cols) {
        (Slice::Value(Value::Str(k)), None) => Ok(k.to_string()),
        _ => Err(RuntimeError::type_error("a bundle is indexed by a single string key", line)),
    }
}

fn out_of_bounds(pos: usize, dim: usize, line: usize) -> RuntimeError {
    RuntimeError::IndexOutOfBounds { details: format!("position {} of {dim}", pos + 1),
                                     line }
}
