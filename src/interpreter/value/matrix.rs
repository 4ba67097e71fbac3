use std::fmt;

use nalgebra::{DMatrix, Dyn, linalg::LU};

use crate::util::num::{MATRIX_NA, count_to_f64};

/// A dense two-dimensional matrix of doubles, stored column-major.
///
/// Missing cells hold `NaN` ([`MATRIX_NA`]), not the scalar/series sentinel.
/// A matrix may carry row and column names, and the observation range it was
/// built from when it came from series data.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows:         usize,
    cols:         usize,
    data:         Vec<f64>,
    /// Optional row labels, one per row.
    pub rownames: Option<Vec<String>>,
    /// Optional column labels, one per column.
    pub colnames: Option<Vec<String>>,
    /// 0-based inclusive observation range, for a column vector built from
    /// series data.
    pub obs:      Option<(usize, usize)>,
}

impl Matrix {
    /// Creates a `rows` x `cols` matrix filled with `value`.
    #[must_use]
    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self { rows,
               cols,
               data: vec![value; rows * cols],
               rownames: None,
               colnames: None,
               obs: None }
    }

    /// Creates a `rows` x `cols` matrix filled with `value`, or `None` if
    /// the cell count overflows or cannot be allocated.
    ///
    /// # Example
    /// ```
    /// use genr::interpreter::value::matrix::Matrix;
    ///
    /// assert!(Matrix::try_filled(2, 2, 1.0).is_some());
    /// assert!(Matrix::try_filled(usize::MAX, 2, 1.0).is_none());
    /// ```
    #[must_use]
    pub fn try_filled(rows: usize, cols: usize, value: f64) -> Option<Self> {
        let len = rows.checked_mul(cols)?;
        let mut data = Vec::new();
        data.try_reserve_exact(len).ok()?;
        data.resize(len, value);
        Some(Self { rows,
                    cols,
                    data,
                    rownames: None,
                    colnames: None,
                    obs: None })
    }

    /// Creates a zero matrix.
    ///
    /// # Example
    /// ```
    /// use genr::interpreter::value::matrix::Matrix;
    ///
    /// let m = Matrix::zeros(2, 3);
    /// assert_eq!((m.rows(), m.cols()), (2, 3));
    /// assert_eq!(m.get(1, 2), 0.0);
    /// ```
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, 0.0)
    }

    /// Creates the `n` x `n` identity matrix.
    #[must_use]
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.set(i, i, 1.0);
        }
        m
    }

    /// Wraps column-major data.
    ///
    /// Returns `None` if `data` does not hold exactly `rows * cols` values.
    #[must_use]
    pub fn from_col_major(rows: usize, cols: usize, data: Vec<f64>) -> Option<Self> {
        (data.len() == rows * cols).then_some(Self { rows,
                                                      cols,
                                                      data,
                                                      rownames: None,
                                                      colnames: None,
                                                      obs: None })
    }

    /// Builds a matrix from row slices.
    ///
    /// Returns `None` if the rows have different lengths.
    ///
    /// # Example
    /// ```
    /// use genr::interpreter::value::matrix::Matrix;
    ///
    /// let m = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
    /// assert_eq!(m.get(1, 0), 3.0);
    /// assert!(Matrix::from_rows(&[vec![1.0], vec![2.0, 3.0]]).is_none());
    /// ```
    #[must_use]
    pub fn from_rows(rows: &[Vec<f64>]) -> Option<Self> {
        let r = rows.len();
        let c = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != c) {
            return None;
        }
        let mut m = Self::zeros(r, c);
        for (i, row) in rows.iter().enumerate() {
            for (j, &x) in row.iter().enumerate() {
                m.set(i, j, x);
            }
        }
        Some(m)
    }

    /// A column vector holding `values`.
    #[must_use]
    pub fn column(values: Vec<f64>) -> Self {
        let rows = values.len();
        Self { rows,
               cols: 1,
               data: values,
               rownames: None,
               colnames: None,
               obs: None }
    }

    /// A row vector holding `values`.
    #[must_use]
    pub fn row(values: Vec<f64>) -> Self {
        let cols = values.len();
        Self { rows: 1,
               cols,
               data: values,
               rownames: None,
               colnames: None,
               obs: None }
    }

    /// A 1 x 1 matrix.
    #[must_use]
    pub fn scalar(x: f64) -> Self {
        Self::column(vec![x])
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Number of cells.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows * self.cols
    }

    /// `true` for a matrix with no cells.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` for a 1 x 1 matrix, which behaves like a scalar in arithmetic.
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        self.rows == 1 && self.cols == 1
    }

    /// `true` for a row or column vector.
    #[must_use]
    pub const fn is_vector(&self) -> bool {
        self.rows == 1 || self.cols == 1
    }

    /// `true` for a square matrix.
    #[must_use]
    pub const fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// The cell at row `i`, column `j` (0-based). Panics if out of range.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[j * self.rows + i]
    }

    /// Writes the cell at row `i`, column `j` (0-based). Panics if out of
    /// range.
    pub fn set(&mut self, i: usize, j: usize, x: f64) {
        self.data[j * self.rows + i] = x;
    }

    /// The cells in column-major order.
    #[must_use]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Mutable access to the cells in column-major order.
    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Consumes the matrix, returning its cells in column-major order.
    #[must_use]
    pub fn into_data(self) -> Vec<f64> {
        self.data
    }

    /// Applies `f` to every cell.
    #[must_use]
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self { rows:     self.rows,
               cols:     self.cols,
               data:     self.data.iter().map(|&x| f(x)).collect(),
               rownames: self.rownames.clone(),
               colnames: self.colnames.clone(),
               obs:      self.obs, }
    }

    /// Returns the transpose. Row and column names swap places.
    ///
    /// # Example
    /// ```
    /// use genr::interpreter::value::matrix::Matrix;
    ///
    /// let m = Matrix::row(vec![1.0, 2.0, 3.0]);
    /// let t = m.transpose();
    /// assert_eq!((t.rows(), t.cols()), (3, 1));
    /// assert_eq!(t.get(2, 0), 3.0);
    /// ```
    #[must_use]
    pub fn transpose(&self) -> Self {
        let mut t = Self::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                t.set(j, i, self.get(i, j));
            }
        }
        t.rownames.clone_from(&self.colnames);
        t.colnames.clone_from(&self.rownames);
        t
    }

    /// Matrix product. Returns `None` if the inner dimensions disagree.
    #[must_use]
    pub fn matmul(&self, other: &Self) -> Option<Self> {
        if self.cols != other.rows {
            return None;
        }
        let mut out = Self::zeros(self.rows, other.cols);
        for j in 0..other.cols {
            for k in 0..self.cols {
                let b = other.get(k, j);
                for i in 0..self.rows {
                    out.data[j * out.rows + i] += self.get(i, k) * b;
                }
            }
        }
        Some(out)
    }

    /// Horizontal concatenation `[self, other]`. An empty operand yields the
    /// other one.
    #[must_use]
    pub fn hcat(&self, other: &Self) -> Option<Self> {
        if self.is_empty() {
            return Some(other.clone());
        }
        if other.is_empty() {
            return Some(self.clone());
        }
        if self.rows != other.rows {
            return None;
        }
        let mut data = self.data.clone();
        data.extend_from_slice(&other.data);
        let mut out = Self::from_col_major(self.rows, self.cols + other.cols, data)?;
        if let (Some(a), Some(b)) = (&self.colnames, &other.colnames) {
            out.colnames = Some(a.iter().chain(b).cloned().collect());
        }
        out.rownames.clone_from(&self.rownames);
        Some(out)
    }

    /// Vertical concatenation `[self; other]`. An empty operand yields the
    /// other one.
    #[must_use]
    pub fn vcat(&self, other: &Self) -> Option<Self> {
        if self.is_empty() {
            return Some(other.clone());
        }
        if other.is_empty() {
            return Some(self.clone());
        }
        if self.cols != other.cols {
            return None;
        }
        let rows = self.rows + other.rows;
        let mut out = Self::zeros(rows, self.cols);
        for j in 0..self.cols {
            for i in 0..self.rows {
                out.set(i, j, self.get(i, j));
            }
            for i in 0..other.rows {
                out.set(self.rows + i, j, other.get(i, j));
            }
        }
        out.colnames.clone_from(&self.colnames);
        Some(out)
    }

    /// The same matrix as an `nalgebra` matrix, without labels.
    fn to_dmatrix(&self) -> DMatrix<f64> {
        DMatrix::from_column_slice(self.rows, self.cols, &self.data)
    }

    /// The LU factorisation of a square matrix, or `None` if any pivot is
    /// zero, `NaN` or negligible next to the largest entry.
    fn nonsingular_lu(&self) -> Option<LU<f64, Dyn, Dyn>> {
        if !self.is_square() {
            return None;
        }
        let scale = self.data.iter().fold(0.0_f64, |m, x| m.max(x.abs()));
        let tiny = f64::EPSILON * scale.max(1.0) * count_to_f64(self.rows.max(1));
        let lu = self.to_dmatrix().lu();
        lu.u()
          .diagonal()
          .iter()
          .all(|d| d.abs() > tiny)
          .then_some(lu)
    }

    /// Solves `self * X = rhs`.
    ///
    /// Returns `None` if `self` is not square, the row counts disagree, or
    /// `self` is singular. The result keeps the column names of `rhs`.
    ///
    /// # Example
    /// ```
    /// use genr::interpreter::value::matrix::Matrix;
    ///
    /// let a = Matrix::from_rows(&[vec![2.0, 0.0], vec![0.0, 4.0]]).unwrap();
    /// let b = Matrix::column(vec![2.0, 2.0]);
    /// let x = a.solve(&b).unwrap();
    /// assert_eq!(x.data(), &[1.0, 0.5]);
    /// ```
    #[must_use]
    pub fn solve(&self, rhs: &Self) -> Option<Self> {
        if rhs.rows != self.rows {
            return None;
        }
        let x = self.nonsingular_lu()?.solve(&rhs.to_dmatrix())?;
        let mut out = Self::from_col_major(rhs.rows, rhs.cols, x.as_slice().to_vec())?;
        out.colnames.clone_from(&rhs.colnames);
        Some(out)
    }

    /// The inverse, or `None` if the matrix is not square or is singular.
    #[must_use]
    pub fn inverse(&self) -> Option<Self> {
        let inv = self.nonsingular_lu()?.try_inverse()?;
        Self::from_col_major(self.rows, self.cols, inv.as_slice().to_vec())
    }

    /// The determinant, or `None` if the matrix is not square.
    ///
    /// A singular matrix has determinant zero.
    #[must_use]
    pub fn determinant(&self) -> Option<f64> {
        self.is_square().then(|| self.to_dmatrix().lu().determinant())
    }

    /// Copies out the cells at the given 0-based rows and columns.
    #[must_use]
    pub fn select(&self, rows: &[usize], cols: &[usize]) -> Self {
        let mut out = Self::zeros(rows.len(), cols.len());
        for (jj, &j) in cols.iter().enumerate() {
            for (ii, &i) in rows.iter().enumerate() {
                out.set(ii, jj, self.get(i, j));
            }
        }
        if let Some(names) = &self.colnames {
            out.colnames = Some(cols.iter().map(|&j| names[j].clone()).collect());
        }
        if let Some(names) = &self.rownames {
            out.rownames = Some(rows.iter().map(|&i| names[i].clone()).collect());
        }
        out
    }

    /// `true` if any cell is missing.
    #[must_use]
    pub fn has_missing(&self) -> bool {
        self.data.iter().any(|x| x.is_nan())
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "empty matrix ({} x {})", self.rows, self.cols);
        }
        let cells: Vec<String> =
            self.data
                .iter()
                .map(|&x| {
                    if x.is_nan() || x == MATRIX_NA {
                        "nan".to_string()
                    } else {
                        crate::interpreter::output::format_number(x)
                    }
                })
                .collect();
        let width = cells.iter().map(String::len).max().unwrap_or(1);
        let label_width = self.rownames
                              .as_ref()
                              .map_or(0, |n| n.iter().map(String::len).max().unwrap_or(0));

        if let Some(names) = &self.colnames {
            write!(f, "{:label_width$}", "")?;
            for name in names {
                write!(f, " {name:>width$}")?;
            }
            writeln!(f)?;
        }
        for i in 0..self.rows {
            if let Some(names) = &self.rownames {
                write!(f, "{:<label_width$}", names[i])?;
            }
            for j in 0..self.cols {
                write!(f, " {:>width$}", cells[j * self.rows + i])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
