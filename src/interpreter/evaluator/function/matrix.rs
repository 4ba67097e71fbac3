use std::{
    collections::{BTreeSet, HashSet},
    rc::Rc,
};

use ordered_float::OrderedFloat;

use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::core::{Context, EvalResult},
        value::{core::Value, matrix::Matrix},
    },
    util::num::{count_to_f64, f64_to_dim_checked, f64_to_i64_checked, is_na},
};

/// Longest vector `seq()` will build.
const MAX_SEQ_LEN: u64 = 100_000_000;

/// Reads argument `i` as a non-negative dimension.
fn dim_arg(args: &[Value], i: usize, line: usize) -> EvalResult<usize> {
    f64_to_dim_checked(args[i].as_scalar(line)?, line)
}

/// A `rows` x `cols` matrix with every cell equal to `fill`; `cols`
/// defaults to 1.
///
/// # Example
/// ```
/// use genr::interpreter::{evaluator::{core::Context, function::matrix::constant},
///                         value::core::Value};
///
/// let mut ctx = Context::new();
/// let Value::Matrix(m) = constant(&mut ctx, &[Value::Scalar(2.0), Value::Scalar(3.0)], 1, 1.0)
///                            .unwrap()
/// else {
///     panic!("expected a matrix");
/// };
/// assert_eq!((m.rows(), m.cols()), (2, 3));
/// assert!(m.data().iter().all(|&x| x == 1.0));
/// ```
pub fn constant(ctx: &mut Context, args: &[Value], line: usize, fill: f64) -> EvalResult<Value> {
    let rows = dim_arg(args, 0, line)?;
    let cols = if args.len() > 1 { dim_arg(args, 1, line)? } else { 1 };
    Ok(Value::Matrix(ctx.try_matrix_from_fn(rows, cols, line, |_, _| fill)?))
}

/// The `n` x `n` identity matrix.
pub fn identity(ctx: &mut Context, args: &[Value], line: usize) -> EvalResult<Value> {
    let n = dim_arg(args, 0, line)?;
    Ok(Value::Matrix(ctx.try_matrix_from_fn(n, n, line, |i, j| {
                            if i == j { 1.0 } else { 0.0 }
                        })?))
}

/// `seq(a, b)`: the integers from `a` to `b` as a row vector, counting down
/// if `b < a`.
///
/// # Errors
/// Returns `RuntimeError::Allocation` if the sequence is unreasonably long.
#[allow(clippy::cast_precision_loss)]
pub fn seq(ctx: &mut Context, args: &[Value], line: usize) -> EvalResult<Value> {
    let a = f64_to_i64_checked(args[0].as_scalar(line)?, line)?;
    let b = f64_to_i64_checked(args[1].as_scalar(line)?, line)?;
    let len = a.abs_diff(b) + 1;
    if len > MAX_SEQ_LEN {
        return Err(RuntimeError::Allocation { details: format!("a sequence of {len} values"),
                                              line });
    }
    let values: Vec<f64> = if a <= b {
        (a..=b).map(|i| i as f64).collect()
    } else {
        (b..=a).rev().map(|i| i as f64).collect()
    };
    Ok(Value::Matrix(ctx.aux.adopt_matrix(Matrix::row(values))))
}

/// Number of rows. A scalar has one; a series has one per observation in
/// the sample.
pub fn rows(ctx: &mut Context, args: &[Value], _line: usize) -> EvalResult<Value> {
    let n = match &args[0] {
        Value::Matrix(m) => m.rows(),
        Value::Series(_) => ctx.dataset.sample_len(),
        _ => 1,
    };
    Ok(Value::Scalar(count_to_f64(n)))
}

/// Number of columns. Scalars and series have one.
pub fn cols(_ctx: &mut Context, args: &[Value], _line: usize) -> EvalResult<Value> {
    let n = match &args[0] {
        Value::Matrix(m) => m.cols(),
        _ => 1,
    };
    Ok(Value::Scalar(count_to_f64(n)))
}

/// The transpose, as a function.
pub fn transp(ctx: &mut Context, args: &[Value], line: usize) -> EvalResult<Value> {
    let m = ctx.value_to_matrix(&args[0], line)?;
    Ok(Value::Matrix(ctx.aux.adopt_matrix(m.transpose())))
}

/// Stacks the columns of a matrix into one column vector.
pub fn vec(ctx: &mut Context, args: &[Value], line: usize) -> EvalResult<Value> {
    let m = ctx.value_to_matrix(&args[0], line)?;
    Ok(Value::Matrix(ctx.aux.adopt_matrix(Matrix::column(m.data().to_vec()))))
}

/// `mshape(X, r, c)`: an `r` x `c` matrix filled column-wise with the cells
/// of `X`, starting over from the first cell whenever `X` runs out.
///
/// # Errors
/// Returns `RuntimeError::InvalidArgument` if `X` is empty but the result
/// is not.
pub fn mshape(ctx: &mut Context, args: &[Value], line: usize) -> EvalResult<Value> {
    let src = ctx.value_to_matrix(&args[0], line)?;
    let (rows, cols) = (dim_arg(args, 1, line)?, dim_arg(args, 2, line)?);
    if src.is_empty() && rows > 0 && cols > 0 {
        return Err(RuntimeError::InvalidArgument { details: "cannot reshape an empty matrix"
                                                                .to_string(),
                                                   line });
    }
    let data = src.data().to_vec();
    Ok(Value::Matrix(ctx.try_matrix_from_fn(rows, cols, line, |i, j| {
                            data[(j * rows + i) % data.len()]
                        })?))
}

/// A reduction along one axis of a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduce {
    /// Column sums, as a row vector.
    SumColumns,
    /// Row sums, as a column vector.
    SumRows,
    /// Column means, as a row vector.
    MeanColumns,
}

/// Sums or averages the rows or columns of a matrix.
///
/// # Example
/// ```
/// use genr::interpreter::{evaluator::{core::Context, function::matrix::{Reduce, reduce}},
///                         value::{core::Value, matrix::Matrix}};
///
/// let mut ctx = Context::new();
/// let m = Value::from(Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap());
/// let Value::Matrix(s) = reduce(&mut ctx, &[m], 1, Reduce::SumColumns).unwrap() else {
///     panic!("expected a matrix");
/// };
/// assert_eq!(s.data(), &[4.0, 6.0]);
/// ```
pub fn reduce(ctx: &mut Context, args: &[Value], line: usize, how: Reduce) -> EvalResult<Value> {
    let m = ctx.value_to_matrix(&args[0], line)?;
    let (rows, cols) = (m.rows(), m.cols());
    let column_sum = |j: usize| (0..rows).map(|i| m.get(i, j)).sum::<f64>();
    let out = match how {
        Reduce::SumColumns => ctx.matrix_from_fn(1, cols, |_, j| column_sum(j)),
        Reduce::MeanColumns => {
            ctx.matrix_from_fn(1, cols, |_, j| column_sum(j) / count_to_f64(rows))
        },
        Reduce::SumRows => {
            ctx.matrix_from_fn(rows, 1, |i, _| (0..cols).map(|j| m.get(i, j)).sum::<f64>())
        },
    };
    Ok(Value::Matrix(out))
}

/// The main diagonal, as a column vector.
pub fn diag(ctx: &mut Context, args: &[Value], line: usize) -> EvalResult<Value> {
    let m = ctx.value_to_matrix(&args[0], line)?;
    let n = m.rows().min(m.cols());
    Ok(Value::Matrix(ctx.matrix_from_fn(n, 1, |i, _| m.get(i, i))))
}

fn require_square(m: &Matrix, what: &str, line: usize) -> EvalResult<()> {
    if m.is_square() {
        Ok(())
    } else {
        Err(RuntimeError::nonconformable(format!("{what} needs a square matrix, found {} x {}",
                                                 m.rows(),
                                                 m.cols()),
                                         line))
    }
}

/// The inverse of a square matrix.
///
/// # Errors
/// `RuntimeError::Nonconformable` if the matrix is not square,
/// `RuntimeError::Singular` if it has no inverse.
pub fn inv(ctx: &mut Context, args: &[Value], line: usize) -> EvalResult<Value> {
    let m = ctx.value_to_matrix(&args[0], line)?;
    require_square(&m, "inv()", line)?;
    let inverse = m.inverse().ok_or(RuntimeError::Singular { line })?;
    Ok(Value::Matrix(ctx.aux.adopt_matrix(inverse)))
}

/// The determinant of a square matrix.
pub fn det(ctx: &mut Context, args: &[Value], line: usize) -> EvalResult<Value> {
    let m = ctx.value_to_matrix(&args[0], line)?;
    require_square(&m, "det()", line)?;
    let d = m.determinant().ok_or(RuntimeError::Singular { line })?;
    Ok(Value::Scalar(d))
}

/// The distinct non-missing values of a series (over the sample) or a
/// matrix, as a column vector: in order of first appearance for `uniq`,
/// ascending for `values`.
pub fn distinct(ctx: &mut Context, args: &[Value], line: usize, sorted: bool) -> EvalResult<Value> {
    let source: Rc<Vec<f64>> = match &args[0] {
        Value::Series(s) => {
            Rc::new(s.data
                     .get(ctx.dataset.t1()..=ctx.dataset.t2())
                     .map(<[f64]>::to_vec)
                     .unwrap_or_default())
        },
        other => Rc::new(ctx.value_to_matrix(other, line)?.data().to_vec()),
    };
    let valid = source.iter().copied().filter(|&x| !is_na(x));
    let values: Vec<f64> = if sorted {
        valid.map(OrderedFloat)
             .collect::<BTreeSet<_>>()
             .into_iter()
             .map(OrderedFloat::into_inner)
             .collect()
    } else {
        let mut seen = HashSet::new();
        valid.filter(|&x| seen.insert(OrderedFloat(x))).collect()
    };
    Ok(Value::Matrix(ctx.aux.adopt_matrix(Matrix::column(values))))
}
