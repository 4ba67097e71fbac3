use std::fs;

use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::core::{Context, EvalResult},
        value::{core::Value, matrix::Matrix},
    },
};

fn read(path: &str, line: usize) -> EvalResult<String> {
    fs::read_to_string(path).map_err(|e| RuntimeError::Io { path: path.to_string(),
                                                            details: e.to_string(),
                                                            line })
}

/// `readfile(path)`: the contents of a text file as a string.
///
/// # Errors
/// Returns `RuntimeError::Io` if the file cannot be read.
pub fn readfile(_ctx: &mut Context, args: &[Value], line: usize) -> EvalResult<Value> {
    let path = args[0].as_str(line)?;
    Ok(Value::from(read(path, line)?))
}

/// Parses the text format `mread` reads: a header line holding the row and
/// column counts, followed by the cells row by row, separated by any
/// whitespace. `nan` and `NA` mark missing cells.
///
/// # Example
/// ```
/// use genr::interpreter::evaluator::function::file::parse_matrix;
///
/// let m = parse_matrix("2 2\n1 2\n3 4\n", "m.mat", 1).unwrap();
/// assert_eq!(m.get(1, 0), 3.0);
/// assert!(parse_matrix("2 2\n1 2 3\n", "m.mat", 1).is_err());
/// ```
///
/// # Errors
/// Returns `RuntimeError::Io` describing the first malformed token or a
/// cell count that does not match the header.
pub fn parse_matrix(text: &str, path: &str, line: usize) -> EvalResult<Matrix> {
    let malformed = |details: String| RuntimeError::Io { path: path.to_string(),
                                                         details,
                                                         line };
    let mut tokens = text.split_whitespace();
    let mut header = || -> EvalResult<usize> {
        let token = tokens.next()
                          .ok_or_else(|| malformed("missing dimensions".to_string()))?;
        token.parse()
             .map_err(|_| malformed(format!("bad dimension '{token}'")))
    };
    let (rows, cols) = (header()?, header()?);

    let cells = tokens.map(|token| match token {
                          "nan" | "NaN" | "NA" | "." => Ok(f64::NAN),
                          _ => token.parse::<f64>()
                                    .map_err(|_| malformed(format!("bad number '{token}'"))),
                      })
                      .collect::<EvalResult<Vec<f64>>>()?;
    if cells.len() != rows * cols {
        return Err(malformed(format!("expected {} values for a {rows} x {cols} matrix, \
                                      found {}",
                                     rows * cols,
                                     cells.len())));
    }
    Matrix::from_col_major(cols, rows, cells).map(|m| m.transpose())
                                              .ok_or_else(|| malformed("ragged rows".to_string()))
}

/// `mread(path)`: reads a matrix saved in text form.
///
/// # Errors
/// Returns `RuntimeError::Io` if the file cannot be read or parsed.
pub fn mread(ctx: &mut Context, args: &[Value], line: usize) -> EvalResult<Value> {
    let path = args[0].as_str(line)?;
    let m = parse_matrix(&read(path, line)?, path, line)?;
    Ok(Value::Matrix(ctx.aux.adopt_matrix(m)))
}
