use crate::{error::RuntimeError, interpreter::evaluator::core::EvalResult};

/// The missing-value sentinel used for scalars and series.
///
/// It is deliberately a finite, representable double rather than `NaN`, so
/// that it survives being copied through code that treats `NaN` specially.
/// Matrices use `NaN` instead (see [`MATRIX_NA`]).
pub const NADBL: f64 = f64::MAX;

/// The "not available" marker stored in matrix cells.
pub const MATRIX_NA: f64 = f64::NAN;

/// Largest integer value exactly representable as an `f64` (`2^53 - 1`).
pub const MAX_SAFE_U64_INT: u64 = 9_007_199_254_740_991;

/// Returns `true` if `x` is a missing value.
///
/// Both the series sentinel and a stray `NaN` count as missing, so a `NaN`
/// that leaks out of a matrix into scalar arithmetic keeps propagating as NA.
///
/// # Example
/// ```
/// use genr::util::num::{NADBL, is_na};
///
/// assert!(is_na(NADBL));
/// assert!(is_na(f64::NAN));
/// assert!(!is_na(0.0));
/// ```
#[must_use]
#[allow(clippy::float_cmp)]
pub fn is_na(x: f64) -> bool {
    x == NADBL || x.is_nan()
}

/// Returns `true` if `x` is missing, infinite or `NaN`: anything that must not
/// be stored as an ordinary scalar or series value.
#[must_use]
pub fn is_bad(x: f64) -> bool {
    is_na(x) || !x.is_finite()
}

/// Observation `t` of series data, or missing past its end.
///
/// # Example
/// ```
/// use genr::util::num::{NADBL, obs_at};
///
/// assert_eq!(obs_at(&[1.0, 2.0], 1), 2.0);
/// assert_eq!(obs_at(&[1.0, 2.0], 5), NADBL);
/// ```
#[must_use]
pub fn obs_at(data: &[f64], t: usize) -> f64 {
    data.get(t).copied().unwrap_or(NADBL)
}

/// Translates a scalar/series value into its matrix representation.
///
/// The series sentinel becomes `NaN`; everything else is returned unchanged.
#[must_use]
pub fn na_to_matrix(x: f64) -> f64 {
    if is_na(x) { MATRIX_NA } else { x }
}

/// Translates a matrix cell into its scalar/series representation.
#[must_use]
pub fn matrix_to_na(x: f64) -> f64 {
    if x.is_nan() { NADBL } else { x }
}

/// Converts a boolean into the language's numeric truth value.
#[must_use]
pub const fn truth(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

/// Safely converts a `usize` to `f64` if and only if it is exactly
/// representable.
///
/// # Errors
/// Returns `RuntimeError::InvalidArgument` if the value exceeds
/// `MAX_SAFE_U64_INT`.
///
/// # Example
/// ```
/// use genr::util::num::usize_to_f64_checked;
///
/// assert_eq!(usize_to_f64_checked(100, 0).unwrap(), 100.0);
/// ```
#[allow(clippy::cast_precision_loss)]
pub fn usize_to_f64_checked(value: usize, line: usize) -> EvalResult<f64> {
    if value as u64 > MAX_SAFE_U64_INT {
        return Err(RuntimeError::InvalidArgument { details: format!("{value} is too large"),
                                                   line });
    }
    Ok(value as f64)
}

/// Converts a dimension count to `f64`.
///
/// Dimensions handled by the evaluator are always far below `2^53`, so this
/// conversion is lossless in practice.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub const fn count_to_f64(value: usize) -> f64 {
    value as f64
}

/// Safely converts an `f64` to `i64` if the value is finite, within range, and
/// not fractional.
///
/// # Errors
/// Returns an error for missing, non-finite, out-of-range, or fractional
/// values.
///
/// # Example
/// ```
/// use genr::{error::RuntimeError, util::num::f64_to_i64_checked};
///
/// assert_eq!(f64_to_i64_checked(-3.0, 1).unwrap(), -3);
///
/// let err = f64_to_i64_checked(1.5, 123).unwrap_err();
/// assert!(matches!(err, RuntimeError::InvalidArgument { line: 123, .. }));
/// ```
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_precision_loss)]
pub fn f64_to_i64_checked(value: f64, line: usize) -> EvalResult<i64> {
    if is_bad(value) {
        return Err(RuntimeError::MissingData { details: "expected an integer, found NA".into(),
                                               line });
    }
    if value < i64::MIN as f64 || value > i64::MAX as f64 {
        return Err(RuntimeError::InvalidArgument { details: format!("{value} is out of range"),
                                                   line });
    }
    if value.fract() != 0.0 {
        return Err(RuntimeError::InvalidArgument { details:
                                                       format!("{value} is not an integer"),
                                                   line });
    }
    Ok(value as i64)
}

/// Converts a 1-based position given as `f64` into a 0-based index.
///
/// # Errors
/// Fails on missing, fractional or non-positive values.
///
/// # Example
/// ```
/// use genr::util::num::position_to_index;
///
/// assert_eq!(position_to_index(3.0, 1).unwrap(), 2);
/// assert!(position_to_index(0.0, 1).is_err());
/// ```
pub fn position_to_index(value: f64, line: usize) -> EvalResult<usize> {
    let pos = f64_to_i64_checked(value, line)?;
    if pos < 1 {
        return Err(RuntimeError::IndexOutOfBounds { details: format!("index {pos} is below 1"),
                                                    line });
    }
    usize::try_from(pos - 1).map_err(|_| RuntimeError::IndexOutOfBounds { details:
                                                                             format!("index {pos} is too large"),
                                                                         line })
}

/// Converts a non-negative `f64` dimension (as used by `zeros(r, c)`) into a
/// `usize`.
///
/// # Errors
/// Fails on missing, fractional or negative values.
pub fn f64_to_dim_checked(value: f64, line: usize) -> EvalResult<usize> {
    let n = f64_to_i64_checked(value, line)?;
    usize::try_from(n).map_err(|_| RuntimeError::InvalidArgument { details:
                                                                     format!("invalid dimension {n}"),
                                                                 line })
}
