/// Numeric helpers.
///
/// This module owns the missing-value sentinel and the conversions between
/// the scalar/series NA marker and the matrix `NaN` marker, together with
/// checked conversions between `f64` and the integer types used for indices
/// and dimensions.
///
/// All conversion functions return a `Result`, which is `Ok` if the conversion
/// is lossless and valid, or an error if the value is missing, out of range or
/// not an integer.
pub mod num;
