/// Core value representation.
///
/// Defines the `Value` enum covering every kind the language manipulates,
/// and the `Series` payload that may borrow a dataset column.
pub mod core;
/// Dense matrices.
///
/// Column-major storage with optional row and column names, plus the
/// arithmetic and linear algebra the evaluator needs: products,
/// concatenation, solving, inversion and determinants.
pub mod matrix;
/// Bundles.
///
/// A string-keyed map of values of any kind.
pub mod bundle;
