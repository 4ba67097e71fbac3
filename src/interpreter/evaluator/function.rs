/// Element-wise math functions and `assert`.
///
/// Work on scalars, series and matrices alike.
pub mod builtin;
/// Missing-value predicates and replacements.
pub mod missing;
/// Summary statistics and series transforms.
pub mod stats;
/// Matrix constructors, shape queries and linear algebra.
pub mod matrix;
/// String and container functions.
pub mod text;
/// Functions that read files.
pub mod file;
/// Calls to functions defined in scripts.
pub mod user;

/// The builtin table and call dispatch.
pub mod core;
