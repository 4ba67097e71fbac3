/// Binary dispatch.
///
/// Routes an operator to the handler for its operand kinds.
pub mod core;
/// The scalar kernels shared by every numeric path.
pub mod scalar;
/// Element-wise operations on series and scalars.
pub mod series;
/// Matrix arithmetic, products, division and concatenation.
pub mod matrix;
/// Integer powers of square matrices.
pub mod power;
/// List set operations and list comparisons.
pub mod list;
/// String concatenation, comparison and offsets.
pub mod string;
/// Bundle union.
pub mod bundle;
