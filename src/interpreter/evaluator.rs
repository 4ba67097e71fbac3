/// Binary operator evaluation logic.
///
/// Routes every operator to the handler for its operand kinds: scalars,
/// series, matrices, lists, strings and bundles.
pub mod binary;

/// Unary operator evaluation logic.
///
/// Implements negation, unary plus, logical NOT and postfix transpose.
pub mod unary;

/// Core evaluation logic and context management.
///
/// Contains the main evaluation engine and the runtime context.
pub mod core;

/// Reusable storage for intermediate results.
pub mod auxiliary;

/// Short-circuit and lazy-branch decisions.
pub mod lazy;

/// Conversions between scalars, series, matrices and lists.
pub mod cast;

/// Subscripts: the shared addressing used by reads and writes.
pub mod slice;

/// Writing results into the dataset and the variable store.
pub mod assign;

/// Compiling and running genr statements.
///
/// A statement is compiled once into a [`genr::Genr`] and may be executed
/// many times, reusing its auxiliary storage.
pub mod genr;

/// Statement execution.
pub mod statement;

/// Evaluation of `loop` blocks.
///
/// Manages the index variable and executes the compiled body once per
/// iteration.
pub mod for_loop;

/// Utility functions for evaluation.
///
/// Provides helpers and reusable routines shared by evaluation logic.
pub mod utils;

/// Function evaluation.
///
/// Handles user-defined and built-in function calls, argument checking, and
/// return value adaptation.
pub mod function;
