/// Expression entry point and statement terminators.
///
/// Contains the top of the expression grammar (the ternary conditional) and
/// the shared `ParseResult` type.
pub mod core;

/// Prefix operators, exponentiation, postfix operators and primaries.
///
/// Handles negation, logical not, `^`, transposes, subscripts, bundle
/// members, calls and matrix literals.
pub mod unary;

/// Binary operator precedence levels.
///
/// Implements the left-associative levels from `||` down to `*`.
pub mod binary;

/// Block bodies.
///
/// Collects the statements of `loop` and `function` blocks up to their
/// closing keyword.
pub mod block;

/// Utility functions for the parser.
///
/// Comma-separated lists, identifiers and subscripts.
pub mod utils;

/// Statement parsing.
///
/// Implements genr statements (declarations, assignments and bare names),
/// commands, and `loop`/`function` blocks.
pub mod statement;
