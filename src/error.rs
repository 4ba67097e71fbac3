/// Parsing errors.
///
/// Defines all error types that can occur during lexing and parsing of source
/// code, and during the compile step that validates a statement's target
/// before anything is evaluated.
pub mod parse_error;
/// Runtime errors.
///
/// Contains all error types that can be raised during evaluation and
/// execution: type mismatches, non-conformable matrices, unknown names,
/// missing data and so on.
pub mod runtime_error;
/// Non-fatal diagnostics.
///
/// Warnings are collected on the evaluation context instead of aborting the
/// statement that produced them.
pub mod warning;

pub use parse_error::ParseError;
pub use runtime_error::RuntimeError;
use thiserror::Error;
pub use warning::Warning;

/// Any error produced while running a script.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// The script could not be tokenized or parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// A statement failed while it was being compiled or executed.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
