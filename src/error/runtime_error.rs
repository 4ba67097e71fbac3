use thiserror::Error;

use crate::error::ParseError;

/// Represents all errors that can occur during evaluation.
///
/// Evaluation errors abort the statement being evaluated. Mutations committed
/// by earlier statements are not rolled back.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    /// Operand, argument or target kind does not fit the operation.
    #[error("Error on line {line}: Type error: {details}.")]
    TypeError {
        /// Details about the type mismatch.
        details: String,
        /// The source line where the error occurred.
        line:    usize,
    },
    /// Matrix or vector dimensions do not agree.
    #[error("Error on line {line}: Non-conformable operands: {details}.")]
    Nonconformable {
        /// Description of the offending shapes.
        details: String,
        /// The source line where the error occurred.
        line:    usize,
    },
    /// Tried to use a variable that does not exist at the current level.
    #[error("Error on line {line}: Unknown variable '{name}'.")]
    UnknownVariable {
        /// The name of the variable.
        name: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// Called a function that is neither built in nor user defined.
    #[error("Error on line {line}: Unknown function '{name}'.")]
    UnknownFunction {
        /// The name of the function.
        name: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// An operation that cannot tolerate missing values received one.
    #[error("Error on line {line}: Missing values encountered: {details}.")]
    MissingData {
        /// What was being attempted.
        details: String,
        /// The source line where the error occurred.
        line:    usize,
    },
    /// An operation that needs a dataset was run without one.
    #[error("Error on line {line}: No dataset is in place.")]
    NoData {
        /// The source line where the error occurred.
        line: usize,
    },
    /// A result would be too large to allocate.
    #[error("Error on line {line}: Out of memory allocating {details}.")]
    Allocation {
        /// What was being allocated.
        details: String,
        /// The source line where the error occurred.
        line:    usize,
    },
    /// A variable of another kind already holds this name at this level.
    #[error("Error on line {line}: '{name}' already exists as a {existing}.")]
    DuplicateName {
        /// The name of the variable.
        name:     String,
        /// The kind of the existing variable.
        existing: String,
        /// The source line where the error occurred.
        line:     usize,
    },
    /// The wrong number of arguments was supplied to a function.
    #[error("Error on line {line}: Function '{name}' called with the wrong number of arguments.")]
    ArgumentCountMismatch {
        /// The name of the function.
        name: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// An index or selection is outside the addressed object.
    #[error("Error on line {line}: Index out of bounds: {details}.")]
    IndexOutOfBounds {
        /// Details about the selection.
        details: String,
        /// The source line where the error occurred.
        line:    usize,
    },
    /// An argument was invalid or out of range.
    #[error("Error on line {line}: Invalid argument: {details}.")]
    InvalidArgument {
        /// Details about why the argument is invalid.
        details: String,
        /// The source line where the error occurred.
        line:    usize,
    },
    /// A matrix that needed inverting is singular.
    #[error("Error on line {line}: Matrix is singular.")]
    Singular {
        /// The source line where the error occurred.
        line: usize,
    },
    /// An assertion failed during execution.
    #[error("Error on line {line}: Assertion failed.")]
    AssertionFailed {
        /// The source line where the error occurred.
        line: usize,
    },
    /// A file could not be read.
    #[error("Error on line {line}: Could not read '{path}': {details}.")]
    Io {
        /// The path that was being read.
        path:    String,
        /// The underlying I/O error message.
        details: String,
        /// The source line where the error occurred.
        line:    usize,
    },
    /// A statement reached at run time (inside a loop or function body)
    /// failed its compile step.
    #[error(transparent)]
    Compile(#[from] ParseError),
}

impl RuntimeError {
    /// Shorthand for the most common error: an operator or function applied
    /// to operands of the wrong kind.
    pub fn type_error(details: impl Into<String>, line: usize) -> Self {
        Self::TypeError { details: details.into(),
                          line }
    }

    /// Shorthand for a dimension mismatch.
    pub fn nonconformable(details: impl Into<String>, line: usize) -> Self {
        Self::Nonconformable { details: details.into(),
                               line }
    }
}
