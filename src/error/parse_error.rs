use thiserror::Error;

/// Represents all errors that can occur before evaluation starts: lexing,
/// parsing, and the compile step that resolves and validates a statement's
/// left-hand side.
///
/// A `ParseError` never leaves partial state behind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Found an unexpected token while parsing.
    #[error("Error on line {line}: Unexpected token: {token}.")]
    UnexpectedToken {
        /// The token encountered.
        token: String,
        /// The source line where the error occurred.
        line:  usize,
    },
    /// Reached the end of input unexpectedly.
    #[error("Error on line {line}: Unexpected end of input.")]
    UnexpectedEndOfInput {
        /// The source line where the error occurred.
        line: usize,
    },
    /// Found extra tokens after a complete statement.
    #[error("Error on line {line}: Extra tokens after statement: {token}.")]
    UnexpectedTrailingTokens {
        /// The extra token.
        token: String,
        /// The source line where the error occurred.
        line:  usize,
    },
    /// Tried to use a reserved identifier as a variable name.
    #[error("Error on line {line}: Identifier {name} is reserved.")]
    IdentifierReserved {
        /// The reserved identifier name.
        name: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// An inflected operator was used on a name that does not exist, or a
    /// print request named an unknown variable.
    #[error("Error on line {line}: Unknown variable '{name}'.")]
    UnknownVariable {
        /// The name of the variable.
        name: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// The assignment operator does not make sense for the target.
    #[error("Error on line {line}: Operator '{op}' is not valid here: {details}.")]
    InvalidOperator {
        /// The offending operator.
        op:      String,
        /// Why it is not valid.
        details: String,
        /// The source line where the error occurred.
        line:    usize,
    },
    /// The assignment operator is not implemented for the target kind.
    #[error("Error on line {line}: Operator '{op}' is not implemented for {kind} targets.")]
    NotImplemented {
        /// The offending operator.
        op:   String,
        /// The target kind.
        kind: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// A function definition was malformed.
    #[error("Error on line {line}: Invalid function definition: {details}.")]
    InvalidFunctionDefinition {
        /// Details about the problem.
        details: String,
        /// The source line where the error occurred.
        line:    usize,
    },
}
