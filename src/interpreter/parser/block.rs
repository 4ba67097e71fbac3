use std::iter::Peekable;

use crate::{
    ast::Statement,
    error::ParseError,
    interpreter::{
        lexer::Token,
        parser::{core::ParseResult, statement::parse_statement},
    },
};

/// Parses the statements of a block body.
///
/// Statements are collected until a token for which `is_end` returns `true`
/// starts a line; that token is left in the stream for the caller, which
/// checks and consumes the closing keyword. Blank lines are skipped.
///
/// # Parameters
/// - `tokens`: Token iterator positioned after the block header.
/// - `line`: Line of the block header, for end-of-input errors.
/// - `is_end`: Recognizes the closing keyword.
///
/// # Errors
/// Returns `ParseError::UnexpectedEndOfInput` if the input ends before the
/// closing keyword, or any error from the statements inside.
pub fn parse_block<'a, I>(tokens: &mut Peekable<I>,
                          line: usize,
                          is_end: fn(&Token) -> bool)
                          -> ParseResult<Vec<Statement>>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut statements = Vec::new();

    loop {
        while let Some((Token::NewLine, _)) = tokens.peek() {
            tokens.next();
        }
        match tokens.peek() {
            None => return Err(ParseError::UnexpectedEndOfInput { line }),
            Some((tok, _)) if is_end(tok) => break,
            Some(_) => statements.push(parse_statement(tokens)?),
        }
    }

    Ok(statements)
}
