use std::iter::Peekable;

use crate::{
    ast::Expr,
    error::ParseError,
    interpreter::{lexer::Token, parser::binary::parse_logical_or},
};

pub type ParseResult<T> = Result<T, ParseError>;

/// Parses a full expression.
///
/// This is the entry point for expression parsing.
/// It begins at the lowest-precedence level, the ternary conditional, and
/// recursively descends through the precedence hierarchy.
///
/// Grammar: `expression := logical_or ("?" expression ":" expression)?`
///
/// The conditional is right-associative, so `a ? b : c ? d : e` parses as
/// `a ? b : (c ? d : e)`.
///
/// # Parameters
/// - `tokens`: Token iterator providing `(Token, line)` pairs.
///
/// # Returns
/// The parsed expression node.
pub fn parse_expression<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let condition = parse_logical_or(tokens)?;

    if let Some((Token::Question, line)) = tokens.peek() {
        let line = *line;
        tokens.next();
        let then_branch = parse_expression(tokens)?;
        match tokens.next() {
            Some((Token::Colon, _)) => {},
            Some((tok, l)) => {
                return Err(ParseError::UnexpectedToken { token: format!("Expected ':' in conditional, found {tok:?}"),
                                                         line:  *l, });
            },
            None => return Err(ParseError::UnexpectedEndOfInput { line }),
        }
        let else_branch = parse_expression(tokens)?;
        return Ok(Expr::Ternary { condition: Box::new(condition),
                                  then_branch: Box::new(then_branch),
                                  else_branch: Box::new(else_branch),
                                  line });
    }

    Ok(condition)
}

/// Returns `true` when the next token ends the current statement.
pub(in crate::interpreter::parser) fn at_statement_end<'a, I>(tokens: &mut Peekable<I>) -> bool
    where I: Iterator<Item = &'a (Token, usize)>
{
    matches!(tokens.peek(), None | Some((Token::NewLine, _)))
}

/// Consumes the end of a statement: a newline or the end of input.
///
/// # Errors
/// Returns `ParseError::UnexpectedTrailingTokens` if anything else follows.
pub(in crate::interpreter::parser) fn expect_statement_end<'a, I>(tokens: &mut Peekable<I>)
                                                                  -> ParseResult<()>
    where I: Iterator<Item = &'a (Token, usize)>
{
    match tokens.next() {
        None | Some((Token::NewLine, _)) => Ok(()),
        Some((tok, line)) => Err(ParseError::UnexpectedTrailingTokens { token: format!("{tok:?}"),
                                                                        line:  *line, }),
    }
}
