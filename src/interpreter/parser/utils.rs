use std::iter::Peekable;

use crate::{
    ast::{IndexExpr, SliceExpr},
    error::ParseError,
    interpreter::{
        lexer::Token,
        parser::core::{ParseResult, parse_expression},
    },
};

/// Parses a comma-separated list of items until a closing token.
///
/// This utility is shared by function argument lists and parameter lists.
/// It repeatedly calls `parse_item` to parse one element, expecting either:
///
/// - a comma, to continue the list, or
/// - the specified closing token, to end it.
///
/// An immediately encountered closing token produces an empty list.
///
/// Grammar (simplified): `list := item ("," item)*`
///
/// # Errors
/// Returns a `ParseError` if:
/// - an item fails to parse,
/// - an unexpected token is encountered,
/// - the stream ends before the closing token.
pub(in crate::interpreter::parser) fn parse_comma_separated<'a, I, T>(
    tokens: &mut Peekable<I>,
    parse_item: impl Fn(&mut Peekable<I>) -> ParseResult<T>,
    closing: &Token)
    -> Result<Vec<T>, ParseError>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut items = Vec::new();
    if let Some((tok, _)) = tokens.peek()
       && tok == closing
    {
        tokens.next();

        return Ok(items);
    }
    loop {
        items.push(parse_item(tokens)?);
        match tokens.peek() {
            Some((Token::Comma, _)) => {
                tokens.next();
            },
            Some((tok, _)) if tok == closing => {
                tokens.next();
                break;
            },
            Some((tok, line)) => {
                return Err(ParseError::UnexpectedToken { token: format!("Expected ',' or {closing:?}, found {tok:?}"),
                                                         line:  *line, });
            },
            None => return Err(ParseError::UnexpectedEndOfInput { line: 0 }),
        }
    }
    Ok(items)
}

/// Parses a plain identifier and returns its name.
///
/// # Errors
/// Returns a `ParseError` if the next token is not an identifier or the
/// input ends.
pub(in crate::interpreter::parser) fn parse_identifier<'a, I>(tokens: &mut Peekable<I>)
                                                              -> ParseResult<String>
    where I: Iterator<Item = &'a (Token, usize)>
{
    match tokens.next() {
        Some((Token::Identifier(s), _)) => Ok(s.clone()),
        Some((tok, line)) => {
            Err(ParseError::UnexpectedToken { token: format!("Expected identifier, found {tok:?}"),
                                              line:  *line, })
        },
        None => Err(ParseError::UnexpectedEndOfInput { line: 0 }),
    }
}

/// Parses the inside of a subscript, after the opening `[`, up to and
/// including the closing `]`.
///
/// Either dimension may be omitted to select everything, and each may be a
/// single expression or an inclusive `a:b` range.
///
/// Grammar:
/// ```text
///     index := slice? ("," slice?)? "]"
///     slice := expression (":" expression)?
/// ```
///
/// # Errors
/// Returns a `ParseError` on a malformed slice or a missing `]`.
pub(in crate::interpreter::parser) fn parse_index_body<'a, I>(tokens: &mut Peekable<I>,
                                                              line: usize)
                                                              -> ParseResult<IndexExpr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let rows = match tokens.peek() {
        Some((Token::Comma, _)) => SliceExpr::All,
        _ => parse_slice(tokens)?,
    };

    let cols = match tokens.next() {
        Some((Token::RBracket, _)) => None,
        Some((Token::Comma, _)) => {
            let cols = match tokens.peek() {
                Some((Token::RBracket, _)) => SliceExpr::All,
                _ => parse_slice(tokens)?,
            };
            match tokens.next() {
                Some((Token::RBracket, _)) => Some(cols),
                Some((tok, l)) => {
                    return Err(ParseError::UnexpectedToken { token: format!("Expected ']', found {tok:?}"),
                                                             line:  *l, });
                },
                None => return Err(ParseError::UnexpectedEndOfInput { line }),
            }
        },
        Some((tok, l)) => {
            return Err(ParseError::UnexpectedToken { token: format!("Expected ',' or ']', found {tok:?}"),
                                                     line:  *l, });
        },
        None => return Err(ParseError::UnexpectedEndOfInput { line }),
    };

    Ok(IndexExpr { rows, cols })
}

/// Parses one dimension of a subscript.
fn parse_slice<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<SliceExpr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let first = parse_expression(tokens)?;
    if let Some((Token::Colon, _)) = tokens.peek() {
        tokens.next();
        let last = parse_expression(tokens)?;
        return Ok(SliceExpr::Range(first, last));
    }
    Ok(SliceExpr::Expr(first))
}
