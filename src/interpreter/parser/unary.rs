use std::iter::Peekable;

use crate::{
    ast::{BinaryOperator, Expr, UnaryOperator},
    error::ParseError,
    interpreter::{
        lexer::Token,
        parser::{
            core::{ParseResult, parse_expression},
            utils::{parse_comma_separated, parse_index_body},
        },
    },
    util::num::NADBL,
};

/// Parses a unary expression.
///
/// Supports prefix operators:
/// - `-`  (numeric negation)
/// - `+`  (unary plus)
/// - `!`  (logical not)
///
/// Unary operators bind more loosely than exponentiation, so `-2^2` is
/// `-(2^2)`.
///
/// Grammar:
/// ```text
///     unary := ("-" | "+" | "!") unary
///            | power
/// ```
pub(crate) fn parse_unary<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let op = match tokens.peek() {
        Some((Token::Minus, _)) => Some(UnaryOperator::Negate),
        Some((Token::Plus, _)) => Some(UnaryOperator::Plus),
        Some((Token::Bang, _)) => Some(UnaryOperator::Not),
        _ => None,
    };

    if let Some(op) = op
       && let Some((_, line)) = tokens.next()
    {
        let expr = parse_unary(tokens)?;
        return Ok(Expr::UnaryOp { op,
                                  expr: Box::new(expr),
                                  line: *line });
    }

    parse_power(tokens)
}

/// Parses exponentiation.
///
/// `^` and `.^` are right-associative and accept a signed exponent, so
/// `2^-1` and `a ^ b ^ c` both parse as expected.
///
/// Grammar: `power := postfix (("^" | ".^") unary)?`
fn parse_power<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let base = parse_primary(tokens)?;
    let base = parse_postfix(tokens, base)?;

    let op = match tokens.peek() {
        Some((Token::Caret, _)) => BinaryOperator::Pow,
        Some((Token::DotCaret, _)) => BinaryOperator::DotPow,
        _ => return Ok(base),
    };
    let line = tokens.next().map_or(0, |(_, l)| *l);
    let exponent = parse_unary(tokens)?;

    Ok(Expr::BinaryOp { left: Box::new(base),
                        op,
                        right: Box::new(exponent),
                        line })
}

/// Parses a primary (atomic) expression.
///
/// Grammar (simplified):
/// ```text
///     primary := NUMBER | STRING | "NA" | "null" | ACCESSOR
///              | IDENTIFIER ( "(" arguments ")" )?
///              | "(" expression ")"
///              | "{" matrix_rows "}"
/// ```
pub(crate) fn parse_primary<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let (tok, line) = tokens.next()
                            .ok_or(ParseError::UnexpectedEndOfInput { line: 0 })?;
    let line = *line;

    match tok {
        Token::Number(value) => Ok(Expr::Number { value: *value,
                                                  line }),
        Token::Na => Ok(Expr::Number { value: NADBL,
                                       line }),
        Token::Str(value) => Ok(Expr::Str { value: value.clone(),
                                            line }),
        Token::Null => Ok(Expr::Null { line }),
        Token::Accessor(name) => Ok(Expr::Accessor { name: name.clone(),
                                                     line }),
        Token::Identifier(name) => {
            if let Some((Token::LParen, _)) = tokens.peek() {
                tokens.next();
                let arguments = parse_comma_separated(tokens, parse_argument, &Token::RParen)?;
                Ok(Expr::FunctionCall { name: name.clone(),
                                        arguments,
                                        line })
            } else {
                Ok(Expr::Variable { name: name.clone(),
                                    line })
            }
        },
        Token::LParen => {
            let expr = parse_expression(tokens)?;
            match tokens.next() {
                Some((Token::RParen, _)) => Ok(expr),
                Some((tok, l)) => {
                    Err(ParseError::UnexpectedToken { token: format!("Expected ')', found {tok:?}"),
                                                      line:  *l, })
                },
                None => Err(ParseError::UnexpectedEndOfInput { line }),
            }
        },
        Token::LBrace => parse_matrix_literal(tokens, line),
        tok => Err(ParseError::UnexpectedToken { token: format!("{tok:?}"),
                                                 line }),
    }
}

/// Parses one function-call argument: an expression, or `&name` to pass a
/// variable by reference.
fn parse_argument<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    if let Some((Token::Ampersand, line)) = tokens.peek() {
        let line = *line;
        tokens.next();
        return match tokens.next() {
            Some((Token::Identifier(name), _)) => Ok(Expr::Reference { name: name.clone(),
                                                                       line }),
            Some((tok, l)) => {
                Err(ParseError::UnexpectedToken { token: format!("Expected name after '&', found {tok:?}"),
                                                  line:  *l, })
            },
            None => Err(ParseError::UnexpectedEndOfInput { line }),
        };
    }
    parse_expression(tokens)
}

/// Parses postfix operators applied to an expression.
///
/// Handles, in any order and any number of times:
/// - transpose `expr'`
/// - subscripts `expr[i]`, `expr[i, j]`, `expr[a:b, ]`
/// - bundle members `expr.key`
fn parse_postfix<'a, I>(tokens: &mut Peekable<I>, mut node: Expr) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    loop {
        match tokens.peek() {
            Some((Token::Apostrophe, line)) => {
                let line = *line;
                tokens.next();
                node = Expr::Transpose { expr: Box::new(node),
                                         line };
            },
            Some((Token::LBracket, line)) => {
                let line = *line;
                tokens.next();
                let index = parse_index_body(tokens, line)?;
                node = Expr::Index { target: Box::new(node),
                                     index: Box::new(index),
                                     line };
            },
            Some((Token::Dot, line)) => {
                let line = *line;
                tokens.next();
                match tokens.next() {
                    Some((Token::Identifier(key), _)) => {
                        node = Expr::Member { target: Box::new(node),
                                              key: key.clone(),
                                              line };
                    },
                    Some((tok, l)) => {
                        return Err(ParseError::UnexpectedToken { token: format!("Expected key after '.', found {tok:?}"),
                                                                 line:  *l, });
                    },
                    None => return Err(ParseError::UnexpectedEndOfInput { line }),
                }
            },
            _ => break,
        }
    }
    Ok(node)
}

/// Parses the body of a matrix literal after the opening `{`.
///
/// Elements are separated by `,` and rows by `;`. `{}` is the empty matrix.
///
/// Grammar: `matrix := "{" (row (";" row)*)? "}"`, `row := expression ("," expression)*`
fn parse_matrix_literal<'a, I>(tokens: &mut Peekable<I>, line: usize) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut rows = Vec::new();
    if let Some((Token::RBrace, _)) = tokens.peek() {
        tokens.next();
        return Ok(Expr::MatrixLiteral { rows, line });
    }

    let mut row = Vec::new();
    loop {
        row.push(parse_expression(tokens)?);
        match tokens.next() {
            Some((Token::Comma, _)) => {},
            Some((Token::Semicolon, _)) => rows.push(std::mem::take(&mut row)),
            Some((Token::RBrace, _)) => {
                rows.push(row);
                break;
            },
            Some((tok, l)) => {
                return Err(ParseError::UnexpectedToken { token: format!("Expected ',', ';' or '}}' in matrix, found {tok:?}"),
                                                         line:  *l, });
            },
            None => return Err(ParseError::UnexpectedEndOfInput { line }),
        }
    }

    Ok(Expr::MatrixLiteral { rows, line })
}
