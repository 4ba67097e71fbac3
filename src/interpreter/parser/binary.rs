use std::iter::Peekable;

use crate::{
    ast::{BinaryOperator, Expr},
    interpreter::{
        lexer::Token,
        parser::{core::ParseResult, unary::parse_unary},
    },
};

/// Maps a token to its corresponding binary operator.
///
/// Returns `None` for all tokens that are not binary operators.
///
/// # Example
/// ```
/// use genr::{
///     ast::BinaryOperator,
///     interpreter::{lexer::Token, parser::binary::token_to_binary_operator},
/// };
///
/// assert_eq!(token_to_binary_operator(&Token::Tilde),
///            Some(BinaryOperator::HCat));
/// assert_eq!(token_to_binary_operator(&Token::Comma), None);
/// ```
#[must_use]
pub const fn token_to_binary_operator(token: &Token) -> Option<BinaryOperator> {
    match token {
        Token::Plus => Some(BinaryOperator::Add),
        Token::Minus => Some(BinaryOperator::Sub),
        Token::Star => Some(BinaryOperator::Mul),
        Token::Slash => Some(BinaryOperator::Div),
        Token::Percent => Some(BinaryOperator::Mod),
        Token::Caret => Some(BinaryOperator::Pow),
        Token::DotStar => Some(BinaryOperator::DotMul),
        Token::DotSlash => Some(BinaryOperator::DotDiv),
        Token::DotCaret => Some(BinaryOperator::DotPow),
        Token::Backslash => Some(BinaryOperator::LDiv),
        Token::Tilde => Some(BinaryOperator::HCat),
        Token::Pipe => Some(BinaryOperator::VCat),
        Token::Less => Some(BinaryOperator::Less),
        Token::Greater => Some(BinaryOperator::Greater),
        Token::LessEqual => Some(BinaryOperator::LessEqual),
        Token::GreaterEqual => Some(BinaryOperator::GreaterEqual),
        Token::EqualEqual => Some(BinaryOperator::Equal),
        Token::BangEqual => Some(BinaryOperator::NotEqual),
        Token::DoubleAmpersand => Some(BinaryOperator::And),
        Token::DoublePipe => Some(BinaryOperator::Or),
        _ => None,
    }
}

/// Parses one left-associative precedence level.
///
/// `accepts` selects the operators belonging to this level and `next` parses
/// the operands at the next-higher level.
fn parse_level<'a, I>(tokens: &mut Peekable<I>,
                      accepts: fn(BinaryOperator) -> bool,
                      next: fn(&mut Peekable<I>) -> ParseResult<Expr>)
                      -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut left = next(tokens)?;
    loop {
        if let Some((token, line)) = tokens.peek()
           && let Some(op) = token_to_binary_operator(token)
           && accepts(op)
        {
            let line = *line;
            tokens.next();
            let right = next(tokens)?;
            left = Expr::BinaryOp { left: Box::new(left),
                                    op,
                                    right: Box::new(right),
                                    line };
            continue;
        }
        break;
    }
    Ok(left)
}

/// Parses logical OR expressions.
///
/// Grammar: `logical_or := logical_and ("||" logical_and)*`
pub fn parse_logical_or<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    parse_level(tokens, |op| op == BinaryOperator::Or, parse_logical_and)
}

/// Parses logical AND expressions.
///
/// Grammar: `logical_and := relational ("&&" relational)*`
pub fn parse_logical_and<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    parse_level(tokens, |op| op == BinaryOperator::And, parse_relational)
}

/// Parses relational and equality operators:
/// `<`, `>`, `<=`, `>=`, `==`, `!=`.
///
/// Grammar: `relational := concat (relop concat)*`
pub fn parse_relational<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    parse_level(tokens, BinaryOperator::is_comparison, parse_concat)
}

/// Parses horizontal (`~`) and vertical (`|`) concatenation.
///
/// Grammar: `concat := additive (("~" | "|") additive)*`
pub fn parse_concat<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    parse_level(tokens,
                |op| matches!(op, BinaryOperator::HCat | BinaryOperator::VCat),
                parse_additive)
}

/// Parses addition and subtraction expressions.
///
/// Grammar: `additive := multiplicative (("+" | "-") multiplicative)*`
pub fn parse_additive<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    parse_level(tokens,
                |op| matches!(op, BinaryOperator::Add | BinaryOperator::Sub),
                parse_multiplicative)
}

/// Parses multiplication-level expressions:
/// `*`, `/`, `%`, `.*`, `./` and `\`.
///
/// Grammar: `multiplicative := unary (mulop unary)*`
pub fn parse_multiplicative<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    parse_level(tokens,
                |op| {
                    matches!(op,
                             BinaryOperator::Mul
                             | BinaryOperator::Div
                             | BinaryOperator::Mod
                             | BinaryOperator::DotMul
                             | BinaryOperator::DotDiv
                             | BinaryOperator::LDiv)
                },
                parse_unary)
}
