use std::iter::Peekable;

use crate::{
    ast::{
        AssignOp, Expr, FunctionDef, GenrStatement, LoopCounter, LoopDef, Param, ParamDefault,
        PrintItem, Statement, Target, TargetSub, TypeKind,
    },
    error::ParseError,
    interpreter::{
        lexer::Token,
        parser::{
            block::parse_block,
            core::{ParseResult, at_statement_end, expect_statement_end, parse_expression},
            utils::{parse_comma_separated, parse_identifier, parse_index_body},
        },
    },
};

/// Parses a whole program: every statement until the end of input.
///
/// Blank lines are skipped.
///
/// # Example
/// ```
/// use genr::interpreter::{lexer::tokenize, parser::statement::parse_program};
///
/// let tokens = tokenize("scalar x = 1\n\nx += 2\nprint x").unwrap();
/// let program = parse_program(&mut tokens.iter().peekable()).unwrap();
///
/// assert_eq!(program.len(), 3);
/// ```
pub fn parse_program<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Vec<Statement>>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut statements = Vec::new();
    loop {
        while let Some((Token::NewLine, _)) = tokens.peek() {
            tokens.next();
        }
        if tokens.peek().is_none() {
            break;
        }
        statements.push(parse_statement(tokens)?);
    }
    Ok(statements)
}

/// Parses a single statement, including its terminating newline.
///
/// A statement may be one of:
/// - a command (`print`, `delete`, `nulldata`, `smpl`, `set`, `return`),
/// - a `loop` or `function` block,
/// - a genr statement (declaration, assignment or bare name),
/// - an expression used as a statement.
///
/// The first token decides which; an identifier is a genr statement only if
/// an assignment operator (or the end of the line) follows its target.
pub fn parse_statement<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Statement>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let Some((token, line)) = tokens.peek().copied() else {
        return Err(ParseError::UnexpectedEndOfInput { line: 0 });
    };
    let line = *line;

    if let Some(kind) = token_to_type_kind(token) {
        return parse_genr(tokens, Some(kind), line).map(Statement::Genr);
    }

    match token {
        Token::Function => parse_function_definition(tokens, line).map(Statement::Function),
        Token::Loop => parse_loop(tokens, line).map(Statement::Loop),
        Token::Return => {
            tokens.next();
            let value = if at_statement_end(tokens) {
                None
            } else {
                Some(parse_expression(tokens)?)
            };
            expect_statement_end(tokens)?;
            Ok(Statement::Return { value, line })
        },
        Token::Print => parse_print(tokens, line),
        Token::Delete => {
            tokens.next();
            let names = parse_name_list(tokens)?;
            if names.is_empty() {
                return Err(ParseError::UnexpectedEndOfInput { line });
            }
            Ok(Statement::Delete { names, line })
        },
        Token::Nulldata => {
            tokens.next();
            let n = parse_expression(tokens)?;
            expect_statement_end(tokens)?;
            Ok(Statement::Nulldata { n, line })
        },
        Token::Smpl => parse_smpl(tokens, line),
        Token::Set => parse_set(tokens, line),
        Token::Identifier(_) if genr_ahead(tokens) => {
            parse_genr(tokens, None, line).map(Statement::Genr)
        },
        Token::End | Token::EndLoop => {
            Err(ParseError::UnexpectedToken { token: format!("{token:?} without an open block"),
                                              line })
        },
        _ => {
            let expr = parse_expression(tokens)?;
            expect_statement_end(tokens)?;
            Ok(Statement::Expression { expr, line })
        },
    }
}

/// Maps a type keyword to the kind it declares.
const fn token_to_type_kind(token: &Token) -> Option<TypeKind> {
    match token {
        Token::Scalar => Some(TypeKind::Scalar),
        Token::Series => Some(TypeKind::Series),
        Token::Matrix => Some(TypeKind::Matrix),
        Token::StringKw => Some(TypeKind::Str),
        Token::List => Some(TypeKind::List),
        Token::Bundle => Some(TypeKind::Bundle),
        _ => None,
    }
}

/// Maps an assignment token to its operator.
const fn token_to_assign_op(token: &Token) -> Option<AssignOp> {
    match token {
        Token::Equals => Some(AssignOp::Assign),
        Token::PlusAssign => Some(AssignOp::Add),
        Token::MinusAssign => Some(AssignOp::Sub),
        Token::MulAssign => Some(AssignOp::Mul),
        Token::DivAssign => Some(AssignOp::Div),
        Token::ModAssign => Some(AssignOp::Mod),
        Token::PowAssign => Some(AssignOp::Pow),
        Token::PlusPlus => Some(AssignOp::Increment),
        Token::MinusMinus => Some(AssignOp::Decrement),
        Token::TildeAssign => Some(AssignOp::HCat),
        Token::PipeAssign => Some(AssignOp::VCat),
        Token::DotAssign => Some(AssignOp::Fill),
        _ => None,
    }
}

/// Looks ahead, without consuming input, to decide whether the statement
/// starting at an identifier is a genr statement.
///
/// That is the case for a bare name, or for a target (`x`, `x[...]`,
/// `x.key`) followed by an assignment operator.
fn genr_ahead<'a, I>(tokens: &Peekable<I>) -> bool
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut lookahead = tokens.clone();
    lookahead.next();

    match lookahead.peek() {
        Some((Token::LBracket, _)) => {
            let mut depth = 0usize;
            for (tok, _) in lookahead.by_ref() {
                match tok {
                    Token::LBracket => depth += 1,
                    Token::RBracket => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    },
                    Token::NewLine => return false,
                    _ => {},
                }
            }
        },
        Some((Token::Dot, _)) => {
            lookahead.next();
            if !matches!(lookahead.next(), Some((Token::Identifier(_), _))) {
                return false;
            }
        },
        None | Some((Token::NewLine, _)) => return true,
        _ => {},
    }

    lookahead.peek()
             .is_some_and(|(tok, _)| token_to_assign_op(tok).is_some())
}

/// Parses `[type] target [op expr]`.
///
/// The type keyword, if any, is consumed here. A bare name yields a
/// statement with no operator, which the evaluator turns into a declaration
/// or a print request.
///
/// # Errors
/// Returns a `ParseError` if the target is malformed, a declaration carries
/// a subscript, or the right-hand side fails to parse.
fn parse_genr<'a, I>(tokens: &mut Peekable<I>,
                     declared: Option<TypeKind>,
                     line: usize)
                     -> ParseResult<GenrStatement>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    if declared.is_some() {
        tokens.next();
    }
    let name = parse_identifier(tokens)?;

    let sub = match tokens.peek() {
        Some((Token::LBracket, l)) => {
            let l = *l;
            tokens.next();
            Some(TargetSub::Index(parse_index_body(tokens, l)?))
        },
        Some((Token::Dot, _)) => {
            tokens.next();
            Some(TargetSub::Member(parse_identifier(tokens)?))
        },
        _ => None,
    };

    if declared.is_some() && sub.is_some() {
        return Err(ParseError::UnexpectedToken { token: format!("subscript on declared variable '{name}'"),
                                                 line });
    }

    let target = Target { name, sub };

    if at_statement_end(tokens) {
        tokens.next();
        return Ok(GenrStatement { declared,
                                  target,
                                  op: None,
                                  value: None,
                                  line });
    }

    let op = match tokens.next() {
        Some((tok, l)) => token_to_assign_op(tok).ok_or_else(|| {
                              ParseError::UnexpectedToken { token: format!("Expected assignment operator, found {tok:?}"),
                                                            line:  *l, }
                          })?,
        None => return Err(ParseError::UnexpectedEndOfInput { line }),
    };

    let value = if op.is_unary() {
        None
    } else if declared == Some(TypeKind::List) && op == AssignOp::Assign {
        Some(parse_list_rhs(tokens, line)?)
    } else {
        Some(parse_expression(tokens)?)
    };

    expect_statement_end(tokens)?;

    Ok(GenrStatement { declared,
                       target,
                       op: Some(op),
                       value,
                       line })
}

/// Parses the right-hand side of a list declaration.
///
/// Two or more bare names separated by spaces form a list literal
/// (`list L = x1 x2 x3`); anything else is an ordinary expression.
fn parse_list_rhs<'a, I>(tokens: &mut Peekable<I>, line: usize) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut lookahead = tokens.clone();
    let mut names = Vec::new();
    while let Some((Token::Identifier(name), _)) = lookahead.peek() {
        names.push(name.clone());
        lookahead.next();
    }

    if names.len() >= 2 && matches!(lookahead.peek(), None | Some((Token::NewLine, _))) {
        *tokens = lookahead;
        return Ok(Expr::ListLiteral { names, line });
    }

    parse_expression(tokens)
}

/// Parses names separated by spaces or commas up to the end of the line.
fn parse_name_list<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Vec<String>>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut names = Vec::new();
    while !at_statement_end(tokens) {
        if let Some((Token::Comma, _)) = tokens.peek() {
            tokens.next();
            continue;
        }
        names.push(parse_identifier(tokens)?);
    }
    tokens.next();
    Ok(names)
}

/// Parses `print item...`.
///
/// A name followed by another name, a comma or the end of the line is
/// printed as a variable; anything else is parsed as an expression.
fn parse_print<'a, I>(tokens: &mut Peekable<I>, line: usize) -> ParseResult<Statement>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    tokens.next();
    let mut items = Vec::new();

    while !at_statement_end(tokens) {
        if let Some((Token::Comma, _)) = tokens.peek() {
            tokens.next();
            continue;
        }

        let mut lookahead = tokens.clone();
        if let Some((Token::Identifier(name), _)) = lookahead.next()
           && matches!(lookahead.peek(),
                       None
                       | Some((Token::NewLine | Token::Comma | Token::Identifier(_), _)))
        {
            tokens.next();
            items.push(PrintItem::Name(name.clone()));
        } else {
            items.push(PrintItem::Expr(parse_expression(tokens)?));
        }
    }
    tokens.next();

    if items.is_empty() {
        return Err(ParseError::UnexpectedEndOfInput { line });
    }
    Ok(Statement::Print { items, line })
}

/// Parses `smpl a b` or `smpl full`.
fn parse_smpl<'a, I>(tokens: &mut Peekable<I>, line: usize) -> ParseResult<Statement>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    tokens.next();

    if let Some((Token::Identifier(word), _)) = tokens.peek()
       && word == "full"
    {
        tokens.next();
        expect_statement_end(tokens)?;
        return Ok(Statement::Smpl { range: None,
                                    line });
    }

    let first = parse_expression(tokens)?;
    if let Some((Token::Comma, _)) = tokens.peek() {
        tokens.next();
    }
    let last = parse_expression(tokens)?;
    expect_statement_end(tokens)?;

    Ok(Statement::Smpl { range: Some((first, last)),
                         line })
}

/// Parses `set key value`.
fn parse_set<'a, I>(tokens: &mut Peekable<I>, line: usize) -> ParseResult<Statement>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    tokens.next();
    let key = parse_identifier(tokens)?;

    let value = match tokens.next() {
        Some((Token::Identifier(v) | Token::Str(v), _)) => v.clone(),
        Some((Token::Number(n), _)) => n.to_string(),
        Some((tok, l)) => {
            return Err(ParseError::UnexpectedToken { token: format!("Expected a value for '{key}', found {tok:?}"),
                                                     line:  *l, });
        },
        None => return Err(ParseError::UnexpectedEndOfInput { line }),
    };
    expect_statement_end(tokens)?;

    Ok(Statement::Set { key, value, line })
}

/// Parses a loop block.
///
/// Syntax:
/// ```text
///     loop <count>
///     loop <var> = <start> .. <end>
///         <statements>
///     endloop
/// ```
fn parse_loop<'a, I>(tokens: &mut Peekable<I>, line: usize) -> ParseResult<LoopDef>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    tokens.next();

    let mut lookahead = tokens.clone();
    let counter = if let Some((Token::Identifier(var), _)) = lookahead.next()
                     && let Some((Token::Equals, _)) = lookahead.peek()
    {
        tokens.next();
        tokens.next();
        let start = parse_expression(tokens)?;
        match tokens.next() {
            Some((Token::DotDot, _)) => {},
            Some((tok, l)) => {
                return Err(ParseError::UnexpectedToken { token: format!("Expected '..' in loop range, found {tok:?}"),
                                                         line:  *l, });
            },
            None => return Err(ParseError::UnexpectedEndOfInput { line }),
        }
        let end = parse_expression(tokens)?;
        LoopCounter::Range { var: var.clone(),
                             start,
                             end }
    } else {
        LoopCounter::Times(parse_expression(tokens)?)
    };
    expect_statement_end(tokens)?;

    let body = parse_block(tokens, line, |tok| matches!(tok, Token::EndLoop))?;
    tokens.next();
    expect_statement_end(tokens)?;

    Ok(LoopDef { counter, body, line })
}

/// Parses a function definition.
///
/// Syntax:
/// ```text
///     function <type|void> <name>(<type> [*]<param> [\[default\]], ...)
///         <statements>
///     end function
/// ```
///
/// # Errors
/// Returns `ParseError::InvalidFunctionDefinition` for a missing return
/// type, a nested definition, or an `end` not followed by `function`.
fn parse_function_definition<'a, I>(tokens: &mut Peekable<I>, line: usize)
                                    -> ParseResult<FunctionDef>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    tokens.next();

    let return_type = match tokens.next() {
        Some((Token::Void, _)) => None,
        Some((tok, l)) => Some(token_to_type_kind(tok).ok_or_else(|| {
                                   ParseError::InvalidFunctionDefinition { details: format!("expected a return type, found {tok:?}"),
                                                                           line:    *l, }
                               })?),
        None => return Err(ParseError::UnexpectedEndOfInput { line }),
    };

    let name = parse_identifier(tokens)?;
    match tokens.next() {
        Some((Token::LParen, _)) => {},
        Some((tok, l)) => {
            return Err(ParseError::UnexpectedToken { token: format!("Expected '(' after function name, found {tok:?}"),
                                                     line:  *l, });
        },
        None => return Err(ParseError::UnexpectedEndOfInput { line }),
    }
    let params = parse_comma_separated(tokens, parse_param, &Token::RParen)?;
    expect_statement_end(tokens)?;

    let body = parse_block(tokens, line, |tok| matches!(tok, Token::End | Token::Function))?;
    match tokens.next() {
        Some((Token::End, _)) => {},
        _ => {
            return Err(ParseError::InvalidFunctionDefinition { details: format!("nested definition inside '{name}'"),
                                                               line });
        },
    }
    match tokens.next() {
        Some((Token::Function, _)) => {},
        _ => {
            return Err(ParseError::InvalidFunctionDefinition { details: "expected 'end function'".to_string(),
                                                               line });
        },
    }
    expect_statement_end(tokens)?;

    Ok(FunctionDef { name,
                     return_type,
                     params,
                     body,
                     line })
}

/// Parses one parameter: `<type> [*]<name> [\[null\] | \[<expr>\]]`.
fn parse_param<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Param>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let kind = match tokens.next() {
        Some((tok, l)) => token_to_type_kind(tok).ok_or_else(|| {
                              ParseError::InvalidFunctionDefinition { details: format!("expected a parameter type, found {tok:?}"),
                                                                      line:    *l, }
                          })?,
        None => return Err(ParseError::UnexpectedEndOfInput { line: 0 }),
    };

    let by_ref = if let Some((Token::Star, _)) = tokens.peek() {
        tokens.next();
        true
    } else {
        false
    };

    let name = parse_identifier(tokens)?;

    let default = if let Some((Token::LBracket, l)) = tokens.peek() {
        let l = *l;
        tokens.next();
        let default = if let Some((Token::Null, _)) = tokens.peek() {
            tokens.next();
            ParamDefault::Null
        } else {
            ParamDefault::Value(parse_expression(tokens)?)
        };
        match tokens.next() {
            Some((Token::RBracket, _)) => {},
            _ => {
                return Err(ParseError::InvalidFunctionDefinition { details: format!("expected ']' after default of '{name}'"),
                                                                   line:    l, });
            },
        }
        Some(default)
    } else {
        None
    };

    Ok(Param { name,
               kind,
               by_ref,
               default })
}
