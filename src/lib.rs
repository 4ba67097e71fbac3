//! # genr
//!
//! genr is an evaluator for an econometric expression language written in
//! Rust. Scripts assign scalars, series, matrices, strings, lists and bundles
//! with `genr`-style statements such as `series y = log(x) - x(-1)` or
//! `M[2, ] = {1, 2, 3}`, with missing-value propagation, automatic casts
//! between kinds, loops and user functions.

#![warn(
    clippy::redundant_clone,
    clippy::needless_pass_by_value,
    clippy::similar_names,
    clippy::large_enum_variant,
    clippy::string_lit_as_bytes,
    clippy::match_same_arms,
    clippy::cargo,
    clippy::nursery,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    clippy::correctness,
    clippy::complexity,
    clippy::pedantic,
    //missing_docs,
)]
#![allow(clippy::missing_errors_doc)]

use crate::{
    error::Error,
    interpreter::{
        dataset::Dataset,
        evaluator::core::Context,
        lexer::tokenize,
        output::{PrintSink, render},
        parser::statement::parse_program,
        value::core::Value,
    },
};

/// Defines the structure of parsed code.
///
/// This module declares the `Expr` and `Statement` types that represent the
/// syntactic structure of a script as a tree. The AST is built by the parser
/// and traversed by the evaluator.
///
/// # Responsibilities
/// - Defines expression and statement types for all language constructs,
///   including assignment targets and their operators.
/// - Attaches source lines to AST nodes for error reporting.
pub mod ast;
/// Provides unified error types for parsing and evaluation.
///
/// This module defines all errors that can be raised while lexing, parsing,
/// compiling or evaluating a statement, and the non-fatal warnings that are
/// collected instead of raised.
///
/// # Responsibilities
/// - Defines error enums for all failure modes (lexer, parser, evaluator).
/// - Attaches line numbers and detailed messages for context.
pub mod error;
/// Orchestrates the entire process of code execution.
///
/// This module ties together lexing, parsing, evaluation, the value model,
/// the variable store and the dataset.
///
/// # Responsibilities
/// - Coordinates all core components: lexer, parser, evaluator, and value
///   types.
/// - Provides entry points for compiling and executing statements.
pub mod interpreter;
/// General utilities for missing values and safe numeric conversion.
pub mod util;

/// Parses and runs `source` in an existing context.
///
/// The script is parsed completely before any statement runs, so a syntax
/// error anywhere means nothing is executed. Statements then run in order;
/// a failing statement stops the script but the effects of earlier ones
/// stay in place.
///
/// # Returns
/// The value of the last statement that produced one.
///
/// # Errors
/// The parse error, or the first runtime error.
///
/// # Examples
/// ```
/// use genr::{interpreter::{evaluator::core::Context, value::core::Value}, run_with_context};
///
/// let mut ctx = Context::with_observations(3);
/// run_with_context(&mut ctx, "scalar x = 2\nx += 1").unwrap();
/// assert_eq!(ctx.store.lookup("x", 0), Some(&Value::Scalar(3.0)));
///
/// // A failing statement keeps the earlier assignments.
/// assert!(run_with_context(&mut ctx, "scalar y = 1\nscalar z = nope").is_err());
/// assert_eq!(ctx.store.lookup("y", 0), Some(&Value::Scalar(1.0)));
/// ```
pub fn run_with_context(ctx: &mut Context, source: &str) -> Result<Option<Value>, Error> {
    let tokens = tokenize(source)?;
    let program = parse_program(&mut tokens.iter().peekable())?;

    ctx.last_value = None;
    for statement in &program {
        ctx.exec_statement(statement)?;
    }
    Ok(ctx.last_value.clone())
}

/// Runs a whole script in a fresh context that prints to standard output.
///
/// With `auto_print`, the value of the last statement that produced one is
/// printed when the script ends.
///
/// # Errors
/// Returns an error if parsing or evaluation fails.
///
/// # Examples
/// ```
/// use genr::run_script;
///
/// assert!(run_script("scalar x = 2 + 2", false).is_ok());
///
/// // 'x' is not defined.
/// assert!(run_script("scalar y = x + 1", false).is_err());
/// ```
pub fn run_script(source: &str, auto_print: bool) -> Result<(), Error> {
    let mut ctx = Context::with_dataset(Dataset::default(), PrintSink::Stdout);
    let result = run_with_context(&mut ctx, source)?;

    if auto_print && let Some(v) = result {
        let text = render(None, &v, &ctx.dataset);
        ctx.printer.emit(&text, 0)?;
    }
    Ok(())
}
