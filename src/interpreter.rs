/// The evaluator module executes AST nodes and computes results.
///
/// The evaluator compiles genr statements, walks expression trees, applies
/// the type-combination dispatch for every operator, writes results back to
/// the dataset and the variable store, and runs loops and user functions.
///
/// # Responsibilities
/// - Evaluates expressions over scalars, series, matrices, strings, lists and
///   bundles with missing-value propagation.
/// - Resolves assignment targets and enforces kind rules on writes.
/// - Reuses intermediate storage across repeated passes of one statement.
pub mod evaluator;
/// The lexer module tokenizes source code for further parsing.
///
/// The lexer (tokenizer) reads the raw source text and produces a stream of
/// tokens, each corresponding to meaningful language elements such as numbers,
/// identifiers, operators, delimiters, and keywords. This is the first stage of
/// interpretation.
///
/// # Responsibilities
/// - Converts the input character stream into tokens with type and source
///   location.
/// - Handles numeric and string literals, identifiers, and operators.
/// - Reports lexical errors for invalid or malformed input.
pub mod lexer;
/// The parser module builds the abstract syntax tree (AST) from tokens.
///
/// The parser processes the token stream produced by the lexer and constructs
/// an AST that represents the syntactic structure of expressions and
/// statements. This enables later phases to analyze and execute user code.
///
/// # Responsibilities
/// - Converts tokens into structured AST nodes (expressions, statements).
/// - Validates correct grammar and syntax, reporting errors with location info.
/// - Supports genr statements, commands, loops and function definitions.
pub mod parser;
/// The value module defines the runtime data types for evaluation.
///
/// # Responsibilities
/// - Defines the `Value` enum and all supported value variants.
/// - Implements matrices with their linear algebra, and bundles.
pub mod value;
/// Named variables scoped by function-call depth.
///
/// Holds every user scalar, matrix, string, list and bundle, and implements
/// call-by-reference by renaming and re-scoping entries.
pub mod store;
/// The dataset that series live in.
///
/// Observation count, current sample range and named columns.
pub mod dataset;
/// Printing.
///
/// Number formatting, value rendering and the print destination.
pub mod output;
