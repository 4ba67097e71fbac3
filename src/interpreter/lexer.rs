use logos::Logos;

/// Represents a lexical token in the source input.
/// A token is a minimal but meaningful unit of text produced by the lexer.
/// This enum defines all recognized tokens in the language.
#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(extras = LexerExtras)]
pub enum Token {
    /// Numeric literal tokens, such as `3`, `3.14`, `.5` or `2.1e-10`.
    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", parse_number)]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", parse_number)]
    Number(f64),
    /// Double-quoted string literals. `\n`, `\t`, `\"` and `\\` are
    /// unescaped.
    #[regex(r#""([^"\\\n]|\\.)*""#, parse_string)]
    Str(String),
    /// `NA`
    #[token("NA")]
    Na,
    /// `null`
    #[token("null")]
    Null,
    /// `scalar`
    #[token("scalar")]
    Scalar,
    /// `series`
    #[token("series")]
    Series,
    /// `matrix`
    #[token("matrix")]
    Matrix,
    /// `string`
    #[token("string")]
    StringKw,
    /// `list`
    #[token("list")]
    List,
    /// `bundle`
    #[token("bundle")]
    Bundle,
    /// `void`
    #[token("void")]
    Void,
    /// `function`
    #[token("function")]
    Function,
    /// `end`
    #[token("end")]
    End,
    /// `return`
    #[token("return")]
    Return,
    /// `print`
    #[token("print")]
    Print,
    /// `delete`
    #[token("delete")]
    Delete,
    /// `loop`
    #[token("loop")]
    Loop,
    /// `endloop`
    #[token("endloop")]
    EndLoop,
    /// `nulldata`
    #[token("nulldata")]
    Nulldata,
    /// `smpl`
    #[token("smpl")]
    Smpl,
    /// `set`
    #[token("set")]
    Set,
    /// Identifier tokens; variable or function names such as `x` or `sqrt`.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),
    /// Accessors such as `$nobs`; the `$` is dropped.
    #[regex(r"\$[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice()[1..].to_string())]
    Accessor(String),
    /// `# Comments.`
    #[regex(r"#[^\n\r]*", logos::skip, allow_greedy = true)]
    Comment,
    /// ```text
    /// /* Multi line comments. */
    /// ```
    #[regex(r"/\*([^*]|\*[^/])*\*/", |lex| {
        let comment      = lex.slice();
        let newlines     = comment.chars().filter(|&c| c == '\n').count();
        lex.extras.line += newlines;
        logos::Skip
    })]
    MultiLineComment,
    /// `..`
    #[token("..")]
    DotDot,
    /// `.*`
    #[token(".*")]
    DotStar,
    /// `./`
    #[token("./")]
    DotSlash,
    /// `.^`
    #[token(".^")]
    DotCaret,
    /// `.=`
    #[token(".=")]
    DotAssign,
    /// `.`
    #[token(".")]
    Dot,
    /// `+=`
    #[token("+=")]
    PlusAssign,
    /// `-=`
    #[token("-=")]
    MinusAssign,
    /// `*=`
    #[token("*=")]
    MulAssign,
    /// `/=`
    #[token("/=")]
    DivAssign,
    /// `%=`
    #[token("%=")]
    ModAssign,
    /// `^=`
    #[token("^=")]
    PowAssign,
    /// `~=`
    #[token("~=")]
    TildeAssign,
    /// `|=`
    #[token("|=")]
    PipeAssign,
    /// `++`
    #[token("++")]
    PlusPlus,
    /// `--`
    #[token("--")]
    MinusMinus,
    /// `+`
    #[token("+")]
    Plus,
    /// `-`
    #[token("-")]
    Minus,
    /// `*`
    #[token("*")]
    Star,
    /// `/`
    #[token("/")]
    Slash,
    /// `\`
    #[token("\\")]
    Backslash,
    /// `^`
    #[token("^")]
    Caret,
    /// `%`
    #[token("%")]
    Percent,
    /// `'`
    #[token("'")]
    Apostrophe,
    /// `~`
    #[token("~")]
    Tilde,
    /// `||`
    #[token("||")]
    DoublePipe,
    /// `|`
    #[token("|")]
    Pipe,
    /// `&&`
    #[token("&&")]
    DoubleAmpersand,
    /// `&`
    #[token("&")]
    Ampersand,
    /// `?`
    #[token("?")]
    Question,
    /// `:`
    #[token(":")]
    Colon,
    /// `(`
    #[token("(")]
    LParen,
    /// `)`
    #[token(")")]
    RParen,
    /// `=`
    #[token("=")]
    Equals,
    /// `{`
    #[token("{")]
    LBrace,
    /// `}`
    #[token("}")]
    RBrace,
    /// `[`
    #[token("[")]
    LBracket,
    /// `]`
    #[token("]")]
    RBracket,
    /// `,`
    #[token(",")]
    Comma,
    /// `;`
    #[token(";")]
    Semicolon,
    /// `==`
    #[token("==")]
    EqualEqual,
    /// `!=`
    #[token("!=")]
    BangEqual,
    /// `<=`
    #[token("<=")]
    LessEqual,
    /// `>=`
    #[token(">=")]
    GreaterEqual,
    /// `<`
    #[token("<")]
    Less,
    /// `>`
    #[token(">")]
    Greater,
    /// `!`
    #[token("!")]
    Bang,

    /// Line breaks end statements.
    #[token("\n", |lex| {
        lex.extras.line += 1;
        Token::NewLine
    })]
    NewLine,
    /// Spaces, tabs, carriage returns and feeds.
    #[regex(r"[ \t\r\f]+", logos::skip)]
    Ignored,
}

/// Additional information carried by the lexer during tokenization.
///
/// Tracks the current line number for error reporting and diagnostics.
#[derive(Default)]
pub struct LexerExtras {
    /// The current line number in the source being tokenized.
    pub line: usize,
}

/// Parses a numeric literal from the current token slice.
fn parse_number(lex: &logos::Lexer<Token>) -> Option<f64> {
    lex.slice().parse().ok()
}

/// Strips the quotes from a string literal and resolves escapes.
///
/// Unknown escapes keep the escaped character.
fn parse_string(lex: &logos::Lexer<Token>) -> String {
    let slice = lex.slice();
    let inner = &slice[1..slice.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Tokenizes a whole script into `(token, line)` pairs.
///
/// # Errors
/// Returns `ParseError::UnexpectedToken` for input the lexer does not
/// recognize.
///
/// # Example
/// ```
/// use genr::interpreter::lexer::{Token, tokenize};
///
/// let tokens = tokenize("x = 1\ny += 2").unwrap();
///
/// assert_eq!(tokens[0], (Token::Identifier("x".into()), 1));
/// assert_eq!(tokens[4], (Token::Identifier("y".into()), 2));
/// assert_eq!(tokens[5].0, Token::PlusAssign);
/// ```
pub fn tokenize(source: &str) -> Result<Vec<(Token, usize)>, crate::error::ParseError> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer_with_extras(source, LexerExtras { line: 1 });

    while let Some(token) = lexer.next() {
        if let Ok(tok) = token {
            // A newline token reports the line it ends, not the one it starts.
            let line = if tok == Token::NewLine {
                lexer.extras.line - 1
            } else {
                lexer.extras.line
            };
            tokens.push((tok, line));
        } else {
            return Err(crate::error::ParseError::UnexpectedToken { token:
                                                                       lexer.slice().to_string(),
                                                                   line:  lexer.extras.line, });
        }
    }

    Ok(tokens)
}
