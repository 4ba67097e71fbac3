use std::fmt;

/// The kinds of value a named variable can hold.
///
/// Used for explicit declarations (`matrix m = ...`), for function parameter
/// and return types, and for reporting type errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// A single double.
    Scalar,
    /// One double per dataset observation.
    Series,
    /// A two-dimensional array of doubles.
    Matrix,
    /// A text value.
    Str,
    /// An ordered collection of series identifiers.
    List,
    /// A key to value map.
    Bundle,
}

impl TypeKind {
    /// Numeric code reported by `inbundle()`.
    ///
    /// # Example
    /// ```
    /// use genr::ast::TypeKind;
    ///
    /// assert_eq!(TypeKind::Matrix.code(), 3);
    /// ```
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Scalar => 1,
            Self::Series => 2,
            Self::Matrix => 3,
            Self::Str => 4,
            Self::Bundle => 5,
            Self::List => 7,
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Scalar => "scalar",
            Self::Series => "series",
            Self::Matrix => "matrix",
            Self::Str => "string",
            Self::List => "list",
            Self::Bundle => "bundle",
        };
        write!(f, "{name}")
    }
}

/// One dimension of a subscript such as `M[2:3, ]`.
#[derive(Debug, Clone, PartialEq)]
pub enum SliceExpr {
    /// An omitted dimension: every row or every column.
    All,
    /// A single expression: a position, an index vector or a boolean mask.
    Expr(Expr),
    /// An inclusive `a:b` range of positions.
    Range(Expr, Expr),
}

/// The contents of a pair of brackets.
///
/// `x[i]` has no `cols`; `M[i, j]` has both.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpr {
    /// The first (or only) dimension.
    pub rows: SliceExpr,
    /// The second dimension, when a comma was present.
    pub cols: Option<SliceExpr>,
}

/// An abstract syntax tree node representing an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A numeric literal. `NA` is parsed as the missing-value sentinel.
    Number {
        /// The constant value.
        value: f64,
        /// Line number in the source code.
        line:  usize,
    },
    /// A string literal.
    Str {
        /// The text, with escapes resolved.
        value: String,
        /// Line number in the source code.
        line:  usize,
    },
    /// The `null` keyword, used for omitted optional arguments and empty
    /// lists.
    Null {
        /// Line number in the source code.
        line: usize,
    },
    /// Reference to a variable by name.
    Variable {
        /// Name of the variable.
        name: String,
        /// Line number in the source code.
        line: usize,
    },
    /// A built-in accessor such as `$nobs`.
    Accessor {
        /// Name without the leading `$`.
        name: String,
        /// Line number in the source code.
        line: usize,
    },
    /// A unary operation.
    UnaryOp {
        /// The unary operator to apply.
        op:   UnaryOperator,
        /// The operand expression.
        expr: Box<Self>,
        /// Line number in the source code.
        line: usize,
    },
    /// A binary operation.
    BinaryOp {
        /// Left operand.
        left:  Box<Self>,
        /// The operator.
        op:    BinaryOperator,
        /// Right operand.
        right: Box<Self>,
        /// Line number in the source code.
        line:  usize,
    },
    /// Conditional expression `c ? a : b`.
    Ternary {
        /// The condition.
        condition:   Box<Self>,
        /// Value where the condition is true.
        then_branch: Box<Self>,
        /// Value where the condition is false.
        else_branch: Box<Self>,
        /// Line number in the source code.
        line:        usize,
    },
    /// A call `f(a, b)`. When `name` is a series rather than a function this
    /// is a lag, as in `y(-1)`.
    FunctionCall {
        /// Name of the function being called.
        name:      String,
        /// Arguments to the function.
        arguments: Vec<Self>,
        /// Line number in the source code.
        line:      usize,
    },
    /// A by-reference argument `&name`.
    Reference {
        /// The referenced variable.
        name: String,
        /// Line number in the source code.
        line: usize,
    },
    /// Matrix literal `{1, 2; 3, 4}`.
    MatrixLiteral {
        /// Rows of element expressions.
        rows: Vec<Vec<Self>>,
        /// Line number in the source code.
        line: usize,
    },
    /// Space-separated series names on the right of a list declaration.
    ListLiteral {
        /// Names of the member series (or lists, which are expanded).
        names: Vec<String>,
        /// Line number in the source code.
        line:  usize,
    },
    /// Subscript `x[...]`.
    Index {
        /// The indexed expression.
        target: Box<Self>,
        /// The subscript.
        index:  Box<IndexExpr>,
        /// Line number in the source code.
        line:   usize,
    },
    /// Bundle member access `b.key`.
    Member {
        /// The bundle expression.
        target: Box<Self>,
        /// The key.
        key:    String,
        /// Line number in the source code.
        line:   usize,
    },
    /// Postfix transpose `A'`.
    Transpose {
        /// The operand.
        expr: Box<Self>,
        /// Line number in the source code.
        line: usize,
    },
}

impl Expr {
    /// Gets the line number from `self`.
    ///
    /// # Example
    /// ```
    /// use genr::ast::Expr;
    ///
    /// let expr = Expr::Variable { name: "x".to_string(),
    ///                             line: 5, };
    ///
    /// assert_eq!(expr.line_number(), 5);
    /// ```
    #[must_use]
    pub const fn line_number(&self) -> usize {
        match self {
            Self::Number { line, .. }
            | Self::Str { line, .. }
            | Self::Null { line }
            | Self::Variable { line, .. }
            | Self::Accessor { line, .. }
            | Self::UnaryOp { line, .. }
            | Self::BinaryOp { line, .. }
            | Self::Ternary { line, .. }
            | Self::FunctionCall { line, .. }
            | Self::Reference { line, .. }
            | Self::MatrixLiteral { line, .. }
            | Self::ListLiteral { line, .. }
            | Self::Index { line, .. }
            | Self::Member { line, .. }
            | Self::Transpose { line, .. } => *line,
        }
    }

    /// Returns `true` if the expression contains a lag of the series `name`,
    /// such as `name(-1)`.
    ///
    /// This is what makes an assignment autoregressive: each observation of
    /// the right-hand side depends on an earlier observation of the target.
    ///
    /// # Example
    /// ```
    /// use genr::ast::{BinaryOperator, Expr};
    ///
    /// let lag = Expr::FunctionCall { name:      "y".into(),
    ///                                arguments: vec![Expr::Number { value: -1.0,
    ///                                                               line:  1, }],
    ///                                line:      1, };
    /// let rhs = Expr::BinaryOp { left:  Box::new(lag),
    ///                            op:    BinaryOperator::Add,
    ///                            right: Box::new(Expr::Number { value: 1.0,
    ///                                                           line:  1, }),
    ///                            line:  1, };
    ///
    /// assert!(rhs.lags_series("y"));
    /// assert!(!rhs.lags_series("x"));
    /// ```
    #[must_use]
    pub fn lags_series(&self, name: &str) -> bool {
        match self {
            Self::FunctionCall { name: callee,
                                 arguments,
                                 .. } => {
                (callee == name && arguments.len() == 1)
                || arguments.iter().any(|a| a.lags_series(name))
            },
            Self::UnaryOp { expr, .. } | Self::Transpose { expr, .. } => expr.lags_series(name),
            Self::BinaryOp { left, right, .. } => {
                left.lags_series(name) || right.lags_series(name)
            },
            Self::Ternary { condition,
                            then_branch,
                            else_branch,
                            .. } => {
                condition.lags_series(name)
                || then_branch.lags_series(name)
                || else_branch.lags_series(name)
            },
            Self::MatrixLiteral { rows, .. } => rows.iter().flatten().any(|e| e.lags_series(name)),
            Self::Index { target, index, .. } => {
                target.lags_series(name)
                || index.rows.lags_series(name)
                || index.cols.as_ref().is_some_and(|c| c.lags_series(name))
            },
            Self::Member { target, .. } => target.lags_series(name),
            Self::Number { .. }
            | Self::Str { .. }
            | Self::Null { .. }
            | Self::Variable { .. }
            | Self::Accessor { .. }
            | Self::Reference { .. }
            | Self::ListLiteral { .. } => false,
        }
    }
}

impl SliceExpr {
    fn lags_series(&self, name: &str) -> bool {
        match self {
            Self::All => false,
            Self::Expr(e) => e.lags_series(name),
            Self::Range(a, b) => a.lags_series(name) || b.lags_series(name),
        }
    }
}

/// Assignment operators accepted after a target.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AssignOp {
    /// `=`
    Assign,
    /// `+=`
    Add,
    /// `-=`
    Sub,
    /// `*=`
    Mul,
    /// `/=`
    Div,
    /// `%=`
    Mod,
    /// `^=`
    Pow,
    /// `++`
    Increment,
    /// `--`
    Decrement,
    /// `~=` (horizontal concatenation, or string append)
    HCat,
    /// `|=` (vertical concatenation)
    VCat,
    /// `.=` (fill every element of a matrix)
    Fill,
}

impl AssignOp {
    /// The binary operator an inflected assignment applies, if any.
    ///
    /// `=` and `.=` replace rather than combine, so they map to `None`;
    /// `++` and `--` map to addition and subtraction of one.
    #[must_use]
    pub const fn binary(self) -> Option<BinaryOperator> {
        match self {
            Self::Assign | Self::Fill => None,
            Self::Add | Self::Increment => Some(BinaryOperator::Add),
            Self::Sub | Self::Decrement => Some(BinaryOperator::Sub),
            Self::Mul => Some(BinaryOperator::Mul),
            Self::Div => Some(BinaryOperator::Div),
            Self::Mod => Some(BinaryOperator::Mod),
            Self::Pow => Some(BinaryOperator::Pow),
            Self::HCat => Some(BinaryOperator::HCat),
            Self::VCat => Some(BinaryOperator::VCat),
        }
    }

    /// `true` for `++` and `--`, which take no right-hand side.
    #[must_use]
    pub const fn is_unary(self) -> bool {
        matches!(self, Self::Increment | Self::Decrement)
    }
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Self::Assign => "=",
            Self::Add => "+=",
            Self::Sub => "-=",
            Self::Mul => "*=",
            Self::Div => "/=",
            Self::Mod => "%=",
            Self::Pow => "^=",
            Self::Increment => "++",
            Self::Decrement => "--",
            Self::HCat => "~=",
            Self::VCat => "|=",
            Self::Fill => ".=",
        };
        write!(f, "{op}")
    }
}

/// The element of a variable addressed on the left of an assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetSub {
    /// `name[...]`: an observation, a submatrix or a bundle key.
    Index(IndexExpr),
    /// `name.key`
    Member(String),
}

/// The left-hand side of a genr statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    /// The variable name.
    pub name: String,
    /// An optional element within the variable.
    pub sub:  Option<TargetSub>,
}

/// A declaration, assignment or print request: `[type] target [op expr]`.
#[derive(Debug, Clone, PartialEq)]
pub struct GenrStatement {
    /// Explicit type keyword, if one was written.
    pub declared: Option<TypeKind>,
    /// What is being written.
    pub target:   Target,
    /// The assignment operator; `None` for a bare name or declaration.
    pub op:       Option<AssignOp>,
    /// The right-hand side; `None` for `++`, `--` and bare names.
    pub value:    Option<Expr>,
    /// Line number in the source code.
    pub line:     usize,
}

/// The default of an optional function parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamDefault {
    /// `[null]`: the parameter may be omitted and is then empty.
    Null,
    /// `[expr]`: the parameter takes this value when omitted.
    Value(Expr),
}

/// One parameter of a user function.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// The name the argument is bound to inside the function.
    pub name:    String,
    /// The declared kind.
    pub kind:    TypeKind,
    /// `true` if the parameter was written `*name` and takes `&var`.
    pub by_ref:  bool,
    /// Default for an optional parameter.
    pub default: Option<ParamDefault>,
}

/// Represents a user-defined function definition.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    /// The name of the function.
    pub name:        String,
    /// The declared return kind; `None` for `void`.
    pub return_type: Option<TypeKind>,
    /// The parameters in declaration order.
    pub params:      Vec<Param>,
    /// The statements of the body.
    pub body:        Vec<Statement>,
    /// Line number in the source code.
    pub line:        usize,
}

/// How many times a loop runs.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopCounter {
    /// `loop N`
    Times(Expr),
    /// `loop i=a..b`
    Range {
        /// The index variable, a scalar.
        var:   String,
        /// First value.
        start: Expr,
        /// Last value, inclusive.
        end:   Expr,
    },
}

/// A `loop ... endloop` block.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopDef {
    /// The loop header.
    pub counter: LoopCounter,
    /// The statements of the body.
    pub body:    Vec<Statement>,
    /// Line number in the source code.
    pub line:    usize,
}

/// One item of a `print` statement.
#[derive(Debug, Clone, PartialEq)]
pub enum PrintItem {
    /// A variable, printed with its name.
    Name(String),
    /// Any other expression, printed by value.
    Expr(Expr),
}

/// Represents a top-level statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Declaration, assignment or implicit print.
    Genr(GenrStatement),
    /// A standalone expression evaluated for its result.
    Expression {
        /// The expression to evaluate.
        expr: Expr,
        /// Line number in the source code.
        line: usize,
    },
    /// `print a b ...`
    Print {
        /// The things to print.
        items: Vec<PrintItem>,
        /// Line number in the source code.
        line:  usize,
    },
    /// `delete a b ...`
    Delete {
        /// Variables to remove.
        names: Vec<String>,
        /// Line number in the source code.
        line:  usize,
    },
    /// `nulldata N`: replace the dataset with N empty observations.
    Nulldata {
        /// Number of observations.
        n:    Expr,
        /// Line number in the source code.
        line: usize,
    },
    /// `smpl a b` or `smpl full`.
    Smpl {
        /// First and last observation (1-based); `None` restores the full
        /// range.
        range: Option<(Expr, Expr)>,
        /// Line number in the source code.
        line:  usize,
    },
    /// `set key value`
    Set {
        /// Setting name.
        key:   String,
        /// Setting value.
        value: String,
        /// Line number in the source code.
        line:  usize,
    },
    /// `loop ... endloop`
    Loop(LoopDef),
    /// `function ... end function`
    Function(FunctionDef),
    /// `return [expr]`
    Return {
        /// The returned expression, if any.
        value: Option<Expr>,
        /// Line number in the source code.
        line:  usize,
    },
}

/// Represents a binary operator.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BinaryOperator {
    /// Addition (`+`)
    Add,
    /// Subtraction (`-`)
    Sub,
    /// Multiplication, matrix product for matrices (`*`)
    Mul,
    /// Division, right division for matrices (`/`)
    Div,
    /// Modulus (`%`)
    Mod,
    /// Exponentiation, matrix power for square matrices (`^`)
    Pow,
    /// Element-wise multiplication (`.*`)
    DotMul,
    /// Element-wise division (`./`)
    DotDiv,
    /// Element-wise power (`.^`)
    DotPow,
    /// Left division (`\`)
    LDiv,
    /// Horizontal concatenation (`~`)
    HCat,
    /// Vertical concatenation (`|`)
    VCat,
    /// Less than (`<`)
    Less,
    /// Greater than (`>`)
    Greater,
    /// Less than or equal (`<=`)
    LessEqual,
    /// Greater than or equal (`>=`)
    GreaterEqual,
    /// Equal to (`==`)
    Equal,
    /// Not equal to (`!=`)
    NotEqual,
    /// Logical and (`&&`)
    And,
    /// Logical or (`||`)
    Or,
}

impl BinaryOperator {
    /// Returns `true` for the six comparison operators.
    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(self,
                 Self::Less
                 | Self::Greater
                 | Self::LessEqual
                 | Self::GreaterEqual
                 | Self::Equal
                 | Self::NotEqual)
    }

    /// The operator with its operands swapped: `a < b` is `b > a`.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Less => Self::Greater,
            Self::Greater => Self::Less,
            Self::LessEqual => Self::GreaterEqual,
            Self::GreaterEqual => Self::LessEqual,
            other => other,
        }
    }
}

/// Represents a unary operator.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UnaryOperator {
    /// Arithmetic negation (`-x`).
    Negate,
    /// Unary plus (`+x`).
    Plus,
    /// Logical NOT (`!x`).
    Not,
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use BinaryOperator::{
            Add, And, Div, DotDiv, DotMul, DotPow, Equal, Greater, GreaterEqual, HCat, LDiv,
            Less, LessEqual, Mod, Mul, NotEqual, Or, Pow, Sub, VCat,
        };
        let operator = match self {
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Mod => "%",
            Pow => "^",
            DotMul => ".*",
            DotDiv => "./",
            DotPow => ".^",
            LDiv => "\\",
            HCat => "~",
            VCat => "|",
            Less => "<",
            Greater => ">",
            LessEqual => "<=",
            GreaterEqual => ">=",
            Equal => "==",
            NotEqual => "!=",
            And => "&&",
            Or => "||",
        };
        write!(f, "{operator}")
    }
}
