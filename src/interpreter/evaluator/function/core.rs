use std::fmt;

use crate::{
    ast::Expr,
    error::RuntimeError,
    interpreter::{
        evaluator::{
            core::{Context, EvalResult},
            function::{builtin, file, matrix, missing, stats, text},
        },
        value::core::Value,
    },
    util::num::f64_to_i64_checked,
};

/// Type alias for builtin function handlers.
///
/// A builtin receives the context (for the dataset and the auxiliary pool),
/// the evaluated arguments and the line number.
type BuiltinFn = fn(&mut Context, &[Value], usize) -> EvalResult<Value>;

/// Specifies the allowed number of arguments for a builtin.
///
/// - `Exact(n)` means the builtin must receive exactly `n` arguments.
/// - `OneOf(slice)` means the builtin accepts any arity listed in `slice`.
#[derive(Clone, Copy)]
enum Arity {
    Exact(usize),
    OneOf(&'static [usize]),
}

/// A set of value kinds an argument position accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kinds(u8);

impl Kinds {
    /// A scalar, or a 1 x 1 matrix.
    pub const SCALAR: Self = Self(1);
    /// A series.
    pub const SERIES: Self = Self(1 << 1);
    /// A matrix.
    pub const MATRIX: Self = Self(1 << 2);
    /// A string.
    pub const STR: Self = Self(1 << 3);
    /// A list.
    pub const LIST: Self = Self(1 << 4);
    /// A bundle.
    pub const BUNDLE: Self = Self(1 << 5);
    /// Any numeric kind.
    pub const NUMERIC: Self = Self(Self::SCALAR.0 | Self::SERIES.0 | Self::MATRIX.0);
    /// A series or a matrix.
    pub const DATA: Self = Self(Self::SERIES.0 | Self::MATRIX.0);
    /// Anything but null.
    pub const ANY: Self = Self(0x3f);

    /// `true` if `value` is one of these kinds.
    ///
    /// # Example
    /// ```
    /// use genr::interpreter::{evaluator::function::core::Kinds, value::core::Value};
    ///
    /// assert!(Kinds::NUMERIC.accepts(&Value::Scalar(1.0)));
    /// assert!(!Kinds::NUMERIC.accepts(&Value::from("x")));
    /// assert!(!Kinds::ANY.accepts(&Value::Null));
    /// ```
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        let bit = match value {
            Value::Scalar(_) => Self::SCALAR,
            Value::Matrix(m) if m.is_scalar() => Self(Self::SCALAR.0 | Self::MATRIX.0),
            Value::Series(_) => Self::SERIES,
            Value::Matrix(_) => Self::MATRIX,
            Value::Str(_) => Self::STR,
            Value::List(_) => Self::LIST,
            Value::Bundle(_) => Self::BUNDLE,
            Value::Null => return false,
        };
        self.0 & bit.0 != 0
    }
}

impl fmt::Display for Kinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [(Self::SCALAR, "scalar"),
                     (Self::SERIES, "series"),
                     (Self::MATRIX, "matrix"),
                     (Self::STR, "string"),
                     (Self::LIST, "list"),
                     (Self::BUNDLE, "bundle")];
        let accepted: Vec<&str> = names.iter()
                                       .filter(|(k, _)| self.0 & k.0 != 0)
                                       .map(|(_, n)| *n)
                                       .collect();
        write!(f, "{}", accepted.join(" or "))
    }
}

/// Defines builtin functions by generating a lookup table and a name list.
///
/// Each entry provides:
/// - a string name,
/// - an arity specification,
/// - the kinds accepted by each argument position (the last entry applies
///   to every later argument),
/// - a function pointer implementing the builtin.
///
/// The macro produces:
/// - `BuiltinDef` (internal metadata),
/// - `BUILTIN_TABLE` (static table for lookup),
/// - `BUILTIN_FUNCTIONS` (public list of builtin names).
macro_rules! builtin_functions {
    (
        $(
            $name:literal => {
                arity: $arity:expr,
                kinds: $kinds:expr,
                func: $func:expr $(,)?
            }
        ),* $(,)?
    ) => {
        struct BuiltinDef {
            name:  &'static str,
            arity: Arity,
            kinds: &'static [Kinds],
            func:  BuiltinFn,
        }
        static BUILTIN_TABLE: &[BuiltinDef] = &[
            $(
                BuiltinDef { name: $name, arity: $arity, kinds: $kinds, func: $func },
            )*
        ];
        /// Names of every builtin function. They are reserved: no variable
        /// or user function may take them.
        pub const BUILTIN_FUNCTIONS: &[&str] = &[
            $($name,)*
        ];
    };
}

builtin_functions! {
    "abs"      => { arity: Arity::Exact(1), kinds: &[Kinds::NUMERIC], func: |c, a, l| builtin::apply(c, a, l, f64::abs) },
    "sqrt"     => { arity: Arity::Exact(1), kinds: &[Kinds::NUMERIC], func: |c, a, l| builtin::apply(c, a, l, f64::sqrt) },
    "exp"      => { arity: Arity::Exact(1), kinds: &[Kinds::NUMERIC], func: |c, a, l| builtin::apply(c, a, l, f64::exp) },
    "log"      => { arity: Arity::Exact(1), kinds: &[Kinds::NUMERIC], func: |c, a, l| builtin::apply(c, a, l, f64::ln) },
    "ln"       => { arity: Arity::Exact(1), kinds: &[Kinds::NUMERIC], func: |c, a, l| builtin::apply(c, a, l, f64::ln) },
    "log10"    => { arity: Arity::Exact(1), kinds: &[Kinds::NUMERIC], func: |c, a, l| builtin::apply(c, a, l, f64::log10) },
    "sin"      => { arity: Arity::Exact(1), kinds: &[Kinds::NUMERIC], func: |c, a, l| builtin::apply(c, a, l, f64::sin) },
    "cos"      => { arity: Arity::Exact(1), kinds: &[Kinds::NUMERIC], func: |c, a, l| builtin::apply(c, a, l, f64::cos) },
    "tan"      => { arity: Arity::Exact(1), kinds: &[Kinds::NUMERIC], func: |c, a, l| builtin::apply(c, a, l, f64::tan) },
    "atan"     => { arity: Arity::Exact(1), kinds: &[Kinds::NUMERIC], func: |c, a, l| builtin::apply(c, a, l, f64::atan) },
    "floor"    => { arity: Arity::Exact(1), kinds: &[Kinds::NUMERIC], func: |c, a, l| builtin::apply(c, a, l, f64::floor) },
    "ceil"     => { arity: Arity::Exact(1), kinds: &[Kinds::NUMERIC], func: |c, a, l| builtin::apply(c, a, l, f64::ceil) },
    "round"    => { arity: Arity::Exact(1), kinds: &[Kinds::NUMERIC], func: |c, a, l| builtin::apply(c, a, l, f64::round) },
    "int"      => { arity: Arity::Exact(1), kinds: &[Kinds::NUMERIC], func: |c, a, l| builtin::apply(c, a, l, f64::trunc) },
    "sgn"      => { arity: Arity::Exact(1), kinds: &[Kinds::NUMERIC], func: |c, a, l| builtin::apply(c, a, l, builtin::sgn) },
    "assert"   => { arity: Arity::Exact(1), kinds: &[Kinds::SCALAR], func: builtin::assert_fn },
    "missing"  => { arity: Arity::Exact(1), kinds: &[Kinds::NUMERIC], func: missing::missing },
    "ok"       => { arity: Arity::Exact(1), kinds: &[Kinds::NUMERIC], func: missing::ok },
    "misszero" => { arity: Arity::Exact(1), kinds: &[Kinds::NUMERIC], func: missing::misszero },
    "zeromiss" => { arity: Arity::Exact(1), kinds: &[Kinds::NUMERIC], func: missing::zeromiss },
    "sum"      => { arity: Arity::Exact(1), kinds: &[Kinds::NUMERIC], func: |c, a, l| stats::summary(c, a, l, stats::Summary::Sum) },
    "mean"     => { arity: Arity::Exact(1), kinds: &[Kinds::NUMERIC], func: |c, a, l| stats::summary(c, a, l, stats::Summary::Mean) },
    "sd"       => { arity: Arity::Exact(1), kinds: &[Kinds::NUMERIC], func: |c, a, l| stats::summary(c, a, l, stats::Summary::Sd) },
    "var"      => { arity: Arity::Exact(1), kinds: &[Kinds::NUMERIC], func: |c, a, l| stats::summary(c, a, l, stats::Summary::Var) },
    "min"      => { arity: Arity::Exact(1), kinds: &[Kinds::NUMERIC], func: |c, a, l| stats::summary(c, a, l, stats::Summary::Min) },
    "max"      => { arity: Arity::Exact(1), kinds: &[Kinds::NUMERIC], func: |c, a, l| stats::summary(c, a, l, stats::Summary::Max) },
    "nobs"     => { arity: Arity::Exact(1), kinds: &[Kinds::NUMERIC], func: |c, a, l| stats::summary(c, a, l, stats::Summary::Count) },
    "diff"     => { arity: Arity::Exact(1), kinds: &[Kinds::DATA], func: stats::diff },
    "cum"      => { arity: Arity::Exact(1), kinds: &[Kinds::DATA], func: stats::cum },
    "lag"      => { arity: Arity::OneOf(&[1, 2]), kinds: &[Kinds::SERIES, Kinds::SCALAR], func: stats::lag },
    "zeros"    => { arity: Arity::OneOf(&[1, 2]), kinds: &[Kinds::SCALAR], func: |c, a, l| matrix::constant(c, a, l, 0.0) },
    "ones"     => { arity: Arity::OneOf(&[1, 2]), kinds: &[Kinds::SCALAR], func: |c, a, l| matrix::constant(c, a, l, 1.0) },
    "I"        => { arity: Arity::Exact(1), kinds: &[Kinds::SCALAR], func: matrix::identity },
    "seq"      => { arity: Arity::Exact(2), kinds: &[Kinds::SCALAR], func: matrix::seq },
    "rows"     => { arity: Arity::Exact(1), kinds: &[Kinds::NUMERIC], func: matrix::rows },
    "cols"     => { arity: Arity::Exact(1), kinds: &[Kinds::NUMERIC], func: matrix::cols },
    "transp"   => { arity: Arity::Exact(1), kinds: &[Kinds::NUMERIC], func: matrix::transp },
    "vec"      => { arity: Arity::Exact(1), kinds: &[Kinds::NUMERIC], func: matrix::vec },
    "mshape"   => { arity: Arity::Exact(3), kinds: &[Kinds::NUMERIC, Kinds::SCALAR], func: matrix::mshape },
    "sumc"     => { arity: Arity::Exact(1), kinds: &[Kinds::NUMERIC], func: |c, a, l| matrix::reduce(c, a, l, matrix::Reduce::SumColumns) },
    "sumr"     => { arity: Arity::Exact(1), kinds: &[Kinds::NUMERIC], func: |c, a, l| matrix::reduce(c, a, l, matrix::Reduce::SumRows) },
    "meanc"    => { arity: Arity::Exact(1), kinds: &[Kinds::NUMERIC], func: |c, a, l| matrix::reduce(c, a, l, matrix::Reduce::MeanColumns) },
    "diag"     => { arity: Arity::Exact(1), kinds: &[Kinds::NUMERIC], func: matrix::diag },
    "inv"      => { arity: Arity::Exact(1), kinds: &[Kinds::NUMERIC], func: matrix::inv },
    "det"      => { arity: Arity::Exact(1), kinds: &[Kinds::NUMERIC], func: matrix::det },
    "uniq"     => { arity: Arity::Exact(1), kinds: &[Kinds::DATA], func: |c, a, l| matrix::distinct(c, a, l, false) },
    "values"   => { arity: Arity::Exact(1), kinds: &[Kinds::DATA], func: |c, a, l| matrix::distinct(c, a, l, true) },
    "strlen"   => { arity: Arity::Exact(1), kinds: &[Kinds::STR], func: text::strlen },
    "toupper"  => { arity: Arity::Exact(1), kinds: &[Kinds::STR], func: |_, a, l| text::recase(a, l, true) },
    "tolower"  => { arity: Arity::Exact(1), kinds: &[Kinds::STR], func: |_, a, l| text::recase(a, l, false) },
    "nelem"    => { arity: Arity::Exact(1), kinds: &[Kinds::ANY], func: text::nelem },
    "inbundle" => { arity: Arity::Exact(2), kinds: &[Kinds::BUNDLE, Kinds::STR], func: text::inbundle },
    "typestr"  => { arity: Arity::Exact(1), kinds: &[Kinds::ANY], func: text::typestr },
    "readfile" => { arity: Arity::Exact(1), kinds: &[Kinds::STR], func: file::readfile },
    "mread"    => { arity: Arity::Exact(1), kinds: &[Kinds::STR], func: file::mread },
}

impl Arity {
    /// Tests whether the given argument count satisfies this arity constraint.
    ///
    /// Returns `true` if the count is permitted, `false` otherwise.
    fn check(&self, n: usize) -> bool {
        match self {
            Self::Exact(m) => n == *m,
            Self::OneOf(arr) => arr.contains(&n),
        }
    }
}

impl Context {
    /// Evaluates a call `name(args)`.
    ///
    /// The name is resolved in this order:
    /// 1. a builtin: arguments are evaluated left to right, then checked
    ///    against the builtin's arity and accepted kinds,
    /// 2. a user function, see [`Context::call_user_function`],
    /// 3. a series visible at the current level, making this a lag: `y(-1)`
    ///    is the previous observation of `y`, `y(1)` the next.
    ///
    /// # Errors
    /// Returns `RuntimeError::UnknownFunction` if the name is none of
    /// these, `RuntimeError::ArgumentCountMismatch` for the wrong number of
    /// arguments, and a type error for an argument of the wrong kind.
    pub(crate) fn eval_function_call(&mut self,
                                     name: &str,
                                     args: &[Expr],
                                     line: usize)
                                     -> EvalResult<Value> {
        if let Some(builtin) = BUILTIN_TABLE.iter().find(|b| b.name == name) {
            let values = args.iter()
                             .map(|a| self.eval(a))
                             .collect::<EvalResult<Vec<_>>>()?;
            if !builtin.arity.check(values.len()) {
                return Err(RuntimeError::ArgumentCountMismatch { name: name.to_string(),
                                                                 line });
            }
            for (i, value) in values.iter().enumerate() {
                let kinds = builtin.kinds[i.min(builtin.kinds.len() - 1)];
                if !kinds.accepts(value) {
                    return Err(RuntimeError::type_error(format!("argument {} of {name}() must \
                                                                 be a {kinds}, found {}",
                                                                i + 1,
                                                                value.type_name()),
                                                        line));
                }
            }
            return (builtin.func)(self, &values, line);
        }

        if let Some(def) = self.functions.get(name).cloned() {
            return self.call_user_function(&def, args, line);
        }

        if let Some(id) = self.dataset.series_id(name, self.level)
           && let [offset] = args
        {
            let k = self.eval(offset)?.as_scalar(line)?;
            let k = f64_to_i64_checked(k, line)?;
            let data = self.dataset.data(id).unwrap_or_default();
            return self.series_from_fn(line, |t| stats::shifted(&data, t, k));
        }

        Err(RuntimeError::UnknownFunction { name: name.to_string(),
                                            line })
    }
}
