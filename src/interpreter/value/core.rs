use std::{fmt, rc::Rc};

use crate::{
    ast::TypeKind,
    error::RuntimeError,
    interpreter::{
        evaluator::core::EvalResult,
        output::format_number,
        value::{bundle::Bundle, matrix::Matrix},
    },
};

/// Series data: one double per dataset observation.
///
/// The buffer always spans the full dataset, not just the current sample.
/// `id` is set when the data are a named dataset column; such a node borrows
/// the column by sharing the `Rc` and never owns it. Computed series have no
/// id.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// The observations.
    pub data: Rc<Vec<f64>>,
    /// Dataset column this series was read from, if any.
    pub id:   Option<usize>,
}

impl Series {
    /// A computed series holding `data`.
    #[must_use]
    pub fn temporary(data: Rc<Vec<f64>>) -> Self {
        Self { data, id: None }
    }
}

/// Represents a runtime value in the interpreter.
///
/// Every value kind the language knows is one variant, so the kind tag and
/// the payload can never disagree. The heavier payloads are reference
/// counted: reading a named matrix, list or bundle shares it with the store,
/// and writes go through copy-on-write.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A single double. Missing is [`NADBL`](crate::util::num::NADBL).
    Scalar(f64),
    /// One double per observation.
    Series(Series),
    /// A two-dimensional matrix.
    Matrix(Rc<Matrix>),
    /// Text.
    Str(Rc<str>),
    /// Ordered series identifiers.
    List(Rc<Vec<usize>>),
    /// A key to value map.
    Bundle(Rc<Bundle>),
    /// An omitted optional argument, or the result of a `void` function.
    Null,
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Scalar(x)
    }
}

impl From<Matrix> for Value {
    fn from(m: Matrix) -> Self {
        Self::Matrix(Rc::new(m))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(Rc::from(s))
    }
}

impl From<Bundle> for Value {
    fn from(b: Bundle) -> Self {
        Self::Bundle(Rc::new(b))
    }
}

impl Value {
    /// The kind of this value, or `None` for [`Value::Null`].
    ///
    /// # Example
    /// ```
    /// use genr::{ast::TypeKind, interpreter::value::core::Value};
    ///
    /// assert_eq!(Value::Scalar(1.0).kind(), Some(TypeKind::Scalar));
    /// assert_eq!(Value::Null.kind(), None);
    /// ```
    #[must_use]
    pub const fn kind(&self) -> Option<TypeKind> {
        match self {
            Self::Scalar(_) => Some(TypeKind::Scalar),
            Self::Series(_) => Some(TypeKind::Series),
            Self::Matrix(_) => Some(TypeKind::Matrix),
            Self::Str(_) => Some(TypeKind::Str),
            Self::List(_) => Some(TypeKind::List),
            Self::Bundle(_) => Some(TypeKind::Bundle),
            Self::Null => None,
        }
    }

    /// Name of the kind, for error messages.
    #[must_use]
    pub fn type_name(&self) -> String {
        self.kind().map_or_else(|| "null".to_string(), |k| k.to_string())
    }

    /// `true` for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Reads a scalar, accepting a 1 x 1 matrix as well.
    ///
    /// A missing matrix cell comes back as the scalar missing value.
    ///
    /// # Errors
    /// Returns `RuntimeError::TypeError` for any other kind.
    ///
    /// # Example
    /// ```
    /// use genr::interpreter::value::{core::Value, matrix::Matrix};
    ///
    /// assert_eq!(Value::Scalar(2.0).as_scalar(1).unwrap(), 2.0);
    /// assert_eq!(Value::from(Matrix::scalar(3.0)).as_scalar(1).unwrap(), 3.0);
    /// assert!(Value::from("x").as_scalar(1).is_err());
    /// ```
    pub fn as_scalar(&self, line: usize) -> EvalResult<f64> {
        match self {
            Self::Scalar(x) => Ok(*x),
            Self::Matrix(m) if m.is_scalar() => Ok(crate::util::num::matrix_to_na(m.get(0, 0))),
            other => Err(RuntimeError::type_error(format!("expected a scalar, found {}",
                                                          other.type_name()),
                                                  line)),
        }
    }

    /// Borrows the text of a string value.
    ///
    /// # Errors
    /// Returns `RuntimeError::TypeError` for any other kind.
    pub fn as_str(&self, line: usize) -> EvalResult<&str> {
        match self {
            Self::Str(s) => Ok(s),
            other => Err(RuntimeError::type_error(format!("expected a string, found {}",
                                                          other.type_name()),
                                                  line)),
        }
    }

    /// The empty value of a kind, as created by a bare declaration.
    ///
    /// A new series is filled with zeros over `n` observations; a new scalar
    /// is missing; a new matrix is 0 x 0.
    #[must_use]
    pub fn empty_of(kind: TypeKind, n: usize) -> Self {
        match kind {
            TypeKind::Scalar => Self::Scalar(crate::util::num::NADBL),
            TypeKind::Series => Self::Series(Series::temporary(Rc::new(vec![0.0; n]))),
            TypeKind::Matrix => Self::from(Matrix::zeros(0, 0)),
            TypeKind::Str => Self::from(""),
            TypeKind::List => Self::List(Rc::new(Vec::new())),
            TypeKind::Bundle => Self::from(Bundle::new()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(x) => write!(f, "{}", format_number(*x)),
            Self::Series(s) => {
                let cells: Vec<String> = s.data.iter().map(|&x| format_number(x)).collect();
                write!(f, "{}", cells.join(" "))
            },
            Self::Matrix(m) => write!(f, "{m}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::List(l) => {
                let ids: Vec<String> = l.iter().map(ToString::to_string).collect();
                write!(f, "{{{}}}", ids.join(" "))
            },
            Self::Bundle(b) => write!(f, "{b}"),
            Self::Null => write!(f, "null"),
        }
    }
}
