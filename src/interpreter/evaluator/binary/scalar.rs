use crate::{
    ast::BinaryOperator,
    util::num::{NADBL, is_na, truth},
};

/// Applies a binary operator to two scalar/series values.
///
/// Missing values propagate: if either operand is NA the result is NA, with
/// two exceptions:
/// - `0 * NA` and `NA * 0` are `0`,
/// - `x || NA` is `1` for any non-missing nonzero `x`.
///
/// `0 && NA` is NA here. A scalar `0` on the left of `&&` never reaches
/// this kernel: the evaluator skips the right operand.
///
/// NA compared with anything, NA included, is NA.
///
/// Non-finite arithmetic results (division by zero, overflow) are returned
/// as is; they are turned into NA when the result is stored.
///
/// # Parameters
/// - `op`: The operator. Concatenation operators never reach this kernel.
/// - `a`: Left operand.
/// - `b`: Right operand.
///
/// # Example
/// ```
/// use genr::{
///     ast::BinaryOperator,
///     interpreter::evaluator::binary::scalar::scalar_op,
///     util::num::{NADBL, is_na},
/// };
///
/// assert_eq!(scalar_op(BinaryOperator::Add, 2.0, 3.0), 5.0);
/// assert!(is_na(scalar_op(BinaryOperator::Add, 2.0, NADBL)));
/// assert_eq!(scalar_op(BinaryOperator::Mul, 0.0, NADBL), 0.0);
/// assert_eq!(scalar_op(BinaryOperator::Or, NADBL, 5.0), 1.0);
/// assert!(is_na(scalar_op(BinaryOperator::And, NADBL, 0.0)));
/// assert!(is_na(scalar_op(BinaryOperator::Equal, NADBL, NADBL)));
/// ```
#[must_use]
#[allow(clippy::float_cmp)]
pub fn scalar_op(op: BinaryOperator, a: f64, b: f64) -> f64 {
    use BinaryOperator::{
        Add, And, Div, DotDiv, DotMul, DotPow, Equal, Greater, GreaterEqual, HCat, LDiv, Less,
        LessEqual, Mod, Mul, NotEqual, Or, Pow, Sub, VCat,
    };

    let na_a = is_na(a);
    let na_b = is_na(b);

    match op {
        Or => {
            if (!na_a && a != 0.0) || (!na_b && b != 0.0) {
                1.0
            } else if na_a || na_b {
                NADBL
            } else {
                0.0
            }
        },
        Mul | DotMul if (a == 0.0 && na_b) || (na_a && b == 0.0) => 0.0,
        _ if na_a || na_b => NADBL,
        And => truth(a != 0.0 && b != 0.0),
        Add => a + b,
        Sub => a - b,
        Mul | DotMul => a * b,
        Div | DotDiv => a / b,
        LDiv => b / a,
        Mod => a % b,
        Pow | DotPow => a.powf(b),
        Less => truth(a < b),
        Greater => truth(a > b),
        LessEqual => truth(a <= b),
        GreaterEqual => truth(a >= b),
        Equal => truth(a == b),
        NotEqual => truth(a != b),
        // routed to the matrix path before reaching here
        HCat | VCat => NADBL,
    }
}

/// Applies a binary operator to two matrix cells.
///
/// Matrix cells follow IEEE rules: `NaN` propagates through arithmetic with
/// no exceptions, and comparisons involving `NaN` are false.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn cell_op(op: BinaryOperator, a: f64, b: f64) -> f64 {
    use BinaryOperator::{
        Add, And, Div, DotDiv, DotMul, DotPow, Equal, Greater, GreaterEqual, HCat, LDiv, Less,
        LessEqual, Mod, Mul, NotEqual, Or, Pow, Sub, VCat,
    };

    match op {
        Add => a + b,
        Sub => a - b,
        Mul | DotMul => a * b,
        Div | DotDiv => a / b,
        LDiv => b / a,
        Mod => a % b,
        Pow | DotPow => a.powf(b),
        Less => truth(a < b),
        Greater => truth(a > b),
        LessEqual => truth(a <= b),
        GreaterEqual => truth(a >= b),
        Equal => truth(a == b),
        NotEqual => truth(a != b),
        And | Or if a.is_nan() || b.is_nan() => f64::NAN,
        And => truth(a != 0.0 && b != 0.0),
        Or => truth(a != 0.0 || b != 0.0),
        HCat | VCat => f64::NAN,
    }
}
