use crate::{
    interpreter::{
        evaluator::core::{Context, EvalResult},
        value::core::Value,
    },
    util::num::count_to_f64,
};

/// Length of a string in characters.
///
/// # Example
/// ```
/// use genr::interpreter::{evaluator::{core::Context, function::text::strlen},
///                         value::core::Value};
///
/// let mut ctx = Context::new();
/// assert_eq!(strlen(&mut ctx, &[Value::from("héllo")], 1).unwrap(), Value::Scalar(5.0));
/// ```
pub fn strlen(_ctx: &mut Context, args: &[Value], line: usize) -> EvalResult<Value> {
    Ok(Value::Scalar(count_to_f64(args[0].as_str(line)?.chars().count())))
}

/// Upper- or lower-cases a string.
pub fn recase(args: &[Value], line: usize, upper: bool) -> EvalResult<Value> {
    let s = args[0].as_str(line)?;
    Ok(Value::from(if upper { s.to_uppercase() } else { s.to_lowercase() }))
}

/// Number of elements: list members, bundle keys, matrix cells or string
/// characters. A scalar or series counts as one.
pub fn nelem(_ctx: &mut Context, args: &[Value], _line: usize) -> EvalResult<Value> {
    let n = match &args[0] {
        Value::List(l) => l.len(),
        Value::Bundle(b) => b.len(),
        Value::Matrix(m) => m.len(),
        Value::Str(s) => s.chars().count(),
        Value::Scalar(_) | Value::Series(_) => 1,
        Value::Null => 0,
    };
    Ok(Value::Scalar(count_to_f64(n)))
}

/// `inbundle(b, key)`: the type code of the member under `key`, or 0 if
/// there is none.
///
/// The codes are 1 scalar, 2 series, 3 matrix, 4 string, 5 bundle and
/// 7 list.
pub fn inbundle(_ctx: &mut Context, args: &[Value], line: usize) -> EvalResult<Value> {
    let Value::Bundle(b) = &args[0] else {
        return Ok(Value::Scalar(0.0));
    };
    let key = args[1].as_str(line)?;
    let code = b.get(key).and_then(Value::kind).map_or(0, |k| k.code());
    Ok(Value::Scalar(f64::from(code)))
}

/// The kind of a value, as a string such as `"matrix"`.
pub fn typestr(_ctx: &mut Context, args: &[Value], _line: usize) -> EvalResult<Value> {
    Ok(Value::from(args[0].type_name()))
}
