//! Property tests for missing-value propagation and matrix conformability.

use genr::{
    ast::BinaryOperator,
    error::{Error, RuntimeError},
    interpreter::{
        evaluator::{binary::scalar::scalar_op, core::Context},
        value::{core::Value, matrix::Matrix},
    },
    run_with_context,
    util::num::{NADBL, is_na},
};
use proptest::prelude::*;

fn finite() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.0), -1e6..1e6f64]
}

fn nonzero() -> impl Strategy<Value = f64> {
    (-1e6..1e6f64).prop_filter("nonzero", |x| *x != 0.0)
}

fn dims() -> impl Strategy<Value = (usize, usize)> {
    (1..5usize, 1..5usize)
}

fn arithmetic() -> impl Strategy<Value = BinaryOperator> {
    prop_oneof![Just(BinaryOperator::Add),
                Just(BinaryOperator::Sub),
                Just(BinaryOperator::Div),
                Just(BinaryOperator::Pow)]
}

fn matrix_of((rows, cols): (usize, usize)) -> Value {
    Value::from(Matrix::filled(rows, cols, 1.0))
}

#[test]
fn zero_times_missing_is_zero() {
    assert_eq!(scalar_op(BinaryOperator::Mul, 0.0, NADBL), 0.0);
    assert_eq!(scalar_op(BinaryOperator::Mul, NADBL, 0.0), 0.0);
}

#[test]
fn only_a_scalar_zero_on_the_left_skips_missing_in_and() {
    let mut ctx = Context::new();
    run_with_context(&mut ctx, "scalar a = NA\nscalar z = 0\nscalar c = a && z\nscalar d = z && a")
        .unwrap();

    assert!(matches!(ctx.store.lookup("c", 0), Some(Value::Scalar(c)) if is_na(*c)));
    assert_eq!(ctx.store.lookup("d", 0), Some(&Value::Scalar(0.0)));
}

proptest! {
    #[test]
    fn missing_operand_gives_missing_result(x in finite(), op in arithmetic()) {
        prop_assert!(is_na(scalar_op(op, x, NADBL)));
        prop_assert!(is_na(scalar_op(op, NADBL, x)));
        prop_assert!(is_na(scalar_op(op, NADBL, NADBL)));
    }

    #[test]
    fn nonzero_times_missing_is_missing(x in nonzero()) {
        prop_assert!(is_na(scalar_op(BinaryOperator::Mul, x, NADBL)));
    }

    #[test]
    fn true_or_missing_is_true(x in nonzero()) {
        prop_assert_eq!(scalar_op(BinaryOperator::Or, x, NADBL), 1.0);
        prop_assert_eq!(scalar_op(BinaryOperator::Or, NADBL, x), 1.0);
    }

    #[test]
    fn and_with_missing_is_missing(x in finite()) {
        prop_assert!(is_na(scalar_op(BinaryOperator::And, x, NADBL)));
        prop_assert!(is_na(scalar_op(BinaryOperator::And, NADBL, x)));
    }

    #[test]
    fn missing_propagates_through_a_script(x in finite()) {
        let mut ctx = Context::new();
        ctx.store.add("a", Value::Scalar(x), 0, 1).unwrap();
        run_with_context(&mut ctx, "scalar c = a + NA\nscalar d = (a != 0) || NA").unwrap();

        prop_assert!(matches!(ctx.store.lookup("c", 0), Some(Value::Scalar(c)) if is_na(*c)));
        let d = match ctx.store.lookup("d", 0) {
            Some(Value::Scalar(d)) => *d,
            other => panic!("d is {other:?}"),
        };
        if x == 0.0 {
            prop_assert!(is_na(d));
        } else {
            prop_assert_eq!(d, 1.0);
        }
    }

    #[test]
    fn addition_needs_equal_shapes_or_a_scalar(a in dims(), b in dims()) {
        let mut ctx = Context::new();
        let result = ctx.eval_matrix_op(BinaryOperator::Add, &matrix_of(a), &matrix_of(b), 1);
        let conformable = a == b || a == (1, 1) || b == (1, 1);

        match result {
            Ok(Value::Matrix(m)) => {
                prop_assert!(conformable);
                let expected = if a == (1, 1) { b } else { a };
                prop_assert_eq!((m.rows(), m.cols()), expected);
            },
            Ok(other) => panic!("unexpected result {other:?}"),
            Err(e) => {
                prop_assert!(!conformable);
                prop_assert!(matches!(e, RuntimeError::Nonconformable { .. }), "unexpected error: {:?}", e);
            },
        }
    }

    #[test]
    fn products_need_inner_agreement_or_a_scalar(a in dims(), b in dims()) {
        let mut ctx = Context::new();
        let result = ctx.eval_matrix_op(BinaryOperator::Mul, &matrix_of(a), &matrix_of(b), 1);
        let conformable = a.1 == b.0 || a == (1, 1) || b == (1, 1);

        prop_assert_eq!(result.is_ok(), conformable);
        if let Err(e) = result {
            prop_assert!(matches!(e, RuntimeError::Nonconformable { .. }), "unexpected error: {:?}", e);
        }
    }

    #[test]
    fn a_failed_assignment_creates_nothing(a in dims(), b in dims()) {
        prop_assume!(a != b && a != (1, 1) && b != (1, 1));

        let mut ctx = Context::new();
        ctx.store.add("A", matrix_of(a), 0, 1).unwrap();
        ctx.store.add("B", matrix_of(b), 0, 1).unwrap();
        let err = run_with_context(&mut ctx, "matrix C = A + B").unwrap_err();

        prop_assert!(matches!(err, Error::Runtime(RuntimeError::Nonconformable { .. })), "unexpected error: {:?}", err);
        prop_assert!(ctx.store.lookup("C", 0).is_none());
    }
}

