use genr::{
    ast::{GenrStatement, Statement, TypeKind},
    error::RuntimeError,
    interpreter::{
        evaluator::{
            core::Context,
            genr::{ExecMode, GenrOutcome, GenrPlan},
        },
        lexer::tokenize,
        parser::statement::parse_program,
        value::{core::Value, matrix::Matrix},
    },
    run_with_context,
    util::num::{NADBL, is_na},
};
use pretty_assertions::assert_eq;

fn genr_statement(src: &str) -> GenrStatement {
    let tokens = tokenize(src).unwrap();
    let mut program = parse_program(&mut tokens.iter().peekable()).unwrap();
    match program.remove(0) {
        Statement::Genr(stmt) => stmt,
        other => panic!("not a genr statement: {other:?}"),
    }
}

fn context(src: &str) -> Context {
    let mut ctx = Context::new();
    run_with_context(&mut ctx, src).unwrap();
    ctx
}

fn series(ctx: &Context, name: &str) -> Vec<f64> {
    let id = ctx.dataset.series_id(name, 0).unwrap();
    ctx.dataset.data(id).unwrap().to_vec()
}

fn matrix(ctx: &Context, name: &str) -> Matrix {
    match ctx.store.lookup(name, 0) {
        Some(Value::Matrix(m)) => (**m).clone(),
        other => panic!("{name} is not a matrix: {other:?}"),
    }
}

#[test]
fn products_and_concatenation_follow_conformability() {
    let a = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
    let b = Matrix::column(vec![1.0, 1.0]);

    assert_eq!(a.matmul(&b).unwrap().data(), &[3.0, 7.0]);
    assert!(b.matmul(&a).is_none());

    let wide = a.hcat(&b).unwrap();
    assert_eq!((wide.rows(), wide.cols()), (2, 3));
    assert!(a.vcat(&b).is_none());
    assert_eq!(Matrix::zeros(0, 0).vcat(&a), Some(a.clone()));
}

#[test]
fn inverse_and_determinant() {
    let a = Matrix::from_rows(&[vec![4.0, 7.0], vec![2.0, 6.0]]).unwrap();
    let inv = a.inverse().unwrap();
    let product = a.matmul(&inv).unwrap();

    for (got, want) in product.data().iter().zip(Matrix::identity(2).data()) {
        assert!((got - want).abs() < 1e-12);
    }
    assert!((a.determinant().unwrap() - 10.0).abs() < 1e-12);

    let singular = Matrix::from_rows(&[vec![1.0, 2.0], vec![2.0, 4.0]]).unwrap();
    assert!(singular.inverse().is_none());
    assert_eq!(singular.determinant(), Some(0.0));
    assert_eq!(Matrix::zeros(2, 3).determinant(), None);
}

#[test]
fn select_copies_the_requested_block() {
    let m = Matrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
    let block = m.select(&[1], &[0, 2]);

    assert_eq!(block, Matrix::row(vec![4.0, 6.0]));
}

#[test]
fn matrix_cells_use_nan_for_missing() {
    let ctx = context("scalar a = NA\nmatrix M = {1, 2}\nM[1, 2] = a");
    let m = matrix(&ctx, "M");

    assert!(m.get(0, 1).is_nan());
    assert!(m.has_missing());

    let ctx = context("matrix M = {1, 2}\nscalar s = M[1, 2] + 1");
    assert_eq!(ctx.store.lookup("s", 0), Some(&Value::Scalar(3.0)));
}

#[test]
fn matrix_infinities_become_missing_with_a_warning() {
    let mut ctx = context("matrix M = {1, 0} ./ {0, 0}");
    let m = matrix(&ctx, "M");

    assert!(m.get(0, 0).is_nan());
    assert!(m.get(0, 1).is_nan());
    assert_eq!(ctx.take_warnings().len(), 1);
}

#[test]
fn matrix_to_series_prefers_recorded_observations() {
    let ctx = context("nulldata 5\nseries x = {1; 2; 3; 4; 5}\nsmpl 2 4\nmatrix v = x\nsmpl full\nseries y = v");

    assert_eq!(matrix(&ctx, "v").obs, Some((1, 3)));
    let y = series(&ctx, "y");
    assert!(is_na(y[0]));
    assert_eq!(&y[1..4], &[2.0, 3.0, 4.0]);
    assert!(is_na(y[4]));
}

#[test]
fn matrix_to_series_uses_the_sample_then_the_dataset() {
    let ctx = context("nulldata 4\nsmpl 2 3\nseries a = {7; 8}\nsmpl full\nseries b = {1; 2; 3; 4}");

    let a = series(&ctx, "a");
    assert!(is_na(a[0]));
    assert_eq!(&a[1..3], &[7.0, 8.0]);
    assert_eq!(series(&ctx, "b"), vec![1.0, 2.0, 3.0, 4.0]);

    let mut ctx = Context::with_observations(4);
    let err = run_with_context(&mut ctx, "series c = {1; 2; 3}").unwrap_err();
    assert!(matches!(err, genr::error::Error::Runtime(RuntimeError::Nonconformable { .. })));
}

#[test]
fn series_with_missing_values_cannot_become_matrices() {
    let mut ctx = Context::with_observations(3);
    run_with_context(&mut ctx, "series x = 1\nx[2] = NA").unwrap();

    let err = run_with_context(&mut ctx, "matrix M = x").unwrap_err();
    assert!(matches!(err, genr::error::Error::Runtime(RuntimeError::MissingData { .. })));
}

#[test]
fn coerce_accepts_the_implicit_conversions() {
    let mut ctx = Context::with_observations(3);

    let m = ctx.coerce(Value::Scalar(NADBL), TypeKind::Matrix, 1).unwrap();
    let Value::Matrix(m) = m else {
        panic!("not a matrix");
    };
    assert!(m.get(0, 0).is_nan());

    let s = ctx.coerce(Value::from(Matrix::scalar(2.0)), TypeKind::Scalar, 1)
               .unwrap();
    assert_eq!(s, Value::Scalar(2.0));

    let series = ctx.coerce(Value::Scalar(4.0), TypeKind::Series, 1).unwrap();
    assert_eq!(series.kind(), Some(TypeKind::Series));

    assert!(ctx.coerce(Value::from("x"), TypeKind::Matrix, 1).is_err());
    assert!(ctx.coerce(Value::Scalar(1.0), TypeKind::Str, 1).is_err());
}

#[test]
fn compile_only_changes_nothing() {
    let mut ctx = Context::new();
    let stmt = genr_statement("matrix M = I(3)");

    let GenrOutcome::Compiled(genr) = ctx.generate(&stmt, ExecMode::CompileOnly).unwrap() else {
        panic!("expected a compiled statement");
    };
    assert_eq!(genr.plan(), &GenrPlan::Assign);
    assert!(ctx.store.is_empty());
    assert_eq!(genr.destroy().allocated, 0);
}

#[test]
fn compile_resolves_the_plan_from_the_target() {
    let ctx = context("nulldata 3\nseries y = 1\nscalar k = 2");

    let declare = genr_statement("matrix fresh");
    assert_eq!(ctx.compile(&declare).unwrap().plan(), &GenrPlan::Declare(TypeKind::Matrix));

    let print = genr_statement("k");
    assert_eq!(ctx.compile(&print).unwrap().plan(), &GenrPlan::Print);

    let ar = genr_statement("y = 0.5 * y(-1)");
    assert_eq!(ctx.compile(&ar).unwrap().plan(), &GenrPlan::Autoregressive);

    let plain = genr_statement("y = y * 2");
    assert_eq!(ctx.compile(&plain).unwrap().plan(), &GenrPlan::Assign);

    assert!(ctx.compile(&genr_statement("unknown")).is_err());
    assert!(ctx.compile(&genr_statement("unknown += 1")).is_err());
}

#[test]
fn executing_a_compiled_statement_reuses_its_pool() {
    let mut ctx = context("nulldata 4\nseries x = {1; 2; 3; 4}");
    let stmt = genr_statement("series z = x * 2 + 1");
    let mut genr = ctx.compile(&stmt).unwrap();

    ctx.execute(&mut genr).unwrap();
    let first = genr.stats();
    ctx.execute(&mut genr).unwrap();
    ctx.execute(&mut genr).unwrap();
    let later = genr.stats();

    assert_eq!(later.allocated, first.allocated);
    assert!(later.reused > 0);
    assert_eq!(series(&ctx, "z"), vec![3.0, 5.0, 7.0, 9.0]);
    genr.destroy();
}

#[test]
fn autoregressive_matches_one_observation_at_a_time() {
    let setup = "nulldata 6\nseries y = 1\nseries x = {1; 2; 3; 4; 5; 6}";

    let mut whole = context(setup);
    run_with_context(&mut whole, "smpl 2 6\ny = 0.5 * y(-1) + x\nsmpl full").unwrap();

    let mut stepwise = context(setup);
    for t in 2..=6 {
        run_with_context(&mut stepwise, &format!("smpl {t} {t}\ny = 0.5 * y(-1) + x")).unwrap();
    }

    assert_eq!(series(&whole, "y"), series(&stepwise, "y"));
}

#[test]
fn a_compiled_loop_body_reuses_storage_across_iterations() {
    let ctx = context("matrix acc = zeros(2, 2)\nloop 50\n  acc = acc + ones(2, 2) * 2\nendloop");
    assert_eq!(matrix(&ctx, "acc"), Matrix::filled(2, 2, 100.0));
}
