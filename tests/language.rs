use std::{fs, rc::Rc};

use genr::{
    error::{Error, ParseError, RuntimeError},
    interpreter::{evaluator::core::Context, value::core::Value},
    run_script, run_with_context,
    util::num::is_na,
};
use walkdir::WalkDir;

#[test]
fn script_examples_work() {
    let mut count = 0;

    for entry in
        WalkDir::new("tests/scripts").into_iter()
                                     .filter_map(Result::ok)
                                     .filter(|e| e.path().extension().is_some_and(|ext| ext == "inp"))
    {
        let path = entry.path();
        let content =
            fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {path:?}: {e}"));

        count += 1;
        let mut ctx = Context::new();
        if let Err(e) = run_with_context(&mut ctx, &content) {
            panic!("Script {path:?} failed:\n{e}");
        }
    }

    assert!(count > 0, "No scripts found in tests/scripts");
}

fn assert_success(src: &str) {
    if let Err(e) = run_script(src, false) {
        panic!("Script failed: {e}");
    }
}

fn assert_failure(src: &str) {
    if run_script(src, false).is_ok() {
        panic!("Script succeeded but was expected to fail")
    }
}

fn run(src: &str) -> Context {
    let mut ctx = Context::new();
    if let Err(e) = run_with_context(&mut ctx, src) {
        panic!("Script failed: {e}");
    }
    ctx
}

fn run_err(src: &str) -> (Context, Error) {
    let mut ctx = Context::new();
    let err = run_with_context(&mut ctx, src).expect_err("script was expected to fail");
    (ctx, err)
}

#[test]
fn scalar_assignment_and_arithmetic() {
    assert_success("scalar x = 1 + 2\nassert(x == 3)");
    assert_success("scalar x = 7 * 9\nassert(x == 63)");
    assert_success("scalar x = 8 - 5\nassert(x == 3)");
    assert_success("scalar x = 10 / 4\nassert(x == 2.5)");
    assert_success("scalar x = 2 ^ 10\nassert(x == 1024)");
    assert_success("x = 5\nassert(x == 5)");
}

#[test]
fn inflected_operators() {
    assert_success("scalar x = 1\nx += 2\nassert(x == 3)");
    assert_success("scalar x = 10\nx -= 4\nx *= 2\nx /= 3\nassert(x == 4)");
    assert_success("scalar x = 7\nx %= 4\nassert(x == 3)");
    assert_success("scalar x = 3\nx ^= 2\nassert(x == 9)");
    assert_success("scalar x = 1\nx++\nx++\nx--\nassert(x == 2)");
}

#[test]
fn plain_assignment_does_not_accumulate() {
    let ctx = run("scalar a = 4\nscalar y = a * 2\ny = a * 2");
    assert_eq!(ctx.store.lookup("y", 0), Some(&Value::Scalar(8.0)));

    let ctx = run("scalar a = 4\nscalar y = 0\ny += a\ny += a");
    assert_eq!(ctx.store.lookup("y", 0), Some(&Value::Scalar(8.0)));
}

#[test]
fn inflected_operator_on_unknown_name_fails() {
    let (_, err) = run_err("nope += 1");
    assert!(matches!(err, Error::Runtime(RuntimeError::Compile(ParseError::UnknownVariable { .. }))));
}

#[test]
fn missing_values_propagate() {
    assert_success("scalar a = NA\nscalar b = a + 1\nassert(missing(b))");
    assert_success("scalar a = NA\nscalar b = a * 0\nassert(missing(b))");
    assert_success("scalar a = NA\nassert(!ok(a))");
    assert_success("scalar a = NA\nscalar b = misszero(a)\nassert(b == 0)");
}

#[test]
fn generated_missing_values_warn_but_store() {
    let ctx = &mut Context::new();
    run_with_context(ctx, "scalar z = log(0)").unwrap();

    assert!(matches!(ctx.store.lookup("z", 0), Some(Value::Scalar(x)) if genr::util::num::is_na(*x)));
    assert_eq!(ctx.take_warnings().len(), 1);
}

#[test]
fn series_over_the_sample() {
    assert_success("nulldata 5\nseries x = 1\nassert(sum(x) == 5)");
    assert_success("nulldata 4\nseries x = {1; 2; 3; 4}\nseries y = x * 2\nassert(sum(y) == 20)");
    assert_success("nulldata 4\nseries x = {1; 2; 3; 4}\nassert(x[3] == 3)");
    assert_success("nulldata 4\nseries x = {1; 2; 3; 4}\nsmpl 2 3\nassert(sum(x) == 5)\nsmpl full\nassert(nobs(x) == 4)");
}

#[test]
fn series_lags() {
    assert_success("nulldata 4\nseries x = {1; 2; 3; 4}\nseries d = x - x(-1)\nassert(missing(d[1]))\nassert(d[4] == 1)");
    assert_success("nulldata 4\nseries x = {1; 2; 3; 4}\nseries l = lag(x)\nassert(l[2] == 1)");
    assert_success("nulldata 4\nseries x = {1; 2; 3; 4}\nseries f = x(1)\nassert(f[1] == 2)\nassert(missing(f[4]))");
}

#[test]
fn autoregressive_assignment_sees_earlier_observations() {
    assert_success("nulldata 5\nseries y = 0\nsmpl 2 5\ny = y(-1) + 1\nsmpl full\nassert(y[5] == 4)\nassert(sum(y) == 10)");
}

#[test]
fn submatrix_writes() {
    assert_success("matrix M = zeros(3, 3)\nM[2, 3] = 7\nassert(M[2, 3] == 7)\nassert(sum(M) == 7)");
    assert_success("matrix M = zeros(3, 3)\nM[1, ] = {1, 2, 3}\nassert(M[1, 2] == 2)\nassert(sum(M) == 6)");
    assert_success("matrix M = zeros(3, 3)\nM[, 2] = 5\nassert(sum(M) == 15)");
    assert_success("matrix M = I(3)\nM[2:3, 2:3] = ones(2, 2) * 4\nassert(M[3, 2] == 4)\nassert(M[1, 1] == 1)");
    assert_success("matrix M = zeros(2, 2)\nM[1, 1] += 3\nM[1, 1] *= 2\nassert(M[1, 1] == 6)");
}

#[test]
fn submatrix_write_shape_must_match() {
    assert_failure("matrix M = zeros(3, 3)\nM[1, ] = {1, 2}");
    assert_failure("matrix M = zeros(3, 3)\nM[4, 1] = 1");
}

#[test]
fn oversized_requests_fail_cleanly() {
    let (_, err) = run_err("matrix M = I(3)\nmatrix S = M[1:1e12, ]");
    assert!(matches!(err, Error::Runtime(RuntimeError::IndexOutOfBounds { .. })));

    let (_, err) = run_err("matrix Z = zeros(1e9, 1e9)");
    assert!(matches!(err, Error::Runtime(RuntimeError::Allocation { .. })));

    let (_, err) = run_err("matrix Z = mshape({1, 2}, 1e9, 1e9)");
    assert!(matches!(err, Error::Runtime(RuntimeError::Allocation { .. })));
}

#[test]
fn zero_one_selectors_of_full_length_are_masks() {
    assert_success("matrix M = {1, 2; 3, 4; 5, 6}
matrix S = M[{1, 0, 1}, ]
assert(rows(S) == 2)
assert(S[2, 1] == 5)");
    assert_success("matrix M = {1, 2, 3; 4, 5, 6}
matrix S = M[, {0, 1, 1}]
assert(cols(S) == 2)
assert(S[1, 1] == 2)");
    assert_success("matrix M = {1, 2; 3, 4; 5, 6}
M[{0, 1, 0}, ] = {9, 9}
assert(M[2, 2] == 9)
assert(sum(M) == 32)");
    // a 0/1 vector of another length lists positions
    assert_success("matrix M = {1, 2; 3, 4; 5, 6}
matrix S = M[{1, 1}, ]
assert(rows(S) == 2)
assert(S[2, 1] == 1)");
    // at full length, {1, 1} means every row, not the first row twice
    assert_success("matrix M = {1, 2; 3, 4}
matrix S = M[{1, 1}, ]
assert(S[2, 1] == 3)");
}

#[test]
fn matrix_algebra() {
    assert_success("matrix A = {1, 2; 3, 4}\nmatrix B = A * I(2)\nassert(B == A)");
    assert_success("matrix A = {2, 0; 0, 4}\nmatrix B = inv(A)\nassert(B[2, 2] == 0.25)");
    assert_success("matrix A = {1, 2; 3, 4}\nassert(abs(det(A) + 2) < 1e-10)");
    assert_success("matrix A = {1, 2; 3, 4}\nmatrix T = A'\nassert(T[1, 2] == 3)");
    assert_success("matrix A = {1, 2}\nA ~= {3}\nassert(cols(A) == 3)");
    assert_success("matrix A = {1, 2}\nA |= {3, 4}\nassert(rows(A) == 2)");
    assert_success("matrix A = zeros(2, 3)\nA .= 2\nassert(sum(A) == 12)");
    assert_success("matrix s = seq(1, 4)\nassert(sum(s) == 10)\nassert(cols(s) == 4)");
}

#[test]
fn nonconformable_operands_fail() {
    let (_, err) = run_err("matrix M = {1, 2} + {1; 2}");
    assert!(matches!(err, Error::Runtime(RuntimeError::Nonconformable { .. })));
    assert_failure("matrix M = {1, 2, 3} * {1, 2}");
}

#[test]
fn singular_matrix_fails() {
    let (_, err) = run_err("matrix M = inv({1, 2; 2, 4})");
    assert!(matches!(err, Error::Runtime(RuntimeError::Singular { .. })));
}

#[test]
fn operator_checks_at_compile_time() {
    let (_, err) = run_err("matrix M = I(2)\nM %= 2");
    assert!(matches!(err, Error::Runtime(RuntimeError::Compile(ParseError::NotImplemented { .. }))));

    let (_, err) = run_err("scalar x = 1\nx .= 2");
    assert!(matches!(err, Error::Runtime(RuntimeError::Compile(ParseError::InvalidOperator { .. }))));

    let (_, err) = run_err("scalar x = 1\nx |= 2");
    assert!(matches!(err, Error::Runtime(RuntimeError::Compile(ParseError::InvalidOperator { .. }))));
}

#[test]
fn redeclaring_a_variable_as_another_kind_fails() {
    let (ctx, err) = run_err("scalar x = 1\nmatrix x = {1, 2; 3, 4}");
    assert!(matches!(err, Error::Runtime(RuntimeError::TypeError { .. })));
    assert_eq!(ctx.store.lookup("x", 0), Some(&Value::Scalar(1.0)));
}

#[test]
fn reserved_names_are_rejected() {
    let (_, err) = run_err("scalar sqrt = 1");
    assert!(matches!(err,
                     Error::Runtime(RuntimeError::Compile(ParseError::IdentifierReserved { .. }))));
    assert_failure("const = 2");
}

#[test]
fn failed_statement_keeps_earlier_effects() {
    let (ctx, _) = run_err("scalar a = 1\nscalar b = a + missing_name\nscalar c = 3");
    assert_eq!(ctx.store.lookup("a", 0), Some(&Value::Scalar(1.0)));
    assert_eq!(ctx.store.lookup("b", 0), None);
    assert_eq!(ctx.store.lookup("c", 0), None);
}

#[test]
fn ternary_only_evaluates_the_chosen_branch() {
    assert_success("scalar x = 1 ? 2 : nope\nassert(x == 2)");
    assert_success("scalar x = 0 ? nope : 3\nassert(x == 3)");
    assert_success("nulldata 4\nseries x = {1; 2; 3; 4}\nseries y = x > 2 ? 1 : 0\nassert(sum(y) == 2)");
}

#[test]
fn series_condition_that_never_changes_picks_one_branch() {
    assert_success("nulldata 4\nseries c = 1\nseries y = c ? 1 : nope\nassert(sum(y) == 4)");
    assert_success("nulldata 4\nseries c = 0\nseries y = c ? nope : 2\nassert(sum(y) == 8)");
    assert_failure("nulldata 4\nseries c = {1; 0; 1; 1}\nseries y = c ? 1 : nope");
}

#[test]
fn missing_series_condition_gives_missing_observations() {
    let src = "nulldata 4
series c = {1; 0; 1; 0}
c[3] = NA
series y = c ? 10 : 20";
    let ctx = run(src);
    let id = ctx.dataset.series_id("y", 0).unwrap();
    let y = ctx.dataset.data(id).unwrap();

    assert_eq!(y[0], 10.0);
    assert_eq!(y[1], 20.0);
    assert!(is_na(y[2]));
    assert_eq!(y[3], 20.0);
}

#[test]
fn logical_operators_short_circuit() {
    assert_success("scalar x = 0 && nope\nassert(x == 0)");
    assert_success("scalar x = 1 || nope\nassert(x == 1)");
}

#[test]
fn strings() {
    assert_success("string s = \"ab\"\ns ~= \"cd\"\nassert(strlen(s) == 4)");
    assert_success("string s = \"Hi\"\nstring u = toupper(s)\nassert(u == \"HI\")");
    assert_success("string s = \"abc\"\nassert(typestr(s) == \"string\")");
    assert_failure("string s = \"a\"\ns += 1\ns *= 2");
}

#[test]
fn bundles() {
    assert_success("bundle b\nb.x = 3\nassert(b.x == 3)\nassert(inbundle(b, \"x\") == 1)");
    assert_success("bundle b\nb[\"name\"] = \"gdp\"\nassert(inbundle(b, \"name\") == 4)\nassert(nelem(b) == 1)");
    assert_success("bundle b\nb.m = I(2)\nb.m = \"now a string\"\nassert(inbundle(b, \"m\") == 4)");
    assert_failure("bundle b\nb.x += 1");
}

#[test]
fn bundle_member_shares_nothing_with_its_source() {
    let ctx = run("matrix A = I(2)\nbundle b\nb.m = A\nA[1, 1] = 5");
    let Some(Value::Bundle(b)) = ctx.store.lookup("b", 0) else {
        panic!("b is not a bundle");
    };
    let Some(Value::Matrix(m)) = b.get("m") else {
        panic!("b.m is not a matrix");
    };
    assert_eq!(m.get(0, 0), 1.0);
}

#[test]
fn bundled_series_follow_a_resized_dataset() {
    let setup = "nulldata 3\nseries x = 5\nbundle b\nb.s = x\nnulldata 6";

    assert_success(&format!("{setup}
series d = diff(b.s)
series c = cum(b.s)
series y = b.s
series z = b.s > 0 ? 1 : 0
assert(sum(missing(y)) == 3)
assert(sum(missing(c)) == 3)
assert(sum(missing(z)) == 3)
smpl 1 3
matrix m = b.s
assert(rows(m) == 3)"));

    let (_, err) = run_err(&format!("{setup}\nmatrix m = b.s"));
    assert!(matches!(err, Error::Runtime(RuntimeError::MissingData { .. })));
}

#[test]
fn lists() {
    assert_success("nulldata 3\nseries a = 1\nseries b = 2\nlist L = a b\nassert(nelem(L) == 2)");
    assert_success("nulldata 3\nseries a = 1\nseries b = 2\nlist L = a b\ndelete a\nassert(nelem(L) == 1)");
    assert_success("nulldata 3\nseries a = 1\nseries b = 2\nlist L = a b\nmatrix X = L\nassert(cols(X) == 2)\nassert(rows(X) == 3)");
}

#[test]
fn delete_removes_variables() {
    let ctx = run("scalar x = 1\nmatrix M = I(2)\ndelete x M");
    assert!(ctx.store.is_empty());
    assert_failure("delete nothing_here");
}

#[test]
fn loops() {
    assert_success("scalar s = 0\nloop i=1..4\n  s += i\nendloop\nassert(s == 10)");
    assert_success("scalar s = 0\nloop 3\n  s++\nendloop\nassert(s == 3)");
    assert_success("matrix M = zeros(3, 1)\nloop i=1..3\n  M[i] = i * i\nendloop\nassert(M[3] == 9)");
    assert_failure("loop i=1..3\n  scalar y = nope\nendloop");
}

#[test]
fn user_functions() {
    let src = "function scalar twice(scalar x)
  return 2 * x
end function
scalar y = twice(21)
assert(y == 42)";
    assert_success(src);

    let src = "function scalar add(scalar a, scalar b[10])
  return a + b
end function
assert(add(1) == 11)
assert(add(1, 2) == 3)";
    assert_success(src);

    let src = "function matrix build(scalar n)
  matrix out = I(n)
  return out
end function
matrix M = build(3)
assert(rows(M) == 3)";
    assert_success(src);
}

#[test]
fn function_locals_are_destroyed_on_return() {
    let src = "function scalar f(scalar a)
  scalar tmp = a * 2
  matrix big = zeros(4, 4)
  return tmp
end function
scalar r = f(3)";
    let ctx = run(src);
    assert_eq!(ctx.store.lookup("r", 0), Some(&Value::Scalar(6.0)));
    assert_eq!(ctx.store.len(), 1);
    assert_eq!(ctx.level, 0);
}

#[test]
fn function_locals_are_destroyed_on_error() {
    let src = "function scalar f(scalar a)
  scalar tmp = a
  scalar bad = nope
  return tmp
end function
scalar r = f(3)";
    let (ctx, _) = run_err(src);
    assert!(ctx.store.is_empty());
    assert_eq!(ctx.level, 0);
}

#[test]
fn a_returned_list_keeps_its_series() {
    let src = "nulldata 3
function list f()
  series a = 1
  series tmp = 2
  list L = a
  return L
end function
list M = f()
series w = 7
scalar v = M[1][1]";
    let ctx = run(src);
    let a = ctx.dataset.series_id("a", 0).unwrap();

    assert_eq!(ctx.store.lookup("M", 0), Some(&Value::List(Rc::new(vec![a]))));
    assert_eq!(ctx.store.lookup("v", 0), Some(&Value::Scalar(1.0)));
    assert_eq!(ctx.dataset.series_id("tmp", 0), None);
    assert_eq!(ctx.dataset.series_id("tmp", 1), None);
}

#[test]
fn a_returned_list_overwrites_a_caller_series_of_the_same_name() {
    let src = "nulldata 3
series a = 9
function list f()
  series a = 1
  list L = a
  return L
end function
list M = f()";
    let ctx = run(src);
    let a = ctx.dataset.series_id("a", 0).unwrap();

    assert_eq!(ctx.store.lookup("M", 0), Some(&Value::List(Rc::new(vec![a]))));
    assert_eq!(ctx.dataset.data(a).unwrap().as_slice(), &[1.0, 1.0, 1.0]);
    assert_eq!(ctx.dataset.num_series(), 2);
}

#[test]
fn reference_parameters() {
    let src = "function void bump(matrix *M)
  M[1, 1] = 99
end function
matrix A = zeros(2, 2)
bump(&A)
assert(A[1, 1] == 99)";
    assert_success(src);

    let src = "function void incr(scalar *x)
  x += 1
end function
scalar k = 1
incr(&k)
incr(&k)
assert(k == 3)";
    assert_success(src);

    let src = "function void fill(series *y)
  y = 7
end function
nulldata 3
series z = 0
fill(&z)
assert(sum(z) == 21)";
    assert_success(src);
}

#[test]
fn reference_parameter_kind_must_match() {
    assert_failure("function void f(matrix *M)\nend function\nscalar x = 1\nf(&x)");
    assert_failure("function void f(matrix *M)\nend function\nmatrix A = I(2)\nf(A)");
    assert_failure("function void f(matrix M)\nend function\nmatrix A = I(2)\nf(&A)");
}

#[test]
fn wrong_argument_counts_fail() {
    assert_failure("function scalar f(scalar a)\n  return a\nend function\nscalar y = f(1, 2)");
    assert_failure("function scalar f(scalar a)\n  return a\nend function\nscalar y = f()");
    assert_failure("scalar y = sqrt(1, 2)");
}

#[test]
fn return_type_is_enforced() {
    assert_failure("function scalar f()\n  return \"text\"\nend function\nscalar y = f()");
    assert_failure("function matrix f()\nend function\nmatrix y = f()");
}

#[test]
fn builtins() {
    assert_success("assert(abs(-2) == 2)");
    assert_success("assert(sqrt(16) == 4)");
    assert_success("assert(floor(2.7) == 2)");
    assert_success("assert(ceil(2.1) == 3)");
    assert_success("assert(int(-2.7) == -2)");
    assert_success("assert(sgn(-3) == -1)");
    assert_success("matrix v = values({3, 1, 3, 2})\nassert(rows(v) == 3)\nassert(v[1] == 1)");
    assert_success("matrix u = uniq({3, 1, 3, 2})\nassert(u[1] == 3)");
    assert_success("matrix m = mshape(seq(1, 6), 2, 3)\nassert(m[2, 1] == 2)");
    assert_success("matrix d = diag({1, 2; 3, 4})\nassert(sum(d) == 5)");
    assert_success("matrix c = sumc({1, 2; 3, 4})\nassert(c[2] == 6)");
    assert_success("assert(mean({1, 2, 3}) == 2)");
    assert_success("assert(sd({2, 4, 4, 4, 5, 5, 7, 9}) > 2)");
}

#[test]
fn unknown_function_fails() {
    let (_, err) = run_err("scalar y = frobnicate(2)");
    assert!(matches!(err, Error::Runtime(RuntimeError::UnknownFunction { .. })));
}

#[test]
fn assert_failure_is_an_error() {
    let (_, err) = run_err("assert(1 == 2)");
    assert!(matches!(err, Error::Runtime(RuntimeError::AssertionFailed { .. })));
}

#[test]
fn print_and_echo_go_to_the_sink() {
    let mut ctx = run("scalar x = 2\nprint x");
    assert!(ctx.printer.take_buffer().contains('2'));

    let mut ctx = run("set echo on\nscalar y = 5");
    assert!(ctx.printer.take_buffer().contains('5'));

    let mut ctx = run("set warnings off\nscalar z = log(0)");
    assert!(ctx.printer.take_buffer().is_empty());
    assert_eq!(ctx.take_warnings().len(), 1);
}

#[test]
fn nulldata_replaces_the_dataset() {
    let ctx = run("nulldata 3\nseries a = 1\nlist L = a\nnulldata 10");
    assert_eq!(ctx.dataset.n(), 10);
    assert_eq!(ctx.dataset.series_id("a", 0), None);
    assert_eq!(ctx.store.lookup("L", 0), None);
}

#[test]
fn series_need_a_dataset() {
    let (_, err) = run_err("series x = 1");
    assert!(matches!(err, Error::Runtime(RuntimeError::NoData { .. })));
}

#[test]
fn parse_errors_run_nothing() {
    let (ctx, err) = run_err("scalar a = 1\nscalar b = (2 +");
    assert!(matches!(err, Error::Parse(_)));
    assert!(ctx.store.is_empty());
}
