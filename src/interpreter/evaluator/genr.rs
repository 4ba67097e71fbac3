use tracing::debug;

use crate::{
    ast::{AssignOp, Expr, GenrStatement, TargetSub, TypeKind},
    error::{ParseError, RuntimeError, Warning},
    interpreter::{
        evaluator::{
            assign::sanitize_series,
            auxiliary::{AuxPool, AuxStats},
            core::{Context, EvalResult},
            utils::{is_reserved_identifier, value_at},
        },
        output::render,
        value::core::{Series, Value},
    },
};

/// What a compiled statement does when executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenrPlan {
    /// `type name`: create an empty variable unless it already exists.
    Declare(TypeKind),
    /// `name` or `name[...]` on its own: print it.
    Print,
    /// Evaluate the right-hand side once and write the result.
    Assign,
    /// `y = f(y(-1), ...)`: evaluate the right-hand side once per
    /// observation of the sample, in order, writing each result before the
    /// next observation is computed.
    Autoregressive,
}

/// Whether [`Context::generate`] should also run what it compiled.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExecMode {
    /// Compile and execute once, then tear down.
    Full,
    /// Only compile; the caller executes and destroys.
    CompileOnly,
}

/// What [`Context::generate`] produced.
#[derive(Debug)]
pub enum GenrOutcome<'a> {
    /// The compiled statement, ready for [`Context::execute`].
    Compiled(Genr<'a>),
    /// The statement ran; this is the value it stored or printed.
    Done(Option<Value>),
}

/// A compiled genr statement.
///
/// Compiling resolves the target and validates the operator against it;
/// nothing in the context is changed. The compiled form owns the auxiliary
/// pool its executions share, so executing it again (in a loop, or once per
/// observation) overwrites the intermediate results of the previous run
/// instead of allocating new ones.
#[derive(Debug)]
pub struct Genr<'a> {
    stmt: &'a GenrStatement,
    plan: GenrPlan,
    aux:  AuxPool,
}

impl Genr<'_> {
    /// The decision made at compile time.
    #[must_use]
    pub const fn plan(&self) -> &GenrPlan {
        &self.plan
    }

    /// Usage counters of the auxiliary pool so far.
    #[must_use]
    pub const fn stats(&self) -> AuxStats {
        self.aux.stats()
    }

    /// Tears the statement down, releasing every auxiliary slot.
    pub fn destroy(self) -> AuxStats {
        self.aux.destroy()
    }
}

impl Context {
    /// Compiles a genr statement against the current state.
    ///
    /// The left-hand side decides the plan:
    /// - a bare declaration creates an empty variable of the declared kind,
    /// - a bare name that exists is printed,
    /// - anything with an operator is an assignment, which is autoregressive
    ///   when an existing series is assigned with `=` from an expression
    ///   that lags it.
    ///
    /// # Errors
    /// - `ParseError::IdentifierReserved` for builtin names and `const`,
    /// - `ParseError::UnknownVariable` for a bare or inflected name that
    ///   does not exist,
    /// - `ParseError::NotImplemented` for `%=` and `^=` on a matrix,
    /// - `ParseError::InvalidOperator` for `.=`, `|=` or `~=` on a kind that
    ///   does not support them,
    /// - a type error when a declaration contradicts an existing variable.
    ///
    /// # Example
    /// ```
    /// use genr::{
    ///     ast::{AssignOp, Expr, GenrStatement, Target},
    ///     interpreter::evaluator::{core::Context, genr::GenrPlan},
    /// };
    ///
    /// let ctx = Context::new();
    /// let stmt = GenrStatement { declared: None,
    ///                            target:   Target { name: "x".into(),
    ///                                               sub:  None, },
    ///                            op:       Some(AssignOp::Assign),
    ///                            value:    Some(Expr::Number { value: 1.0,
    ///                                                          line:  1, }),
    ///                            line:     1, };
    ///
    /// let genr = ctx.compile(&stmt).unwrap();
    /// assert_eq!(genr.plan(), &GenrPlan::Assign);
    /// ```
    pub fn compile<'a>(&self, stmt: &'a GenrStatement) -> EvalResult<Genr<'a>> {
        let name = stmt.target.name.as_str();
        let line = stmt.line;
        if is_reserved_identifier(name) {
            return Err(ParseError::IdentifierReserved { name: name.to_string(),
                                                        line }.into());
        }
        let existing = self.kind_of(name);
        let unknown = || -> RuntimeError {
            ParseError::UnknownVariable { name: name.to_string(),
                                          line }.into()
        };

        if let (Some(declared), Some(existing)) = (stmt.declared, existing)
           && declared != existing
        {
            return Err(RuntimeError::type_error(format!("'{name}' is a {existing}, it cannot \
                                                         be redeclared as a {declared}"),
                                                line));
        }

        let Some(op) = stmt.op else {
            let plan = match (stmt.declared, existing) {
                (Some(kind), _) => GenrPlan::Declare(kind),
                (None, Some(_)) => GenrPlan::Print,
                (None, None) => return Err(unknown()),
            };
            debug!(name, ?plan, "compiled");
            return Ok(Genr { stmt,
                             plan,
                             aux: AuxPool::new() });
        };

        let Some(kind) = stmt.declared.or(existing) else {
            if op != AssignOp::Assign || stmt.target.sub.is_some() {
                return Err(unknown());
            }
            debug!(name, "compiled assignment to a new variable");
            return Ok(Genr { stmt,
                             plan: GenrPlan::Assign,
                             aux: AuxPool::new() });
        };
        if existing.is_none() && op != AssignOp::Assign {
            return Err(unknown());
        }
        check_operator(op, kind, stmt.target.sub.is_some(), line)?;

        let plan = if stmt.target.sub.is_none()
                      && existing == Some(TypeKind::Series)
                      && op == AssignOp::Assign
                      && stmt.value.as_ref().is_some_and(|v| v.lags_series(name))
        {
            GenrPlan::Autoregressive
        } else {
            GenrPlan::Assign
        };
        debug!(name, %kind, %op, ?plan, "compiled");
        Ok(Genr { stmt,
                  plan,
                  aux: AuxPool::new() })
    }

    /// Executes a compiled statement, reusing its auxiliary pool.
    ///
    /// Returns the value written or printed, if any. The context's own pool
    /// is restored afterwards whether or not execution succeeds.
    ///
    /// # Errors
    /// Any error raised while evaluating or writing. Writes committed before
    /// the error (earlier observations of an autoregressive statement) are
    /// kept.
    pub fn execute(&mut self, genr: &mut Genr<'_>) -> EvalResult<Option<Value>> {
        std::mem::swap(&mut self.aux, &mut genr.aux);
        let result = self.run_plan(genr.stmt, &genr.plan);
        std::mem::swap(&mut self.aux, &mut genr.aux);
        result
    }

    /// Compiles a statement and, in [`ExecMode::Full`], runs it once and
    /// tears it down.
    ///
    /// # Errors
    /// See [`Context::compile`] and [`Context::execute`].
    pub fn generate<'a>(&mut self,
                        stmt: &'a GenrStatement,
                        mode: ExecMode)
                        -> EvalResult<GenrOutcome<'a>> {
        let mut genr = self.compile(stmt)?;
        if mode == ExecMode::CompileOnly {
            return Ok(GenrOutcome::Compiled(genr));
        }
        let result = self.execute(&mut genr);
        genr.destroy();
        Ok(GenrOutcome::Done(result?))
    }

    fn run_plan(&mut self, stmt: &GenrStatement, plan: &GenrPlan) -> EvalResult<Option<Value>> {
        let name = stmt.target.name.as_str();
        let line = stmt.line;
        match plan {
            GenrPlan::Declare(kind) => {
                if self.kind_of(name).is_none() {
                    self.declare(name, *kind, line)?;
                }
                Ok(None)
            },
            GenrPlan::Print => {
                self.aux.begin_pass();
                let mut value = self.eval_variable(name, line)?;
                if let Some(TargetSub::Index(index)) = &stmt.target.sub {
                    let (rows, cols) = self.eval_index_slices(index)?;
                    value = self.index_value(&value, &rows, cols.as_ref(), line)?;
                } else if let Some(TargetSub::Member(key)) = &stmt.target.sub {
                    let Value::Bundle(b) = &value else {
                        return Err(RuntimeError::type_error(format!("'{name}' is not a bundle"),
                                                            line));
                    };
                    value = b.get(key).cloned().map(|v| self.fit_to_dataset(v)).ok_or_else(|| {
                                                   RuntimeError::InvalidArgument {
                            details: format!("no key '{key}' in bundle"),
                            line,
                        }
                                               })?;
                }
                let text = render(Some(name), &value, &self.dataset);
                self.printer.emit(&text, line)?;
                Ok(Some(value))
            },
            GenrPlan::Assign => {
                self.aux.begin_pass();
                let op = stmt.op.unwrap_or(AssignOp::Assign);
                let rhs = self.eval_rhs(stmt.value.as_ref(), op, line)?;
                let stored = match &stmt.target.sub {
                    None => self.assign_whole(name, stmt.declared, op, rhs, line)?,
                    Some(TargetSub::Index(index)) => {
                        let (rows, cols) = self.eval_index_slices(index)?;
                        self.assign_index(name, &rows, cols.as_ref(), op, rhs, line)?
                    },
                    Some(TargetSub::Member(key)) => self.assign_member(name, key, op, rhs, line)?,
                };
                Ok(Some(stored))
            },
            GenrPlan::Autoregressive => {
                let expr = stmt.value
                               .as_ref()
                               .ok_or_else(|| RuntimeError::type_error("missing right-hand side",
                                                                       line))?;
                let result = self.run_autoregressive(name, expr, line);
                self.obs = None;
                result.map(Some)
            },
        }
    }

    /// The right-hand side of an assignment: one for `++` and `--`.
    fn eval_rhs(&mut self, value: Option<&Expr>, op: AssignOp, line: usize) -> EvalResult<Value> {
        if op.is_unary() {
            return Ok(Value::Scalar(1.0));
        }
        let expr = value.ok_or_else(|| RuntimeError::type_error("missing right-hand side", line))?;
        self.eval(expr)
    }

    /// Creates an empty variable of `kind` at the current level.
    pub(crate) fn declare(&mut self, name: &str, kind: TypeKind, line: usize) -> EvalResult<()> {
        if kind == TypeKind::Series {
            self.dataset.require_data(line)?;
            self.dataset
                .add_series(name, vec![0.0; self.dataset.n()], self.level);
            return Ok(());
        }
        let empty = Value::empty_of(kind, self.dataset.n());
        self.store.add(name, empty, self.level, line)
    }

    /// Computes `name` observation by observation over the sample.
    ///
    /// Each pass evaluates the whole right-hand side for a single
    /// observation, reusing the auxiliary storage of the previous pass, and
    /// writes the result before the next pass so that lags see it.
    fn run_autoregressive(&mut self, name: &str, expr: &Expr, line: usize) -> EvalResult<Value> {
        let id = self.dataset
                     .series_id(name, self.level)
                     .ok_or_else(|| RuntimeError::UnknownVariable { name: name.to_string(),
                                                                    line })?;
        let mut generated = 0;
        for t in self.dataset.t1()..=self.dataset.t2() {
            self.aux.begin_pass();
            self.obs = Some(t);
            let value = self.eval(expr)?;
            let mut x = [value_at(&value, t, line)?];
            drop(value);
            generated += sanitize_series(&mut x);
            let column = self.dataset.data_mut(id).ok_or_else(|| {
                                                      RuntimeError::UnknownVariable {
                    name: name.to_string(),
                    line,
                }
                                                  })?;
            column[t] = x[0];
        }
        debug!(name, passes = self.dataset.sample_len(), stats = ?self.aux.stats(), "autoregressive");
        if generated > 0 {
            self.raise_warning(Warning::MissingGenerated { target: name.to_string(),
                                                           count: generated,
                                                           line },
                               line)?;
        }
        let data = self.dataset.data(id).unwrap_or_default();
        Ok(Value::Series(Series { data, id: Some(id) }))
    }
}

/// Checks that an assignment operator makes sense for the target kind.
fn check_operator(op: AssignOp, kind: TypeKind, has_sub: bool, line: usize) -> EvalResult<()> {
    let invalid = |details: &str| -> RuntimeError {
        ParseError::InvalidOperator { op: op.to_string(),
                                      details: details.to_string(),
                                      line }.into()
    };
    match op {
        AssignOp::Mod | AssignOp::Pow if kind == TypeKind::Matrix => {
            Err(ParseError::NotImplemented { op: op.to_string(),
                                             kind: kind.to_string(),
                                             line }.into())
        },
        AssignOp::Fill if kind != TypeKind::Matrix => Err(invalid("'.=' needs a matrix")),
        AssignOp::HCat | AssignOp::VCat if has_sub => {
            Err(invalid("concatenation cannot write into part of a variable"))
        },
        AssignOp::VCat if kind != TypeKind::Matrix => Err(invalid("'|=' needs a matrix")),
        AssignOp::HCat if !matches!(kind, TypeKind::Matrix | TypeKind::Str) => {
            Err(invalid("'~=' needs a matrix or a string"))
        },
        _ => Ok(()),
    }
}
