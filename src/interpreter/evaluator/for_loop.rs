use tracing::debug;

use crate::{
    ast::{LoopCounter, LoopDef, Statement},
    error::RuntimeError,
    interpreter::{
        evaluator::{
            auxiliary::AuxStats,
            core::{Context, EvalResult},
            genr::Genr,
            statement::Flow,
        },
        value::core::Value,
    },
    util::num::{f64_to_dim_checked, f64_to_i64_checked},
};

impl Context {
    /// Executes a `loop` block.
    ///
    /// Two forms are supported:
    ///
    /// 1. **Count form:** `loop N`. The body runs `N` times.
    /// 2. **Range form:** `loop i=a..b`. The body runs once for each integer
    ///    from `a` to `b` inclusive, with the scalar `i` holding the current
    ///    value. The bounds are evaluated once, before the first iteration.
    ///
    /// Each genr statement of the body is compiled the first time it is
    /// reached and then re-executed on later iterations, reusing its
    /// auxiliary storage. Every compiled statement is torn down when the
    /// loop ends, whether it ends normally, through `return`, or with an
    /// error.
    ///
    /// # Errors
    /// The first error raised by the body; the remaining iterations do not
    /// run. A type error if the index variable names a series.
    ///
    /// # Example
    /// ```
    /// use genr::{interpreter::{evaluator::core::Context, value::core::Value}, run_with_context};
    ///
    /// let mut ctx = Context::new();
    /// run_with_context(&mut ctx, "scalar s = 0\nloop i=1..4\n  s += i\nendloop").unwrap();
    ///
    /// assert_eq!(ctx.store.lookup("s", 0), Some(&Value::Scalar(10.0)));
    /// ```
    pub fn exec_loop(&mut self, def: &LoopDef) -> EvalResult<Flow> {
        let (var, first, last) = match &def.counter {
            LoopCounter::Times(n) => {
                let n = self.with_fresh_pool(|ctx| ctx.eval(n)?.as_scalar(def.line))?;
                let n = f64_to_dim_checked(n, def.line)?;
                (None, 1, i64::try_from(n).unwrap_or(i64::MAX))
            },
            LoopCounter::Range { var, start, end } => {
                if self.dataset.series_id(var, self.level).is_some() {
                    return Err(RuntimeError::type_error(format!("loop index '{var}' is a \
                                                                 series"),
                                                        def.line));
                }
                let (a, b) = self.with_fresh_pool(|ctx| {
                                     Ok((ctx.eval(start)?.as_scalar(def.line)?,
                                         ctx.eval(end)?.as_scalar(def.line)?))
                                 })?;
                (Some(var.as_str()),
                 f64_to_i64_checked(a, def.line)?,
                 f64_to_i64_checked(b, def.line)?)
            },
        };

        let mut compiled: Vec<Option<Genr<'_>>> = def.body.iter().map(|_| None).collect();
        let result = self.run_iterations(def, var, first, last, &mut compiled);

        let totals = compiled.into_iter()
                             .flatten()
                             .map(Genr::destroy)
                             .fold(AuxStats::default(), |acc, s| {
                                 AuxStats { allocated: acc.allocated + s.allocated,
                                            reused:    acc.reused + s.reused, }
                             });
        debug!(line = def.line,
               allocated = totals.allocated,
               reused = totals.reused,
               "loop finished");
        result
    }

    #[allow(clippy::cast_precision_loss)]
    fn run_iterations<'a>(&mut self,
                          def: &'a LoopDef,
                          var: Option<&str>,
                          first: i64,
                          last: i64,
                          compiled: &mut [Option<Genr<'a>>])
                          -> EvalResult<Flow> {
        for i in first..=last {
            if let Some(var) = var {
                self.store.add(var, Value::Scalar(i as f64), self.level, def.line)?;
            }
            for (statement, slot) in def.body.iter().zip(compiled.iter_mut()) {
                let flow = match statement {
                    Statement::Genr(stmt) => {
                        if slot.is_none() {
                            *slot = Some(self.compile(stmt)?);
                        }
                        let Some(genr) = slot.as_mut() else {
                            continue;
                        };
                        if let Some(value) = self.execute(genr)? {
                            self.last_value = Some(value);
                        }
                        Flow::Continue
                    },
                    other => self.exec_statement(other)?,
                };
                if let Flow::Return(value) = flow {
                    return Ok(Flow::Return(value));
                }
            }
        }
        Ok(Flow::Continue)
    }
}
