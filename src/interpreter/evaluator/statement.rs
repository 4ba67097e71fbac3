use std::rc::Rc;

use tracing::{debug, instrument};

use crate::{
    ast::{Expr, GenrStatement, PrintItem, Statement},
    error::{ParseError, RuntimeError},
    interpreter::{
        dataset::Dataset,
        evaluator::{
            core::{Context, EvalResult},
            utils::is_reserved_identifier,
        },
        output::render,
        value::core::Value,
    },
    util::num::{f64_to_dim_checked, position_to_index},
};

/// How control leaves a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// Go on with the next statement.
    Continue,
    /// A `return` was reached, with its value if it had one.
    Return(Option<Value>),
}

/// The line a statement starts on.
const fn statement_line(statement: &Statement) -> usize {
    match statement {
        Statement::Genr(GenrStatement { line, .. })
        | Statement::Expression { line, .. }
        | Statement::Print { line, .. }
        | Statement::Delete { line, .. }
        | Statement::Nulldata { line, .. }
        | Statement::Smpl { line, .. }
        | Statement::Set { line, .. }
        | Statement::Return { line, .. } => *line,
        Statement::Loop(def) => def.line,
        Statement::Function(def) => def.line,
    }
}

impl Context {
    /// Executes one statement.
    ///
    /// Genr statements are compiled, executed once and torn down; the value
    /// they store becomes [`Context::last_value`]. Statements that fail leave
    /// the effects of earlier statements in place.
    ///
    /// # Errors
    /// Any error raised by the statement.
    #[instrument(level = "debug", skip_all, fields(line = statement_line(statement), level = self.level))]
    pub fn exec_statement(&mut self, statement: &Statement) -> EvalResult<Flow> {
        match statement {
            Statement::Genr(stmt) => {
                if let Some(value) = self.run_genr(stmt)? {
                    self.last_value = Some(value);
                }
            },
            Statement::Expression { expr, .. } => {
                let value = self.with_fresh_pool(|ctx| ctx.eval(expr))?;
                if !value.is_null() {
                    self.last_value = Some(value);
                }
            },
            Statement::Print { items, line } => self.exec_print(items, *line)?,
            Statement::Delete { names, line } => {
                for name in names {
                    self.delete_variable(name, *line)?;
                }
            },
            Statement::Nulldata { n, line } => self.exec_nulldata(n, *line)?,
            Statement::Smpl { range, line } => match range {
                None => self.dataset.full_sample(),
                Some((a, b)) => {
                    let (a, b) = self.with_fresh_pool(|ctx| {
                                         Ok((ctx.eval(a)?.as_scalar(*line)?,
                                             ctx.eval(b)?.as_scalar(*line)?))
                                     })?;
                    let (t1, t2) = (position_to_index(a, *line)?, position_to_index(b, *line)?);
                    self.dataset.set_sample(t1, t2, *line)?;
                },
            },
            Statement::Set { key, value, line } => self.exec_set(key, value, *line)?,
            Statement::Loop(def) => return self.exec_loop(def),
            Statement::Function(def) => {
                if is_reserved_identifier(&def.name) {
                    return Err(ParseError::InvalidFunctionDefinition { details: format!("'{}' is \
                                                                                         a builtin \
                                                                                         name",
                                                                                        def.name),
                                                                       line:    def.line, }.into());
                }
                debug!(name = %def.name, params = def.params.len(), "defined function");
                self.functions.insert(def.name.clone(), Rc::new(def.clone()));
            },
            Statement::Return { value, line } => {
                if self.level == 0 {
                    return Err(RuntimeError::type_error("'return' outside a function", *line));
                }
                let value = match value {
                    Some(expr) => Some(self.with_fresh_pool(|ctx| ctx.eval(expr))?),
                    None => None,
                };
                return Ok(Flow::Return(value));
            },
        }
        Ok(Flow::Continue)
    }

    /// Runs statements in order until one returns.
    ///
    /// # Errors
    /// The first error raised; later statements do not run.
    pub fn exec_block(&mut self, body: &[Statement]) -> EvalResult<Flow> {
        for statement in body {
            if let Flow::Return(value) = self.exec_statement(statement)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Continue)
    }

    /// Compiles, executes and tears down a genr statement.
    fn run_genr(&mut self, stmt: &GenrStatement) -> EvalResult<Option<Value>> {
        let mut genr = self.compile(stmt)?;
        let result = self.execute(&mut genr);
        let stats = genr.destroy();
        debug!(allocated = stats.allocated, reused = stats.reused, "genr finished");
        result
    }

    fn exec_print(&mut self, items: &[PrintItem], line: usize) -> EvalResult<()> {
        for item in items {
            let text = match item {
                PrintItem::Name(name) => {
                    let value = self.eval_variable(name, line)?;
                    render(Some(name), &value, &self.dataset)
                },
                PrintItem::Expr(expr) => {
                    let value = self.with_fresh_pool(|ctx| ctx.eval(expr))?;
                    render(None, &value, &self.dataset)
                },
            };
            self.printer.emit(&text, line)?;
        }
        Ok(())
    }

    /// Deletes a variable, series or user function visible at the current
    /// level.
    ///
    /// Deleting a series removes it from every list that names it.
    ///
    /// # Errors
    /// Returns `RuntimeError::UnknownVariable` if nothing by that name
    /// exists.
    pub fn delete_variable(&mut self, name: &str, line: usize) -> EvalResult<()> {
        if self.store.delete(name, self.level).is_some() {
            return Ok(());
        }
        if let Some(id) = self.dataset.series_id(name, self.level) {
            self.dataset.delete_series(id, line)?;
            self.store.prune_list_member(id);
            return Ok(());
        }
        if self.functions.remove(name).is_some() {
            return Ok(());
        }
        Err(RuntimeError::UnknownVariable { name: name.to_string(),
                                            line })
    }

    /// Replaces the dataset with `n` empty observations.
    ///
    /// Every series and list goes with the old dataset.
    fn exec_nulldata(&mut self, n: &Expr, line: usize) -> EvalResult<()> {
        if self.level > 0 {
            return Err(RuntimeError::type_error("'nulldata' cannot be used inside a function",
                                                line));
        }
        let n = self.with_fresh_pool(|ctx| ctx.eval(n)?.as_scalar(line))?;
        let n = f64_to_dim_checked(n, line)?;
        if n == 0 {
            return Err(RuntimeError::InvalidArgument { details: "a dataset needs at least one \
                                                                 observation"
                                                                             .to_string(),
                                                       line });
        }
        let Some(dataset) = Dataset::try_new(n) else {
            return Err(RuntimeError::Allocation { details: format!("a dataset of {n} observations"),
                                                  line });
        };
        self.dataset = dataset;
        let dropped = self.store.drop_lists();
        debug!(n, dropped_lists = dropped, "new dataset");
        Ok(())
    }

    fn exec_set(&mut self, key: &str, value: &str, line: usize) -> EvalResult<()> {
        let on = match value {
            "on" => true,
            "off" => false,
            other => {
                return Err(RuntimeError::InvalidArgument { details: format!("'{other}' is not \
                                                                             on or off"),
                                                           line });
            },
        };
        match key {
            "warnings" => self.settings.warnings = on,
            "echo" => self.settings.echo = on,
            other => {
                return Err(RuntimeError::InvalidArgument { details: format!("unknown setting \
                                                                             '{other}'"),
                                                           line });
            },
        }
        Ok(())
    }
}
