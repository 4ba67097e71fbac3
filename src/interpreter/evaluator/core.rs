use std::{collections::HashMap, f64::consts::PI, rc::Rc};

use tracing::warn;

use crate::{
    ast::{Expr, FunctionDef, TypeKind},
    error::{RuntimeError, Warning},
    interpreter::{
        dataset::Dataset,
        evaluator::auxiliary::AuxPool,
        output::{PrintSink, Printer},
        store::VarStore,
        value::core::{Series, Value},
    },
    util::num::count_to_f64,
};

/// Result type used by the evaluator.
///
/// All evaluation functions return either a value of type `T` or a
/// `RuntimeError` describing the failure.
pub type EvalResult<T> = Result<T, RuntimeError>;

/// Switches controlled by the `set` command.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Echo "generated missing values" warnings to the print sink.
    pub warnings: bool,
    /// Print the value stored by each assignment.
    pub echo:     bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self { warnings: true,
               echo:     false, }
    }
}

/// Stores the runtime evaluation context.
///
/// The context owns everything a script can see or change: the dataset,
/// the named-variable store, user function definitions and the current
/// function-call depth. Evaluation methods take `&mut self`, so one
/// context is one independent interpreter session.
///
/// ## Usage
///
/// ```
/// use genr::{interpreter::{evaluator::core::Context, value::core::Value}, run_with_context};
///
/// let mut ctx = Context::with_observations(4);
/// run_with_context(&mut ctx, "scalar a = 2\nseries y = a * const").unwrap();
///
/// assert_eq!(ctx.store.lookup("a", 0), Some(&Value::Scalar(2.0)));
/// assert!(ctx.dataset.series_id("y", 0).is_some());
/// ```
#[derive(Debug)]
pub struct Context {
    /// The observations series live in.
    pub dataset:        Dataset,
    /// Named scalars, matrices, strings, lists and bundles.
    pub store:          VarStore,
    /// User function definitions by name.
    pub functions:      HashMap<String, Rc<FunctionDef>>,
    /// Current function-call depth; 0 at the top level.
    pub level:          usize,
    /// Options set with the `set` command.
    pub settings:       Settings,
    /// Destination of `print` output.
    pub printer:        Printer,
    /// Value of the most recent statement that produced one.
    pub last_value:     Option<Value>,
    /// Intermediate storage of the statement being evaluated.
    pub(crate) aux:     AuxPool,
    /// The single observation being computed in autoregressive mode.
    pub(crate) obs:     Option<usize>,
    warnings:           Vec<Warning>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Creates a context with an empty dataset, printing into a buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::with_dataset(Dataset::default(), PrintSink::Buffer)
    }

    /// Creates a context with an `n`-observation dataset.
    #[must_use]
    pub fn with_observations(n: usize) -> Self {
        Self::with_dataset(Dataset::new(n), PrintSink::Buffer)
    }

    /// Creates a context around an existing dataset and print sink.
    #[must_use]
    pub fn with_dataset(dataset: Dataset, sink: PrintSink) -> Self {
        Self { dataset,
               store: VarStore::new(),
               functions: HashMap::new(),
               level: 0,
               settings: Settings::default(),
               printer: Printer::new(sink),
               last_value: None,
               aux: AuxPool::new(),
               obs: None,
               warnings: Vec::new() }
    }

    /// Takes the warnings raised since the last call.
    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }

    /// Records a non-fatal warning: it is kept for [`Context::take_warnings`],
    /// logged, and echoed to the print sink unless warnings are off.
    pub(crate) fn raise_warning(&mut self, warning: Warning, line: usize) -> EvalResult<()> {
        warn!("{warning}");
        if self.settings.warnings {
            self.printer.emit(&warning.to_string(), line)?;
        }
        self.warnings.push(warning);
        Ok(())
    }

    /// Evaluates an expression and returns the resulting value.
    ///
    /// This is the main entry point for expression evaluation. Children are
    /// evaluated depth first, left before right, except where `&&`, `||`
    /// and the ternary operator decide that a child need not run at all.
    ///
    /// # Parameters
    /// - `expr`: Expression to evaluate.
    ///
    /// # Returns
    /// The value of the expression. Intermediate series and matrices are
    /// served from the auxiliary pool of the statement being run.
    pub fn eval(&mut self, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::Number { value, .. } => Ok(Value::Scalar(*value)),
            Expr::Str { value, .. } => Ok(Value::from(value.as_str())),
            Expr::Null { .. } => Ok(Value::Null),
            Expr::Variable { name, line } => self.eval_variable(name, *line),
            Expr::Accessor { name, line } => self.eval_accessor(name, *line),
            Expr::UnaryOp { op, expr, line } => self.eval_unary_op(*op, expr, *line),
            Expr::BinaryOp { left,
                             op,
                             right,
                             line, } => self.eval_binary_op(left, *op, right, *line),
            Expr::Ternary { condition,
                            then_branch,
                            else_branch,
                            line, } => {
                self.eval_ternary(condition, then_branch, else_branch, *line)
            },
            Expr::FunctionCall { name,
                                 arguments,
                                 line, } => self.eval_function_call(name, arguments, *line),
            Expr::Reference { name, line } => {
                Err(RuntimeError::type_error(format!("'&{name}' is only valid as a function \
                                                      argument"),
                                             *line))
            },
            Expr::MatrixLiteral { rows, line } => self.eval_matrix_literal(rows, *line),
            Expr::ListLiteral { names, line } => self.eval_list_literal(names, *line),
            Expr::Index { target, index, line } => self.eval_index(target, index, *line),
            Expr::Member { target, key, line } => self.eval_member(target, key, *line),
            Expr::Transpose { expr, line } => self.eval_transpose(expr, *line),
        }
    }

    /// Resolves a name at the current level: store variables first, then
    /// dataset series.
    ///
    /// A series comes back sharing the column's data, tagged with its id.
    pub(crate) fn eval_variable(&self, name: &str, line: usize) -> EvalResult<Value> {
        if let Some(v) = self.store.lookup(name, self.level) {
            return Ok(v.clone());
        }
        if let Some(id) = self.dataset.series_id(name, self.level)
           && let Some(data) = self.dataset.data(id)
        {
            return Ok(Value::Series(Series { data, id: Some(id) }));
        }
        Err(RuntimeError::UnknownVariable { name: name.to_string(),
                                            line })
    }

    /// The kind of the variable `name` at the current level, if it exists.
    ///
    /// A null placeholder counts as not existing.
    #[must_use]
    pub fn kind_of(&self, name: &str) -> Option<TypeKind> {
        if let Some(v) = self.store.lookup(name, self.level) {
            return v.kind();
        }
        self.dataset
            .series_id(name, self.level)
            .map(|_| TypeKind::Series)
    }

    /// Evaluates a `$name` accessor.
    fn eval_accessor(&self, name: &str, line: usize) -> EvalResult<Value> {
        let value = match name {
            "nobs" => count_to_f64(self.dataset.sample_len()),
            "t1" if self.dataset.has_data() => count_to_f64(self.dataset.t1() + 1),
            "t2" if self.dataset.has_data() => count_to_f64(self.dataset.t2() + 1),
            "t1" | "t2" => return Err(RuntimeError::NoData { line }),
            "pi" => PI,
            _ => {
                return Err(RuntimeError::UnknownVariable { name: format!("${name}"),
                                                           line });
            },
        };
        Ok(Value::Scalar(value))
    }

    /// Runs `f` with a fresh auxiliary pool, restoring the current one
    /// afterwards whether or not `f` succeeds.
    pub(crate) fn with_fresh_pool<T>(&mut self,
                                     f: impl FnOnce(&mut Self) -> EvalResult<T>)
                                     -> EvalResult<T> {
        let saved = std::mem::take(&mut self.aux);
        let result = f(self);
        self.aux = saved;
        result
    }
}
