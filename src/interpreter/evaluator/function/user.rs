use std::rc::Rc;

use tracing::{debug, instrument};

use crate::{
    ast::{Expr, FunctionDef, Param, ParamDefault, TypeKind},
    error::RuntimeError,
    interpreter::{
        evaluator::{
            core::{Context, EvalResult},
            statement::Flow,
        },
        store::pruned_ids,
        value::core::{Series, Value},
    },
};

/// Deepest nesting of user-function calls before a call is refused.
pub const MAX_CALL_DEPTH: usize = 256;

/// An argument after evaluation in the caller's scope.
enum Argument {
    /// A value to bind under the parameter name.
    Value(Value),
    /// `&name`: the caller's variable itself.
    Ref(String),
}

/// A caller variable made visible inside the callee under another name.
enum Localized {
    Var {
        caller: String,
        local:  String,
    },
    Series {
        caller:       String,
        caller_level: usize,
        local:        String,
    },
}

impl Context {
    /// Calls a user-defined function.
    ///
    /// Arguments are evaluated left to right in the caller's scope, then the
    /// call pushes a new scope level:
    /// - a by-value argument is converted to the parameter's kind and bound
    ///   as a new variable (a series argument becomes a new series),
    /// - a `&name` argument for a `*` parameter is moved into the callee's
    ///   scope under the parameter name, so that changes made by the callee
    ///   are seen by the caller,
    /// - an omitted optional argument takes its default.
    ///
    /// Whatever happens in the body, on the way out every reference argument
    /// goes back to its caller name and every variable and series created in
    /// the callee's scope is destroyed. The returned value is then converted
    /// to the declared return kind.
    ///
    /// # Errors
    /// - `RuntimeError::ArgumentCountMismatch` for too many arguments or a
    ///   missing required one,
    /// - a type error for an argument or return value of the wrong kind,
    /// - `RuntimeError::InvalidArgument` past [`MAX_CALL_DEPTH`],
    /// - any error raised by the body.
    ///
    /// # Example
    /// ```
    /// use genr::{interpreter::{evaluator::core::Context, value::core::Value}, run_with_context};
    ///
    /// let src = "function scalar twice(scalar x)\n  return 2 * x\nend function\nscalar y = twice(21)";
    /// let mut ctx = Context::new();
    /// run_with_context(&mut ctx, src).unwrap();
    ///
    /// assert_eq!(ctx.store.lookup("y", 0), Some(&Value::Scalar(42.0)));
    /// ```
    #[instrument(level = "debug", skip_all, fields(name = %def.name, level = self.level))]
    pub(crate) fn call_user_function(&mut self,
                                     def: &FunctionDef,
                                     args: &[Expr],
                                     line: usize)
                                     -> EvalResult<Value> {
        if args.len() > def.params.len() {
            return Err(RuntimeError::ArgumentCountMismatch { name: def.name.clone(),
                                                             line });
        }
        if self.level >= MAX_CALL_DEPTH {
            return Err(RuntimeError::InvalidArgument { details: format!("calls to '{}' nested \
                                                                         too deeply",
                                                                        def.name),
                                                       line });
        }

        let bound = def.params
                       .iter()
                       .enumerate()
                       .map(|(i, param)| self.eval_argument(def, param, args.get(i), line))
                       .collect::<EvalResult<Vec<_>>>()?;

        let saved_obs = self.obs.take();
        self.level += 1;
        let mut localized = Vec::new();
        let outcome = self.bind_arguments(&def.params, bound, &mut localized, line)
                          .and_then(|()| self.exec_block(&def.body));
        let mut returned = match outcome {
            Ok(Flow::Return(value)) => Ok(value),
            Ok(Flow::Continue) => Ok(None),
            Err(e) => Err(e),
        };
        self.unwind_call(localized, returned.as_mut().ok().and_then(Option::as_mut));
        self.level -= 1;
        self.obs = saved_obs;

        self.adapt_return(def, returned?, line)
    }

    /// Evaluates one argument, or the default of an omitted one.
    fn eval_argument(&mut self,
                     def: &FunctionDef,
                     param: &Param,
                     arg: Option<&Expr>,
                     line: usize)
                     -> EvalResult<Argument> {
        match (arg, param.by_ref) {
            (Some(Expr::Reference { name, line }), true) => {
                match self.kind_of(name) {
                    Some(kind) if kind == param.kind => Ok(Argument::Ref(name.clone())),
                    Some(kind) => {
                        Err(RuntimeError::type_error(format!("'{}' takes a {}, but '{name}' \
                                                              is a {kind}",
                                                             param.name, param.kind),
                                                     *line))
                    },
                    None => Err(RuntimeError::UnknownVariable { name: name.clone(),
                                                                line: *line, }),
                }
            },
            (Some(Expr::Reference { name, line }), false) => {
                Err(RuntimeError::type_error(format!("'{}' is not a reference parameter; pass \
                                                      '{name}' without '&'",
                                                     param.name),
                                             *line))
            },
            (None | Some(Expr::Null { .. }), _) => match &param.default {
                Some(ParamDefault::Null) => Ok(Argument::Value(Value::Null)),
                Some(ParamDefault::Value(expr)) => {
                    let value = self.eval(expr)?;
                    Ok(Argument::Value(self.coerce(value, param.kind, line)?))
                },
                None => Err(RuntimeError::ArgumentCountMismatch { name: def.name.clone(),
                                                                  line }),
            },
            (Some(_), true) => {
                Err(RuntimeError::type_error(format!("'{}' is a reference parameter; pass \
                                                      '&name'",
                                                     param.name),
                                             line))
            },
            (Some(expr), false) => {
                let value = self.eval(expr)?;
                Ok(Argument::Value(self.coerce(value, param.kind, line)?))
            },
        }
    }

    /// Binds evaluated arguments at the (already entered) callee level.
    fn bind_arguments(&mut self,
                      params: &[Param],
                      bound: Vec<Argument>,
                      localized: &mut Vec<Localized>,
                      line: usize)
                      -> EvalResult<()> {
        let (level, caller_level) = (self.level, self.level - 1);
        for (param, arg) in params.iter().zip(bound) {
            match arg {
                Argument::Value(Value::Series(s)) => {
                    self.dataset.add_series(&param.name, s.data.to_vec(), level);
                },
                Argument::Value(value) => self.store.add(&param.name, value, level, line)?,
                Argument::Ref(caller) if param.kind == TypeKind::Series => {
                    let Some(id) = self.dataset.series_id(&caller, caller_level) else {
                        return Err(RuntimeError::UnknownVariable { name: caller, line });
                    };
                    self.dataset.relabel(id, &param.name, level);
                    localized.push(Localized::Series { caller,
                                                       caller_level,
                                                       local: param.name.clone() });
                },
                Argument::Ref(caller) => {
                    if !self.store.localize(&caller, caller_level, &param.name) {
                        return Err(RuntimeError::UnknownVariable { name: caller, line });
                    }
                    localized.push(Localized::Var { caller,
                                                    local: param.name.clone() });
                },
            }
        }
        Ok(())
    }

    /// Leaves the callee's scope: reference arguments go home, series named
    /// by a returned list move to the caller, and the remaining locals are
    /// destroyed.
    fn unwind_call(&mut self, localized: Vec<Localized>, returned: Option<&mut Value>) {
        let level = self.level;
        for binding in localized.into_iter().rev() {
            match binding {
                Localized::Var { caller, local } => {
                    self.store.unlocalize(&local, level, &caller);
                },
                Localized::Series { caller,
                                    caller_level,
                                    local, } => {
                    if let Some(id) = self.dataset.series_id(&local, level) {
                        self.dataset.relabel(id, &caller, caller_level);
                    }
                },
            }
        }
        let mut returned_list = match returned {
            Some(Value::List(ids)) => {
                self.promote_list_members(Rc::make_mut(ids).as_mut_slice(), level);
                Some(ids)
            },
            _ => None,
        };
        let vars = self.store.destroy_all_at_scope(level);
        let series = self.dataset.delete_series_at_level(level);
        for &id in &series {
            self.store.prune_list_member(id);
            if let Some(ids) = returned_list.as_deref_mut() {
                *ids = Rc::new(pruned_ids(ids.as_slice(), id));
            }
        }
        debug!(level, vars, series = series.len(), "left function scope");
    }

    /// Hands the callee's series named in a returned list over to the caller.
    ///
    /// A member without a caller series of the same name is moved to the
    /// caller's level; otherwise its data overwrite the caller's series and
    /// the list is pointed at that series instead.
    fn promote_list_members(&mut self, ids: &mut [usize], level: usize) {
        let caller_level = level - 1;
        for id in ids.iter_mut() {
            if self.dataset.column(*id).is_none_or(|c| c.level != level) {
                continue;
            }
            let name = self.dataset.name(*id).to_string();
            match self.dataset.series_id(&name, caller_level) {
                Some(existing) if existing != *id => {
                    if let (Some(data), Some(dst)) =
                        (self.dataset.data(*id), self.dataset.data_mut(existing))
                    {
                        dst.clone_from(&data);
                    }
                    *id = existing;
                },
                _ => {
                    self.dataset.relabel(*id, &name, caller_level);
                },
            }
            debug!(series = %name, "returned to caller");
        }
    }

    /// Converts a returned value to the declared return kind.
    fn adapt_return(&mut self,
                    def: &FunctionDef,
                    value: Option<Value>,
                    line: usize)
                    -> EvalResult<Value> {
        let Some(kind) = def.return_type else {
            return Ok(Value::Null);
        };
        let Some(value) = value.filter(|v| !v.is_null()) else {
            return Err(RuntimeError::type_error(format!("function '{}' must return a {kind}",
                                                        def.name),
                                                line));
        };
        let value = match value {
            Value::Series(s) => Value::Series(Series::temporary(s.data)),
            other => other,
        };
        self.coerce(value, kind, line)
            .map_err(|_| {
                RuntimeError::type_error(format!("function '{}' must return a {kind}", def.name),
                                         line)
            })
    }
}
