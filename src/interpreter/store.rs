use std::rc::Rc;

use tracing::trace;

use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::core::EvalResult,
        value::{core::Value, matrix::Matrix},
    },
};

/// A named non-series variable and the function-call depth that owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct UserVar {
    /// The variable name.
    pub name:  String,
    /// Function-call depth at which the variable is visible.
    pub level: usize,
    /// The current value.
    pub value: Value,
}

/// Registry of named scalars, matrices, strings, lists and bundles.
///
/// The store is one flat list tagged with scope levels rather than a stack
/// of maps. A name is visible only at the level it was created at, so a
/// function body cannot see its caller's locals except through parameters
/// passed by reference (see [`VarStore::localize`]).
///
/// `(name, level)` pairs are unique.
///
/// # Example
/// ```
/// use genr::interpreter::{store::VarStore, value::core::Value};
///
/// let mut store = VarStore::new();
/// store.add("x", Value::Scalar(1.0), 0, 1).unwrap();
///
/// assert_eq!(store.lookup("x", 0), Some(&Value::Scalar(1.0)));
/// assert_eq!(store.lookup("x", 1), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct VarStore {
    vars: Vec<UserVar>,
}

impl VarStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variable at `level`, taking ownership of `value`.
    ///
    /// If the name already exists at that level with the same kind, or as a
    /// null placeholder, the old value is replaced.
    ///
    /// # Errors
    /// Returns `RuntimeError::DuplicateName` if the name is taken at that
    /// level by a variable of another kind.
    pub fn add(&mut self, name: &str, value: Value, level: usize, line: usize) -> EvalResult<()> {
        if let Some(var) = self.find_mut(name, level) {
            if !var.value.is_null() && var.value.kind() != value.kind() {
                return Err(RuntimeError::DuplicateName { name: name.to_string(),
                                                         existing: var.value.type_name(),
                                                         line });
            }
            trace!(name, level, "replacing variable");
            var.value = value;
            return Ok(());
        }
        trace!(name, level, kind = %value.type_name(), "adding variable");
        self.vars.push(UserVar { name: name.to_string(),
                                 level,
                                 value });
        Ok(())
    }

    /// Looks up a variable visible at `level`.
    #[must_use]
    pub fn lookup(&self, name: &str, level: usize) -> Option<&Value> {
        self.vars
            .iter()
            .find(|v| v.level == level && v.name == name)
            .map(|v| &v.value)
    }

    /// Mutable lookup of a variable visible at `level`.
    pub fn lookup_mut(&mut self, name: &str, level: usize) -> Option<&mut Value> {
        self.find_mut(name, level).map(|v| &mut v.value)
    }

    fn find_mut(&mut self, name: &str, level: usize) -> Option<&mut UserVar> {
        self.vars
            .iter_mut()
            .find(|v| v.level == level && v.name == name)
    }

    /// Finds the variable, at any level, whose matrix is this very
    /// allocation.
    ///
    /// A matrix read from the store is shared, not copied; this reports
    /// whether a value about to be stored is already owned by a variable.
    #[must_use]
    pub fn lookup_by_identity(&self, m: &Rc<Matrix>) -> Option<&UserVar> {
        self.vars
            .iter()
            .find(|v| matches!(&v.value, Value::Matrix(held) if Rc::ptr_eq(held, m)))
    }

    /// Installs a new value for an existing variable, keeping its level.
    ///
    /// The old value is dropped. If it is shared with a bundle member the
    /// data live on there; nothing needs to be checked first.
    ///
    /// Returns the old value, or `None` if there was no such variable (in
    /// which case nothing is changed).
    pub fn replace(&mut self, name: &str, level: usize, value: Value) -> Option<Value> {
        let var = self.find_mut(name, level)?;
        trace!(name, level, "replacing variable");
        Some(std::mem::replace(&mut var.value, value))
    }

    /// Removes a variable, returning its value.
    pub fn delete(&mut self, name: &str, level: usize) -> Option<Value> {
        let pos = self.vars
                      .iter()
                      .position(|v| v.level == level && v.name == name)?;
        trace!(name, level, "deleting variable");
        Some(self.vars.remove(pos).value)
    }

    /// Drops every variable at `level`, keeping the others in their original
    /// order. Returns how many were removed.
    pub fn destroy_all_at_scope(&mut self, level: usize) -> usize {
        let before = self.vars.len();
        self.vars.retain(|v| v.level != level);
        let removed = before - self.vars.len();
        if removed > 0 {
            trace!(level, removed, "destroyed scope");
        }
        removed
    }

    /// Makes the caller's variable `name` at `level` visible one level down
    /// under `new_name`, without copying it.
    ///
    /// Returns `false` if there is no such variable.
    pub fn localize(&mut self, name: &str, level: usize, new_name: &str) -> bool {
        let Some(var) = self.find_mut(name, level) else {
            return false;
        };
        var.name = new_name.to_string();
        var.level = level + 1;
        trace!(name, new_name, level = level + 1, "localized variable");
        true
    }

    /// Reverses [`VarStore::localize`]: renames `new_name` at `callee_level`
    /// back to `orig_name` one level up.
    ///
    /// Returns `false` if the callee deleted the variable.
    pub fn unlocalize(&mut self, new_name: &str, callee_level: usize, orig_name: &str) -> bool {
        let Some(var) = self.find_mut(new_name, callee_level) else {
            return false;
        };
        var.name = orig_name.to_string();
        var.level = callee_level.saturating_sub(1);
        trace!(new_name, orig_name, "unlocalized variable");
        true
    }

    /// Updates every stored list after the dataset column `id` was removed:
    /// the member is dropped and higher identifiers shift down by one.
    pub fn prune_list_member(&mut self, id: usize) {
        for var in &mut self.vars {
            if let Value::List(list) = &mut var.value
               && list.iter().any(|&m| m >= id)
            {
                *list = Rc::new(pruned_ids(list.as_slice(), id));
            }
        }
    }

    /// Drops every list, at all levels. Lists name dataset columns, so they
    /// cannot outlive the dataset they were built on.
    pub fn drop_lists(&mut self) -> usize {
        let before = self.vars.len();
        self.vars.retain(|v| !matches!(v.value, Value::List(_)));
        before - self.vars.len()
    }

    /// Iterates over every variable, at all levels.
    pub fn iter(&self) -> impl Iterator<Item = &UserVar> {
        self.vars.iter()
    }

    /// Number of variables, at all levels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// `true` if the store holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// The members of a list after dataset column `id` was removed: `id` is
/// dropped and higher identifiers shift down by one.
///
/// # Example
/// ```
/// use genr::interpreter::store::pruned_ids;
///
/// assert_eq!(pruned_ids(&[1, 3, 4], 3), vec![1, 3]);
/// ```
#[must_use]
pub fn pruned_ids(list: &[usize], id: usize) -> Vec<usize> {
    list.iter()
        .filter(|&&m| m != id)
        .map(|&m| if m > id { m - 1 } else { m })
        .collect()
}
