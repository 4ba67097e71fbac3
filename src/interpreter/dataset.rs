use std::rc::Rc;

use tracing::trace;

use crate::{error::RuntimeError, interpreter::evaluator::core::EvalResult, util::num::NADBL};

/// Name of the constant column every dataset starts with.
pub const CONST_NAME: &str = "const";

/// One named column of the dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// The series name.
    pub name:  String,
    /// One value per observation, over the full dataset.
    pub data:  Rc<Vec<f64>>,
    /// Function-call depth at which the series is visible.
    pub level: usize,
}

/// The observations that series live in.
///
/// A dataset has `n` observations, a current sample `t1..=t2` (0-based,
/// inclusive) that arithmetic runs over, and named columns. Column 0 is the
/// constant and is visible at every level; other columns are scoped by
/// function-call depth like store variables.
///
/// Column data are shared with the series values read from them; writing a
/// column copies it first if a value still holds the old buffer.
///
/// # Example
/// ```
/// use genr::interpreter::dataset::Dataset;
///
/// let mut ds = Dataset::new(5);
/// let id = ds.add_series("x", vec![1.0; 5], 0);
///
/// assert_eq!(ds.series_id("x", 0), Some(id));
/// assert_eq!(ds.series_id("x", 1), None);
/// assert_eq!(ds.series_id("const", 3), Some(0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    n:       usize,
    t1:      usize,
    t2:      usize,
    columns: Vec<Column>,
}

impl Default for Dataset {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Dataset {
    /// Creates a dataset of `n` observations holding only the constant.
    #[must_use]
    pub fn new(n: usize) -> Self {
        Self { n,
               t1: 0,
               t2: n.saturating_sub(1),
               columns: vec![Column { name:  CONST_NAME.to_string(),
                                      data:  Rc::new(vec![1.0; n]),
                                      level: 0, }] }
    }

    /// [`Dataset::new`], or `None` if the constant column cannot be
    /// allocated.
    #[must_use]
    pub fn try_new(n: usize) -> Option<Self> {
        let mut constant = Vec::new();
        constant.try_reserve_exact(n).ok()?;
        constant.resize(n, 1.0);
        Some(Self { n,
                    t1: 0,
                    t2: n.saturating_sub(1),
                    columns: vec![Column { name:  CONST_NAME.to_string(),
                                           data:  Rc::new(constant),
                                           level: 0, }] })
    }

    /// Number of observations.
    #[must_use]
    pub const fn n(&self) -> usize {
        self.n
    }

    /// First observation of the current sample.
    #[must_use]
    pub const fn t1(&self) -> usize {
        self.t1
    }

    /// Last observation of the current sample.
    #[must_use]
    pub const fn t2(&self) -> usize {
        self.t2
    }

    /// `true` if there are any observations at all.
    #[must_use]
    pub const fn has_data(&self) -> bool {
        self.n > 0
    }

    /// Fails with `NoData` when there are no observations.
    ///
    /// # Errors
    /// Returns `RuntimeError::NoData` on an empty dataset.
    pub fn require_data(&self, line: usize) -> EvalResult<()> {
        if self.n == 0 {
            return Err(RuntimeError::NoData { line });
        }
        Ok(())
    }

    /// Number of observations in the current sample.
    #[must_use]
    pub const fn sample_len(&self) -> usize {
        if self.n == 0 { 0 } else { self.t2 - self.t1 + 1 }
    }

    /// Restricts the sample to `t1..=t2` (0-based).
    ///
    /// # Errors
    /// Returns `RuntimeError::InvalidArgument` if the range is empty or runs
    /// past the dataset.
    pub fn set_sample(&mut self, t1: usize, t2: usize, line: usize) -> EvalResult<()> {
        if t1 > t2 || t2 >= self.n {
            return Err(RuntimeError::InvalidArgument { details:
                                                           format!("invalid sample range {}..{} \
                                                                    for {} observations",
                                                                   t1 + 1,
                                                                   t2 + 1,
                                                                   self.n),
                                                       line });
        }
        self.t1 = t1;
        self.t2 = t2;
        Ok(())
    }

    /// Restores the sample to every observation.
    pub const fn full_sample(&mut self) {
        self.t1 = 0;
        self.t2 = self.n.saturating_sub(1);
    }

    /// Number of columns, including the constant.
    #[must_use]
    pub fn num_series(&self) -> usize {
        self.columns.len()
    }

    /// Finds the column named `name` visible at `level`.
    #[must_use]
    pub fn series_id(&self, name: &str, level: usize) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name == name && (c.level == level || c.name == CONST_NAME))
    }

    /// The column with identifier `id`.
    #[must_use]
    pub fn column(&self, id: usize) -> Option<&Column> {
        self.columns.get(id)
    }

    /// The name of column `id`, or an empty string if there is none.
    #[must_use]
    pub fn name(&self, id: usize) -> &str {
        self.columns.get(id).map_or("", |c| c.name.as_str())
    }

    /// Shares the data of column `id`.
    #[must_use]
    pub fn data(&self, id: usize) -> Option<Rc<Vec<f64>>> {
        self.columns.get(id).map(|c| Rc::clone(&c.data))
    }

    /// Mutable access to the data of column `id`, copying the buffer first
    /// if a value still shares it.
    pub fn data_mut(&mut self, id: usize) -> Option<&mut Vec<f64>> {
        self.columns.get_mut(id).map(|c| Rc::make_mut(&mut c.data))
    }

    /// Appends a column and returns its identifier.
    ///
    /// `data` is padded with missing values or truncated to the dataset
    /// length.
    pub fn add_series(&mut self, name: &str, mut data: Vec<f64>, level: usize) -> usize {
        data.resize(self.n, NADBL);
        self.columns.push(Column { name: name.to_string(),
                                   data: Rc::new(data),
                                   level });
        trace!(name, level, id = self.columns.len() - 1, "added series");
        self.columns.len() - 1
    }

    /// Removes column `id`. Higher identifiers shift down by one.
    ///
    /// # Errors
    /// Returns `RuntimeError::InvalidArgument` for the constant or an unknown
    /// identifier.
    pub fn delete_series(&mut self, id: usize, line: usize) -> EvalResult<Column> {
        if id == 0 || id >= self.columns.len() {
            return Err(RuntimeError::InvalidArgument { details:
                                                           format!("cannot delete series {id}"),
                                                       line });
        }
        trace!(id, name = %self.columns[id].name, "deleted series");
        Ok(self.columns.remove(id))
    }

    /// Removes every column created at `level` and returns their former
    /// identifiers, highest first.
    pub fn delete_series_at_level(&mut self, level: usize) -> Vec<usize> {
        let ids: Vec<usize> = (1..self.columns.len()).rev()
                                                      .filter(|&i| self.columns[i].level == level)
                                                      .collect();
        for &id in &ids {
            self.columns.remove(id);
        }
        ids
    }

    /// Renames column `id` and moves it to `level`, returning its previous
    /// name and level.
    pub fn relabel(&mut self, id: usize, name: &str, level: usize) -> Option<(String, usize)> {
        let col = self.columns.get_mut(id)?;
        let old_name = std::mem::replace(&mut col.name, name.to_string());
        let old_level = std::mem::replace(&mut col.level, level);
        Some((old_name, old_level))
    }
}
