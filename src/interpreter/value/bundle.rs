use std::{collections::BTreeMap, fmt};

use crate::interpreter::value::core::Value;

/// A string-keyed map whose values may be of any kind.
///
/// Keys iterate in sorted order, which keeps printing deterministic.
/// Members are shared with the variables they were copied from until one
/// side is written, so putting a matrix into a bundle never duplicates it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bundle {
    items: BTreeMap<String, Value>,
}

impl Bundle {
    /// Creates an empty bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a member.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.items.get(key)
    }

    /// Inserts or replaces a member, whatever its previous kind.
    ///
    /// # Example
    /// ```
    /// use genr::interpreter::value::{bundle::Bundle, core::Value};
    ///
    /// let mut b = Bundle::new();
    /// b.insert("k", Value::Scalar(1.0));
    /// b.insert("k", Value::from("text"));
    ///
    /// assert_eq!(b.len(), 1);
    /// assert_eq!(b.get("k"), Some(&Value::from("text")));
    /// ```
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.items.insert(key.into(), value)
    }

    /// Removes a member.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.items.remove(key)
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// `true` if the bundle has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over the members in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.items.iter()
    }

    /// The union of two bundles. Where both hold a key, `self` wins.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut out = self.clone();
        for (k, v) in &other.items {
            out.items.entry(k.clone()).or_insert_with(|| v.clone());
        }
        out
    }
}

impl fmt::Display for Bundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.items.is_empty() {
            return writeln!(f, "bundle: empty");
        }
        writeln!(f, "bundle:")?;
        for (key, value) in &self.items {
            match value {
                Value::Scalar(_) | Value::Str(_) => writeln!(f, "  {key} = {value}")?,
                Value::Matrix(m) => writeln!(f, "  {key} ({} x {})", m.rows(), m.cols())?,
                Value::Series(s) => writeln!(f, "  {key} (series, length {})", s.data.len())?,
                Value::List(l) => writeln!(f, "  {key} (list, {} members)", l.len())?,
                Value::Bundle(_) => writeln!(f, "  {key} (bundle)")?,
                Value::Null => writeln!(f, "  {key} (null)")?,
            }
        }
        Ok(())
    }
}
