//! The in-memory, caller-facing result of reading a [`Schema`](crate::Schema).

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::value::{Primitive, Value};

/// Typed values keyed by field name, plus nested data trees keyed by
/// nested-schema name.
///
/// A data tree is not persisted itself; the engine produces one per access,
/// the caller mutates it, and the engine writes it back to the tag tree.
///
/// ```rust
/// use nbtlink::DataTree;
///
/// let mut data = DataTree::new();
/// data.put("level", 5);
/// data.get_or_create_compound("position").put("x", 12.5);
///
/// assert_eq!(data.get::<i32>("level"), 5);
/// assert_eq!(data.get_compound("position").map(|p| p.get::<f64>("x")), Some(12.5));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTree {
    root: BTreeMap<String, Value>,
    nested: BTreeMap<String, DataTree>,
}

impl DataTree {
    /// Creates an empty data tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a typed value, replacing any prior value under `key`.
    pub fn put<T: Primitive>(&mut self, key: &str, value: T) {
        self.root.insert(key.to_owned(), value.to_value());
    }

    /// Stores an already-erased value.
    pub fn put_value(&mut self, key: &str, value: Value) {
        self.root.insert(key.to_owned(), value);
    }

    /// Returns the value under `key` as `T`.
    ///
    /// # Panics
    /// Panics if nothing is stored under `key` or the stored kind is not
    /// `T::KIND`. After a schema read every key of that schema is populated,
    /// so either case is a programming error. Use [`DataTree::try_get`] to
    /// check instead.
    #[allow(clippy::panic)]
    pub fn get<T: Primitive>(&self, key: &str) -> T {
        match self.try_get(key) {
            Ok(value) => value,
            Err(err) => panic!("DataTree::get: {err}"),
        }
    }

    /// Checked form of [`DataTree::get`].
    ///
    /// # Errors
    /// [`Error::MissingValue`] when the key is absent and
    /// [`Error::KindMismatch`] when it holds another kind.
    pub fn try_get<T: Primitive>(&self, key: &str) -> Result<T> {
        let value = self
            .root
            .get(key)
            .ok_or_else(|| Error::MissingValue(key.to_owned()))?;
        T::from_value(value.clone()).map_err(|found| Error::KindMismatch {
            key: key.to_owned(),
            expected: T::KIND,
            found: found.kind(),
        })
    }

    /// The erased value under `key`.
    pub fn get_value(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// Removes and returns the value under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.root.remove(key)
    }

    /// Whether a value is stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.root.contains_key(key)
    }

    /// The nested data tree under `key`.
    pub fn get_compound(&self, key: &str) -> Option<&DataTree> {
        self.nested.get(key)
    }

    /// Mutable access to the nested data tree under `key`.
    pub fn get_compound_mut(&mut self, key: &str) -> Option<&mut DataTree> {
        self.nested.get_mut(key)
    }

    /// The nested data tree under `key`, created empty when missing.
    pub fn get_or_create_compound(&mut self, key: &str) -> &mut DataTree {
        self.nested.entry(key.to_owned()).or_default()
    }

    /// Stores a nested data tree, replacing any prior one.
    pub fn put_compound(&mut self, key: &str, tree: DataTree) {
        self.nested.insert(key.to_owned(), tree);
    }

    /// Iterates over the root values in key order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.root.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates over the nested trees in key order.
    pub fn compounds(&self) -> impl Iterator<Item = (&str, &DataTree)> {
        self.nested.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether the tree holds neither values nor nested trees.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty() && self.nested.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueKind;

    #[test]
    fn try_get_reports_mismatch() {
        let mut data = DataTree::new();
        data.put("level", 5);

        assert!(matches!(
            data.try_get::<f64>("level"),
            Err(Error::KindMismatch { expected: ValueKind::Double, found: ValueKind::Int, .. })
        ));
        assert!(matches!(data.try_get::<i32>("name"), Err(Error::MissingValue(_))));
    }

    #[test]
    #[should_panic(expected = "Kind mismatch")]
    fn get_panics_on_mismatch() {
        let mut data = DataTree::new();
        data.put("name", String::from("steve"));
        let _: i32 = data.get("name");
    }
}
