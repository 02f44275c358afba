//! Schemas: named, composable bindings of field names to codecs.
//!
//! A [`Schema`] has a *root* map (field name → [`Codec`]) and a *nested* map
//! (field name → [`Schema`]). Both are insert-if-absent: the first
//! registration under a name wins, so registering the same definition twice
//! is harmless.
//!
//! [`Schema::write`] and [`Schema::read`] translate between a [`DataTree`] and
//! the tag tree. The engine wraps them in its prepare/synchronize protocol.

mod builder;

use std::collections::btree_map::{BTreeMap, Entry};
use std::sync::Arc;

use crate::codec::{versioned, Codec, CodecRef, Registration};
use crate::data::DataTree;
use crate::tag::{Compound, Tag};

pub use builder::SchemaBuilder;

/// A named set of field codecs and nested schemas.
#[derive(Debug, Clone)]
pub struct Schema {
    id: String,
    root: BTreeMap<String, CodecRef>,
    nested: BTreeMap<String, Arc<Schema>>,
    versioned: bool,
}

impl Schema {
    /// Creates an empty, unversioned schema.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            root: BTreeMap::new(),
            nested: BTreeMap::new(),
            versioned: false,
        }
    }

    /// Starts a builder for a schema named `id`.
    pub fn builder(id: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(id)
    }

    /// The schema id, used as its sub-tree key by the engine.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether fields are written inside version envelopes.
    pub fn is_versioned(&self) -> bool {
        self.versioned
    }

    /// Switches version envelopes on or off for this schema.
    ///
    /// Nested schemas keep their own setting.
    pub fn set_versioned(&mut self, versioned: bool) {
        self.versioned = versioned;
    }

    /// Binds `key` to `codec` unless the key is already bound.
    pub fn add_field(&mut self, key: impl Into<String>, codec: CodecRef) -> Registration {
        match self.root.entry(key.into()) {
            Entry::Occupied(_) => Registration::Duplicate,
            Entry::Vacant(slot) => {
                slot.insert(codec);
                Registration::Fresh
            }
        }
    }

    /// Binds `key` to a nested schema unless the key is already bound.
    pub fn add_nested(
        &mut self,
        key: impl Into<String>,
        schema: impl Into<Arc<Schema>>,
    ) -> Registration {
        match self.nested.entry(key.into()) {
            Entry::Occupied(_) => Registration::Duplicate,
            Entry::Vacant(slot) => {
                slot.insert(schema.into());
                Registration::Fresh
            }
        }
    }

    /// The root field codecs in key order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &CodecRef)> {
        self.root.iter().map(|(k, c)| (k.as_str(), c))
    }

    /// The nested schemas in key order.
    pub fn nested(&self) -> impl Iterator<Item = (&str, &Arc<Schema>)> {
        self.nested.iter().map(|(k, s)| (k.as_str(), s))
    }

    /// The codec bound to `key`.
    pub fn field(&self, key: &str) -> Option<&CodecRef> {
        self.root.get(key)
    }

    /// The nested schema bound to `key`.
    pub fn nested_schema(&self, key: &str) -> Option<&Arc<Schema>> {
        self.nested.get(key)
    }

    /// A data tree holding the fallback of every field, recursively.
    pub fn defaults(&self) -> DataTree {
        let mut data = DataTree::new();
        for (key, codec) in &self.root {
            data.put_value(key, codec.fallback());
        }
        for (key, nested) in &self.nested {
            data.put_compound(key, nested.defaults());
        }
        data
    }

    /// Writes every field of `data` into `tree`.
    ///
    /// A field missing from `data` is written as its codec's fallback. Keys
    /// the schema does not know are left untouched in `tree`.
    pub fn write(&self, tree: &mut Compound, data: &DataTree) {
        for (key, codec) in &self.root {
            let value = data.get_value(key).cloned().unwrap_or_else(|| codec.fallback());
            if self.versioned {
                versioned::write(&**codec, key, tree, &value);
            } else {
                codec.write(key, tree, &value);
            }
        }

        let empty = DataTree::new();
        for (key, nested) in &self.nested {
            let sub_data = data.get_compound(key).unwrap_or(&empty);
            nested.write(tree.get_or_create_compound(key), sub_data);
        }
    }

    /// Reads every field of the schema from `tree` into `data`.
    ///
    /// `tree` is never modified. A nested schema whose sub-tree is missing
    /// reads as its fallbacks.
    pub fn read(&self, tree: &Compound, data: &mut DataTree) {
        for (key, codec) in &self.root {
            let value = if self.versioned {
                versioned::read(&**codec, key, tree)
            } else {
                codec.read(key, tree)
            };
            data.put_value(key, value);
        }

        let empty = Compound::new();
        for (key, nested) in &self.nested {
            let sub_tree = tree.get_compound(key).unwrap_or(&empty);
            nested.read(sub_tree, data.get_or_create_compound(key));
        }
    }

    /// Reads `tree` into a fresh data tree.
    pub fn read_new(&self, tree: &Compound) -> DataTree {
        let mut data = DataTree::new();
        self.read(tree, &mut data);
        data
    }

    /// Rewrites every unversioned entry of a versioned schema in place.
    /// Returns how many entries were upgraded.
    pub fn upgrade_legacy(&self, tree: &mut Compound) -> usize {
        let mut upgraded = 0;
        if self.versioned {
            for (key, codec) in &self.root {
                if versioned::upgrade_legacy(&**codec, key, tree) {
                    upgraded += 1;
                }
            }
        }
        for (key, nested) in &self.nested {
            if let Some(Tag::Compound(_)) = tree.get(key) {
                upgraded += nested.upgrade_legacy(tree.get_or_create_compound(key));
            }
        }
        upgraded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::builtin;
    use crate::value::Value;

    fn position() -> Schema {
        Schema::builder("position").double("x").double("y").double("z").build()
    }

    #[test]
    fn first_registration_wins() {
        let mut schema = Schema::new("stats");
        assert_eq!(schema.add_field("level", builtin::INT.shared()), Registration::Fresh);
        assert_eq!(schema.add_field("level", builtin::STRING.shared()), Registration::Duplicate);
        assert_eq!(schema.add_nested("position", position()), Registration::Fresh);
        assert_eq!(schema.add_nested("position", Schema::new("other")), Registration::Duplicate);

        assert_eq!(schema.field("level").map(|c| c.kind()), Some(crate::value::ValueKind::Int));
        assert_eq!(
            schema.nested_schema("position").map(|s| s.id().to_owned()).as_deref(),
            Some("position")
        );
    }

    #[test]
    fn missing_subtree_reads_fallbacks_without_mutation() {
        let mut schema = Schema::new("stats");
        schema.add_nested("position", position());

        let tree = Compound::new();
        let data = schema.read_new(&tree);
        assert!(tree.is_empty());
        assert_eq!(
            data.get_compound("position").and_then(|p| p.get_value("y")),
            Some(&Value::Double(0.0))
        );
        assert_eq!(data, schema.defaults());
    }

    #[test]
    fn missing_data_writes_fallbacks() {
        let schema = Schema::builder("stats").int("level").string("name").build();
        let mut tree = Compound::new();
        let mut data = DataTree::new();
        data.put("level", 3);
        tree.put_int("unrelated", 1);

        schema.write(&mut tree, &data);
        assert_eq!(tree.get_int("level"), Some(3));
        assert_eq!(tree.get_string("name").as_deref(), Some(""));
        assert_eq!(tree.get_int("unrelated"), Some(1));
    }
}
