//! Stateful data objects that persist themselves.

use std::any::Any;
use std::sync::Arc;

use crate::data::DataTree;
use crate::schema::Schema;
use crate::tag::Compound;

/// A data object stored under its own sub-tree of a container.
///
/// The engine calls [`CustomData::write_to`] on a fresh, empty sub-tree the
/// first time a category is seen and [`CustomData::read_from`] on every
/// access, the same protocol it applies to schemas.
pub trait CustomData: Any {
    /// The sub-tree key.
    fn category(&self) -> &str;

    /// Loads the object from its sub-tree.
    fn read_from(&mut self, tree: &Compound);

    /// Stores the object into its sub-tree.
    fn write_to(&self, tree: &mut Compound);

    /// Upcast for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the concrete type.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A schema and its current data, usable wherever custom data is expected.
#[derive(Debug, Clone)]
pub struct SchemaData {
    schema: Arc<Schema>,
    data: DataTree,
}

impl SchemaData {
    /// Wraps `schema` with its fallback values.
    pub fn new(schema: impl Into<Arc<Schema>>) -> Self {
        let schema = schema.into();
        let data = schema.defaults();
        Self { schema, data }
    }

    /// The schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The current values.
    pub fn data(&self) -> &DataTree {
        &self.data
    }

    /// Mutable access to the current values.
    pub fn data_mut(&mut self) -> &mut DataTree {
        &mut self.data
    }
}

impl CustomData for SchemaData {
    fn category(&self) -> &str {
        self.schema.id()
    }

    fn read_from(&mut self, tree: &Compound) {
        self.data = self.schema.read_new(tree);
    }

    fn write_to(&self, tree: &mut Compound) {
        self.schema.write(tree, &self.data);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
