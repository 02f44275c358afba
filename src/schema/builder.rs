use std::sync::Arc;

use super::Schema;
use crate::codec::{builtin, CodecRef};

macro_rules! builtin_fields {
    ($($method:ident => $codec:ident),* $(,)?) => {
        $(
            #[doc = concat!("Adds a field using [`builtin::", stringify!($codec), "`].")]
            pub fn $method(self, key: impl Into<String>) -> Self {
                self.field(key, builtin::$codec.shared())
            }
        )*
    };
}

/// Fluent construction of a [`Schema`].
///
/// ```rust
/// use nbtlink::Schema;
///
/// let position = Schema::builder("position").double("x").double("y").double("z").build();
/// let stats = Schema::builder("player_stats")
///     .int("level")
///     .nested("position", position)
///     .build();
///
/// assert_eq!(stats.fields().count(), 1);
/// assert_eq!(stats.nested().count(), 1);
/// ```
#[derive(Debug)]
#[must_use]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    /// Starts an empty builder.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            schema: Schema::new(id),
        }
    }

    builtin_fields! {
        byte => BYTE,
        short => SHORT,
        int => INT,
        long => LONG,
        float => FLOAT,
        double => DOUBLE,
        bool => BOOL,
        string => STRING,
        byte_array => BYTE_ARRAY,
        int_array => INT_ARRAY,
        long_array => LONG_ARRAY,
        uuid => UUID,
    }

    /// Adds a field with an arbitrary codec. A duplicate key is ignored.
    pub fn field(mut self, key: impl Into<String>, codec: CodecRef) -> Self {
        let key = key.into();
        if !self.schema.add_field(key.clone(), codec).is_fresh() {
            log::warn!("schema '{}' already has a field '{key}'", self.schema.id());
        }
        self
    }

    /// Adds a nested schema. A duplicate key is ignored.
    pub fn nested(mut self, key: impl Into<String>, schema: impl Into<Arc<Schema>>) -> Self {
        let key = key.into();
        if !self.schema.add_nested(key.clone(), schema).is_fresh() {
            log::warn!("schema '{}' already has a nested schema '{key}'", self.schema.id());
        }
        self
    }

    /// Whether fields are written inside version envelopes.
    pub fn versioned(mut self, versioned: bool) -> Self {
        self.schema.set_versioned(versioned);
        self
    }

    /// Finishes the schema.
    pub fn build(self) -> Schema {
        self.schema
    }

    /// Finishes the schema behind an `Arc`, ready to be shared.
    pub fn build_shared(self) -> Arc<Schema> {
        Arc::new(self.schema)
    }
}
