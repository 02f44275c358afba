//! # nbtlink
//!
//! Schema-driven, versioned key-value data attached to the tagged-data trees
//! of ephemeral containers.
//!
//! ## Overview
//!
//! Host objects such as item stacks are created and destroyed constantly, but
//! each carries a persisted tag tree ([`tag::Compound`]). nbtlink lets you
//! declare what lives in that tree and access it as typed data without ever
//! touching raw tags:
//!
//! *   **Codecs:** one codec per value type moves a [`Value`] in and out of a
//!     tag tree, with a fallback for absent or malformed entries.
//! *   **Schemas:** a [`Schema`] names a set of fields and nested schemas. It
//!     owns the sub-tree keyed by its id and writes its defaults only into an
//!     empty sub-tree, so repeated access never resets customized data.
//! *   **Versioning:** versioned schemas wrap each field in an envelope that
//!     records the codec version and migrate older payloads on read.
//! *   **Linking:** `#[derive(Linked)]` binds struct members to schema keys, and
//!     a [`Linker`] moves values between a [`DataTree`] and a plain Rust object
//!     in both directions.
//! *   **Classifiers:** a [`DataRegistry`] attaches data objects to every
//!     container a [`Classifier`] matches, creating them lazily per container.
//!
//! ## Architecture
//!
//! ```text
//!   Compound (persisted)  <--Schema::write/read-->  DataTree  <--Linker-->  struct
//!          ^                                          ^
//!          |                                          |
//!     Engine pipelines (prepare / synchronize)   CodecRegistry (TypeId -> codec)
//! ```
//!
//! The [`Engine`] ties the registries together and runs the access protocol:
//! prepare (defaults into an empty sub-tree, then read), mutate, synchronize
//! (clear, then write back).
//!
//! ## Usage
//!
//! ```rust
//! use nbtlink::{Engine, Linked};
//! use nbtlink::tag::Compound;
//!
//! #[derive(Default, Linked)]
//! #[nbtlink(auto)]
//! pub struct Stats {
//!     pub level: i32,
//!     pub speed: f64,
//! }
//!
//! let mut engine = Engine::new();
//! engine.register_linked::<Stats>();
//! let schema = engine.derive_schema::<Stats>("player_stats")?;
//!
//! let mut root = Compound::new();
//! let mut stats = Stats::default();
//! engine.use_linked(&schema, &mut stats, &mut root, |s| s.level = 5)?;
//!
//! let stored = root.get_compound("player_stats").and_then(|t| t.get_int("level"));
//! assert_eq!(stored, Some(5));
//! # Ok::<(), nbtlink::Error>(())
//! ```

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]

extern crate self as nbtlink;

// --- PUBLIC API MODULES ---

pub mod classify;
pub mod codec;
pub mod config;
pub mod custom;
pub mod data;
pub mod engine;
pub mod error;
pub mod events;
pub mod link;
pub mod schema;
pub mod tag;
pub mod value;
pub mod version;

/// Items used by code generated by `#[derive(Linked)]`.
#[doc(hidden)]
pub mod rt {
    pub use std::any::{type_name, Any, TypeId};
}

// --- RE-EXPORTS ---

pub use classify::{Classifier, DataRegistry};
pub use codec::{Codec, CodecRegistry, Registration};
pub use config::EngineConfig;
pub use custom::{CustomData, SchemaData};
pub use data::DataTree;
pub use engine::Engine;
pub use error::{Error, Result};
pub use link::{LinkReport, Linked, Linker, LinkerLookup};
pub use schema::{Schema, SchemaBuilder};
pub use tag::{Compound, Tag};
pub use value::{Primitive, Value, ValueKind};
pub use version::FieldVersion;

/// Derive macro implementing [`link::Linked`].
pub use nbtlink_derive::Linked;
