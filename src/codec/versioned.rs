//! Version envelopes around codec output.
//!
//! A versioned field is stored as
//!
//! ```text
//! key: {
//!     Version: "1.0.0",
//!     Serializer: "nbtlink:int",
//!     Content: { Value: 42 }
//! }
//! ```
//!
//! Reading compares the stored version with the codec's and asks the codec to
//! migrate the content when they differ. An entry without the envelope (one
//! written before the schema became versioned) is read as-is and gets the
//! envelope on the next write.

use super::Codec;
use crate::tag::{Compound, Tag};
use crate::value::Value;
use crate::version::FieldVersion;

/// Key holding the version literal.
pub const VERSION_KEY: &str = "Version";
/// Key holding the id of the codec that wrote the content.
pub const SERIALIZER_KEY: &str = "Serializer";
/// Key holding the wrapped content.
pub const CONTENT_KEY: &str = "Content";
/// Key of the value inside the content.
pub const VALUE_KEY: &str = "Value";

/// Writes `value` under `key`, wrapped in an envelope carrying the codec's
/// current version.
pub fn write(codec: &dyn Codec, key: &str, tree: &mut Compound, value: &Value) {
    let mut content = Compound::new();
    codec.write(VALUE_KEY, &mut content, value);

    let mut envelope = Compound::new();
    envelope.put_string(VERSION_KEY, codec.version().literal());
    envelope.put_string(SERIALIZER_KEY, codec.id().to_string());
    envelope.put_compound(CONTENT_KEY, content);
    tree.put_compound(key, envelope);
}

/// Reads the value under `key`. `tree` is never modified.
pub fn read(codec: &dyn Codec, key: &str, tree: &Compound) -> Value {
    let envelope = match tree.get(key) {
        None => return codec.fallback(),
        Some(Tag::Compound(envelope)) if envelope.contains(VERSION_KEY) => envelope,
        Some(_) => {
            log::debug!("'{key}' has no version envelope, reading it as a legacy entry");
            return codec.read(key, tree);
        }
    };

    if let Some(serializer) = envelope.get_string(SERIALIZER_KEY) {
        if serializer != codec.id().to_string() {
            log::debug!("'{key}' was written by {serializer}, reading it with {}", codec.id());
        }
    }

    let stored = FieldVersion::parse(&envelope.get_string(VERSION_KEY).unwrap_or_default());
    let current = codec.version();
    let content = envelope.get_compound(CONTENT_KEY);

    if stored.equals_to(&current) {
        return match content {
            Some(content) => codec.read(VALUE_KEY, content),
            None => codec.fallback(),
        };
    }

    let mut migrated = content.cloned().unwrap_or_default();
    if codec.migrate(&mut migrated, &stored) {
        log::trace!("migrated '{key}' from {stored} to {current}");
        codec.read(VALUE_KEY, &migrated)
    } else {
        log::warn!(
            "{} cannot migrate '{key}' from version {stored} to {current}, using the fallback",
            codec.id()
        );
        codec.fallback()
    }
}

/// Wraps a legacy entry under `key` into an envelope in place, tagging it with
/// the codec's current version. Returns whether anything was rewritten.
pub fn upgrade_legacy(codec: &dyn Codec, key: &str, tree: &mut Compound) -> bool {
    match tree.get(key) {
        None => false,
        Some(Tag::Compound(envelope)) if envelope.contains(VERSION_KEY) => false,
        Some(_) => {
            let value = codec.read(key, tree);
            write(codec, key, tree, &value);
            true
        }
    }
}
