//! Centralized error handling for nbtlink.
//!
//! Most of the engine is deliberately lenient: duplicate registrations, missing
//! linkers and inaccessible members are logged and skipped so that one
//! misconfigured field cannot block the rest of a container's data. The
//! variants below cover the cases that *are* surfaced to callers.
//!
//! ## Error Categories
//!
//! - **Value Errors** ([`Error::KindMismatch`], [`Error::MissingValue`]): checked
//!   access into a [`DataTree`](crate::DataTree)
//! - **Lookup Errors** ([`Error::MissingLinker`], [`Error::UnsafeClassifier`],
//!   [`Error::NoMatch`]): registry queries that could not be answered
//! - **Link Errors** ([`Error::Link`]): partial linking failures under strict linking
//! - **Version Errors** ([`Error::Version`]): malformed strict version literals
//!
//! ## Error Propagation with `?`
//!
//! ```rust
//! use nbtlink::DataTree;
//!
//! fn level(data: &DataTree) -> nbtlink::Result<i32> {
//!     let level = data.try_get::<i32>("level")?;
//!     Ok(level.max(1))
//! }
//! # let mut data = DataTree::new();
//! # data.put("level", 3);
//! # assert_eq!(level(&data)?, 3);
//! # assert!(level(&DataTree::new()).is_err());
//! # Ok::<(), nbtlink::Error>(())
//! ```

use crate::link::LinkFailure;
use crate::value::ValueKind;

/// A specialized `Result` type for nbtlink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The error enum covering every failure nbtlink reports to callers.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// A value was requested as one kind but is stored as another.
    #[error("Kind mismatch for '{key}': expected {expected}, found {found}")]
    KindMismatch {
        /// Key of the offending entry.
        key: String,
        /// Kind the caller asked for.
        expected: ValueKind,
        /// Kind actually stored.
        found: ValueKind,
    },

    /// A value was requested from a key that holds nothing.
    #[error("No value stored under '{0}'")]
    MissingValue(String),

    /// No linker is registered for a composite type.
    #[error("No linker registered for type {0}")]
    MissingLinker(&'static str),

    /// A single-result query was issued with a multi-match classifier.
    #[error("Classifier {0} may match several entries; use get_all instead")]
    UnsafeClassifier(u64),

    /// A search that is required to succeed found nothing.
    #[error("Computation failed: no results have been found")]
    NoMatch,

    /// Linking finished with failures and strict linking is enabled.
    #[error("Linking {type_name} failed for {} member(s)", .failures.len())]
    Link {
        /// The type being linked.
        type_name: &'static str,
        /// Every member that could not be transferred.
        failures: Vec<LinkFailure>,
    },

    /// A strict version literal could not be parsed.
    #[error("'{0}' is not a semantic version")]
    Version(String),
}
