//! Engine configuration.
//!
//! [`EngineConfig`] is plain serde data, so hosts can keep it next to their
//! own settings:
//!
//! ```rust
//! use nbtlink::config::EngineConfig;
//!
//! let config = EngineConfig {
//!     strict_linking: true,
//!     ..EngineConfig::default()
//! };
//! assert!(config.strict_classifiers);
//! assert!(!config.versioned_by_default);
//! ```

use serde::{Deserialize, Serialize};

/// Behaviour switches of an [`Engine`](crate::Engine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Reject single-result lookups made with a multi-match classifier.
    /// When off, the first match in registration order is returned.
    pub strict_classifiers: bool,
    /// Turn partial linking failures into [`Error::Link`](crate::Error::Link).
    pub strict_linking: bool,
    /// Make schemas from [`Engine::schema_builder`](crate::Engine::schema_builder)
    /// write version envelopes.
    pub versioned_by_default: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict_classifiers: true,
            strict_linking: false,
            versioned_by_default: false,
        }
    }
}
