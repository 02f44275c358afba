//! Version tags attached to serialized field data.
//!
//! A stored version is only ever compared for equality ("is the stored data
//! the version this codec expects?"), so [`FieldVersion`] deliberately has no
//! ordering.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A version tag: a single integer, a `major.minor.patch` triplet, or an
/// opaque literal.
#[derive(Debug, Clone)]
pub enum FieldVersion {
    /// A plain integer version such as `3`.
    Integer(i32),
    /// A semantic version such as `1.2.3`.
    Semantic {
        /// Major component.
        major: i32,
        /// Minor component.
        minor: i32,
        /// Patch component.
        patch: i32,
    },
    /// Anything else, kept verbatim.
    Literal(String),
}

impl FieldVersion {
    /// Parses the most specific variant that matches `literal`.
    ///
    /// Exactly three dot-separated integers give [`FieldVersion::Semantic`],
    /// a single integer gives [`FieldVersion::Integer`], anything else is a
    /// [`FieldVersion::Literal`]. Parsing never fails.
    pub fn parse(literal: &str) -> Self {
        if let Some((major, minor, patch)) = parse_triplet(literal) {
            return Self::Semantic { major, minor, patch };
        }
        if let Ok(value) = literal.parse::<i32>() {
            return Self::Integer(value);
        }
        Self::Literal(literal.to_owned())
    }

    /// Parses a literal that must be semantic.
    ///
    /// # Errors
    /// Returns [`Error::Version`] when `literal` is not `major.minor.patch`.
    pub fn semantic_str(literal: &str) -> Result<Self> {
        parse_triplet(literal)
            .map(|(major, minor, patch)| Self::Semantic { major, minor, patch })
            .ok_or_else(|| Error::Version(literal.to_owned()))
    }

    /// Builds a semantic version from its components.
    pub const fn semantic(major: i32, minor: i32, patch: i32) -> Self {
        Self::Semantic { major, minor, patch }
    }

    /// The string form written to the tag tree.
    pub fn literal(&self) -> String {
        self.to_string()
    }

    /// Version equality.
    ///
    /// Same-variant versions compare structurally and differing non-literal
    /// variants never match. As soon as either side is a
    /// [`FieldVersion::Literal`], the raw literals are compared instead, so
    /// two versions with the same literal always match.
    pub fn equals_to(&self, other: &FieldVersion) -> bool {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (
                Self::Semantic { major, minor, patch },
                Self::Semantic { major: o_major, minor: o_minor, patch: o_patch },
            ) => major == o_major && minor == o_minor && patch == o_patch,
            (Self::Literal(_), _) | (_, Self::Literal(_)) => self.literal() == other.literal(),
            _ => false,
        }
    }
}

fn parse_triplet(literal: &str) -> Option<(i32, i32, i32)> {
    let mut pieces = literal.split('.');
    let major = pieces.next()?.parse().ok()?;
    let minor = pieces.next()?.parse().ok()?;
    let patch = pieces.next()?.parse().ok()?;
    if pieces.next().is_some() {
        return None;
    }
    Some((major, minor, patch))
}

impl Default for FieldVersion {
    /// `1.0.0`, the version assumed for codecs that do not declare one.
    fn default() -> Self {
        Self::semantic(1, 0, 0)
    }
}

impl PartialEq for FieldVersion {
    fn eq(&self, other: &Self) -> bool {
        self.equals_to(other)
    }
}

impl fmt::Display for FieldVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Semantic { major, minor, patch } => write!(f, "{major}.{minor}.{patch}"),
            Self::Literal(s) => f.write_str(s),
        }
    }
}

impl FromStr for FieldVersion {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_most_specific_variant() {
        assert!(matches!(FieldVersion::parse("1.2.3"), FieldVersion::Semantic { .. }));
        assert!(matches!(FieldVersion::parse("7"), FieldVersion::Integer(7)));
        assert!(matches!(FieldVersion::parse("1.2"), FieldVersion::Literal(_)));
        assert!(matches!(FieldVersion::parse("1.2.3.4"), FieldVersion::Literal(_)));
        assert!(matches!(FieldVersion::parse("beta"), FieldVersion::Literal(_)));
    }

    #[test]
    fn variants_do_not_cross_match() {
        // "1" and "1.0.0" are different variants and different literals.
        assert!(!FieldVersion::parse("1").equals_to(&FieldVersion::parse("1.0.0")));
        assert!(!FieldVersion::Integer(3).equals_to(&FieldVersion::semantic(3, 0, 0)));
    }

    #[test]
    fn literal_comparison_is_symmetric() {
        let lit = FieldVersion::Literal("3".into());
        let int = FieldVersion::Integer(3);
        assert!(lit.equals_to(&int));
        assert!(int.equals_to(&lit));
    }

    #[test]
    fn strict_semantic_rejects_integers() {
        assert!(FieldVersion::semantic_str("3").is_err());
        assert_eq!(FieldVersion::semantic_str("0.1.0").ok(), Some(FieldVersion::semantic(0, 1, 0)));
    }
}
