//! Small value types shared by the model and codec layers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a [`ModelObject`](crate::model::ModelObject) inside its [`Model`](crate::model::Model)
/// arena.
///
/// Handles are only meaningful for the model that issued them. They are never reused: objects
/// are not removed from an arena once inserted.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Handle(pub(crate) usize);

impl Handle {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The role tag of a reference, e.g. `InstrumentRef` or `Pump`.
///
/// Two references can point at the same target type yet mean different things (a light source
/// used for illumination vs. one pumping a laser); the kind keeps them apart. In markup the kind
/// is the tag of the reference element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RefKind(String);

impl RefKind {
    pub fn new(kind: impl Into<String>) -> Self {
        RefKind(kind.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RefKind {
    fn from(kind: &str) -> Self {
        RefKind(kind.to_string())
    }
}

impl From<String> for RefKind {
    fn from(kind: String) -> Self {
        RefKind(kind)
    }
}

impl AsRef<str> for RefKind {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for RefKind {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for RefKind {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How many values a content field may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    /// Zero or one.
    Single,
    /// Zero or more, in document order.
    Many,
}

impl Cardinality {
    pub fn is_single(&self) -> bool {
        matches!(self, Cardinality::Single)
    }
}

/// Whether a record type carries an `ID` attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentifierPolicy {
    /// Construction fails without an `ID`.
    Required,
    /// An `ID` is read and registered when present.
    Optional,
    /// The type never participates in references. Inherited policies still apply.
    #[default]
    Inherit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_kind_comparisons() {
        let kind = RefKind::from("InstrumentRef");
        assert_eq!(kind, "InstrumentRef");
        assert_eq!(kind.as_str(), "InstrumentRef");
        assert_eq!(format!("{kind}"), "InstrumentRef");
        assert_ne!(kind, RefKind::new("Pump"));
    }

    #[test]
    fn test_handle_display() {
        assert_eq!(Handle(3).to_string(), "#3");
        assert_eq!(Handle(3).index(), 3);
    }
}
