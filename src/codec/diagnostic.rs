//! Diagnostic types for document parsing and reference resolution.
//!
//! Diagnostics are the non-fatal findings of a parse. Structural problems abort construction
//! and surface as [`ModelError`](crate::ModelError); everything here leaves a usable, possibly
//! partial, graph behind.

use crate::properties::{Handle, RefKind};
use std::fmt;

/// A reference whose target identifier no object declared.
///
/// The edge is simply absent from the resolved graph.
///
/// # Examples
///
/// ```
/// # use ome_graph::{codec::UnresolvedReference, properties::RefKind};
/// let unresolved = UnresolvedReference::new("Image", "InstrumentRef".into(), "Instrument:9")
///     .with_source_id("Image:0");
/// assert_eq!(unresolved.target_id, "Instrument:9");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    /// The object holding the reference
    pub source: Handle,

    /// Element type of the source
    pub source_element: String,

    /// Identifier of the source, if it has one
    pub source_id: Option<String>,

    /// Role of the reference
    pub kind: RefKind,

    /// The identifier that could not be found
    pub target_id: String,
}

impl UnresolvedReference {
    pub fn new(
        source_element: impl Into<String>,
        kind: RefKind,
        target_id: impl Into<String>,
    ) -> Self {
        UnresolvedReference {
            source: Handle::default(),
            source_element: source_element.into(),
            source_id: None,
            kind,
            target_id: target_id.into(),
        }
    }

    pub fn with_source(mut self, source: Handle) -> Self {
        self.source = source;
        self
    }

    pub fn with_source_id(mut self, id: impl Into<String>) -> Self {
        self.source_id = Some(id.into());
        self
    }
}

/// Diagnostic information produced during document parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseDiagnostic {
    /// A reference to an identifier that no object in the document declares
    UnresolvedReference(UnresolvedReference),

    /// The target exists, but no handler in the source's chain declares the reference kind
    UnrecognizedReferenceKind {
        source: Handle,
        source_element: String,
        kind: RefKind,
        target_id: String,
    },

    /// A handler declares the kind, but the target is not of the declared type
    IncompatibleTarget {
        source: Handle,
        kind: RefKind,
        target_id: String,
        expected: String,
        found: String,
    },

    /// A warning message about the parse (e.g., skipped element, tolerated duplicate)
    Warning(String),

    /// An informational message about the parse
    Info(String),
}

impl ParseDiagnostic {
    /// Create a warning diagnostic
    pub fn warning(message: impl Into<String>) -> Self {
        Self::Warning(message.into())
    }

    /// Create an info diagnostic
    pub fn info(message: impl Into<String>) -> Self {
        Self::Info(message.into())
    }

    /// Check if this diagnostic represents an unresolved reference
    pub fn is_unresolved_reference(&self) -> bool {
        matches!(self, Self::UnresolvedReference(_))
    }

    /// Get the unresolved reference if this is one
    pub fn as_unresolved_reference(&self) -> Option<&UnresolvedReference> {
        match self {
            Self::UnresolvedReference(unresolved) => Some(unresolved),
            _ => None,
        }
    }

    /// True for diagnostics that mean an edge is missing from the graph
    pub fn is_graph_incomplete(&self) -> bool {
        matches!(
            self,
            Self::UnresolvedReference(_)
                | Self::UnrecognizedReferenceKind { .. }
                | Self::IncompatibleTarget { .. }
        )
    }
}

impl fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedReference(unresolved) => write!(
                f,
                "Unresolved reference in <{}> {}: {} -> '{}'",
                unresolved.source_element,
                unresolved.source_id.as_deref().unwrap_or("(no ID)"),
                unresolved.kind,
                unresolved.target_id
            ),
            Self::UnrecognizedReferenceKind {
                source_element,
                kind,
                target_id,
                ..
            } => write!(
                f,
                "<{source_element}> has no handler for reference kind {kind} (target '{target_id}')"
            ),
            Self::IncompatibleTarget {
                kind,
                target_id,
                expected,
                found,
                ..
            } => write!(
                f,
                "{kind} -> '{target_id}' expects <{expected}> but found <{found}>"
            ),
            Self::Warning(msg) => write!(f, "Warning: {msg}"),
            Self::Info(msg) => write!(f, "Info: {msg}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_reference_creation() {
        let unresolved =
            UnresolvedReference::new("Image", RefKind::from("InstrumentRef"), "Instrument:9")
                .with_source(Handle(4));

        assert_eq!(unresolved.source, Handle(4));
        assert!(unresolved.source_id.is_none());
        assert_eq!(unresolved.kind, "InstrumentRef");
    }

    #[test]
    fn test_parse_diagnostic_is_unresolved() {
        let unresolved = ParseDiagnostic::UnresolvedReference(UnresolvedReference::new(
            "Image",
            RefKind::from("InstrumentRef"),
            "Instrument:9",
        ));

        assert!(unresolved.is_unresolved_reference());
        assert!(unresolved.as_unresolved_reference().is_some());
        assert!(unresolved.is_graph_incomplete());

        let warning = ParseDiagnostic::warning("test");
        assert!(!warning.is_unresolved_reference());
        assert!(warning.as_unresolved_reference().is_none());
        assert!(!warning.is_graph_incomplete());
    }

    #[test]
    fn test_display() {
        let unrecognized = ParseDiagnostic::UnrecognizedReferenceKind {
            source: Handle(1),
            source_element: "Detector".to_string(),
            kind: RefKind::from("PumpRef"),
            target_id: "LightSource:0".to_string(),
        };
        assert_eq!(
            unrecognized.to_string(),
            "<Detector> has no handler for reference kind PumpRef (target 'LightSource:0')"
        );
        assert_eq!(ParseDiagnostic::info("done").to_string(), "Info: done");
    }
}
