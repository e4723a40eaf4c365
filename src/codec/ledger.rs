//! Reference ledger and the resolution pass.
//!
//! While a document is being parsed its targets may not exist yet, so references are only
//! written down. Once the traversal has finished, and the identifier registry is therefore
//! complete, [`ReferenceLedger::resolve`] walks the entries once, in the order they were
//! recorded, and links what it can.

use super::{
    diagnostic::{ParseDiagnostic, UnresolvedReference},
    registry::IdentifierRegistry,
};
use crate::{
    error::ModelError,
    model::{LinkOutcome, Model},
    properties::{Handle, RefKind},
};

/// One recorded reference: `source` points at whatever declares `target_id`, in role `kind`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub source: Handle,
    pub target_id: String,
    pub kind: RefKind,
}

/// Counts from one resolution pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionSummary {
    pub linked: usize,
    pub unchanged: usize,
    pub unresolved: usize,
    pub rejected: usize,
}

/// Append-only list of references awaiting resolution.
#[derive(Debug, Default)]
pub struct ReferenceLedger {
    entries: Vec<Reference>,
}

impl ReferenceLedger {
    pub fn new() -> Self {
        ReferenceLedger::default()
    }

    pub fn record(&mut self, source: Handle, target_id: impl Into<String>, kind: impl Into<RefKind>) {
        let reference = Reference {
            source,
            target_id: target_id.into(),
            kind: kind.into(),
        };
        tracing::debug!(
            "[ReferenceLedger::record] {} -{}-> '{}'",
            reference.source,
            reference.kind,
            reference.target_id
        );
        self.entries.push(reference);
    }

    pub fn entries(&self) -> &[Reference] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Link every entry whose target is registered, consuming the ledger.
    ///
    /// Missing targets, unrecognized kinds and incompatible target types are appended to
    /// `diagnostics`; none of them stops the pass. Errors are only returned for handles that
    /// do not belong to `model`.
    pub fn resolve(
        self,
        registry: &IdentifierRegistry,
        model: &mut Model,
        diagnostics: &mut Vec<ParseDiagnostic>,
    ) -> Result<ResolutionSummary, ModelError> {
        tracing::info!(
            "[ReferenceLedger::resolve] Resolving {} reference(s) against {} identifier(s)",
            self.entries.len(),
            registry.len()
        );
        let mut summary = ResolutionSummary::default();

        for Reference {
            source,
            target_id,
            kind,
        } in self.entries
        {
            let Some(target) = registry.lookup(&target_id) else {
                let object = model.object(source)?;
                let mut unresolved =
                    UnresolvedReference::new(object.element(), kind, target_id).with_source(source);
                unresolved.source_id = object.id().map(str::to_string);
                let diagnostic = ParseDiagnostic::UnresolvedReference(unresolved);
                tracing::warn!("{diagnostic}");
                diagnostics.push(diagnostic);
                summary.unresolved += 1;
                continue;
            };

            let diagnostic = match model.link(source, kind.as_str(), target)? {
                LinkOutcome::Linked | LinkOutcome::Unlinked => {
                    summary.linked += 1;
                    continue;
                }
                LinkOutcome::Unchanged => {
                    summary.unchanged += 1;
                    continue;
                }
                LinkOutcome::Unrecognized => ParseDiagnostic::UnrecognizedReferenceKind {
                    source,
                    source_element: model.object(source)?.element().to_string(),
                    kind,
                    target_id,
                },
                LinkOutcome::Incompatible { expected, found } => {
                    ParseDiagnostic::IncompatibleTarget {
                        source,
                        kind,
                        target_id,
                        expected: expected.to_string(),
                        found: found.to_string(),
                    }
                }
            };
            tracing::warn!("{diagnostic}");
            diagnostics.push(diagnostic);
            summary.rejected += 1;
        }

        tracing::info!("[ReferenceLedger::resolve] Done: {summary:?}");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{RecordSchema, SchemaRegistry};
    use crate::properties::{Cardinality, IdentifierPolicy};

    fn registry() -> SchemaRegistry {
        let schemas = SchemaRegistry::empty();
        schemas.register(
            RecordSchema::new("Node")
                .identifier(IdentifierPolicy::Required)
                .reference("NodeRef", "Node", Cardinality::Many, Some("Node"))
                .reference("OtherRef", "Other", Cardinality::Single, None),
        );
        schemas.register(RecordSchema::new("Other").identifier(IdentifierPolicy::Optional));
        schemas
    }

    fn node(model: &mut Model, schemas: &SchemaRegistry, ids: &mut IdentifierRegistry, id: &str) -> Handle {
        let handle = model.insert(schemas.record("Node").unwrap(), None).unwrap();
        model.assign_identifier(handle, id).unwrap();
        ids.register(id, handle).unwrap();
        handle
    }

    #[test]
    fn test_resolution_in_ledger_order() {
        let schemas = registry();
        let mut model = Model::new();
        let mut ids = IdentifierRegistry::default();
        let a = node(&mut model, &schemas, &mut ids, "Node:a");

        let mut ledger = ReferenceLedger::new();
        // b does not exist yet when the reference is recorded
        ledger.record(a, "Node:b", "NodeRef");
        ledger.record(a, "Node:a", "NodeRef");
        let b = node(&mut model, &schemas, &mut ids, "Node:b");

        let mut diagnostics = vec![];
        let summary = ledger.resolve(&ids, &mut model, &mut diagnostics).unwrap();
        assert_eq!(summary.linked, 2);
        assert!(diagnostics.is_empty());
        assert_eq!(model.object(a).unwrap().forward("NodeRef"), &[b, a]);
        assert_eq!(model.object(b).unwrap().back_references("Node"), &[a]);
    }

    #[test]
    fn test_failures_are_diagnostics() {
        let schemas = registry();
        let mut model = Model::new();
        let mut ids = IdentifierRegistry::default();
        let a = node(&mut model, &schemas, &mut ids, "Node:a");
        let b = node(&mut model, &schemas, &mut ids, "Node:b");

        let mut ledger = ReferenceLedger::new();
        ledger.record(a, "Node:missing", "NodeRef");
        ledger.record(a, "Node:b", "PumpRef");
        ledger.record(a, "Node:b", "OtherRef");
        ledger.record(a, "Node:b", "NodeRef");

        let mut diagnostics = vec![];
        let summary = ledger.resolve(&ids, &mut model, &mut diagnostics).unwrap();
        assert_eq!(
            summary,
            ResolutionSummary {
                linked: 1,
                unchanged: 0,
                unresolved: 1,
                rejected: 2,
            }
        );
        assert_eq!(diagnostics.len(), 3);
        assert_eq!(
            diagnostics[0].as_unresolved_reference().map(|u| u.target_id.as_str()),
            Some("Node:missing")
        );
        assert_eq!(
            diagnostics[0]
                .as_unresolved_reference()
                .and_then(|u| u.source_id.as_deref()),
            Some("Node:a")
        );
        assert!(matches!(
            diagnostics[1],
            ParseDiagnostic::UnrecognizedReferenceKind { .. }
        ));
        assert!(matches!(
            &diagnostics[2],
            ParseDiagnostic::IncompatibleTarget { expected, .. } if expected == "Other"
        ));
        // the one good edge still made it
        assert_eq!(model.object(a).unwrap().forward("NodeRef"), &[b]);
    }
}
