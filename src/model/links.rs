//! Link and unlink: the only mutators of forward links and back-reference views.
//!
//! For every relationship whose declaration names a back-reference view, the following holds
//! after each individual call: the number of times `B` appears in `A`'s forward slot for the
//! kind equals the number of times `A` appears in `B`'s view.

use super::Model;
use crate::{
    codec::ReferenceField,
    error::ModelError,
    properties::{Cardinality, Handle},
};

/// Result of asking an object's handler chain to link or unlink a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    Linked,
    Unlinked,
    /// Handled, but nothing changed: the single-valued slot already held the target, or the
    /// target was not linked.
    Unchanged,
    /// No handler in the chain declares the kind.
    Unrecognized,
    /// A handler declares the kind, but for a different target type.
    Incompatible {
        expected: &'static str,
        found: &'static str,
    },
}

impl LinkOutcome {
    /// True when some handler in the chain accepted the call.
    pub fn is_handled(&self) -> bool {
        matches!(
            self,
            LinkOutcome::Linked | LinkOutcome::Unlinked | LinkOutcome::Unchanged
        )
    }
}

impl Model {
    /// Link `source` to `target` under reference kind `kind`.
    ///
    /// The source's handler chain is consulted base type first. The first handler declaring
    /// `kind` whose target type `target` satisfies performs the link. A single-valued slot is
    /// overwritten, detaching the previous target's back-reference first.
    pub fn link(
        &mut self,
        source: Handle,
        kind: &str,
        target: Handle,
    ) -> Result<LinkOutcome, ModelError> {
        let record = self.object(source)?.record.clone();
        let target_record = self.object(target)?.record.clone();

        let mut outcome = LinkOutcome::Unrecognized;
        for handler in record.handlers() {
            if handler.field.kind != kind {
                continue;
            }
            if !target_record.is_a(handler.field.target) {
                if outcome == LinkOutcome::Unrecognized {
                    outcome = LinkOutcome::Incompatible {
                        expected: handler.field.target,
                        found: target_record.element(),
                    };
                }
                continue;
            }
            return Ok(self.attach(source, target, &handler.field));
        }
        tracing::debug!(
            "[Model::link] {} {source} cannot link {kind} -> {target}: {outcome:?}",
            record.element()
        );
        Ok(outcome)
    }

    /// Remove one `kind` link from `source` to `target`, along with its reciprocal.
    ///
    /// A single-valued slot is cleared only when it currently holds `target`.
    pub fn unlink(
        &mut self,
        source: Handle,
        kind: &str,
        target: Handle,
    ) -> Result<LinkOutcome, ModelError> {
        self.object(target)?;
        let record = self.object(source)?.record.clone();
        let Some(handler) = record.handler(kind) else {
            return Ok(LinkOutcome::Unrecognized);
        };
        if self.detach(source, target, &handler.field) {
            Ok(LinkOutcome::Unlinked)
        } else {
            Ok(LinkOutcome::Unchanged)
        }
    }

    fn attach(&mut self, source: Handle, target: Handle, field: &ReferenceField) -> LinkOutcome {
        if field.cardinality == Cardinality::Single {
            let current = self.objects[source.0]
                .forward
                .get(field.kind)
                .and_then(|slot| slot.first().copied());
            match current {
                Some(current) if current == target => return LinkOutcome::Unchanged,
                Some(current) => {
                    self.detach(source, current, field);
                }
                None => {}
            }
        }

        self.objects[source.0]
            .forward
            .entry(field.kind.to_string())
            .or_default()
            .push(target);
        if let Some(view) = field.back_reference {
            self.objects[target.0]
                .back
                .entry(view.to_string())
                .or_default()
                .push(source);
        }
        tracing::debug!("[Model::link] {source} -{}-> {target}", field.kind);
        LinkOutcome::Linked
    }

    /// Remove the first occurrence of `target` from the slot. Returns false if absent.
    fn detach(&mut self, source: Handle, target: Handle, field: &ReferenceField) -> bool {
        let forward = &mut self.objects[source.0].forward;
        let Some(slot) = forward.get_mut(field.kind) else {
            return false;
        };
        let Some(position) = slot.iter().position(|h| *h == target) else {
            return false;
        };
        slot.remove(position);
        if slot.is_empty() {
            forward.shift_remove(field.kind);
        }

        if let Some(view) = field.back_reference {
            let back = &mut self.objects[target.0].back;
            if let Some(sources) = back.get_mut(view) {
                if let Some(position) = sources.iter().position(|h| *h == source) {
                    sources.remove(position);
                }
                if sources.is_empty() {
                    back.shift_remove(view);
                }
            }
        }
        tracing::debug!("[Model::unlink] {source} -{}-/-> {target}", field.kind);
        true
    }

    /// Describe every place where a forward slot and its back-reference view disagree.
    ///
    /// Empty for any model mutated only through [`Model::link`] and [`Model::unlink`].
    pub fn check_back_references(&self) -> Vec<String> {
        let mut from_forward = Vec::new();
        for object in self.objects.iter() {
            for (kind, targets) in object.forward.iter() {
                let view = object
                    .record
                    .handler(kind)
                    .and_then(|h| h.field.back_reference);
                if let Some(view) = view {
                    for target in targets {
                        from_forward.push((object.handle, *target, view.to_string()));
                    }
                }
            }
        }

        let mut from_back = Vec::new();
        for object in self.objects.iter() {
            for (view, sources) in object.back.iter() {
                for source in sources {
                    from_back.push((*source, object.handle, view.clone()));
                }
            }
        }

        from_forward.sort();
        from_back.sort();
        if from_forward == from_back {
            return vec![];
        }

        let mut problems = Vec::new();
        for edge in from_forward.iter() {
            let expected = from_forward.iter().filter(|e| *e == edge).count();
            let actual = from_back.iter().filter(|e| *e == edge).count();
            if expected != actual {
                problems.push(format!(
                    "{} -> {} links {expected} time(s) but view '{}' lists it {actual} time(s)",
                    edge.0, edge.1, edge.2
                ));
            }
        }
        for edge in from_back.iter() {
            if !from_forward.contains(edge) {
                problems.push(format!(
                    "view '{}' on {} lists {} without a forward link",
                    edge.2, edge.1, edge.0
                ));
            }
        }
        problems.dedup();
        problems
    }
}
