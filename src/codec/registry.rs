//! Identifier registry: which object declared which `ID` during one document load.

use crate::{config::DuplicatePolicy, error::ModelError, properties::Handle};
use std::collections::HashMap;

/// Result of a successful [`IdentifierRegistry::register`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// First binding of the identifier.
    New,
    /// The identifier was already bound to the same object.
    Repeated,
    /// Lenient mode: a different object claimed the identifier and the first binding was kept.
    Kept { existing: Handle },
    /// Lenient mode: a different object claimed the identifier and took it over.
    Replaced { previous: Handle },
}

/// Document-scoped map from identifier to declaring object.
///
/// Populated during the parse traversal and consulted by the resolution pass. The first
/// registration is authoritative: under the default [`DuplicatePolicy::Reject`] a second object
/// claiming the same identifier is an error.
#[derive(Debug, Default)]
pub struct IdentifierRegistry {
    policy: DuplicatePolicy,
    ids: HashMap<String, Handle>,
}

impl IdentifierRegistry {
    pub fn new(policy: DuplicatePolicy) -> Self {
        IdentifierRegistry {
            policy,
            ids: HashMap::new(),
        }
    }

    pub fn register(&mut self, id: &str, handle: Handle) -> Result<Registration, ModelError> {
        let Some(existing) = self.ids.get(id).copied() else {
            self.ids.insert(id.to_string(), handle);
            return Ok(Registration::New);
        };
        if existing == handle {
            return Ok(Registration::Repeated);
        }
        match self.policy {
            DuplicatePolicy::Reject => Err(ModelError::DuplicateIdentifier { id: id.to_string() }),
            DuplicatePolicy::FirstWins => Ok(Registration::Kept { existing }),
            DuplicatePolicy::LastWins => {
                self.ids.insert(id.to_string(), handle);
                Ok(Registration::Replaced { previous: existing })
            }
        }
    }

    pub fn lookup(&self, id: &str) -> Option<Handle> {
        self.ids.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut registry = IdentifierRegistry::default();
        assert_eq!(
            registry.register("Image:0", Handle(1)),
            Ok(Registration::New)
        );
        assert_eq!(registry.lookup("Image:0"), Some(Handle(1)));
        assert_eq!(registry.lookup("Image:1"), None);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_repeated_registration_is_idempotent() {
        let mut registry = IdentifierRegistry::default();
        registry.register("Image:0", Handle(1)).unwrap();
        assert_eq!(
            registry.register("Image:0", Handle(1)),
            Ok(Registration::Repeated)
        );
    }

    #[test]
    fn test_duplicate_rejected_by_default() {
        let mut registry = IdentifierRegistry::default();
        registry.register("X", Handle(1)).unwrap();
        assert_eq!(
            registry.register("X", Handle(2)),
            Err(ModelError::DuplicateIdentifier {
                id: "X".to_string()
            })
        );
        // the first binding survives the failed attempt
        assert_eq!(registry.lookup("X"), Some(Handle(1)));
    }

    #[test]
    fn test_lenient_policies() {
        let mut first = IdentifierRegistry::new(DuplicatePolicy::FirstWins);
        first.register("X", Handle(1)).unwrap();
        assert_eq!(
            first.register("X", Handle(2)),
            Ok(Registration::Kept {
                existing: Handle(1)
            })
        );
        assert_eq!(first.lookup("X"), Some(Handle(1)));

        let mut last = IdentifierRegistry::new(DuplicatePolicy::LastWins);
        last.register("X", Handle(1)).unwrap();
        assert_eq!(
            last.register("X", Handle(2)),
            Ok(Registration::Replaced {
                previous: Handle(1)
            })
        );
        assert_eq!(last.lookup("X"), Some(Handle(2)));
    }
}
