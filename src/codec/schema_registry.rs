// Schema registry for record type definitions
//
// This module provides a global registry of record schemas: which attributes, quantities,
// children and references each element type declares. The built-in OME schemas are registered
// on creation; downstream code can register further types at runtime.

use crate::{
    error::ModelError,
    properties::{Cardinality, IdentifierPolicy},
    units::Unit,
};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

/// Global singleton schema registry with built-in schemas
pub static SCHEMAS: Lazy<SchemaRegistry> = Lazy::new(SchemaRegistry::create);

/// A quantity-valued property and the unit assumed when its unit attribute is absent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantityField {
    pub name: &'static str,
    pub default_unit: Unit,
}

/// A reference child element: an empty element whose only payload is the target's `ID`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceField {
    /// Tag of the reference element, doubling as the reference kind.
    pub kind: &'static str,
    /// Record type the target must be (or derive from).
    pub target: &'static str,
    pub cardinality: Cardinality,
    /// Name of the view on the target listing every source linked through this field. `None`
    /// when the target keeps no record of who points at it.
    pub back_reference: Option<&'static str>,
}

/// One entry of a record's content model, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentField {
    /// A child element holding character data, e.g. `<Description>`.
    Text {
        tag: &'static str,
        cardinality: Cardinality,
    },
    /// A compositional child record owned by this one.
    Record {
        tag: &'static str,
        cardinality: Cardinality,
    },
    /// A container element wrapping exactly one concrete member of a variant role.
    Variant {
        role: &'static str,
        cardinality: Cardinality,
    },
    Reference(ReferenceField),
}

impl ContentField {
    /// The child tag this field matches.
    pub fn tag(&self) -> &'static str {
        match self {
            ContentField::Text { tag, .. } | ContentField::Record { tag, .. } => *tag,
            ContentField::Variant { role, .. } => *role,
            ContentField::Reference(field) => field.kind,
        }
    }

    pub fn cardinality(&self) -> Cardinality {
        match self {
            ContentField::Text { cardinality, .. }
            | ContentField::Record { cardinality, .. }
            | ContentField::Variant { cardinality, .. } => *cardinality,
            ContentField::Reference(field) => field.cardinality,
        }
    }
}

/// Declaration of one record type.
///
/// A schema only lists what its own level adds; inherited attributes, quantities, content and
/// reference kinds come from the `base` chain. A schema with a non-empty `variants` list is an
/// abstract role: it is never constructed directly, and in markup its element wraps exactly one
/// of the listed concrete elements.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    pub element: &'static str,
    pub base: Option<&'static str>,
    pub identifier: IdentifierPolicy,
    pub attributes: Vec<&'static str>,
    pub quantities: Vec<QuantityField>,
    pub content: Vec<ContentField>,
    pub variants: Vec<&'static str>,
}

impl RecordSchema {
    pub fn new(element: &'static str) -> Self {
        RecordSchema {
            element,
            base: None,
            identifier: IdentifierPolicy::Inherit,
            attributes: vec![],
            quantities: vec![],
            content: vec![],
            variants: vec![],
        }
    }

    pub fn base(mut self, base: &'static str) -> Self {
        self.base = Some(base);
        self
    }

    pub fn identifier(mut self, policy: IdentifierPolicy) -> Self {
        self.identifier = policy;
        self
    }

    pub fn attributes(mut self, names: &[&'static str]) -> Self {
        self.attributes.extend_from_slice(names);
        self
    }

    pub fn quantity(mut self, name: &'static str, default_unit: Unit) -> Self {
        self.quantities.push(QuantityField { name, default_unit });
        self
    }

    pub fn text(mut self, tag: &'static str, cardinality: Cardinality) -> Self {
        self.content.push(ContentField::Text { tag, cardinality });
        self
    }

    pub fn child(mut self, tag: &'static str, cardinality: Cardinality) -> Self {
        self.content.push(ContentField::Record { tag, cardinality });
        self
    }

    pub fn variant(mut self, role: &'static str, cardinality: Cardinality) -> Self {
        self.content.push(ContentField::Variant { role, cardinality });
        self
    }

    pub fn reference(
        mut self,
        kind: &'static str,
        target: &'static str,
        cardinality: Cardinality,
        back_reference: Option<&'static str>,
    ) -> Self {
        self.content.push(ContentField::Reference(ReferenceField {
            kind,
            target,
            cardinality,
            back_reference,
        }));
        self
    }

    pub fn variants(mut self, members: &[&'static str]) -> Self {
        self.variants.extend_from_slice(members);
        self
    }

    pub fn is_role(&self) -> bool {
        !self.variants.is_empty()
    }

    pub fn declares_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| *a == name) || self.quantities.iter().any(|q| q.name == name)
    }
}

/// One link handler: the reference kinds a single schema level knows how to attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkHandler {
    pub declared_by: &'static str,
    pub field: ReferenceField,
}

/// A schema resolved against its inheritance chain.
///
/// Compiled once per element type and shared by every object of that type; the `handlers`
/// list is the object's link dispatch chain, base levels first.
#[derive(Debug)]
pub struct CompiledRecord {
    chain: Vec<Arc<RecordSchema>>,
    handlers: Vec<LinkHandler>,
    role_depth: Option<usize>,
    identifier_required: bool,
}

impl CompiledRecord {
    pub fn element(&self) -> &'static str {
        self.schema().element
    }

    /// The most derived schema.
    pub fn schema(&self) -> &RecordSchema {
        // chain is never empty: compile always pushes the requested schema
        &self.chain[self.chain.len() - 1]
    }

    /// Inheritance chain, root base first.
    pub fn chain(&self) -> &[Arc<RecordSchema>] {
        &self.chain
    }

    pub fn is_a(&self, element: &str) -> bool {
        self.chain.iter().any(|s| s.element == element)
    }

    pub fn identifier_required(&self) -> bool {
        self.identifier_required
    }

    pub fn handlers(&self) -> &[LinkHandler] {
        &self.handlers
    }

    /// The first handler in the chain declaring `kind`.
    pub fn handler(&self, kind: &str) -> Option<&LinkHandler> {
        self.handlers.iter().find(|h| h.field.kind == kind)
    }

    /// The abstract role this type is a concrete member of, if any.
    pub fn role(&self) -> Option<&RecordSchema> {
        self.role_depth.map(|depth| self.chain[depth].as_ref())
    }

    /// Chain index of the role; levels at or above it are written on the container element.
    pub fn role_depth(&self) -> Option<usize> {
        self.role_depth
    }

    pub fn quantity_field(&self, name: &str) -> Option<&QuantityField> {
        self.chain
            .iter()
            .flat_map(|s| s.quantities.iter())
            .find(|q| q.name == name)
    }

    pub fn quantity_fields(&self) -> impl Iterator<Item = (usize, &QuantityField)> {
        self.chain
            .iter()
            .enumerate()
            .flat_map(|(depth, s)| s.quantities.iter().map(move |q| (depth, q)))
    }

    /// Content field matching a child tag, with the chain index of the level declaring it.
    pub fn content_field(&self, tag: &str) -> Option<(usize, &ContentField)> {
        self.content_fields().find(|(_, field)| field.tag() == tag)
    }

    pub fn content_fields(&self) -> impl Iterator<Item = (usize, &ContentField)> {
        self.chain
            .iter()
            .enumerate()
            .flat_map(|(depth, s)| s.content.iter().map(move |c| (depth, c)))
    }

    /// Chain index of the level declaring a scalar attribute or quantity.
    pub fn attribute_depth(&self, name: &str) -> Option<usize> {
        self.chain.iter().position(|s| s.declares_attribute(name))
    }
}

struct Registry {
    schemas: HashMap<String, Arc<RecordSchema>>,
    compiled: HashMap<String, Arc<CompiledRecord>>,
}

/// Thread-safe registry for record schemas
///
/// Compiled records are cached; registering a schema drops the cache so that subtypes pick up
/// changes to their bases.
pub struct SchemaRegistry(Arc<RwLock<Registry>>);

impl Clone for SchemaRegistry {
    fn clone(&self) -> Self {
        SchemaRegistry(self.0.clone())
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        SchemaRegistry::create()
    }
}

impl SchemaRegistry {
    /// Create registry with built-in schemas
    pub fn create() -> Self {
        let registry = SchemaRegistry::empty();
        crate::ome::register_builtin(&registry);
        registry
    }

    /// Create a registry with no schemas at all
    pub fn empty() -> Self {
        SchemaRegistry(Arc::new(RwLock::new(Registry {
            schemas: HashMap::new(),
            compiled: HashMap::new(),
        })))
    }

    /// Register a schema definition
    ///
    /// If a schema with this element name already exists, it will be overwritten and a log
    /// message emitted.
    pub fn register(&self, schema: RecordSchema) {
        let mut writer = self.0.write();

        if writer.schemas.contains_key(schema.element) {
            tracing::info!(
                "[SchemaRegistry::register] Overwriting existing schema: {}",
                schema.element
            );
        }

        writer.compiled.clear();
        writer
            .schemas
            .insert(schema.element.to_string(), Arc::new(schema));
    }

    /// Retrieve a schema definition by element name
    pub fn get(&self, element: &str) -> Option<Arc<RecordSchema>> {
        self.0.read().schemas.get(element).cloned()
    }

    /// List all registered element names
    pub fn list_schemas(&self) -> Vec<String> {
        let mut names: Vec<String> = self.0.read().schemas.keys().cloned().collect();
        names.sort();
        names
    }

    /// Resolve an element type against its base chain.
    pub fn record(&self, element: &str) -> Result<Arc<CompiledRecord>, ModelError> {
        if let Some(compiled) = self.0.read().compiled.get(element) {
            return Ok(compiled.clone());
        }

        let compiled = Arc::new(self.compile(element)?);
        self.0
            .write()
            .compiled
            .insert(element.to_string(), compiled.clone());
        Ok(compiled)
    }

    fn compile(&self, element: &str) -> Result<CompiledRecord, ModelError> {
        let reader = self.0.read();
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut next = Some(element);
        while let Some(name) = next {
            if !seen.insert(name) {
                return Err(ModelError::Schema(format!(
                    "inheritance cycle through <{name}>"
                )));
            }
            let schema = reader.schemas.get(name).ok_or_else(|| {
                if name == element {
                    ModelError::Schema(format!("no schema registered for <{name}>"))
                } else {
                    ModelError::Schema(format!("<{element}> extends unknown type <{name}>"))
                }
            })?;
            chain.push(schema.clone());
            next = schema.base;
        }
        chain.reverse();

        let handlers = chain
            .iter()
            .flat_map(|schema| {
                schema.content.iter().filter_map(move |c| match c {
                    ContentField::Reference(field) => Some(LinkHandler {
                        declared_by: schema.element,
                        field: *field,
                    }),
                    _ => None,
                })
            })
            .collect();

        let last = chain.len() - 1;
        let role_depth = (0..last)
            .rev()
            .find(|&depth| chain[depth].variants.contains(&chain[last].element));

        let identifier_required = chain
            .iter()
            .rev()
            .map(|s| s.identifier)
            .find(|p| *p != IdentifierPolicy::Inherit)
            == Some(IdentifierPolicy::Required);

        Ok(CompiledRecord {
            chain,
            handlers,
            role_depth,
            identifier_required,
        })
    }

    /// Report dangling names in the registered schemas.
    ///
    /// Every base, child type, role, variant member and reference target must itself be
    /// registered, and every variant member must derive from its role.
    pub fn validate(&self) -> Vec<String> {
        let reader = self.0.read();
        let known = |name: &str| reader.schemas.contains_key(name);
        let mut problems = Vec::new();

        let mut elements: Vec<&Arc<RecordSchema>> = reader.schemas.values().collect();
        elements.sort_by_key(|s| s.element);
        for schema in elements {
            if let Some(base) = schema.base {
                if !known(base) {
                    problems.push(format!("<{}> extends unknown <{base}>", schema.element));
                }
            }
            for field in schema.content.iter() {
                match field {
                    ContentField::Record { tag, .. } if !known(*tag) => {
                        problems.push(format!("<{}> contains unknown <{tag}>", schema.element));
                    }
                    ContentField::Variant { role, .. } => match reader.schemas.get(*role) {
                        Some(r) if r.is_role() => {}
                        Some(_) => problems.push(format!(
                            "<{}> uses <{role}> as a variant role but it lists no members",
                            schema.element
                        )),
                        None => problems.push(format!(
                            "<{}> contains unknown role <{role}>",
                            schema.element
                        )),
                    },
                    ContentField::Reference(r) if !known(r.target) => {
                        problems.push(format!(
                            "<{}>/<{}> targets unknown <{}>",
                            schema.element, r.kind, r.target
                        ));
                    }
                    _ => {}
                }
            }
            for member in schema.variants.iter() {
                let derives = reader
                    .schemas
                    .get(*member)
                    .is_some_and(|m| m.base == Some(schema.element));
                if !derives {
                    problems.push(format!(
                        "variant <{member}> of <{}> is unknown or does not extend it",
                        schema.element
                    ));
                }
            }
        }
        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_registry() -> SchemaRegistry {
        let registry = SchemaRegistry::empty();
        registry.register(
            RecordSchema::new("Source")
                .identifier(IdentifierPolicy::Required)
                .attributes(&["Manufacturer"])
                .quantity("Power", Unit::Milliwatt)
                .reference("AnnotationRef", "Note", Cardinality::Many, Some("Source"))
                .variants(&["Lamp", "Beam"]),
        );
        registry.register(RecordSchema::new("Lamp").base("Source"));
        registry.register(
            RecordSchema::new("Beam")
                .base("Source")
                .quantity("Wavelength", Unit::Nanometer)
                .reference("Pump", "Source", Cardinality::Single, None),
        );
        registry.register(RecordSchema::new("Note").identifier(IdentifierPolicy::Required));
        registry
    }

    #[test]
    fn test_schema_registration() {
        let registry = SchemaRegistry::create();

        // Built-in schema should be present
        assert!(registry.get("Image").is_some());

        registry.register(RecordSchema::new("Custom"));
        assert!(registry.get("Custom").is_some());
        assert!(registry.list_schemas().contains(&"Custom".to_string()));
    }

    #[test]
    fn test_schema_overwrite() {
        let registry = small_registry();
        assert!(registry.record("Note").unwrap().identifier_required());

        registry.register(RecordSchema::new("Note").identifier(IdentifierPolicy::Optional));
        assert!(!registry.record("Note").unwrap().identifier_required());
    }

    #[test]
    fn test_compiled_chain_and_handlers() {
        let registry = small_registry();
        let beam = registry.record("Beam").unwrap();

        assert_eq!(beam.element(), "Beam");
        assert!(beam.is_a("Source"));
        assert!(beam.identifier_required());
        assert_eq!(beam.role().map(|r| r.element), Some("Source"));
        assert_eq!(beam.role_depth(), Some(0));

        // base handlers precede the subtype's own
        let kinds: Vec<&str> = beam.handlers().iter().map(|h| h.field.kind).collect();
        assert_eq!(kinds, vec!["AnnotationRef", "Pump"]);
        assert_eq!(beam.handler("Pump").unwrap().declared_by, "Beam");

        assert_eq!(
            beam.quantity_field("Power").unwrap().default_unit,
            Unit::Milliwatt
        );
        assert_eq!(beam.attribute_depth("Wavelength"), Some(1));
        assert_eq!(beam.attribute_depth("Manufacturer"), Some(0));
    }

    #[test]
    fn test_unknown_base_and_cycles() {
        let registry = SchemaRegistry::empty();
        registry.register(RecordSchema::new("Orphan").base("Missing"));
        assert!(matches!(
            registry.record("Orphan"),
            Err(ModelError::Schema(_))
        ));

        registry.register(RecordSchema::new("A").base("B"));
        registry.register(RecordSchema::new("B").base("A"));
        assert!(matches!(registry.record("A"), Err(ModelError::Schema(_))));
        assert!(matches!(
            registry.record("Nothing"),
            Err(ModelError::Schema(_))
        ));
    }

    #[test]
    fn test_validate() {
        assert!(small_registry().validate().is_empty());
        assert!(SchemaRegistry::create().validate().is_empty());

        let registry = small_registry();
        registry.register(
            RecordSchema::new("Broken")
                .child("Ghost", Cardinality::Many)
                .reference("GhostRef", "Ghost", Cardinality::Single, None),
        );
        assert_eq!(registry.validate().len(), 2);
    }
}
