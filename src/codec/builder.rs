use indexmap::IndexMap;
use regex::Regex;
use std::{collections::HashMap, sync::Arc};

use super::{
    diagnostic::{ParseDiagnostic, UnresolvedReference},
    dispatch::{Dispatch, VariantTable},
    ledger::{ReferenceLedger, ResolutionSummary},
    markup::{Element, ID_ATTRIBUTE},
    registry::IdentifierRegistry,
    schema_registry::{CompiledRecord, ContentField, SchemaRegistry},
};
use crate::{
    config::{DuplicatePolicy, ElementPolicy, ModelConfig},
    error::ModelError,
    model::Model,
    properties::Handle,
    units::{parse_quantity, unit_attribute},
};

/// `Type:n` style identifiers, or full LSIDs.
const IDENTIFIER_PATTERN: &str = r"^(urn:lsid:([\w\-\.]+\.[\w\-\.]+)+:\S+:\S+|\S+:\S+)$";

/// Namespace declarations may reach the builder through non-XML codecs.
const NAMESPACE_ATTRIBUTE: &str = "xmlns";

/// A fully linked model plus the non-fatal findings of the parse that produced it.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub model: Model,
    pub diagnostics: Vec<ParseDiagnostic>,
    pub summary: ResolutionSummary,
}

impl ParsedDocument {
    /// True when every recorded reference became an edge.
    pub fn is_complete(&self) -> bool {
        !self.diagnostics.iter().any(|d| d.is_graph_incomplete())
    }

    pub fn unresolved(&self) -> impl Iterator<Item = &UnresolvedReference> {
        self.diagnostics
            .iter()
            .filter_map(|d| d.as_unresolved_reference())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.diagnostics.iter().filter_map(|d| match d {
            ParseDiagnostic::Warning(msg) => Some(msg.as_str()),
            _ => None,
        })
    }
}

/// Builds a [`Model`] from an element tree in a single traversal.
///
/// Every constructed object registers its identifier and appends the references it declares to
/// the ledger. Nothing is linked during the traversal; [`GraphBuilder::build`] runs the
/// resolution pass only once the whole tree has been visited, so forward references resolve
/// exactly like backward ones.
pub struct GraphBuilder<'a> {
    schemas: &'a SchemaRegistry,
    config: &'a ModelConfig,
    model: Model,
    registry: IdentifierRegistry,
    ledger: ReferenceLedger,
    diagnostics: Vec<ParseDiagnostic>,
    variant_tables: HashMap<&'static str, Arc<VariantTable>>,
    id_pattern: Option<Regex>,
    /// Under [`DuplicatePolicy::LastWins`], the last element declaring each identifier.
    last_declarations: HashMap<String, *const Element>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(schemas: &'a SchemaRegistry, config: &'a ModelConfig) -> Self {
        GraphBuilder {
            schemas,
            config,
            model: Model::new(),
            registry: IdentifierRegistry::new(config.duplicate_identifiers),
            ledger: ReferenceLedger::new(),
            diagnostics: Vec::new(),
            variant_tables: HashMap::new(),
            id_pattern: None,
            last_declarations: HashMap::new(),
        }
    }

    pub fn build(mut self, root: &Element) -> Result<ParsedDocument, ModelError> {
        tracing::info!("[GraphBuilder::build] Parsing <{}> document", root.tag);
        if self.config.validate_identifiers {
            self.id_pattern = Some(Regex::new(IDENTIFIER_PATTERN)?);
        }

        if self.config.duplicate_identifiers == DuplicatePolicy::LastWins {
            self.collect_declarations(root)?;
        }
        self.construct_node(root, None)?;

        let GraphBuilder {
            config,
            mut model,
            registry,
            ledger,
            mut diagnostics,
            ..
        } = self;
        tracing::info!(
            "[GraphBuilder::build] Constructed {} object(s), {} identifier(s), {} reference(s)",
            model.len(),
            registry.len(),
            ledger.len()
        );

        let summary = ledger.resolve(&registry, &mut model, &mut diagnostics)?;

        if config.strict_references {
            let incomplete = diagnostics.iter().filter(|d| d.is_graph_incomplete()).count();
            if incomplete > 0 {
                return Err(ModelError::UnresolvedReferences(incomplete));
            }
        }
        Ok(ParsedDocument {
            model,
            diagnostics,
            summary,
        })
    }

    fn warn(&mut self, message: String) {
        tracing::warn!("[GraphBuilder] {message}");
        self.diagnostics.push(ParseDiagnostic::Warning(message));
    }

    /// Construct `element`, dispatching through its variant table if it is a role container.
    fn construct_node(
        &mut self,
        element: &Element,
        parent: Option<Handle>,
    ) -> Result<Option<Handle>, ModelError> {
        let record = self.schemas.record(&element.tag)?;
        if record.schema().is_role() {
            self.construct_variant(element, parent)
        } else {
            self.construct(element, None, record, parent)
        }
    }

    fn variant_table(&mut self, role: &str) -> Result<Arc<VariantTable>, ModelError> {
        if let Some(table) = self.variant_tables.get(role) {
            return Ok(table.clone());
        }
        let schema = self
            .schemas
            .get(role)
            .ok_or_else(|| ModelError::Schema(format!("no schema registered for <{role}>")))?;
        let table = Arc::new(VariantTable::for_role(&schema, self.schemas)?);
        self.variant_tables.insert(table.role(), table.clone());
        Ok(table)
    }

    fn construct_variant(
        &mut self,
        container: &Element,
        parent: Option<Handle>,
    ) -> Result<Option<Handle>, ModelError> {
        let table = self.variant_table(&container.tag)?;
        match table.select(container)? {
            Some(Dispatch { element, record }) => {
                self.construct(element, Some(container), record, parent)
            }
            None => {
                let message = format!(
                    "<{}> holds none of {:?}; the slot is left empty",
                    container.tag,
                    table.tags().collect::<Vec<_>>()
                );
                tracing::debug!("[GraphBuilder] {message}");
                self.diagnostics.push(ParseDiagnostic::Info(message));
                Ok(None)
            }
        }
    }

    /// Construct one concrete object. `container` is the role element wrapping `element`, whose
    /// attributes and remaining children belong to the same object.
    ///
    /// Returns `None` when a lenient duplicate policy gives the element's identifier to another
    /// declaration; the element and everything below it are skipped.
    fn construct(
        &mut self,
        element: &Element,
        container: Option<&Element>,
        record: Arc<CompiledRecord>,
        parent: Option<Handle>,
    ) -> Result<Option<Handle>, ModelError> {
        let name = record.element();

        let mut attributes: IndexMap<&str, &str> = IndexMap::new();
        if let Some(container) = container {
            for (k, v) in container.attributes.iter() {
                attributes.insert(k.as_str(), v.as_str());
            }
        }
        for (k, v) in element.attributes.iter() {
            if attributes.insert(k.as_str(), v.as_str()).is_some() {
                self.warn(format!(
                    "{k} is given on both the container and <{name}>; using the <{name}> value"
                ));
            }
        }
        attributes.shift_remove(NAMESPACE_ATTRIBUTE);

        let identifier = attributes.shift_remove(ID_ATTRIBUTE);
        if identifier.is_none() && record.identifier_required() {
            return Err(ModelError::MissingRequiredIdentifier {
                element: name.to_string(),
            });
        }

        if let Some(id) = identifier {
            if self.loses_identifier(id, element) {
                let winner = match self.config.duplicate_identifiers {
                    DuplicatePolicy::LastWins => "a later declaration",
                    _ => "the first declaration",
                };
                self.warn(format!(
                    "<{name}> repeats ID '{id}'; skipped in favour of {winner}"
                ));
                return Ok(None);
            }
        }

        let handle = self.model.insert(record.clone(), parent)?;
        if let Some(id) = identifier {
            self.register_identifier(handle, name, id)?;
        }

        for (_, field) in record.quantity_fields() {
            let unit_name = unit_attribute(field.name);
            let unit = attributes.shift_remove(unit_name.as_str());
            let Some(raw) = attributes.shift_remove(field.name) else {
                if unit.is_some() {
                    self.warn(format!(
                        "<{name}> gives {unit_name} without {}; ignored",
                        field.name
                    ));
                }
                continue;
            };
            let quantity = parse_quantity(raw, unit, field.default_unit).map_err(|err| {
                ModelError::QuantityParse {
                    element: name.to_string(),
                    property: field.name.to_string(),
                    value: raw.to_string(),
                    reason: err.to_string(),
                }
            })?;
            self.model.set_quantity(handle, field.name, quantity)?;
        }

        for (k, v) in attributes {
            self.model.set_attribute(handle, k, v)?;
        }

        let children: Vec<&Element> = container
            .into_iter()
            .flat_map(|c| c.children.iter())
            .filter(|c| !std::ptr::eq(*c, element))
            .chain(element.children.iter())
            .collect();
        self.check_cardinality(&record, &children)?;

        for child in children {
            self.construct_child(handle, &record, child)?;
        }

        tracing::debug!(
            "[GraphBuilder] Constructed <{name}> {handle} {}",
            self.model.object(handle)?.id().unwrap_or("")
        );
        Ok(Some(handle))
    }

    fn construct_child(
        &mut self,
        handle: Handle,
        record: &CompiledRecord,
        child: &Element,
    ) -> Result<(), ModelError> {
        match record.content_field(&child.tag).map(|(_, field)| *field) {
            Some(ContentField::Text { tag, .. }) => {
                let text = child.text.clone().unwrap_or_default();
                self.model.push_text(handle, tag, text)?;
            }
            Some(ContentField::Record { .. }) => {
                self.construct_node(child, Some(handle))?;
            }
            Some(ContentField::Variant { .. }) => {
                self.construct_variant(child, Some(handle))?;
            }
            Some(ContentField::Reference(field)) => {
                let id = child.attribute(ID_ATTRIBUTE).ok_or_else(|| {
                    ModelError::MissingRequiredIdentifier {
                        element: field.kind.to_string(),
                    }
                })?;
                self.ledger.record(handle, id, field.kind);
            }
            None => match child.attribute(ID_ATTRIBUTE) {
                // undeclared reference: the resolution pass reports the unknown kind
                Some(id) if child.is_reference() => {
                    self.ledger.record(handle, id, child.tag.as_str());
                }
                _ => self.undeclared(record.element(), child)?,
            },
        }
        Ok(())
    }

    fn check_cardinality(
        &self,
        record: &CompiledRecord,
        children: &[&Element],
    ) -> Result<(), ModelError> {
        for (_, field) in record.content_fields() {
            if !field.cardinality().is_single() {
                continue;
            }
            let count = children.iter().filter(|c| c.tag == field.tag()).count();
            if count > 1 {
                return Err(ModelError::CardinalityViolation {
                    element: record.element().to_string(),
                    child: field.tag().to_string(),
                    count,
                });
            }
        }
        Ok(())
    }

    fn register_identifier(
        &mut self,
        handle: Handle,
        element: &str,
        id: &str,
    ) -> Result<(), ModelError> {
        let malformed = self
            .id_pattern
            .as_ref()
            .is_some_and(|pattern| !pattern.is_match(id));
        if malformed {
            self.warn(format!(
                "<{element}> ID '{id}' does not follow the Type:n or LSID form"
            ));
        }

        self.registry.register(id, handle)?;
        self.model.assign_identifier(handle, id)
    }

    /// Whether a lenient duplicate policy hands `id` to a declaration other than `element`.
    fn loses_identifier(&self, id: &str, element: &Element) -> bool {
        match self.config.duplicate_identifiers {
            DuplicatePolicy::Reject => false,
            DuplicatePolicy::FirstWins => self.registry.lookup(id).is_some(),
            DuplicatePolicy::LastWins => self
                .last_declarations
                .get(id)
                .is_some_and(|last| !std::ptr::eq(*last, element)),
        }
    }

    /// Record the last declaration of every identifier, visiting elements in construction order.
    fn collect_declarations(&mut self, element: &Element) -> Result<(), ModelError> {
        let record = self.schemas.record(&element.tag)?;
        if !record.schema().is_role() {
            return self.collect_object(element, None, &record);
        }
        let table = self.variant_table(&element.tag)?;
        match table.select(element)? {
            Some(Dispatch { element: member, record }) => {
                self.collect_object(member, Some(element), &record)
            }
            None => Ok(()),
        }
    }

    fn collect_object(
        &mut self,
        element: &Element,
        container: Option<&Element>,
        record: &CompiledRecord,
    ) -> Result<(), ModelError> {
        let id = element
            .attribute(ID_ATTRIBUTE)
            .or_else(|| container.and_then(|c| c.attribute(ID_ATTRIBUTE)));
        if let Some(id) = id {
            self.last_declarations
                .insert(id.to_string(), element as *const Element);
        }
        let children = container
            .into_iter()
            .flat_map(|c| c.children.iter())
            .filter(|c| !std::ptr::eq(*c, element))
            .chain(element.children.iter());
        for child in children {
            if let Some((_, ContentField::Record { .. } | ContentField::Variant { .. })) =
                record.content_field(&child.tag)
            {
                self.collect_declarations(child)?;
            }
        }
        Ok(())
    }

    fn undeclared(&mut self, parent: &str, child: &Element) -> Result<(), ModelError> {
        match self.config.undeclared_elements {
            ElementPolicy::Warn => {
                self.warn(format!("<{parent}> does not declare <{}>; skipped", child.tag));
                Ok(())
            }
            ElementPolicy::Ignore => {
                tracing::debug!("[GraphBuilder] Ignoring <{}> in <{parent}>", child.tag);
                Ok(())
            }
            ElementPolicy::Reject => Err(ModelError::Schema(format!(
                "<{parent}> does not declare <{}>",
                child.tag
            ))),
        }
    }
}
