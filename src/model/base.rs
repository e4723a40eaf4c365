use crate::{
    codec::CompiledRecord,
    error::ModelError,
    properties::Handle,
    units::Quantity,
};
use indexmap::IndexMap;
use std::sync::Arc;

/// One record instance.
///
/// Forward links and back-reference views are read-only from the outside; they change only
/// through [`Model::link`] and [`Model::unlink`].
#[derive(Debug, Clone)]
pub struct ModelObject {
    pub(super) handle: Handle,
    pub(super) record: Arc<CompiledRecord>,
    pub(super) id: Option<String>,
    pub(super) attributes: IndexMap<String, String>,
    pub(super) quantities: IndexMap<String, Quantity>,
    pub(super) text: IndexMap<String, Vec<String>>,
    pub(super) parent: Option<Handle>,
    pub(super) children: Vec<Handle>,
    /// Resolved references keyed by reference kind.
    pub(super) forward: IndexMap<String, Vec<Handle>>,
    /// Sources linking here, keyed by view name.
    pub(super) back: IndexMap<String, Vec<Handle>>,
}

impl ModelObject {
    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn record(&self) -> &Arc<CompiledRecord> {
        &self.record
    }

    /// Concrete element type, e.g. `Laser` rather than `LightSource`.
    pub fn element(&self) -> &'static str {
        self.record.element()
    }

    pub fn is_a(&self, element: &str) -> bool {
        self.record.is_a(element)
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn quantity(&self, name: &str) -> Option<Quantity> {
        self.quantities.get(name).copied()
    }

    pub fn quantities(&self) -> impl Iterator<Item = (&str, Quantity)> {
        self.quantities.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Values of a text child element, in document order.
    pub fn text(&self, tag: &str) -> &[String] {
        self.text.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn parent(&self) -> Option<Handle> {
        self.parent
    }

    pub fn children(&self) -> &[Handle] {
        &self.children
    }

    /// Targets linked under `kind`, in link order. Duplicates are kept.
    pub fn forward(&self, kind: &str) -> &[Handle] {
        self.forward.get(kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn forward_links(&self) -> impl Iterator<Item = (&str, &[Handle])> {
        self.forward
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Sources currently linking here through relationships that publish `view`.
    pub fn back_references(&self, view: &str) -> &[Handle] {
        self.back.get(view).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn back_views(&self) -> impl Iterator<Item = (&str, &[Handle])> {
        self.back.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// Arena holding every object of one document.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub(super) objects: Vec<ModelObject>,
}

impl Model {
    pub fn new() -> Self {
        Model::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, handle: Handle) -> Option<&ModelObject> {
        self.objects.get(handle.0)
    }

    /// Like [`Model::get`], failing with [`ModelError::NotFound`].
    pub fn object(&self, handle: Handle) -> Result<&ModelObject, ModelError> {
        self.get(handle)
            .ok_or_else(|| ModelError::NotFound(format!("no object with handle {handle}")))
    }

    pub(crate) fn object_mut(&mut self, handle: Handle) -> Result<&mut ModelObject, ModelError> {
        self.objects
            .get_mut(handle.0)
            .ok_or_else(|| ModelError::NotFound(format!("no object with handle {handle}")))
    }

    pub fn objects(&self) -> impl Iterator<Item = &ModelObject> {
        self.objects.iter()
    }

    /// Objects without a parent, in insertion order.
    pub fn roots(&self) -> impl Iterator<Item = Handle> + '_ {
        self.objects
            .iter()
            .filter(|o| o.parent.is_none())
            .map(|o| o.handle)
    }

    pub fn root(&self) -> Option<Handle> {
        self.roots().next()
    }

    /// The object declaring `id`.
    pub fn find(&self, id: &str) -> Option<Handle> {
        self.objects
            .iter()
            .find(|o| o.id.as_deref() == Some(id))
            .map(|o| o.handle)
    }

    /// Every object of type `element` or one of its subtypes.
    pub fn find_all<'a>(&'a self, element: &'a str) -> impl Iterator<Item = Handle> + 'a {
        self.objects
            .iter()
            .filter(move |o| o.is_a(element))
            .map(|o| o.handle)
    }

    /// Add an object, appending it to `parent`'s children.
    pub fn insert(
        &mut self,
        record: Arc<CompiledRecord>,
        parent: Option<Handle>,
    ) -> Result<Handle, ModelError> {
        if record.schema().is_role() {
            return Err(ModelError::Schema(format!(
                "<{}> is an abstract role; construct one of its variants",
                record.element()
            )));
        }
        let handle = Handle(self.objects.len());
        if let Some(parent) = parent {
            self.object_mut(parent)?.children.push(handle);
        }
        self.objects.push(ModelObject {
            handle,
            record,
            id: None,
            attributes: IndexMap::new(),
            quantities: IndexMap::new(),
            text: IndexMap::new(),
            parent,
            children: vec![],
            forward: IndexMap::new(),
            back: IndexMap::new(),
        });
        Ok(handle)
    }

    /// Give an object an identifier, rejecting one already used elsewhere in this model.
    pub fn set_identifier(&mut self, handle: Handle, id: &str) -> Result<(), ModelError> {
        if let Some(other) = self.find(id) {
            if other != handle {
                return Err(ModelError::DuplicateIdentifier { id: id.to_string() });
            }
        }
        self.object_mut(handle)?.id = Some(id.to_string());
        Ok(())
    }

    /// Identifier assignment for the parser, whose registry has already arbitrated duplicates.
    pub(crate) fn assign_identifier(&mut self, handle: Handle, id: &str) -> Result<(), ModelError> {
        self.object_mut(handle)?.id = Some(id.to_string());
        Ok(())
    }

    pub fn set_attribute(
        &mut self,
        handle: Handle,
        name: &str,
        value: impl Into<String>,
    ) -> Result<Option<String>, ModelError> {
        Ok(self
            .object_mut(handle)?
            .attributes
            .insert(name.to_string(), value.into()))
    }

    pub fn remove_attribute(
        &mut self,
        handle: Handle,
        name: &str,
    ) -> Result<Option<String>, ModelError> {
        Ok(self.object_mut(handle)?.attributes.shift_remove(name))
    }

    /// Store a quantity. A declared property only accepts units of its default unit's
    /// dimension.
    pub fn set_quantity(
        &mut self,
        handle: Handle,
        name: &str,
        quantity: Quantity,
    ) -> Result<Option<Quantity>, ModelError> {
        let object = self.object_mut(handle)?;
        if let Some(field) = object.record.quantity_field(name) {
            let expected = field.default_unit.dimension();
            if quantity.unit().dimension() != expected {
                return Err(ModelError::QuantityParse {
                    element: object.element().to_string(),
                    property: name.to_string(),
                    value: quantity.to_string(),
                    reason: format!("expected a {expected} unit"),
                });
            }
        }
        Ok(object.quantities.insert(name.to_string(), quantity))
    }

    pub fn push_text(
        &mut self,
        handle: Handle,
        tag: &str,
        value: impl Into<String>,
    ) -> Result<(), ModelError> {
        self.object_mut(handle)?
            .text
            .entry(tag.to_string())
            .or_default()
            .push(value.into());
        Ok(())
    }
}
