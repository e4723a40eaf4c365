//! Serializer: model back to an element tree.
//!
//! Only forward links are walked. Back-reference views are derived state and are never
//! emitted, so each logical edge appears exactly once, as a reference element inside its
//! source.

use super::{
    markup::{Element, ID_ATTRIBUTE},
    schema_registry::ContentField,
};
use crate::{
    config::ModelConfig,
    error::ModelError,
    model::{Model, ModelObject},
    properties::{Handle, IdentifierPolicy},
    units::unit_attribute,
};
use std::collections::HashSet;

pub struct ModelWriter<'a> {
    model: &'a Model,
    config: &'a ModelConfig,
}

impl<'a> ModelWriter<'a> {
    pub fn new(model: &'a Model, config: &'a ModelConfig) -> Self {
        ModelWriter { model, config }
    }

    /// The document element for the model's single root object.
    pub fn to_element(&self) -> Result<Element, ModelError> {
        let mut roots = self.model.roots();
        let root = roots
            .next()
            .ok_or_else(|| ModelError::Serialization("model has no objects".to_string()))?;
        if let Some(extra) = roots.next() {
            return Err(ModelError::Serialization(format!(
                "model has more than one root object ({root}, {extra}, ...)"
            )));
        }

        let mut element = self.element(root)?;
        if !self.config.namespace.is_empty() {
            element
                .attributes
                .shift_insert(0, "xmlns".to_string(), self.config.namespace.clone());
        }
        tracing::debug!(
            "[ModelWriter::to_element] Emitted {} object(s)",
            self.model.len()
        );
        Ok(element)
    }

    /// Emit one object. A concrete member of a variant role comes back wrapped in its container,
    /// which carries the role-level attributes and content.
    pub fn element(&self, handle: Handle) -> Result<Element, ModelError> {
        let object = self.model.object(handle)?;
        let record = object.record();
        let split = record.role_depth();
        let on_container =
            |depth: Option<usize>| matches!((split, depth), (Some(s), Some(d)) if d <= s);

        let mut inner = Element::new(object.element());
        let mut outer = record.role().map(|role| Element::new(role.element));

        if let Some(id) = object.id() {
            let declared_at = record
                .chain()
                .iter()
                .position(|s| s.identifier != IdentifierPolicy::Inherit);
            target(&mut inner, &mut outer, on_container(declared_at))
                .attributes
                .insert(ID_ATTRIBUTE.to_string(), id.to_string());
        }

        for (name, value) in object.attributes() {
            target(&mut inner, &mut outer, on_container(record.attribute_depth(name)))
                .attributes
                .insert(name.to_string(), value.to_string());
        }

        for (name, quantity) in object.quantities() {
            let attributes = &mut target(
                &mut inner,
                &mut outer,
                on_container(record.attribute_depth(name)),
            )
            .attributes;
            attributes.insert(name.to_string(), quantity.value_string());
            attributes.insert(unit_attribute(name), quantity.unit().symbol().to_string());
        }

        let mut outer_content = Vec::new();
        let mut children_written = false;
        let mut text_written = HashSet::new();
        for (depth, field) in record.content_fields() {
            let content = if on_container(Some(depth)) {
                &mut outer_content
            } else {
                &mut inner.children
            };
            match field {
                ContentField::Text { tag, .. } => {
                    if text_written.insert(*tag) {
                        for value in object.text(tag) {
                            content.push(Element::new(*tag).with_text(value.as_str()));
                        }
                    }
                }
                // compositional children keep their document order, which may interleave
                // several child types
                ContentField::Record { .. } | ContentField::Variant { .. } => {
                    if !children_written {
                        children_written = true;
                        for child in object.children() {
                            content.push(self.element(*child)?);
                        }
                    }
                }
                ContentField::Reference(field) => {
                    for target in object.forward(field.kind) {
                        content.push(
                            Element::new(field.kind)
                                .with_attribute(ID_ATTRIBUTE, self.target_id(object, *target)?),
                        );
                    }
                }
            }
        }

        if !children_written {
            for child in object.children() {
                inner.children.push(self.element(*child)?);
            }
        }

        match outer {
            Some(mut outer) => {
                outer.children.push(inner);
                outer.children.extend(outer_content);
                Ok(outer)
            }
            None => Ok(inner),
        }
    }

    fn target_id(&self, source: &ModelObject, target: Handle) -> Result<String, ModelError> {
        self.model.object(target)?.id().map(str::to_string).ok_or_else(|| {
            ModelError::Serialization(format!(
                "<{}> {} links to {target}, which has no ID",
                source.element(),
                source.handle()
            ))
        })
    }
}

fn target<'e>(
    inner: &'e mut Element,
    outer: &'e mut Option<Element>,
    on_container: bool,
) -> &'e mut Element {
    match outer {
        Some(outer) if on_container => outer,
        _ => inner,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        codec::SCHEMAS,
        units::{Quantity, Unit},
    };

    #[test]
    fn test_variant_is_wrapped_in_container() {
        let mut model = Model::new();
        let ome = model.insert(SCHEMAS.record("OME").unwrap(), None).unwrap();
        let instrument = model
            .insert(SCHEMAS.record("Instrument").unwrap(), Some(ome))
            .unwrap();
        model.set_identifier(instrument, "Instrument:0").unwrap();
        let laser = model
            .insert(SCHEMAS.record("Laser").unwrap(), Some(instrument))
            .unwrap();
        model.set_identifier(laser, "LightSource:0").unwrap();
        model
            .set_quantity(laser, "Power", Quantity::new(5.0, Unit::Watt))
            .unwrap();
        model
            .set_quantity(laser, "Wavelength", Quantity::new(561.0, Unit::Nanometer))
            .unwrap();
        model.set_attribute(laser, "Type", "SolidState").unwrap();

        let config = ModelConfig::default();
        let root = ModelWriter::new(&model, &config).to_element().unwrap();
        assert_eq!(
            root.attribute("xmlns"),
            Some(crate::config::DEFAULT_NAMESPACE)
        );

        let container = &root.children[0].children[0];
        assert_eq!(container.tag, "LightSource");
        assert_eq!(container.attribute("ID"), Some("LightSource:0"));
        assert_eq!(container.attribute("Power"), Some("5"));
        assert_eq!(container.attribute("PowerUnit"), Some("W"));

        let concrete = &container.children[0];
        assert_eq!(concrete.tag, "Laser");
        assert_eq!(concrete.attribute("Type"), Some("SolidState"));
        assert_eq!(concrete.attribute("WavelengthUnit"), Some("nm"));
        assert!(concrete.attribute("ID").is_none());
    }

    #[test]
    fn test_back_references_are_not_emitted() {
        let mut model = Model::new();
        let ome = model.insert(SCHEMAS.record("OME").unwrap(), None).unwrap();
        let dataset = model
            .insert(SCHEMAS.record("Dataset").unwrap(), Some(ome))
            .unwrap();
        model.set_identifier(dataset, "Dataset:0").unwrap();
        let image = model
            .insert(SCHEMAS.record("Image").unwrap(), Some(ome))
            .unwrap();
        model.set_identifier(image, "Image:0").unwrap();
        model.link(dataset, "ImageRef", image).unwrap();

        let config = ModelConfig::default();
        let root = ModelWriter::new(&model, &config).to_element().unwrap();
        let dataset = &root.children[0];
        let image = &root.children[1];
        assert_eq!(dataset.children_named("ImageRef").count(), 1);
        assert_eq!(image.children_named("DatasetRef").count(), 0);
        assert!(image.children.is_empty());
    }

    #[test]
    fn test_link_to_anonymous_object_fails() {
        let mut model = Model::new();
        let ome = model.insert(SCHEMAS.record("OME").unwrap(), None).unwrap();
        let project = model
            .insert(SCHEMAS.record("Project").unwrap(), Some(ome))
            .unwrap();
        model.set_identifier(project, "Project:0").unwrap();
        let dataset = model
            .insert(SCHEMAS.record("Dataset").unwrap(), Some(ome))
            .unwrap();
        model.link(project, "DatasetRef", dataset).unwrap();

        let config = ModelConfig::default();
        assert!(matches!(
            ModelWriter::new(&model, &config).to_element(),
            Err(ModelError::Serialization(_))
        ));
    }

    #[test]
    fn test_single_root_required() {
        let config = ModelConfig::default();
        let mut model = Model::new();
        assert!(ModelWriter::new(&model, &config).to_element().is_err());
        model.insert(SCHEMAS.record("OME").unwrap(), None).unwrap();
        model.insert(SCHEMAS.record("OME").unwrap(), None).unwrap();
        assert!(ModelWriter::new(&model, &config).to_element().is_err());
    }
}
