//! The element tree shared by every codec, and the codec registry.
//!
//! The graph builder and the serializer only ever see [`Element`] trees. A [`MarkupCodec`]
//! turns text into such a tree and back; XML is the native OME encoding, JSON is offered for
//! tooling that prefers it.

use crate::{config::ModelConfig, error::ModelError};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::xml::XmlCodec;

/// Name of the identifier attribute, and of the payload of every reference element.
pub const ID_ATTRIBUTE: &str = "ID";

/// Global singleton codec map with builtin codecs (xml, ome, json)
pub static CODECS: Lazy<CodecMap> = Lazy::new(CodecMap::create);

/// A tagged element with named attributes, optional character data and child elements.
///
/// Tags and attribute names are local names; namespace prefixes are dropped on read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub tag: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Element {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// An empty element whose only payload is a target `ID`.
    pub fn is_reference(&self) -> bool {
        self.children.is_empty()
            && self.text.is_none()
            && self.attributes.len() == 1
            && self.attributes.contains_key(ID_ATTRIBUTE)
    }
}

/// Converts between a textual encoding and an [`Element`] tree.
pub trait MarkupCodec: Send + Sync {
    fn read(&self, content: &str) -> Result<Element, ModelError>;

    fn write(&self, root: &Element, config: &ModelConfig) -> Result<String, ModelError>;
}

/// Element trees as JSON objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl MarkupCodec for JsonCodec {
    fn read(&self, content: &str) -> Result<Element, ModelError> {
        Ok(serde_json::from_str(content)?)
    }

    fn write(&self, root: &Element, config: &ModelConfig) -> Result<String, ModelError> {
        if config.indent == 0 {
            Ok(serde_json::to_string(root)?)
        } else {
            Ok(serde_json::to_string_pretty(root)?)
        }
    }
}

// It is better to express the complexity of the singleton than hide it.
#[allow(clippy::type_complexity)]
pub struct CodecMap(Arc<RwLock<Vec<(String, Arc<dyn MarkupCodec>)>>>);

impl Clone for CodecMap {
    fn clone(&self) -> Self {
        CodecMap(self.0.clone())
    }
}

impl CodecMap {
    pub fn create() -> Self {
        CodecMap(Arc::new(RwLock::new(vec![
            ("xml".to_string(), Arc::new(XmlCodec) as Arc<dyn MarkupCodec>),
            ("ome".to_string(), Arc::new(XmlCodec)),
            ("json".to_string(), Arc::new(JsonCodec)),
        ])))
    }

    pub fn insert<T: MarkupCodec + Default + 'static>(&self, extension: String) {
        let mut writer = self.0.write();
        if let Some(entry) = writer.iter_mut().find(|(ext, _)| ext == &extension) {
            tracing::info!("[CodecMap::insert] Replacing codec for .{extension}");
            entry.1 = Arc::new(T::default());
        } else {
            writer.push((extension, Arc::new(T::default())));
        }
    }

    pub fn get(&self, ext: &str) -> Option<Arc<dyn MarkupCodec>> {
        let reader = self.0.read();
        reader
            .iter()
            .find(|(codec_ext, _value)| ext.eq_ignore_ascii_case(codec_ext))
            .map(|(_codec_ext, value)| value.clone())
    }

    pub fn extensions(&self) -> Vec<String> {
        let reader = self.0.read();
        reader
            .iter()
            .map(|(codec_ext, _value)| codec_ext.clone())
            .collect::<Vec<String>>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Element {
        Element::new("Image")
            .with_attribute("ID", "Image:0")
            .with_attribute("Name", "cells")
            .with_child(Element::new("Description").with_text("HeLa <fixed> & stained"))
            .with_child(Element::new("InstrumentRef").with_attribute("ID", "Instrument:0"))
    }

    #[test]
    fn test_reference_shape() {
        let image = sample();
        assert!(!image.is_reference());
        let refs: Vec<&Element> = image.children_named("InstrumentRef").collect();
        assert_eq!(refs.len(), 1);
        assert!(refs[0].is_reference());
        assert!(!Element::new("Description").with_text("x").is_reference());
    }

    #[test]
    fn test_json_codec() {
        let codec = JsonCodec;
        let text = codec.write(&sample(), &ModelConfig::default()).unwrap();
        assert!(!text.contains("\"children\": []"));
        assert_eq!(codec.read(&text).unwrap(), sample());
    }

    #[test]
    fn test_codec_lookup() {
        let codecs = CodecMap::create();
        assert!(codecs.get("xml").is_some());
        assert!(codecs.get("OME").is_some());
        assert!(codecs.get("md").is_none());

        codecs.insert::<JsonCodec>("ome.json".to_string());
        assert!(codecs.extensions().contains(&"ome.json".to_string()));
    }
}
