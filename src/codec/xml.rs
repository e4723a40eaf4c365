//! XML encoding of element trees, on top of quick-xml.
//!
//! Character data is kept verbatim unless it is whitespace only, which is treated as layout and
//! dropped.

use super::markup::{Element, MarkupCodec};
use crate::{config::ModelConfig, error::ModelError};
use quick_xml::{
    escape::resolve_predefined_entity,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    reader::Reader,
    Writer,
};
use std::io::Write;

#[derive(Debug, Clone, Copy, Default)]
pub struct XmlCodec;

impl MarkupCodec for XmlCodec {
    fn read(&self, content: &str) -> Result<Element, ModelError> {
        let mut reader = Reader::from_str(content);
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => stack.push(open_element(&reader, &start)?),
                Event::Empty(start) => {
                    let element = open_element(&reader, &start)?;
                    close_element(element, &mut stack, &mut root)?;
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| {
                        ModelError::Markup("closing tag without an open element".to_string())
                    })?;
                    close_element(element, &mut stack, &mut root)?;
                }
                Event::Text(text) => {
                    let text = reader.decoder().decode(&text).map_err(markup_error)?;
                    push_text(&mut stack, &text);
                }
                Event::CData(data) => {
                    let text = reader.decoder().decode(&data).map_err(markup_error)?;
                    push_text(&mut stack, &text);
                }
                Event::GeneralRef(entity) => {
                    let name = reader.decoder().decode(&entity).map_err(markup_error)?;
                    let resolved = resolve_entity(&name)?;
                    push_text(&mut stack, &resolved);
                }
                Event::Eof => break,
                // declarations, comments, processing instructions, doctype
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(ModelError::Markup(format!(
                "document ended inside <{}>",
                open.tag
            )));
        }
        root.ok_or_else(|| ModelError::Markup("document has no root element".to_string()))
    }

    fn write(&self, root: &Element, config: &ModelConfig) -> Result<String, ModelError> {
        let mut writer = if config.indent > 0 {
            Writer::new_with_indent(Vec::new(), b' ', config.indent)
        } else {
            Writer::new(Vec::new())
        };
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        write_element(&mut writer, root)?;
        Ok(String::from_utf8(writer.into_inner())?)
    }
}

fn markup_error(err: impl std::fmt::Display) -> ModelError {
    ModelError::Markup(format!("{err}"))
}

fn open_element(reader: &Reader<&[u8]>, start: &BytesStart<'_>) -> Result<Element, ModelError> {
    let decoder = reader.decoder();
    let local = start.local_name();
    let tag = decoder.decode(local.as_ref()).map_err(markup_error)?;
    let mut element = Element::new(tag);
    for attribute in start.attributes() {
        let attribute = attribute?;
        // namespace declarations and prefixed (xsi:, xml:) attributes are not model data
        if attribute.key.as_namespace_binding().is_some() || attribute.key.prefix().is_some() {
            continue;
        }
        let name = decoder
            .decode(attribute.key.local_name().as_ref())
            .map_err(markup_error)?
            .into_owned();
        let value = attribute.decode_and_unescape_value(decoder)?.into_owned();
        element.attributes.insert(name, value);
    }
    Ok(element)
}

fn close_element(
    mut element: Element,
    stack: &mut Vec<Element>,
    root: &mut Option<Element>,
) -> Result<(), ModelError> {
    // indentation between child elements is not content
    if element.text.as_deref().is_some_and(|text| text.trim().is_empty()) {
        element.text = None;
    }
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(ModelError::Markup(format!(
                "second root element <{}>",
                element.tag
            )))
        }
    }
    Ok(())
}

fn push_text(stack: &mut [Element], text: &str) {
    if let Some(open) = stack.last_mut() {
        open.text.get_or_insert_with(String::new).push_str(text);
    }
}

fn resolve_entity(name: &str) -> Result<String, ModelError> {
    let resolved = match name.strip_prefix('#') {
        Some(code) => {
            let value = match code.strip_prefix('x') {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => code.parse::<u32>().ok(),
            };
            value.and_then(char::from_u32).map(String::from)
        }
        None => resolve_predefined_entity(name).map(str::to_string),
    };
    resolved.ok_or_else(|| ModelError::Markup(format!("unknown entity &{name};")))
}

fn write_element<W: Write>(writer: &mut Writer<W>, element: &Element) -> Result<(), ModelError> {
    let mut start = BytesStart::new(element.tag.as_str());
    for (name, value) in element.attributes.iter() {
        start.push_attribute((name.as_str(), value.as_str()));
    }

    if element.children.is_empty() && element.text.is_none() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if let Some(text) = element.text.as_ref() {
        writer.write_event(Event::Text(BytesText::new(text)))?;
    }
    for child in element.children.iter() {
        write_element(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(element.tag.as_str())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_nested_document() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<OME xmlns="http://www.openmicroscopy.org/Schemas/OME/2015-01"
     xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
     xsi:schemaLocation="http://www.openmicroscopy.org/Schemas/OME/2015-01 ome.xsd">
  <!-- comment -->
  <Image ID="Image:0" Name="a &amp; b">
    <Description>Tom &amp; Jerry &#x263A;</Description>
    <InstrumentRef ID="Instrument:0"/>
  </Image>
</OME>"#;
        let root = XmlCodec.read(xml).unwrap();
        assert_eq!(root.tag, "OME");
        assert!(root.attributes.is_empty());
        assert_eq!(root.text, None);

        let image = &root.children[0];
        assert_eq!(image.attribute("Name"), Some("a & b"));
        assert_eq!(
            image.children[0].text.as_deref(),
            Some("Tom & Jerry \u{263A}")
        );
        assert!(image.children[1].is_reference());
    }

    #[test]
    fn test_malformed_documents() {
        assert!(matches!(
            XmlCodec.read("<OME><Image></OME>"),
            Err(ModelError::Markup(_))
        ));
        assert!(matches!(
            XmlCodec.read("<OME>"),
            Err(ModelError::Markup(_))
        ));
        assert!(matches!(XmlCodec.read(""), Err(ModelError::Markup(_))));
        assert!(matches!(
            XmlCodec.read("<A/><B/>"),
            Err(ModelError::Markup(_))
        ));
    }

    #[test]
    fn test_write_then_read() {
        let root = Element::new("OME")
            .with_attribute("xmlns", "urn:test")
            .with_child(
                Element::new("Experimenter")
                    .with_attribute("ID", "Experimenter:0")
                    .with_attribute("LastName", "O'Brien <lab>"),
            )
            .with_child(Element::new("Description").with_text("x < y"));
        let text = XmlCodec.write(&root, &ModelConfig::default()).unwrap();
        assert!(text.starts_with("<?xml"));
        assert!(text.contains("<Experimenter ID=\"Experimenter:0\""));

        let read = XmlCodec.read(&text).unwrap();
        // the namespace declaration is not read back as an attribute
        assert!(read.attributes.is_empty());
        assert_eq!(read.children, root.children);
    }

    #[test]
    fn test_text_keeps_its_whitespace() {
        let root = XmlCodec
            .read("<OME>\n  <Description>  indented\n  line </Description>\n</OME>")
            .unwrap();
        assert_eq!(root.text, None);
        assert_eq!(
            root.children[0].text.as_deref(),
            Some("  indented\n  line ")
        );

        let text = XmlCodec.write(&root, &ModelConfig::default()).unwrap();
        assert_eq!(XmlCodec.read(&text).unwrap(), root);
    }
}
