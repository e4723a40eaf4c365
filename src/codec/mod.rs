//! Document parsing and serialization.
//!
//! This module turns OME metadata documents into a linked [`Model`] and back.
//!
//! ## Key Components
//!
//! - [`GraphBuilder`] - Single-traversal object construction, followed by one resolution pass
//! - [`ReferenceLedger`](ledger::ReferenceLedger) - References recorded during the traversal,
//!   resolved once every identifier is known
//! - [`IdentifierRegistry`](registry::IdentifierRegistry) - Identifier to object lookup
//! - [`VariantTable`](dispatch::VariantTable) - Concrete type selection for abstract roles
//! - [`ModelWriter`](writer::ModelWriter) - Emits forward links only
//! - [`MarkupCodec`] trait - Textual encodings of element trees (accessible via [`CODECS`])
//! - [`SchemaRegistry`] - Global registry of record schemas (accessible via [`SCHEMAS`])
//! - [`ParseDiagnostic`] - Unresolved references and other non-fatal findings
//!
//! ## Forward References
//!
//! Documents may reference an identifier before the element declaring it. The builder never
//! links during the traversal: it registers identifiers and appends each reference to the
//! ledger, then resolves the whole ledger at once. A reference whose target is declared
//! nowhere becomes a [`ParseDiagnostic::UnresolvedReference`] and the edge is left out.
//!
//! ## Built-in Codecs
//!
//! - **XML** (`.xml`, `.ome`) - via [`XmlCodec`]
//! - **JSON** (`.json`) - via [`JsonCodec`], the [`Element`] tree as serde JSON
//!
//! ```rust
//! use ome_graph::{codec, config::ModelConfig, codec::SCHEMAS};
//!
//! let xml = r#"<OME>
//!   <Image ID="Image:0"><InstrumentRef ID="Instrument:0"/></Image>
//!   <Instrument ID="Instrument:0"/>
//! </OME>"#;
//!
//! let config = ModelConfig::default();
//! let parsed = codec::parse_str(xml, &SCHEMAS, &config).unwrap();
//! assert!(parsed.is_complete());
//!
//! let model = &parsed.model;
//! let image = model.find("Image:0").unwrap();
//! let instrument = model.find("Instrument:0").unwrap();
//! assert_eq!(model.object(image).unwrap().forward("InstrumentRef"), &[instrument]);
//! assert_eq!(model.object(instrument).unwrap().back_references("Image"), &[image]);
//! ```

use std::{
    io::{BufRead, Write},
    path::Path,
};

use crate::{config::ModelConfig, error::ModelError, model::Model};

pub mod builder;
pub mod diagnostic;
pub mod dispatch;
pub mod ledger;
pub mod markup;
pub mod registry;
pub mod schema_registry;
pub mod writer;
pub mod xml;

pub use builder::{GraphBuilder, ParsedDocument};
pub use diagnostic::{ParseDiagnostic, UnresolvedReference};
pub use markup::{Element, JsonCodec, MarkupCodec, CODECS};
pub use schema_registry::{
    CompiledRecord, ContentField, RecordSchema, ReferenceField, SchemaRegistry, SCHEMAS,
};
pub use writer::ModelWriter;
pub use xml::XmlCodec;

/// Build a linked model from an already decoded element tree.
pub fn parse_element(
    root: &Element,
    schemas: &SchemaRegistry,
    config: &ModelConfig,
) -> Result<ParsedDocument, ModelError> {
    GraphBuilder::new(schemas, config).build(root)
}

/// Parse an XML document.
pub fn parse_str(
    content: &str,
    schemas: &SchemaRegistry,
    config: &ModelConfig,
) -> Result<ParsedDocument, ModelError> {
    let root = XmlCodec.read(content)?;
    parse_element(&root, schemas, config)
}

/// Parse an XML document from any buffered reader.
pub fn parse_reader<R: BufRead>(
    mut reader: R,
    schemas: &SchemaRegistry,
    config: &ModelConfig,
) -> Result<ParsedDocument, ModelError> {
    let mut content = String::new();
    reader.read_to_string(&mut content)?;
    parse_str(&content, schemas, config)
}

/// Parse a document file, choosing the codec by extension.
pub fn parse_file<P: AsRef<Path>>(
    path: P,
    schemas: &SchemaRegistry,
    config: &ModelConfig,
) -> Result<ParsedDocument, ModelError> {
    let path = path.as_ref();
    let codec = codec_for(path)?;
    tracing::info!("[codec::parse_file] Parsing {}", path.display());
    let content = std::fs::read_to_string(path)?;
    let root = codec.read(&content)?;
    parse_element(&root, schemas, config)
}

/// The element tree for `model`, rooted at its single root object.
pub fn to_element(model: &Model, config: &ModelConfig) -> Result<Element, ModelError> {
    ModelWriter::new(model, config).to_element()
}

/// Serialize `model` as an XML document.
pub fn to_string(model: &Model, config: &ModelConfig) -> Result<String, ModelError> {
    XmlCodec.write(&to_element(model, config)?, config)
}

pub fn write_to<W: Write>(
    mut writer: W,
    model: &Model,
    config: &ModelConfig,
) -> Result<(), ModelError> {
    writer.write_all(to_string(model, config)?.as_bytes())?;
    Ok(())
}

/// Serialize `model` to a file, choosing the codec by extension.
pub fn write_file<P: AsRef<Path>>(
    path: P,
    model: &Model,
    config: &ModelConfig,
) -> Result<(), ModelError> {
    let path = path.as_ref();
    let codec = codec_for(path)?;
    let content = codec.write(&to_element(model, config)?, config)?;
    std::fs::write(path, content)?;
    tracing::info!("[codec::write_file] Wrote {}", path.display());
    Ok(())
}

fn codec_for(path: &Path) -> Result<std::sync::Arc<dyn MarkupCodec>, ModelError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("xml");
    CODECS.get(extension).ok_or_else(|| {
        ModelError::Markup(format!(
            "no codec for .{extension} (known: {})",
            CODECS.extensions().join(", ")
        ))
    })
}
