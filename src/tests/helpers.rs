//! Shared test utilities for in-crate tests

use crate::{
    codec::{self, ParsedDocument, SCHEMAS},
    config::ModelConfig,
};

/// The fixture also used by the integration tests.
pub const SAMPLE_DOCUMENT: &str = include_str!("../../tests/documents/sample.ome.xml");

/// Parse `xml` against the built-in schemas with the default configuration.
pub fn parse(xml: &str) -> ParsedDocument {
    codec::parse_str(xml, &SCHEMAS, &ModelConfig::default()).unwrap()
}

/// Wrap `body` in an `OME` root element.
pub fn ome(body: &str) -> String {
    format!("<OME>{body}</OME>")
}
