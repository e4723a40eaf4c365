//! # ome-graph
//!
//! A reference-resolving object graph for OME microscopy metadata documents.
//!
//! ## Overview
//!
//! An OME document describes instruments, images, plates, regions of interest and annotations
//! as a tree of elements that point at each other by identifier. ome-graph reads such a
//! document in a single traversal, records every reference it meets, and resolves them all in
//! one pass once the identifier registry is complete. The result is a [`model::Model`] in
//! which every link is **bidirectional**: the source holds a forward slot and the target holds
//! a back-reference view, and the two are kept consistent by [`model::Model::link`] and
//! [`model::Model::unlink`].
//!
//! ### Key Features
//!
//! - **Forward references**: A reference may appear before the element declaring its target
//! - **Error tolerance**: Missing targets become diagnostics, never failures
//! - **Variant roles**: Abstract roles such as `LightSource` and `Shape` dispatch on the wrapped
//!   concrete element
//! - **Units**: Quantities carry a unit, with a per-property default when the document omits it
//! - **Forward-only serialization**: Each logical edge is written once, inside its source
//!
//! ## Architecture
//!
//! - **[`codec`]**: Markup codecs, the graph builder, reference ledger and serializer
//! - **[`model`]**: The object arena and the link/unlink invariant
//! - **[`ome`]**: Built-in OME record schemas
//! - **[`units`]**: Units of measure and quantity parsing
//! - **[`properties`]**: Handles, reference kinds, cardinalities
//! - **[`config`]**: Parse and serialization policies
//!
//! ## Quick Start
//!
//! ```rust
//! use ome_graph::{codec, codec::SCHEMAS, config::ModelConfig, units::Unit};
//!
//! let xml = r#"<OME xmlns="http://www.openmicroscopy.org/Schemas/OME/2015-01">
//!   <Instrument ID="Instrument:0">
//!     <Detector ID="Detector:0" Voltage="12"/>
//!   </Instrument>
//! </OME>"#;
//!
//! let config = ModelConfig::default();
//! let parsed = codec::parse_str(xml, &SCHEMAS, &config)?;
//! let detector = parsed.model.find("Detector:0").unwrap();
//! let voltage = parsed.model.object(detector)?.quantity("Voltage").unwrap();
//! assert_eq!(voltage.unit(), Unit::Volt);
//!
//! let written = codec::to_string(&parsed.model, &config)?;
//! assert!(written.contains(r#"VoltageUnit="V""#));
//! # Ok::<(), ome_graph::ModelError>(())
//! ```
//!
//! ### Working with Diagnostics
//!
//! ```rust
//! # use ome_graph::{codec, codec::SCHEMAS, config::ModelConfig};
//! let xml = r#"<OME><Image ID="Image:0"><InstrumentRef ID="Instrument:404"/></Image></OME>"#;
//! let parsed = codec::parse_str(xml, &SCHEMAS, &ModelConfig::default())?;
//!
//! for unresolved in parsed.unresolved() {
//!     println!("{} -> {}", unresolved.kind, unresolved.target_id);
//! }
//! assert_eq!(parsed.unresolved().count(), 1);
//! # Ok::<(), ome_graph::ModelError>(())
//! ```
//!
//! Set [`config::ModelConfig::strict_references`] to turn any missing edge into an error.

pub mod codec;
pub mod config;
pub mod error;
pub mod model;
pub mod ome;
pub mod properties;
pub mod units;
#[cfg(test)]
mod tests;

pub use error::*;
