//! Model module: the arena of record instances for one document.
//!
//! Objects live in a [`Model`] and refer to one another by [`Handle`](crate::properties::Handle),
//! never by pointer, so reference cycles (annotations annotating annotations, a laser pumped by
//! another light source) need no special ownership treatment.
//!
//! # Module Organization
//!
//! - [`base`]: `Model` and `ModelObject`, attribute and quantity storage, composition tree
//! - [`links`]: the link/unlink operations keeping forward links and back-reference views in
//!   step
//! - [`graph`]: petgraph view of the forward references and the canonical [`Snapshot`] used to
//!   compare models
//!
//! # Public API
//!
//! ```rust
//! use ome_graph::model::{LinkOutcome, Model, ModelObject, Snapshot};
//! ```

mod base;
mod graph;
mod links;


pub use base::{Model, ModelObject};
pub use graph::{ObjectSnapshot, ReferenceGraph, Snapshot};
pub use links::LinkOutcome;
