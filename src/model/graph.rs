//! Graph views over a [`Model`].
//!
//! - [`ReferenceGraph`]: petgraph digraph of the forward links, for traversal and cycle queries
//! - [`Snapshot`]: a canonical, handle-free rendition of a model. Two models are isomorphic
//!   under identifier equality exactly when their snapshots are equal.

use super::Model;
use crate::{
    error::ModelError,
    properties::{Handle, RefKind},
    units::Quantity,
};
use petgraph::{algo::tarjan_scc, graph::NodeIndex, Graph};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Forward links as a directed graph. Node `i` carries the handle with index `i`.
pub type ReferenceGraph = Graph<Handle, RefKind>;

impl Model {
    pub fn reference_graph(&self) -> ReferenceGraph {
        let mut graph = Graph::with_capacity(self.objects.len(), 0);
        for object in self.objects.iter() {
            graph.add_node(object.handle);
        }
        for object in self.objects.iter() {
            for (kind, targets) in object.forward.iter() {
                for target in targets {
                    graph.add_edge(
                        NodeIndex::new(object.handle.0),
                        NodeIndex::new(target.0),
                        RefKind::from(kind.as_str()),
                    );
                }
            }
        }
        graph
    }

    /// Groups of objects that reach each other through forward links, including objects that
    /// link to themselves.
    pub fn reference_cycles(&self) -> Vec<Vec<Handle>> {
        let graph = self.reference_graph();
        tarjan_scc(&graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|n| graph.find_edge(*n, *n).is_some())
            })
            .map(|component| {
                let mut handles: Vec<Handle> = component.into_iter().map(|n| graph[n]).collect();
                handles.sort();
                handles
            })
            .collect()
    }

    /// Canonical form of this model.
    ///
    /// Objects are keyed by identifier, or by their path from the root when they have none.
    /// Back-reference views are left out; they are derived from the forward links.
    pub fn snapshot(&self) -> Snapshot {
        let keys = self.snapshot_keys();
        let key = |handle: &Handle| keys.get(handle).cloned().unwrap_or_default();

        let objects = self
            .objects
            .iter()
            .map(|object| {
                let snapshot = ObjectSnapshot {
                    element: object.element().to_string(),
                    parent: object.parent.as_ref().map(key),
                    attributes: object
                        .attributes
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect(),
                    quantities: object
                        .quantities
                        .iter()
                        .map(|(k, v)| (k.clone(), *v))
                        .collect(),
                    text: object
                        .text
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect(),
                    children: object.children.iter().map(key).collect(),
                    links: object
                        .forward
                        .iter()
                        .map(|(kind, targets)| (kind.clone(), targets.iter().map(key).collect()))
                        .collect(),
                };
                (key(&object.handle), snapshot)
            })
            .collect();
        Snapshot(objects)
    }

    fn snapshot_keys(&self) -> HashMap<Handle, String> {
        let mut keys = HashMap::new();
        let mut stack: Vec<(Handle, String)> = Vec::new();

        let mut positions: HashMap<&str, usize> = HashMap::new();
        for root in self.roots() {
            let element = self.objects[root.0].element();
            let n = positions.entry(element).or_default();
            stack.push((root, format!("/{element}[{n}]")));
            *n += 1;
        }

        while let Some((handle, path)) = stack.pop() {
            let object = &self.objects[handle.0];
            let mut positions: HashMap<&str, usize> = HashMap::new();
            for child in object.children.iter() {
                let element = self.objects[child.0].element();
                let n = positions.entry(element).or_default();
                stack.push((*child, format!("{path}/{element}[{n}]")));
                *n += 1;
            }
            let key = match object.id.as_ref() {
                Some(id) => id.clone(),
                None => path,
            };
            keys.insert(handle, key);
        }
        keys
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectSnapshot {
    pub element: String,
    pub parent: Option<String>,
    pub attributes: BTreeMap<String, String>,
    pub quantities: BTreeMap<String, Quantity>,
    pub text: BTreeMap<String, Vec<String>>,
    pub children: Vec<String>,
    pub links: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot(pub BTreeMap<String, ObjectSnapshot>);

impl Snapshot {
    pub fn get(&self, key: &str) -> Option<&ObjectSnapshot> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
