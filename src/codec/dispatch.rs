//! Polymorphic element dispatch.
//!
//! An abstract role such as `LightSource` or `Shape` appears in markup as a container element
//! carrying the role's shared attributes and wrapping exactly one concrete element:
//!
//! ```xml
//! <LightSource ID="LightSource:0" Power="100">
//!   <Laser Wavelength="488"/>
//! </LightSource>
//! ```
//!
//! There is no discriminator attribute; the concrete type is the tag of the wrapped child.

use super::{
    markup::Element,
    schema_registry::{CompiledRecord, RecordSchema, SchemaRegistry},
};
use crate::error::ModelError;
use std::{collections::BTreeMap, sync::Arc};

/// Static tag -> constructor table for one role.
#[derive(Debug, Clone)]
pub struct VariantTable {
    role: &'static str,
    members: BTreeMap<&'static str, Arc<CompiledRecord>>,
}

/// The concrete member found inside a container.
#[derive(Debug)]
pub struct Dispatch<'e> {
    pub element: &'e Element,
    pub record: Arc<CompiledRecord>,
}

impl VariantTable {
    pub fn for_role(role: &RecordSchema, schemas: &SchemaRegistry) -> Result<Self, ModelError> {
        if !role.is_role() {
            return Err(ModelError::Schema(format!(
                "<{}> lists no variants",
                role.element
            )));
        }
        let mut members = BTreeMap::new();
        for tag in role.variants.iter() {
            members.insert(*tag, schemas.record(tag)?);
        }
        Ok(VariantTable {
            role: role.element,
            members,
        })
    }

    pub fn role(&self) -> &'static str {
        self.role
    }

    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.members.keys().copied()
    }

    /// Pick the concrete member wrapped by `container`.
    ///
    /// `Ok(None)` for a container without a concrete child: the slot is known but
    /// unpopulated. More than one concrete child is [`ModelError::AmbiguousVariant`]. Children
    /// that are not members of the role (shared content such as annotation references) are
    /// left for the caller.
    pub fn select<'e>(&self, container: &'e Element) -> Result<Option<Dispatch<'e>>, ModelError> {
        let mut found = container
            .children
            .iter()
            .filter_map(|child| self.members.get(child.tag.as_str()).map(|r| (child, r)));

        let Some((element, record)) = found.next() else {
            return Ok(None);
        };
        let extra: Vec<String> = found.map(|(child, _)| child.tag.clone()).collect();
        if !extra.is_empty() {
            let mut all = vec![element.tag.clone()];
            all.extend(extra);
            return Err(ModelError::AmbiguousVariant {
                role: self.role.to_string(),
                found: all,
            });
        }

        tracing::debug!(
            "[VariantTable::select] <{}> dispatches to <{}>",
            self.role,
            element.tag
        );
        Ok(Some(Dispatch {
            element,
            record: record.clone(),
        }))
    }
}
