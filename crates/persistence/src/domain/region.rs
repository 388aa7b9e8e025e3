//! Region entity.

use serde::{Deserialize, Serialize};

use super::{EntityDescriptor, EntityId, FieldDef, entity};

pub(crate) static REGION: EntityDescriptor = EntityDescriptor {
    name: "region",
    table: "region",
    path: "regions",
    index: "region",
    fields: &[FieldDef::text("regionName", "region_name")],
    joins: &[],
};

/// A geographic region.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    /// Store-assigned id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,

    /// Region name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_name: Option<String>,
}

entity!(Region, REGION);

impl Region {
    /// Creates an unsaved region.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the id.
    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the name.
    pub fn with_region_name(mut self, region_name: impl Into<String>) -> Self {
        self.region_name = Some(region_name.into());
        self
    }
}
