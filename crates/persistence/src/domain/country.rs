//! Country entity.

use serde::{Deserialize, Serialize};

use super::{EntityDescriptor, EntityId, EntityRef, FieldDef, entity};

pub(crate) static COUNTRY: EntityDescriptor = EntityDescriptor {
    name: "country",
    table: "country",
    path: "countries",
    index: "country",
    fields: &[
        FieldDef::text("countryName", "country_name"),
        FieldDef::one_to_one("region", "region_id", "region"),
    ],
    joins: &[],
};

/// A country belonging to at most one region.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    /// Store-assigned id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,

    /// Country name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_name: Option<String>,

    /// One-to-one link to a region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<EntityRef>,
}

entity!(Country, COUNTRY);

impl Country {
    /// Creates an unsaved country.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the id.
    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the name.
    pub fn with_country_name(mut self, country_name: impl Into<String>) -> Self {
        self.country_name = Some(country_name.into());
        self
    }

    /// Links the region.
    pub fn with_region(mut self, region: impl Into<EntityRef>) -> Self {
        self.region = Some(region.into());
        self
    }
}
