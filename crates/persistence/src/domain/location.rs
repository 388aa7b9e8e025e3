//! Location entity.

use serde::{Deserialize, Serialize};

use super::{EntityDescriptor, EntityId, EntityRef, FieldDef, entity};

pub(crate) static LOCATION: EntityDescriptor = EntityDescriptor {
    name: "location",
    table: "location",
    path: "locations",
    index: "location",
    fields: &[
        FieldDef::text("streetAddress", "street_address"),
        FieldDef::text("postalCode", "postal_code"),
        FieldDef::text("city", "city"),
        FieldDef::text("stateProvince", "state_province"),
        FieldDef::one_to_one("country", "country_id", "country"),
    ],
    joins: &[],
};

/// A street address, housing at most one department.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Store-assigned id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,

    /// Street and number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street_address: Option<String>,

    /// Postal code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,

    /// City.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    /// State or province.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_province: Option<String>,

    /// One-to-one link to a country.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<EntityRef>,
}

entity!(Location, LOCATION);

impl Location {
    /// Creates an unsaved location.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the id.
    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the street address.
    pub fn with_street_address(mut self, street_address: impl Into<String>) -> Self {
        self.street_address = Some(street_address.into());
        self
    }

    /// Sets the city.
    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    /// Links the country.
    pub fn with_country(mut self, country: impl Into<EntityRef>) -> Self {
        self.country = Some(country.into());
        self
    }
}
