//! Department entity.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{EntityDescriptor, EntityId, EntityRef, FieldDef, entity};

pub(crate) static DEPARTMENT: EntityDescriptor = EntityDescriptor {
    name: "department",
    table: "department",
    path: "departments",
    index: "department",
    fields: &[
        FieldDef::text("departmentName", "department_name").required(),
        FieldDef::one_to_one("location", "location_id", "location"),
    ],
    joins: &[],
};

/// A department housed at a location and staffed by people.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    /// Store-assigned id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,

    /// Department name. Required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_name: Option<String>,

    /// One-to-one link to a location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<EntityRef>,

    /// Inverse side of `Person::department`. Never serialized.
    #[serde(skip)]
    pub people: BTreeSet<EntityRef>,
}

entity!(Department, DEPARTMENT);

impl Department {
    /// Creates an unsaved department.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the id.
    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the name.
    pub fn with_department_name(mut self, department_name: impl Into<String>) -> Self {
        self.department_name = Some(department_name.into());
        self
    }

    /// Links the location.
    pub fn with_location(mut self, location: impl Into<EntityRef>) -> Self {
        self.location = Some(location.into());
        self
    }
}
