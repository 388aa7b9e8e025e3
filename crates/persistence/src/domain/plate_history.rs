//! Plate history entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EntityDescriptor, EntityId, EntityRef, FieldDef, entity};

pub(crate) static PLATE_HISTORY: EntityDescriptor = EntityDescriptor {
    name: "plateHistory",
    table: "plate_history",
    path: "plate-histories",
    index: "platehistory",
    fields: &[
        FieldDef::instant("startDate", "start_date"),
        FieldDef::instant("endDate", "end_date"),
        FieldDef::one_to_one("plate", "plate_id", "plate"),
        FieldDef::one_to_one("department", "department_id", "department"),
        FieldDef::one_to_one("person", "person_id", "person"),
    ],
    joins: &[],
};

/// A period during which a plate was assigned to a person and department.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlateHistory {
    /// Store-assigned id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,

    /// Start of the assignment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,

    /// End of the assignment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,

    /// One-to-one link to the plate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plate: Option<EntityRef>,

    /// One-to-one link to the department.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<EntityRef>,

    /// One-to-one link to the person.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person: Option<EntityRef>,
}

entity!(PlateHistory, PLATE_HISTORY);

impl PlateHistory {
    /// Creates an unsaved history record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the id.
    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the period.
    pub fn with_period(mut self, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Self {
        self.start_date = Some(start);
        self.end_date = end;
        self
    }

    /// Links the plate.
    pub fn with_plate(mut self, plate: impl Into<EntityRef>) -> Self {
        self.plate = Some(plate.into());
        self
    }

    /// Links the department.
    pub fn with_department(mut self, department: impl Into<EntityRef>) -> Self {
        self.department = Some(department.into());
        self
    }

    /// Links the person.
    pub fn with_person(mut self, person: impl Into<EntityRef>) -> Self {
        self.person = Some(person.into());
        self
    }
}
