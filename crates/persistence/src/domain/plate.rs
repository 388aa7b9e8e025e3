//! Plate entity.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{EntityDescriptor, EntityId, EntityRef, FieldDef, JoinDef, entity};

pub(crate) static PLATE: EntityDescriptor = EntityDescriptor {
    name: "plate",
    table: "plate",
    path: "plates",
    index: "plate",
    fields: &[
        FieldDef::text("plateTitle", "plate_title"),
        FieldDef::many_to_one("person", "person_id", "person"),
    ],
    joins: &[JoinDef {
        field: "notes",
        table: "plate_note",
        owner_column: "plate_id",
        target_column: "note_id",
        target: "note",
    }],
};

/// A plate, optionally owned by a person and annotated with notes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plate {
    /// Store-assigned id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,

    /// Title shown for the plate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plate_title: Option<String>,

    /// Owning side of the plate/note association.
    ///
    /// `None` means the collection was not loaded. Saving treats it as empty,
    /// so an update must carry every note it keeps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<BTreeSet<EntityRef>>,

    /// Owner of the plate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person: Option<EntityRef>,
}

entity!(Plate, PLATE);

impl Plate {
    /// Creates an unsaved plate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the id.
    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the title.
    pub fn with_plate_title(mut self, plate_title: impl Into<String>) -> Self {
        self.plate_title = Some(plate_title.into());
        self
    }

    /// Sets the owning person.
    pub fn with_person(mut self, person: impl Into<EntityRef>) -> Self {
        self.person = Some(person.into());
        self
    }

    /// Replaces the note collection.
    pub fn with_notes<I>(mut self, notes: I) -> Self
    where
        I: IntoIterator<Item = EntityId>,
    {
        self.notes = Some(notes.into_iter().map(EntityRef::new).collect());
        self
    }

    /// Returns the ids of the loaded notes.
    pub fn note_ids(&self) -> Vec<EntityId> {
        self.notes
            .iter()
            .flatten()
            .map(|note| note.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialization_shape() {
        let plate = Plate::new()
            .with_id(4)
            .with_plate_title("Blue")
            .with_person(2)
            .with_notes([7, 5]);
        let value = serde_json::to_value(&plate).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 4,
                "plateTitle": "Blue",
                "notes": [{"id": 5}, {"id": 7}],
                "person": {"id": 2}
            })
        );
    }

    #[test]
    fn test_unloaded_notes_are_omitted() {
        let value = serde_json::to_value(Plate::new().with_plate_title("X")).unwrap();
        assert_eq!(value, json!({"plateTitle": "X"}));

        let parsed: Plate = serde_json::from_value(json!({"plateTitle": "X"})).unwrap();
        assert!(parsed.notes.is_none());
        assert!(parsed.id.is_none());
    }
}
