//! Note entity.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{EntityDescriptor, EntityId, EntityRef, FieldDef, entity};

pub(crate) static NOTE: EntityDescriptor = EntityDescriptor {
    name: "note",
    table: "note",
    path: "notes",
    index: "note",
    fields: &[
        FieldDef::text("title", "title"),
        FieldDef::text("description", "description"),
    ],
    joins: &[],
};

/// A free-text note attached to plates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Store-assigned id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,

    /// Short title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Body text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Inverse side of the plate/note association, maintained by
    /// [`EntityGraph`](super::EntityGraph). Never serialized.
    #[serde(skip)]
    pub plates: BTreeSet<EntityRef>,
}

entity!(Note, NOTE);

impl Note {
    /// Creates an unsaved note.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the id.
    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
