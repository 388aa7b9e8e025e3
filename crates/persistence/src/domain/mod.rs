//! Entity model for the plates service.
//!
//! Every entity is a plain record carrying an optional numeric id and
//! references to related entities expressed as [`EntityRef`]s. Storage
//! backends do not know the concrete Rust types; they work from the static
//! [`EntityDescriptor`] each type publishes, which lists its table, columns,
//! reference columns and join tables.
//!
//! # Identity
//!
//! Two entities are equal only when both carry an id and the ids match. An
//! entity without an id is never equal to anything, itself included, so the
//! types implement [`PartialEq`] and [`Hash`] but not [`Eq`]. The hash is a
//! constant.
//!
//! ```
//! use plates_persistence::domain::Plate;
//!
//! let saved = Plate::new().with_id(1).with_plate_title("A");
//! let renamed = Plate::new().with_id(1).with_plate_title("B");
//! assert_eq!(saved, renamed);
//!
//! let unsaved = Plate::new().with_plate_title("A");
//! assert_ne!(unsaved, unsaved.clone());
//! ```

/// Implements [`Entity`] plus id-based [`PartialEq`] and constant [`Hash`].
macro_rules! entity {
    ($ty:ty, $descriptor:expr) => {
        impl $crate::domain::Entity for $ty {
            fn descriptor() -> &'static $crate::domain::EntityDescriptor {
                &$descriptor
            }

            fn id(&self) -> Option<$crate::domain::EntityId> {
                self.id
            }

            fn set_id(&mut self, id: Option<$crate::domain::EntityId>) {
                self.id = id;
            }
        }

        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                matches!((self.id, other.id), (Some(a), Some(b)) if a == b)
            }
        }

        impl std::hash::Hash for $ty {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                std::hash::Hash::hash(&31u32, state);
            }
        }
    };
}

pub(crate) use entity;

mod country;
mod department;
pub mod graph;
mod location;
mod note;
mod person;
mod plate;
mod plate_history;
mod region;

pub use country::Country;
pub use department::Department;
pub use graph::{EntityGraph, GraphError};
pub use location::Location;
pub use note::Note;
pub use person::Person;
pub use plate::Plate;
pub use plate_history::PlateHistory;
pub use region::Region;

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Identifier assigned by the primary store.
pub type EntityId = i64;

/// A reference to another entity by id.
///
/// Serializes as `{"id": n}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    /// The referenced entity's id.
    pub id: EntityId,
}

impl EntityRef {
    /// Creates a reference to the given id.
    pub fn new(id: EntityId) -> Self {
        Self { id }
    }
}

impl From<EntityId> for EntityRef {
    fn from(id: EntityId) -> Self {
        Self { id }
    }
}

/// How a field is stored in the primary store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// UTF-8 text.
    Text,
    /// 64-bit signed integer.
    Integer,
    /// Point in time, RFC 3339 in JSON, stored as UTC text.
    Instant,
    /// Foreign key to another entity's table.
    Reference {
        /// Table of the referenced entity.
        target: &'static str,
    },
}

/// A scalar or reference column of an entity.
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    /// JSON property name.
    pub name: &'static str,
    /// Column name in the primary store.
    pub column: &'static str,
    /// Storage kind.
    pub kind: FieldKind,
    /// Whether a value is mandatory.
    pub required: bool,
    /// Whether the column carries a uniqueness constraint (one-to-one).
    pub unique: bool,
}

impl FieldDef {
    /// A nullable text column.
    pub const fn text(name: &'static str, column: &'static str) -> Self {
        Self {
            name,
            column,
            kind: FieldKind::Text,
            required: false,
            unique: false,
        }
    }

    /// A nullable integer column.
    pub const fn integer(name: &'static str, column: &'static str) -> Self {
        Self {
            name,
            column,
            kind: FieldKind::Integer,
            required: false,
            unique: false,
        }
    }

    /// A nullable instant column.
    pub const fn instant(name: &'static str, column: &'static str) -> Self {
        Self {
            name,
            column,
            kind: FieldKind::Instant,
            required: false,
            unique: false,
        }
    }

    /// A many-to-one reference.
    pub const fn many_to_one(
        name: &'static str,
        column: &'static str,
        target: &'static str,
    ) -> Self {
        Self {
            name,
            column,
            kind: FieldKind::Reference { target },
            required: false,
            unique: false,
        }
    }

    /// A one-to-one reference; the column is unique.
    pub const fn one_to_one(name: &'static str, column: &'static str, target: &'static str) -> Self {
        Self {
            name,
            column,
            kind: FieldKind::Reference { target },
            required: false,
            unique: true,
        }
    }

    /// Marks the field as mandatory.
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Returns the referenced table for reference fields.
    pub fn reference_target(&self) -> Option<&'static str> {
        match self.kind {
            FieldKind::Reference { target } => Some(target),
            _ => None,
        }
    }
}

/// A many-to-many association owned by an entity.
#[derive(Debug, Clone, Copy)]
pub struct JoinDef {
    /// JSON property holding the collection.
    pub field: &'static str,
    /// Join table name (`<owner>_<target>`).
    pub table: &'static str,
    /// Column referencing the owner.
    pub owner_column: &'static str,
    /// Column referencing the target.
    pub target_column: &'static str,
    /// Table of the target entity.
    pub target: &'static str,
}

/// Static description of an entity type.
#[derive(Debug)]
pub struct EntityDescriptor {
    /// Entity name used in alerts and error payloads (e.g. `plateHistory`).
    pub name: &'static str,
    /// Primary store table.
    pub table: &'static str,
    /// REST collection path segment (e.g. `plate-histories`).
    pub path: &'static str,
    /// Search index collection name.
    pub index: &'static str,
    /// Scalar and reference columns, excluding `id`.
    pub fields: &'static [FieldDef],
    /// Owned many-to-many associations.
    pub joins: &'static [JoinDef],
}

impl EntityDescriptor {
    /// Looks up a field by its JSON name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns true if the property can be used for sorting.
    pub fn is_sortable(&self, property: &str) -> bool {
        property == "id" || self.field(property).is_some()
    }

    /// Returns true if this entity holds a reference or join to `table`.
    pub fn references(&self, table: &str) -> bool {
        self.fields
            .iter()
            .any(|f| f.reference_target() == Some(table))
            || self.joins.iter().any(|j| j.target == table)
    }

    /// Returns true if the entity has collections that can be eagerly loaded.
    pub fn supports_eager_load(&self) -> bool {
        !self.joins.is_empty()
    }
}

/// A persistent entity type.
pub trait Entity: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static {
    /// Returns the static descriptor of this type.
    fn descriptor() -> &'static EntityDescriptor;

    /// Returns the id, if assigned.
    fn id(&self) -> Option<EntityId>;

    /// Sets or clears the id.
    fn set_id(&mut self, id: Option<EntityId>);
}

/// Returns descriptors of every entity type, referenced tables first.
pub fn descriptors() -> [&'static EntityDescriptor; 8] {
    [
        Region::descriptor(),
        Country::descriptor(),
        Location::descriptor(),
        Department::descriptor(),
        Person::descriptor(),
        Note::descriptor(),
        Plate::descriptor(),
        PlateHistory::descriptor(),
    ]
}

/// Finds a descriptor by entity name, table or REST path.
pub fn descriptor_for(key: &str) -> Option<&'static EntityDescriptor> {
    descriptors()
        .into_iter()
        .find(|d| d.name == key || d.table == key || d.path == key)
}
