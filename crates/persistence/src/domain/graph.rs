//! In-memory arena for bidirectional relationships.
//!
//! Entities reference each other by id only. The arena owns one map per
//! entity type and keeps both ends of every association consistent:
//!
//! - many-to-many (plate/note) through [`EntityGraph::add_note`] and
//!   [`EntityGraph::remove_note`],
//! - one-to-many (person/plate, department/person) through the
//!   `add_*`/`remove_*` pairs, which move the back-reference as well,
//! - one-to-one links through the `link_*` setters, which reject a second
//!   holder of the same target.
//!
//! Inverse collections (`Note::plates`, `Person::plates`,
//! `Department::people`) are derived from the owning side and recomputed
//! whenever an entity enters or leaves the arena.
//!
//! ```
//! use plates_persistence::domain::{EntityGraph, Note, Plate};
//!
//! let mut graph = EntityGraph::new();
//! graph.insert(Plate::new().with_id(1)).unwrap();
//! graph.insert(Note::new().with_id(2)).unwrap();
//!
//! graph.add_note(1, 2).unwrap();
//! assert!(graph.get::<Note>(2).unwrap().plates.iter().any(|p| p.id == 1));
//! ```

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use super::{
    Country, Department, Entity, EntityId, EntityRef, Location, Note, Person, Plate, PlateHistory,
    Region,
};

/// Errors raised by graph updates.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The entity has no id and cannot be placed in the arena.
    #[error("{entity} has no id")]
    MissingId {
        /// Entity name.
        entity: &'static str,
    },

    /// A referenced entity is not in the arena.
    #[error("{entity}/{id} is not in the graph")]
    Missing {
        /// Entity name.
        entity: &'static str,
        /// Requested id.
        id: EntityId,
    },

    /// A one-to-one target is already held by another entity.
    #[error("{entity}.{field} -> {target} is already held by {entity}/{holder}")]
    AlreadyLinked {
        /// Holder entity name.
        entity: &'static str,
        /// Reference field.
        field: &'static str,
        /// Target id.
        target: EntityId,
        /// Id of the current holder.
        holder: EntityId,
    },
}

/// Per-type slot in the arena.
pub trait GraphMember: Entity {
    #[doc(hidden)]
    fn slot(graph: &EntityGraph) -> &BTreeMap<EntityId, Self>;
    #[doc(hidden)]
    fn slot_mut(graph: &mut EntityGraph) -> &mut BTreeMap<EntityId, Self>;
}

macro_rules! graph_member {
    ($ty:ty, $field:ident) => {
        impl GraphMember for $ty {
            fn slot(graph: &EntityGraph) -> &BTreeMap<EntityId, Self> {
                &graph.$field
            }

            fn slot_mut(graph: &mut EntityGraph) -> &mut BTreeMap<EntityId, Self> {
                &mut graph.$field
            }
        }
    };
}

/// Arena of entities stored by id.
#[derive(Debug, Default, Clone)]
pub struct EntityGraph {
    regions: BTreeMap<EntityId, Region>,
    countries: BTreeMap<EntityId, Country>,
    locations: BTreeMap<EntityId, Location>,
    departments: BTreeMap<EntityId, Department>,
    people: BTreeMap<EntityId, Person>,
    notes: BTreeMap<EntityId, Note>,
    plates: BTreeMap<EntityId, Plate>,
    histories: BTreeMap<EntityId, PlateHistory>,
}

graph_member!(Region, regions);
graph_member!(Country, countries);
graph_member!(Location, locations);
graph_member!(Department, departments);
graph_member!(Person, people);
graph_member!(Note, notes);
graph_member!(Plate, plates);
graph_member!(PlateHistory, histories);

impl EntityGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an entity. Inverse collections are recomputed.
    pub fn insert<E: GraphMember>(&mut self, entity: E) -> Result<(), GraphError> {
        let id = entity.id().ok_or(GraphError::MissingId {
            entity: E::descriptor().name,
        })?;
        E::slot_mut(self).insert(id, entity);
        self.rebuild_inverse();
        Ok(())
    }

    /// Returns the entity with the given id.
    pub fn get<E: GraphMember>(&self, id: EntityId) -> Option<&E> {
        E::slot(self).get(&id)
    }

    /// Returns every entity of one type, ordered by id.
    pub fn all<E: GraphMember>(&self) -> impl Iterator<Item = &E> {
        E::slot(self).values()
    }

    /// Removes an entity and every reference to it held by others.
    pub fn remove<E: GraphMember>(&mut self, id: EntityId) -> Option<E> {
        let removed = E::slot_mut(self).remove(&id)?;
        self.prune_dangling();
        self.rebuild_inverse();
        Some(removed)
    }

    /// Links a note to a plate on both sides.
    pub fn add_note(&mut self, plate_id: EntityId, note_id: EntityId) -> Result<(), GraphError> {
        self.require::<Note>(note_id)?;
        let plate = self.require_mut::<Plate>(plate_id)?;
        plate
            .notes
            .get_or_insert_with(BTreeSet::new)
            .insert(EntityRef::new(note_id));
        if let Some(note) = self.notes.get_mut(&note_id) {
            note.plates.insert(EntityRef::new(plate_id));
        }
        Ok(())
    }

    /// Unlinks a note from a plate on both sides.
    pub fn remove_note(&mut self, plate_id: EntityId, note_id: EntityId) -> Result<(), GraphError> {
        self.require::<Note>(note_id)?;
        let plate = self.require_mut::<Plate>(plate_id)?;
        if let Some(notes) = plate.notes.as_mut() {
            notes.remove(&EntityRef::new(note_id));
        }
        if let Some(note) = self.notes.get_mut(&note_id) {
            note.plates.remove(&EntityRef::new(plate_id));
        }
        Ok(())
    }

    /// Makes `person_id` the owner of `plate_id`, detaching it from any
    /// previous owner.
    pub fn add_plate_to_person(
        &mut self,
        person_id: EntityId,
        plate_id: EntityId,
    ) -> Result<(), GraphError> {
        self.require::<Person>(person_id)?;
        let plate = self.require_mut::<Plate>(plate_id)?;
        let previous = plate.person.replace(EntityRef::new(person_id));
        if let Some(previous) = previous {
            if let Some(owner) = self.people.get_mut(&previous.id) {
                owner.plates.remove(&EntityRef::new(plate_id));
            }
        }
        if let Some(person) = self.people.get_mut(&person_id) {
            person.plates.insert(EntityRef::new(plate_id));
        }
        Ok(())
    }

    /// Detaches `plate_id` from `person_id`. A plate owned by someone else is
    /// left alone.
    pub fn remove_plate_from_person(
        &mut self,
        person_id: EntityId,
        plate_id: EntityId,
    ) -> Result<(), GraphError> {
        self.require::<Person>(person_id)?;
        let plate = self.require_mut::<Plate>(plate_id)?;
        if plate.person.map(|p| p.id) == Some(person_id) {
            plate.person = None;
        }
        if let Some(person) = self.people.get_mut(&person_id) {
            person.plates.remove(&EntityRef::new(plate_id));
        }
        Ok(())
    }

    /// Moves `person_id` into `department_id`.
    pub fn add_person_to_department(
        &mut self,
        department_id: EntityId,
        person_id: EntityId,
    ) -> Result<(), GraphError> {
        self.require::<Department>(department_id)?;
        let person = self.require_mut::<Person>(person_id)?;
        let previous = person.department.replace(EntityRef::new(department_id));
        if let Some(previous) = previous {
            if let Some(department) = self.departments.get_mut(&previous.id) {
                department.people.remove(&EntityRef::new(person_id));
            }
        }
        if let Some(department) = self.departments.get_mut(&department_id) {
            department.people.insert(EntityRef::new(person_id));
        }
        Ok(())
    }

    /// Takes `person_id` out of `department_id`.
    pub fn remove_person_from_department(
        &mut self,
        department_id: EntityId,
        person_id: EntityId,
    ) -> Result<(), GraphError> {
        self.require::<Department>(department_id)?;
        let person = self.require_mut::<Person>(person_id)?;
        if person.department.map(|d| d.id) == Some(department_id) {
            person.department = None;
        }
        if let Some(department) = self.departments.get_mut(&department_id) {
            department.people.remove(&EntityRef::new(person_id));
        }
        Ok(())
    }

    /// Sets or clears the region of a country.
    pub fn link_country_region(
        &mut self,
        country_id: EntityId,
        region_id: Option<EntityId>,
    ) -> Result<(), GraphError> {
        self.link_unique::<Country, Region>(country_id, region_id, "region", |c| &mut c.region)
    }

    /// Sets or clears the country of a location.
    pub fn link_location_country(
        &mut self,
        location_id: EntityId,
        country_id: Option<EntityId>,
    ) -> Result<(), GraphError> {
        self.link_unique::<Location, Country>(location_id, country_id, "country", |l| {
            &mut l.country
        })
    }

    /// Sets or clears the location of a department.
    pub fn link_department_location(
        &mut self,
        department_id: EntityId,
        location_id: Option<EntityId>,
    ) -> Result<(), GraphError> {
        self.link_unique::<Department, Location>(department_id, location_id, "location", |d| {
            &mut d.location
        })
    }

    /// Sets or clears the plate of a history record.
    pub fn link_history_plate(
        &mut self,
        history_id: EntityId,
        plate_id: Option<EntityId>,
    ) -> Result<(), GraphError> {
        self.link_unique::<PlateHistory, Plate>(history_id, plate_id, "plate", |h| &mut h.plate)
    }

    /// Sets or clears the department of a history record.
    pub fn link_history_department(
        &mut self,
        history_id: EntityId,
        department_id: Option<EntityId>,
    ) -> Result<(), GraphError> {
        self.link_unique::<PlateHistory, Department>(history_id, department_id, "department", |h| {
            &mut h.department
        })
    }

    /// Sets or clears the person of a history record.
    pub fn link_history_person(
        &mut self,
        history_id: EntityId,
        person_id: Option<EntityId>,
    ) -> Result<(), GraphError> {
        self.link_unique::<PlateHistory, Person>(history_id, person_id, "person", |h| {
            &mut h.person
        })
    }

    fn link_unique<H: GraphMember, T: GraphMember>(
        &mut self,
        holder_id: EntityId,
        target_id: Option<EntityId>,
        field: &'static str,
        slot: fn(&mut H) -> &mut Option<EntityRef>,
    ) -> Result<(), GraphError> {
        self.require::<H>(holder_id)?;
        if let Some(target_id) = target_id {
            self.require::<T>(target_id)?;
            let taken_by = H::slot_mut(self).iter_mut().find_map(|(id, holder)| {
                let held = slot(holder).map(|r| r.id);
                (*id != holder_id && held == Some(target_id)).then_some(*id)
            });
            if let Some(holder) = taken_by {
                return Err(GraphError::AlreadyLinked {
                    entity: H::descriptor().name,
                    field,
                    target: target_id,
                    holder,
                });
            }
        }
        let holder = self.require_mut::<H>(holder_id)?;
        *slot(holder) = target_id.map(EntityRef::new);
        Ok(())
    }

    fn require<E: GraphMember>(&self, id: EntityId) -> Result<&E, GraphError> {
        E::slot(self).get(&id).ok_or(GraphError::Missing {
            entity: E::descriptor().name,
            id,
        })
    }

    fn require_mut<E: GraphMember>(&mut self, id: EntityId) -> Result<&mut E, GraphError> {
        E::slot_mut(self).get_mut(&id).ok_or(GraphError::Missing {
            entity: E::descriptor().name,
            id,
        })
    }

    fn prune_dangling(&mut self) {
        fn keep(slot: &mut Option<EntityRef>, present: impl Fn(EntityId) -> bool) {
            if slot.is_some_and(|r| !present(r.id)) {
                *slot = None;
            }
        }

        for country in self.countries.values_mut() {
            keep(&mut country.region, |id| self.regions.contains_key(&id));
        }
        for location in self.locations.values_mut() {
            keep(&mut location.country, |id| self.countries.contains_key(&id));
        }
        for department in self.departments.values_mut() {
            keep(&mut department.location, |id| self.locations.contains_key(&id));
        }
        let person_ids: BTreeSet<EntityId> = self.people.keys().copied().collect();
        for person in self.people.values_mut() {
            keep(&mut person.manager, |id| person_ids.contains(&id));
            keep(&mut person.department, |id| self.departments.contains_key(&id));
        }
        for plate in self.plates.values_mut() {
            keep(&mut plate.person, |id| self.people.contains_key(&id));
            if let Some(notes) = plate.notes.as_mut() {
                notes.retain(|n| self.notes.contains_key(&n.id));
            }
        }
        for history in self.histories.values_mut() {
            keep(&mut history.plate, |id| self.plates.contains_key(&id));
            keep(&mut history.department, |id| self.departments.contains_key(&id));
            keep(&mut history.person, |id| self.people.contains_key(&id));
        }
    }

    fn rebuild_inverse(&mut self) {
        for note in self.notes.values_mut() {
            note.plates.clear();
        }
        for person in self.people.values_mut() {
            person.plates.clear();
        }
        for department in self.departments.values_mut() {
            department.people.clear();
        }

        for (plate_id, plate) in &self.plates {
            for note in plate.notes.iter().flatten() {
                if let Some(note) = self.notes.get_mut(&note.id) {
                    note.plates.insert(EntityRef::new(*plate_id));
                }
            }
            if let Some(owner) = plate.person.and_then(|p| self.people.get_mut(&p.id)) {
                owner.plates.insert(EntityRef::new(*plate_id));
            }
        }
        let memberships: Vec<(EntityId, EntityId)> = self
            .people
            .iter()
            .filter_map(|(id, p)| p.department.map(|d| (d.id, *id)))
            .collect();
        for (department_id, person_id) in memberships {
            if let Some(department) = self.departments.get_mut(&department_id) {
                department.people.insert(EntityRef::new(person_id));
            }
        }
    }
}
