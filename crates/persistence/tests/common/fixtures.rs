//! Backends and entities for tests.

use std::sync::Arc;

use plates_persistence::backends::sqlite::SqliteBackend;
use plates_persistence::composite::{EntityService, SyncMonitor};
use plates_persistence::core::{PrimaryStore, SearchIndex};
use plates_persistence::domain::{Entity, Note, Person, Plate};

use super::spy::SpyIndex;

/// Creates an in-memory SQLite backend with the schema applied.
pub fn create_backend() -> SqliteBackend {
    let backend = SqliteBackend::in_memory().expect("Failed to create SQLite backend");
    backend.init_schema().expect("Failed to initialize schema");
    backend
}

/// Shared backends for building services over the same stores.
pub struct Harness {
    pub store: Arc<dyn PrimaryStore>,
    pub index: Arc<SpyIndex>,
    pub monitor: Arc<SyncMonitor>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            store: Arc::new(create_backend()),
            index: Arc::new(SpyIndex::new()),
            monitor: Arc::new(SyncMonitor::default()),
        }
    }

    pub fn service<E: Entity>(&self) -> EntityService<E> {
        EntityService::new(
            Arc::clone(&self.store),
            Arc::clone(&self.index) as Arc<dyn SearchIndex>,
            Arc::clone(&self.monitor),
        )
    }
}

pub fn note(title: &str) -> Note {
    Note::new().with_title(title).with_description(format!("about {}", title))
}

pub fn plate(title: &str) -> Plate {
    Plate::new().with_plate_title(title)
}

pub fn person(first: &str, last: &str) -> Person {
    Person::new().with_first_name(first).with_last_name(last)
}
