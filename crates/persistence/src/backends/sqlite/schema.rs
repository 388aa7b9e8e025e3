//! SQLite schema definitions and migrations.

use rusqlite::Connection;

use crate::error::{BackendError, StorageError, StorageResult};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 2;

fn migration_error(step: &str, e: rusqlite::Error) -> StorageError {
    StorageError::Backend(BackendError::MigrationError {
        message: format!("{}: {}", step, e),
    })
}

/// Initialize the database schema.
pub fn initialize_schema(conn: &Connection) -> StorageResult<()> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        create_schema_v1(conn)?;
        set_schema_version(conn, 1)?;
        migrate_schema(conn, 1)?;
    } else if current_version < SCHEMA_VERSION {
        migrate_schema(conn, current_version)?;
    }

    Ok(())
}

/// Get the current schema version.
fn get_schema_version(conn: &Connection) -> StorageResult<i32> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER NOT NULL
        )",
        [],
    )
    .map_err(|e| migration_error("Failed to create schema_version table", e))?;

    let version: Option<i32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .ok();

    Ok(version.unwrap_or(0))
}

/// Set the schema version.
fn set_schema_version(conn: &Connection, version: i32) -> StorageResult<()> {
    conn.execute("DELETE FROM schema_version", [])
        .map_err(|e| migration_error("Failed to clear schema_version", e))?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])
        .map_err(|e| migration_error("Failed to set schema_version", e))?;
    Ok(())
}

/// Create the initial schema (version 1).
///
/// Tables are created referenced-first so the foreign keys resolve.
fn create_schema_v1(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS region (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            region_name TEXT
        );

        CREATE TABLE IF NOT EXISTS country (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            country_name TEXT,
            region_id INTEGER UNIQUE REFERENCES region (id) ON DELETE SET NULL
        );

        CREATE TABLE IF NOT EXISTS location (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            street_address TEXT,
            postal_code TEXT,
            city TEXT,
            state_province TEXT,
            country_id INTEGER UNIQUE REFERENCES country (id) ON DELETE SET NULL
        );

        CREATE TABLE IF NOT EXISTS department (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            department_name TEXT NOT NULL,
            location_id INTEGER UNIQUE REFERENCES location (id) ON DELETE SET NULL
        );

        CREATE TABLE IF NOT EXISTS person (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT,
            last_name TEXT,
            email TEXT,
            phone_number TEXT,
            hire_date TEXT,
            salary INTEGER,
            commission_pct INTEGER,
            manager_id INTEGER REFERENCES person (id) ON DELETE SET NULL,
            department_id INTEGER REFERENCES department (id) ON DELETE SET NULL
        );

        CREATE TABLE IF NOT EXISTS note (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT,
            description TEXT
        );

        CREATE TABLE IF NOT EXISTS plate (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            plate_title TEXT,
            person_id INTEGER REFERENCES person (id) ON DELETE SET NULL
        );

        CREATE TABLE IF NOT EXISTS plate_note (
            plate_id INTEGER NOT NULL REFERENCES plate (id) ON DELETE CASCADE,
            note_id INTEGER NOT NULL REFERENCES note (id) ON DELETE CASCADE,
            PRIMARY KEY (plate_id, note_id)
        );

        CREATE TABLE IF NOT EXISTS plate_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            start_date TEXT,
            end_date TEXT,
            plate_id INTEGER UNIQUE REFERENCES plate (id) ON DELETE SET NULL,
            department_id INTEGER UNIQUE REFERENCES department (id) ON DELETE SET NULL,
            person_id INTEGER UNIQUE REFERENCES person (id) ON DELETE SET NULL
        );",
    )
    .map_err(|e| migration_error("Failed to create tables", e))
}

/// Run migrations from the given version to the current version.
fn migrate_schema(conn: &Connection, from_version: i32) -> StorageResult<()> {
    let mut version = from_version;

    while version < SCHEMA_VERSION {
        match version {
            1 => migrate_v1_to_v2(conn)?,
            _ => {
                return Err(StorageError::Backend(BackendError::MigrationError {
                    message: format!("Unknown schema version: {}", version),
                }));
            }
        }
        version += 1;
        set_schema_version(conn, version)?;
    }

    Ok(())
}

/// Migrate from schema version 1 to version 2.
///
/// Indexes the many-to-one columns and the target side of the join table.
/// One-to-one columns are already indexed through their UNIQUE constraint.
fn migrate_v1_to_v2(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_person_manager ON person (manager_id);
        CREATE INDEX IF NOT EXISTS idx_person_department ON person (department_id);
        CREATE INDEX IF NOT EXISTS idx_plate_person ON plate (person_id);
        CREATE INDEX IF NOT EXISTS idx_plate_note_note ON plate_note (note_id);",
    )
    .map_err(|e| migration_error("Failed to migrate to v2", e))
}
