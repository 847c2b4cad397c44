//! SQLite storage backend.
//!
//! A single file holds users, entities, and events. Windows are computed in
//! the process-local time zone, the same zone clients use for accounting.

mod row;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::entity::{Entity, EntityUpdate, NewEntity};
use crate::error::{DailiesError, Result};
use crate::event::{Event, EventDetails, NewEvent};
use crate::storage::traits::Storage;
use crate::storage::types::{EntityFilter, StoreMetadata, UpsertOutcome, User};
use crate::time_window::{window_for, TimeWindow};

use row::{parse_uuid, EntityRow, EventRow, ENTITY_COLUMNS, EVENT_COLUMNS};

const FORMAT_VERSION: &str = "0.1";

const SCHEMA: &str = r#"
    CREATE TABLE meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE users (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        token_identifier TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL
    );

    CREATE TABLE entities (
        id TEXT PRIMARY KEY,
        owner_id TEXT NOT NULL,
        name TEXT NOT NULL,
        category TEXT NOT NULL,
        entity_type TEXT NOT NULL,
        is_required INTEGER NOT NULL,
        reset_after_interval TEXT NOT NULL,
        num_required_completions INTEGER,
        included_event_fields_json TEXT NOT NULL,
        created_at TEXT NOT NULL,

        FOREIGN KEY(owner_id) REFERENCES users(id)
    );

    CREATE INDEX entities_by_owner ON entities (owner_id);

    CREATE TABLE events (
        id TEXT PRIMARY KEY,
        owner_id TEXT NOT NULL,
        entity_id TEXT NOT NULL,
        timestamp INTEGER NOT NULL,
        details_json TEXT NOT NULL,

        FOREIGN KEY(owner_id) REFERENCES users(id),
        FOREIGN KEY(entity_id) REFERENCES entities(id)
    );

    CREATE INDEX events_by_entity_id ON events (entity_id, timestamp);
"#;

/// SQLite-backed storage.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Create a fresh database that lives only as long as this value.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Lock the database connection, returning an error if the mutex is poisoned.
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| DailiesError::Storage("SQLite connection poisoned".to_string()))
    }

    fn initialize(conn: &Connection) -> Result<()> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;

        let created_at = Utc::now().to_rfc3339();
        for (key, value) in [
            ("format_version", FORMAT_VERSION),
            ("created_at", created_at.as_str()),
            ("last_modified", created_at.as_str()),
        ] {
            conn.execute("INSERT INTO meta (key, value) VALUES (?, ?)", [key, value])?;
        }
        Ok(())
    }

    fn touch(conn: &Connection) -> Result<()> {
        conn.execute(
            "UPDATE meta SET value = ? WHERE key = 'last_modified'",
            [Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn meta_value(conn: &Connection, key: &str) -> Result<String> {
        conn.query_row("SELECT value FROM meta WHERE key = ?", [key], |row| {
            row.get(0)
        })
        .optional()?
        .ok_or_else(|| DailiesError::Storage(format!("Missing metadata key: {}", key)))
    }

    fn meta_timestamp(conn: &Connection, key: &str) -> Result<DateTime<Utc>> {
        let value = Self::meta_value(conn, key)?;
        Ok(DateTime::parse_from_rfc3339(&value)
            .map_err(|e| DailiesError::Storage(format!("Invalid {} timestamp: {}", key, e)))?
            .with_timezone(&Utc))
    }

    fn user_by_token(conn: &Connection, token_identifier: &str) -> Result<Option<User>> {
        let row = conn
            .query_row(
                "SELECT id, name, token_identifier FROM users WHERE token_identifier = ?",
                [token_identifier],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id, name, token_identifier)| {
            Ok(User {
                id: parse_uuid(&id, "user")?,
                name,
                token_identifier,
            })
        })
        .transpose()
    }

    fn entity_by_id(conn: &Connection, owner_id: &Uuid, id: &Uuid) -> Result<Option<Entity>> {
        let query = format!(
            "SELECT {} FROM entities WHERE owner_id = ? AND id = ?",
            ENTITY_COLUMNS
        );
        let row = conn
            .query_row(
                &query,
                [owner_id.to_string(), id.to_string()],
                EntityRow::from_row,
            )
            .optional()?;
        row.map(Entity::try_from).transpose()
    }

    fn require_entity(conn: &Connection, owner_id: &Uuid, id: &Uuid) -> Result<Entity> {
        Self::entity_by_id(conn, owner_id, id)?
            .ok_or_else(|| DailiesError::NotFound(format!("Entity not found: {}", id)))
    }

    fn event_by_id(conn: &Connection, owner_id: &Uuid, id: &Uuid) -> Result<Option<Event>> {
        let query = format!(
            "SELECT {} FROM events WHERE owner_id = ? AND id = ?",
            EVENT_COLUMNS
        );
        let row = conn
            .query_row(
                &query,
                [owner_id.to_string(), id.to_string()],
                EventRow::from_row,
            )
            .optional()?;
        row.map(Event::try_from).transpose()
    }

    fn event_in_window(
        conn: &Connection,
        owner_id: &Uuid,
        entity_id: &Uuid,
        window: &TimeWindow,
    ) -> Result<Option<Event>> {
        let query = format!(
            "SELECT {} FROM events
             WHERE owner_id = ? AND entity_id = ? AND timestamp >= ? AND timestamp <= ?
             ORDER BY timestamp DESC
             LIMIT 1",
            EVENT_COLUMNS
        );
        let row = conn
            .query_row(
                &query,
                (
                    owner_id.to_string(),
                    entity_id.to_string(),
                    window.start_timestamp,
                    window.end_timestamp,
                ),
                EventRow::from_row,
            )
            .optional()?;
        row.map(Event::try_from).transpose()
    }

    /// Load an event and its entity, refusing events whose window has closed.
    fn open_window_event(
        conn: &Connection,
        owner_id: &Uuid,
        id: &Uuid,
        now: i64,
    ) -> Result<(Event, Entity)> {
        let event = Self::event_by_id(conn, owner_id, id)?
            .ok_or_else(|| DailiesError::NotFound(format!("Event not found: {}", id)))?;
        let entity = Self::require_entity(conn, owner_id, &event.entity_id)?;
        let window = window_for(entity.reset_after_interval, event.timestamp);
        if window.is_closed_at(now) {
            return Err(DailiesError::WindowClosed(format!(
                "Event {} belongs to a {} window that has already ended",
                id, entity.reset_after_interval
            )));
        }
        Ok((event, entity))
    }

    fn insert_event_row(
        conn: &Connection,
        owner_id: &Uuid,
        entity_id: &Uuid,
        timestamp: i64,
        details: &EventDetails,
    ) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let details_json = serde_json::to_string(details)
            .map_err(|e| DailiesError::Storage(format!("Failed to serialize details: {}", e)))?;
        conn.execute(
            "INSERT INTO events (id, owner_id, entity_id, timestamp, details_json)
             VALUES (?, ?, ?, ?, ?)",
            (
                id.to_string(),
                owner_id.to_string(),
                entity_id.to_string(),
                timestamp,
                details_json,
            ),
        )?;
        Ok(id)
    }

    fn has_events(conn: &Connection, owner_id: &Uuid, entity_id: &Uuid) -> Result<bool> {
        let found = conn
            .query_row(
                "SELECT 1 FROM events WHERE owner_id = ? AND entity_id = ? LIMIT 1",
                [owner_id.to_string(), entity_id.to_string()],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn write_entity(conn: &Connection, entity: &Entity) -> Result<()> {
        let fields: Vec<&str> = entity
            .included_event_fields
            .iter()
            .map(|field| field.as_str())
            .collect();
        let fields_json = serde_json::to_string(&fields)
            .map_err(|e| DailiesError::Storage(format!("Failed to serialize fields: {}", e)))?;

        conn.execute(
            r#"
            UPDATE entities
            SET name = ?, is_required = ?, reset_after_interval = ?,
                num_required_completions = ?, included_event_fields_json = ?
            WHERE owner_id = ? AND id = ?
            "#,
            (
                entity.name.as_str(),
                entity.is_required,
                entity.reset_after_interval.as_str(),
                entity.num_required_completions,
                fields_json,
                entity.owner_id.to_string(),
                entity.id.to_string(),
            ),
        )?;
        Ok(())
    }
}

impl Storage for SqliteStorage {
    fn create(path: &Path) -> Result<Self> {
        if path.exists() {
            return Err(DailiesError::Storage(format!(
                "Database already exists: {}",
                path.display()
            )));
        }

        let conn = Connection::open(path)?;
        Self::initialize(&conn)?;
        tracing::info!(path = %path.display(), "created database");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DailiesError::Storage(format!(
                "Database not found: {}",
                path.display()
            )));
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let format_version = Self::meta_value(&conn, "format_version")
            .map_err(|_| DailiesError::Storage("Not a Dailies database".to_string()))?;
        if format_version != FORMAT_VERSION {
            return Err(DailiesError::Storage(format!(
                "Unsupported database format version: {}",
                format_version
            )));
        }

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn metadata(&self) -> Result<StoreMetadata> {
        let conn = self.lock_conn()?;
        Ok(StoreMetadata {
            format_version: Self::meta_value(&conn, "format_version")?,
            created_at: Self::meta_timestamp(&conn, "created_at")?,
            last_modified: Self::meta_timestamp(&conn, "last_modified")?,
        })
    }

    fn ensure_user(&mut self, token_identifier: &str, name: Option<&str>) -> Result<User> {
        let token_identifier = token_identifier.trim();
        if token_identifier.is_empty() {
            return Err(DailiesError::InvalidInput(
                "Identity token cannot be empty".to_string(),
            ));
        }
        let name = name.map(str::trim).filter(|value| !value.is_empty());

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        if let Some(mut user) = Self::user_by_token(&tx, token_identifier)? {
            if let Some(name) = name {
                if user.name != name {
                    tx.execute(
                        "UPDATE users SET name = ? WHERE id = ?",
                        (name, user.id.to_string()),
                    )?;
                    Self::touch(&tx)?;
                    user.name = name.to_string();
                }
            }
            tx.commit()?;
            return Ok(user);
        }

        let user = User {
            id: Uuid::new_v4(),
            name: name.unwrap_or("Anonymous").to_string(),
            token_identifier: token_identifier.to_string(),
        };
        tx.execute(
            "INSERT INTO users (id, name, token_identifier, created_at) VALUES (?, ?, ?, ?)",
            (
                user.id.to_string(),
                user.name.as_str(),
                user.token_identifier.as_str(),
                Utc::now().to_rfc3339(),
            ),
        )?;
        Self::touch(&tx)?;
        tx.commit()?;

        tracing::info!(user_id = %user.id, "registered user");
        Ok(user)
    }

    fn get_user_by_token(&self, token_identifier: &str) -> Result<Option<User>> {
        let conn = self.lock_conn()?;
        Self::user_by_token(&conn, token_identifier.trim())
    }

    fn create_entity(&mut self, owner_id: &Uuid, entity: &NewEntity) -> Result<Uuid> {
        let entity = entity.validate()?;

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        let owner_exists: Option<String> = tx
            .query_row(
                "SELECT id FROM users WHERE id = ?",
                [owner_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        if owner_exists.is_none() {
            return Err(DailiesError::NotFound(format!("Owner not found: {}", owner_id)));
        }

        let fields: Vec<&str> = entity
            .included_event_fields
            .iter()
            .map(|field| field.as_str())
            .collect();
        let fields_json = serde_json::to_string(&fields)
            .map_err(|e| DailiesError::Storage(format!("Failed to serialize fields: {}", e)))?;

        let id = Uuid::new_v4();
        tx.execute(
            r#"
            INSERT INTO entities (
                id,
                owner_id,
                name,
                category,
                entity_type,
                is_required,
                reset_after_interval,
                num_required_completions,
                included_event_fields_json,
                created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            (
                id.to_string(),
                owner_id.to_string(),
                entity.name.as_str(),
                entity.category.as_str(),
                entity.entity_type.as_str(),
                entity.is_required,
                entity.reset_after_interval.as_str(),
                entity.num_required_completions,
                fields_json,
                Utc::now().to_rfc3339(),
            ),
        )?;
        Self::touch(&tx)?;
        tx.commit()?;

        tracing::debug!(entity_id = %id, entity_type = %entity.entity_type, "created entity");
        Ok(id)
    }

    fn get_entity(&self, owner_id: &Uuid, id: &Uuid) -> Result<Option<Entity>> {
        let conn = self.lock_conn()?;
        Self::entity_by_id(&conn, owner_id, id)
    }

    fn list_entities(&self, owner_id: &Uuid, filter: &EntityFilter) -> Result<Vec<Entity>> {
        let conn = self.lock_conn()?;

        let mut conditions = vec!["owner_id = ?".to_string()];
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(owner_id.to_string())];

        if let Some(entity_type) = filter.entity_type {
            conditions.push("entity_type = ?".to_string());
            params.push(Box::new(entity_type.as_str()));
        }
        if let Some(category) = filter.category {
            conditions.push("category = ?".to_string());
            params.push(Box::new(category.as_str()));
        }

        let query = format!(
            "SELECT {} FROM entities WHERE {} ORDER BY created_at, rowid",
            ENTITY_COLUMNS,
            conditions.join(" AND ")
        );
        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map(
            rusqlite::params_from_iter(params.iter()),
            EntityRow::from_row,
        )?;

        let mut entities = Vec::new();
        for row in rows {
            entities.push(Entity::try_from(row?)?);
        }
        Ok(entities)
    }

    fn update_entity(
        &mut self,
        owner_id: &Uuid,
        id: &Uuid,
        update: &EntityUpdate,
    ) -> Result<Entity> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        let existing = Self::require_entity(&tx, owner_id, id)?;
        let updated = update.apply_to(&existing)?;
        if updated.reset_after_interval != existing.reset_after_interval
            && Self::has_events(&tx, owner_id, id)?
        {
            return Err(DailiesError::Validation(format!(
                "Reset interval of \"{}\" cannot change once events are logged",
                existing.name
            )));
        }
        Self::write_entity(&tx, &updated)?;
        Self::touch(&tx)?;
        tx.commit()?;

        tracing::debug!(entity_id = %id, "updated entity");
        Ok(updated)
    }

    fn list_events(&self, owner_id: &Uuid, entity_id: &Uuid) -> Result<Vec<Event>> {
        let conn = self.lock_conn()?;
        let query = format!(
            "SELECT {} FROM events WHERE owner_id = ? AND entity_id = ?
             ORDER BY timestamp DESC, rowid DESC",
            EVENT_COLUMNS
        );
        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map(
            [owner_id.to_string(), entity_id.to_string()],
            EventRow::from_row,
        )?;

        let mut events = Vec::new();
        for row in rows {
            events.push(Event::try_from(row?)?);
        }
        Ok(events)
    }

    fn get_event(&self, owner_id: &Uuid, id: &Uuid) -> Result<Option<Event>> {
        let conn = self.lock_conn()?;
        Self::event_by_id(&conn, owner_id, id)
    }

    fn current_event(
        &self,
        owner_id: &Uuid,
        entity_id: &Uuid,
        window: &TimeWindow,
    ) -> Result<Option<Event>> {
        let conn = self.lock_conn()?;
        Self::event_in_window(&conn, owner_id, entity_id, window)
    }

    fn insert_event(&mut self, owner_id: &Uuid, event: &NewEvent) -> Result<Uuid> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        let entity = Self::require_entity(&tx, owner_id, &event.entity_id)?;
        event.details.validate_for(entity.entity_type)?;

        let window = window_for(entity.reset_after_interval, event.timestamp);
        if let Some(existing) = Self::event_in_window(&tx, owner_id, &entity.id, &window)? {
            return Err(DailiesError::Validation(format!(
                "\"{}\" already has event {} for that {} window",
                entity.name, existing.id, entity.reset_after_interval
            )));
        }

        let id = Self::insert_event_row(
            &tx,
            owner_id,
            &entity.id,
            event.timestamp,
            &event.details,
        )?;
        Self::touch(&tx)?;
        tx.commit()?;

        tracing::debug!(event_id = %id, entity_id = %entity.id, "inserted event");
        Ok(id)
    }

    fn upsert_current_event(
        &mut self,
        owner_id: &Uuid,
        entity_id: &Uuid,
        now: i64,
        details: &EventDetails,
    ) -> Result<UpsertOutcome> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        let entity = Self::require_entity(&tx, owner_id, entity_id)?;
        details.validate_for(entity.entity_type)?;

        let window = window_for(entity.reset_after_interval, now);
        let outcome = match Self::event_in_window(&tx, owner_id, entity_id, &window)? {
            Some(existing) => {
                let details_json = serde_json::to_string(details).map_err(|e| {
                    DailiesError::Storage(format!("Failed to serialize details: {}", e))
                })?;
                tx.execute(
                    "UPDATE events SET timestamp = ?, details_json = ? WHERE id = ?",
                    (now, details_json, existing.id.to_string()),
                )?;
                UpsertOutcome::Replaced(existing.id)
            }
            None => UpsertOutcome::Inserted(Self::insert_event_row(
                &tx, owner_id, entity_id, now, details,
            )?),
        };
        Self::touch(&tx)?;
        tx.commit()?;

        tracing::debug!(
            event_id = %outcome.event_id(),
            entity_id = %entity_id,
            replaced = outcome.was_replaced(),
            "upserted current event"
        );
        Ok(outcome)
    }

    fn update_event(
        &mut self,
        owner_id: &Uuid,
        id: &Uuid,
        details: &EventDetails,
        now: i64,
    ) -> Result<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        let (_event, entity) = Self::open_window_event(&tx, owner_id, id, now)?;
        details.validate_for(entity.entity_type)?;

        let details_json = serde_json::to_string(details)
            .map_err(|e| DailiesError::Storage(format!("Failed to serialize details: {}", e)))?;
        tx.execute(
            "UPDATE events SET details_json = ? WHERE owner_id = ? AND id = ?",
            (details_json, owner_id.to_string(), id.to_string()),
        )?;
        Self::touch(&tx)?;
        tx.commit()?;

        tracing::debug!(event_id = %id, "updated event");
        Ok(())
    }

    fn delete_event(&mut self, owner_id: &Uuid, id: &Uuid, now: i64) -> Result<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        Self::open_window_event(&tx, owner_id, id, now)?;
        tx.execute(
            "DELETE FROM events WHERE owner_id = ? AND id = ?",
            [owner_id.to_string(), id.to_string()],
        )?;
        Self::touch(&tx)?;
        tx.commit()?;

        tracing::debug!(event_id = %id, "deleted event");
        Ok(())
    }

    fn check_integrity(&self) -> Result<()> {
        let conn = self.lock_conn()?;

        let integrity: String = conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        if integrity != "ok" {
            return Err(DailiesError::Storage(format!(
                "SQLite integrity check failed: {}",
                integrity
            )));
        }

        let fk_violation: Option<String> = conn
            .query_row("PRAGMA foreign_key_check", [], |row| row.get(0))
            .optional()?;
        if let Some(table) = fk_violation {
            return Err(DailiesError::Storage(format!(
                "Foreign key violation in table {}",
                table
            )));
        }

        for key in ["format_version", "created_at", "last_modified"] {
            Self::meta_value(&conn, key)?;
        }

        let mut stmt = conn.prepare(
            "SELECT ev.id, en.entity_type, ev.details_json
             FROM events ev JOIN entities en ON en.id = ev.entity_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        for row in rows {
            let (event_id, entity_type, details_json) = row?;
            let details: EventDetails = serde_json::from_str(&details_json).map_err(|e| {
                DailiesError::Storage(format!("Event {} has invalid details: {}", event_id, e))
            })?;
            if details.entity_type().as_str() != entity_type {
                return Err(DailiesError::Storage(format!(
                    "Event {} has {} details but its entity is {}",
                    event_id,
                    details.entity_type(),
                    entity_type
                )));
            }
        }

        Ok(())
    }
}
