mod schema;
mod store;

pub use store::Store;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;
use uuid::Uuid;

use crate::error::{MeetError, MeetResult};
use crate::models::*;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    /// Runs `f` against the connection without a surrounding transaction.
    pub fn with_store<T>(&self, f: impl FnOnce(&Store<'_>) -> MeetResult<T>) -> MeetResult<T> {
        let conn = self.conn.lock().expect("database lock poisoned");
        f(&Store::new(&conn))
    }

    /// Runs `f` inside a single transaction.
    ///
    /// The transaction commits when `f` returns `Ok` and rolls back when it
    /// returns `Err`, so a failed multi-step write leaves nothing behind.
    pub fn transaction<T>(&self, f: impl FnOnce(&Store<'_>) -> MeetResult<T>) -> MeetResult<T> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;
        let value = f(&Store::new(&tx))?;
        tx.commit()?;
        Ok(value)
    }

    // ============================================================
    // Event operations
    // ============================================================

    pub fn create_event(&self, input: CreateEventInput) -> MeetResult<Event> {
        self.with_store(|store| store.insert_event(input))
    }

    pub fn get_event(&self, id: Uuid) -> MeetResult<Option<Event>> {
        self.with_store(|store| store.find_event(id))
    }

    pub fn get_all_events(&self) -> MeetResult<Vec<Event>> {
        self.with_store(|store| store.find_all_events())
    }

    // ============================================================
    // Athlete operations
    // ============================================================

    pub fn create_athlete(&self, input: CreateAthleteInput) -> MeetResult<Athlete> {
        self.transaction(|store| store.insert_athlete(input))
    }

    pub fn get_athlete(&self, id: Uuid) -> MeetResult<Option<Athlete>> {
        self.with_store(|store| store.find_athlete(id))
    }

    pub fn enroll_athlete(&self, event_id: Uuid, input: EnrollAthleteInput) -> MeetResult<EventEntry> {
        self.transaction(|store| {
            store
                .find_event(event_id)?
                .ok_or_else(|| MeetError::not_found(format!("Event {}", event_id)))?;
            store
                .find_athlete(input.athlete_id)?
                .ok_or_else(|| MeetError::not_found(format!("Athlete {}", input.athlete_id)))?;
            store.insert_entry(event_id, input.athlete_id)
        })
    }

    pub fn get_event_athletes(&self, event_id: Uuid) -> MeetResult<Vec<Athlete>> {
        self.with_store(|store| store.find_athletes_by_event(event_id))
    }

    pub fn get_event_entries(&self, event_id: Uuid) -> MeetResult<Vec<EventEntry>> {
        self.with_store(|store| store.find_entries_by_event(event_id))
    }

    // ============================================================
    // Round operations
    // ============================================================

    pub fn create_round(&self, event_id: Uuid, input: CreateRoundInput) -> MeetResult<Round> {
        self.transaction(|store| {
            store
                .find_event(event_id)?
                .ok_or_else(|| MeetError::not_found(format!("Event {}", event_id)))?;
            store.insert_round(event_id, input)
        })
    }

    pub fn get_round(&self, id: Uuid) -> MeetResult<Option<Round>> {
        self.with_store(|store| store.find_round(id))
    }

    pub fn get_rounds_by_event(&self, event_id: Uuid) -> MeetResult<Vec<Round>> {
        self.with_store(|store| store.find_rounds_by_event(event_id))
    }

    // ============================================================
    // Heat operations
    // ============================================================

    pub fn get_heat(&self, id: Uuid) -> MeetResult<Option<HeatWithAthletes>> {
        self.with_store(|store| {
            let Some(heat) = store.find_heat(id)? else {
                return Ok(None);
            };
            let athletes = store.find_athlete_heats_by_heat(heat.id)?;
            Ok(Some(HeatWithAthletes { heat, athletes }))
        })
    }

    /// Heat sheet for a round: heats in sequence order with their athlete rows.
    pub fn get_heats_by_round(&self, round_id: Uuid) -> MeetResult<Vec<HeatWithAthletes>> {
        self.with_store(|store| {
            store
                .find_heats_by_round(round_id)?
                .into_iter()
                .map(|heat| -> MeetResult<HeatWithAthletes> {
                    let athletes = store.find_athlete_heats_by_heat(heat.id)?;
                    Ok(HeatWithAthletes { heat, athletes })
                })
                .collect()
        })
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

/// Database file under the platform data directory.
pub fn default_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "trackmeet")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(dirs.data_dir().join("trackmeet.db"))
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
