//! Data-access queries over a borrowed connection.
//!
//! A [`Store`] wraps either a plain connection or an open transaction, so the
//! engine and recorder run the same queries whether or not they are inside a
//! scoped unit of work.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{parse_datetime, parse_uuid};
use crate::error::{MeetError, MeetResult};
use crate::models::*;

const ATHLETE_HEAT_COLUMNS: &str =
    "ah.id, ah.athlete_id, ah.heat_id, ah.lane, ah.position, ah.time, ah.advancement, ah.seed_rank";

pub struct Store<'c> {
    conn: &'c Connection,
}

impl<'c> Store<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    // ============================================================
    // Events
    // ============================================================

    pub fn insert_event(&self, input: CreateEventInput) -> MeetResult<Event> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        self.conn.execute(
            "INSERT INTO events (id, name, sport_group, created_at) VALUES (?, ?, ?, ?)",
            (
                id.to_string(),
                &input.name,
                input.sport_group.as_str(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(Event {
            id,
            name: input.name,
            sport_group: input.sport_group,
            created_at: now,
        })
    }

    pub fn find_event(&self, id: Uuid) -> MeetResult<Option<Event>> {
        let event = self
            .conn
            .query_row(
                "SELECT id, name, sport_group, created_at FROM events WHERE id = ?",
                [id.to_string()],
                event_from_row,
            )
            .optional()?;
        Ok(event)
    }

    pub fn find_all_events(&self) -> MeetResult<Vec<Event>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, sport_group, created_at FROM events ORDER BY name")?;
        let events = stmt
            .query_map([], event_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(events)
    }

    // ============================================================
    // Athletes
    // ============================================================

    pub fn insert_athlete(&self, input: CreateAthleteInput) -> MeetResult<Athlete> {
        if self.find_athlete_by_chest_number(&input.chest_number)?.is_some() {
            return Err(MeetError::precondition(format!(
                "Chest number {} is already assigned",
                input.chest_number
            )));
        }

        let id = Uuid::new_v4();
        let now = Utc::now();

        self.conn.execute(
            "INSERT INTO athletes (id, name, chest_number, school, created_at)
             VALUES (?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &input.name,
                &input.chest_number,
                &input.school,
                now.to_rfc3339(),
            ),
        )?;

        Ok(Athlete {
            id,
            name: input.name,
            chest_number: input.chest_number,
            school: input.school,
            created_at: now,
        })
    }

    pub fn find_athlete(&self, id: Uuid) -> MeetResult<Option<Athlete>> {
        let athlete = self
            .conn
            .query_row(
                "SELECT id, name, chest_number, school, created_at FROM athletes WHERE id = ?",
                [id.to_string()],
                athlete_from_row,
            )
            .optional()?;
        Ok(athlete)
    }

    pub fn find_athlete_by_chest_number(&self, chest_number: &str) -> MeetResult<Option<Athlete>> {
        let athlete = self
            .conn
            .query_row(
                "SELECT id, name, chest_number, school, created_at
                 FROM athletes WHERE chest_number = ?",
                [chest_number],
                athlete_from_row,
            )
            .optional()?;
        Ok(athlete)
    }

    /// Athletes enrolled in an event, in registration order.
    pub fn find_athletes_by_event(&self, event_id: Uuid) -> MeetResult<Vec<Athlete>> {
        let mut stmt = self.conn.prepare(
            "SELECT a.id, a.name, a.chest_number, a.school, a.created_at
             FROM athletes a
             JOIN event_entries e ON e.athlete_id = a.id
             WHERE e.event_id = ?
             ORDER BY e.entry_order",
        )?;
        let athletes = stmt
            .query_map([event_id.to_string()], athlete_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(athletes)
    }

    // ============================================================
    // Event entries
    // ============================================================

    pub fn insert_entry(&self, event_id: Uuid, athlete_id: Uuid) -> MeetResult<EventEntry> {
        let already: i32 = self.conn.query_row(
            "SELECT COUNT(*) FROM event_entries WHERE event_id = ? AND athlete_id = ?",
            (event_id.to_string(), athlete_id.to_string()),
            |row| row.get(0),
        )?;
        if already > 0 {
            return Err(MeetError::precondition(
                "Athlete is already enrolled in this event",
            ));
        }

        let entry_order: u32 = self.conn.query_row(
            "SELECT COALESCE(MAX(entry_order), 0) + 1 FROM event_entries WHERE event_id = ?",
            [event_id.to_string()],
            |row| row.get(0),
        )?;
        let now = Utc::now();

        self.conn.execute(
            "INSERT INTO event_entries (event_id, athlete_id, entry_order, registered_at)
             VALUES (?, ?, ?, ?)",
            (
                event_id.to_string(),
                athlete_id.to_string(),
                entry_order,
                now.to_rfc3339(),
            ),
        )?;

        Ok(EventEntry {
            event_id,
            athlete_id,
            entry_order,
            registered_at: now,
        })
    }

    pub fn find_entries_by_event(&self, event_id: Uuid) -> MeetResult<Vec<EventEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT event_id, athlete_id, entry_order, registered_at
             FROM event_entries WHERE event_id = ? ORDER BY entry_order",
        )?;
        let entries = stmt
            .query_map([event_id.to_string()], |row| {
                Ok(EventEntry {
                    event_id: parse_uuid(row.get::<_, String>(0)?),
                    athlete_id: parse_uuid(row.get::<_, String>(1)?),
                    entry_order: row.get(2)?,
                    registered_at: parse_datetime(row.get::<_, String>(3)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    // ============================================================
    // Rounds
    // ============================================================

    pub fn insert_round(&self, event_id: Uuid, input: CreateRoundInput) -> MeetResult<Round> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        self.conn.execute(
            "INSERT INTO rounds (id, event_id, kind, scheduled_at, completed, created_at)
             VALUES (?, ?, ?, ?, 0, ?)",
            (
                id.to_string(),
                event_id.to_string(),
                input.kind.as_str(),
                input.scheduled_at.map(|t| t.to_rfc3339()),
                now.to_rfc3339(),
            ),
        )?;

        Ok(Round {
            id,
            event_id,
            kind: input.kind,
            scheduled_at: input.scheduled_at,
            completed: false,
            created_at: now,
        })
    }

    pub fn find_round(&self, id: Uuid) -> MeetResult<Option<Round>> {
        let round = self
            .conn
            .query_row(
                "SELECT id, event_id, kind, scheduled_at, completed, created_at
                 FROM rounds WHERE id = ?",
                [id.to_string()],
                round_from_row,
            )
            .optional()?;
        Ok(round)
    }

    /// The earliest-created round of `kind` for an event.
    pub fn find_round_by_event_and_kind(
        &self,
        event_id: Uuid,
        kind: RoundKind,
    ) -> MeetResult<Option<Round>> {
        let round = self
            .conn
            .query_row(
                "SELECT id, event_id, kind, scheduled_at, completed, created_at
                 FROM rounds WHERE event_id = ? AND kind = ?
                 ORDER BY created_at LIMIT 1",
                (event_id.to_string(), kind.as_str()),
                round_from_row,
            )
            .optional()?;
        Ok(round)
    }

    pub fn find_rounds_by_event(&self, event_id: Uuid) -> MeetResult<Vec<Round>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, event_id, kind, scheduled_at, completed, created_at
             FROM rounds WHERE event_id = ? ORDER BY created_at",
        )?;
        let rounds = stmt
            .query_map([event_id.to_string()], round_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rounds)
    }

    pub fn save_round(&self, round: &Round) -> MeetResult<()> {
        let rows = self.conn.execute(
            "UPDATE rounds SET kind = ?, scheduled_at = ?, completed = ? WHERE id = ?",
            (
                round.kind.as_str(),
                round.scheduled_at.map(|t| t.to_rfc3339()),
                if round.completed { 1 } else { 0 },
                round.id.to_string(),
            ),
        )?;
        if rows == 0 {
            return Err(MeetError::not_found(format!("Round {}", round.id)));
        }
        Ok(())
    }

    // ============================================================
    // Heats
    // ============================================================

    pub fn create_heat(
        &self,
        name: &str,
        round_id: Uuid,
        sequence: u32,
        placement_length: usize,
    ) -> MeetResult<Heat> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let placement = Placement::empty(placement_length);

        self.conn.execute(
            "INSERT INTO heats (id, round_id, name, sequence, placement, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                round_id.to_string(),
                name,
                sequence,
                serde_json::to_string(&placement)?,
                now.to_rfc3339(),
            ),
        )?;

        Ok(Heat {
            id,
            round_id,
            name: name.to_string(),
            sequence,
            placement,
            created_at: now,
        })
    }

    pub fn save_heat(&self, heat: &Heat) -> MeetResult<()> {
        let rows = self.conn.execute(
            "UPDATE heats SET name = ?, sequence = ?, placement = ? WHERE id = ?",
            (
                &heat.name,
                heat.sequence,
                serde_json::to_string(&heat.placement)?,
                heat.id.to_string(),
            ),
        )?;
        if rows == 0 {
            return Err(MeetError::not_found(format!("Heat {}", heat.id)));
        }
        Ok(())
    }

    pub fn find_heat(&self, id: Uuid) -> MeetResult<Option<Heat>> {
        let heat = self
            .conn
            .query_row(
                "SELECT id, round_id, name, sequence, placement, created_at
                 FROM heats WHERE id = ?",
                [id.to_string()],
                heat_from_row,
            )
            .optional()?;
        Ok(heat)
    }

    pub fn find_heats_by_round(&self, round_id: Uuid) -> MeetResult<Vec<Heat>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, round_id, name, sequence, placement, created_at
             FROM heats WHERE round_id = ? ORDER BY sequence",
        )?;
        let heats = stmt
            .query_map([round_id.to_string()], heat_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(heats)
    }

    // ============================================================
    // Athlete heats
    // ============================================================

    pub fn create_athlete_heat(
        &self,
        athlete_id: Uuid,
        heat_id: Uuid,
        lane: u32,
        seed_rank: Option<u32>,
    ) -> MeetResult<AthleteHeat> {
        let id = Uuid::new_v4();

        self.conn.execute(
            "INSERT INTO athlete_heats (id, athlete_id, heat_id, lane, advancement, seed_rank)
             VALUES (?, ?, ?, ?, 0, ?)",
            (
                id.to_string(),
                athlete_id.to_string(),
                heat_id.to_string(),
                lane,
                seed_rank,
            ),
        )?;

        Ok(AthleteHeat {
            id,
            athlete_id,
            heat_id,
            lane,
            position: None,
            time: None,
            advancement: false,
            seed_rank,
        })
    }

    pub fn find_athlete_heat(
        &self,
        athlete_id: Uuid,
        heat_id: Uuid,
    ) -> MeetResult<Option<AthleteHeat>> {
        let sql = format!(
            "SELECT {} FROM athlete_heats ah WHERE ah.athlete_id = ? AND ah.heat_id = ?",
            ATHLETE_HEAT_COLUMNS
        );
        let row = self
            .conn
            .query_row(
                &sql,
                (athlete_id.to_string(), heat_id.to_string()),
                athlete_heat_from_row,
            )
            .optional()?;
        Ok(row)
    }

    pub fn find_athlete_heats_by_heat(&self, heat_id: Uuid) -> MeetResult<Vec<AthleteHeat>> {
        let sql = format!(
            "SELECT {} FROM athlete_heats ah WHERE ah.heat_id = ? ORDER BY ah.lane",
            ATHLETE_HEAT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([heat_id.to_string()], athlete_heat_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Best-placed athlete heats across every heat of a round.
    ///
    /// Rows without a position cannot be ranked and are left out. Equal
    /// positions from different heats fall back to time, then heat sequence,
    /// then lane.
    pub fn find_athlete_heats_by_round_ordered_by_position(
        &self,
        round_id: Uuid,
        limit: u32,
    ) -> MeetResult<Vec<AthleteHeat>> {
        let sql = format!(
            "SELECT {} FROM athlete_heats ah
             JOIN heats h ON h.id = ah.heat_id
             WHERE h.round_id = ? AND ah.position IS NOT NULL
             ORDER BY ah.position, ah.time IS NULL, ah.time, h.sequence, ah.lane
             LIMIT ?",
            ATHLETE_HEAT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map((round_id.to_string(), limit), athlete_heat_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Every athlete heat of a round, tagged with its heat sequence and ordered
    /// by heat sequence then lane.
    pub fn find_heat_entries_by_round(&self, round_id: Uuid) -> MeetResult<Vec<HeatEntry>> {
        let sql = format!(
            "SELECT {}, h.sequence FROM athlete_heats ah
             JOIN heats h ON h.id = ah.heat_id
             WHERE h.round_id = ?
             ORDER BY h.sequence, ah.lane",
            ATHLETE_HEAT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([round_id.to_string()], |row| {
                Ok(HeatEntry {
                    heat_sequence: row.get(8)?,
                    athlete_heat: athlete_heat_from_row(row)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn save_athlete_heat(&self, row: &AthleteHeat) -> MeetResult<()> {
        let rows = self.conn.execute(
            "UPDATE athlete_heats
             SET heat_id = ?, lane = ?, position = ?, time = ?, advancement = ?, seed_rank = ?
             WHERE id = ?",
            (
                row.heat_id.to_string(),
                row.lane,
                row.position,
                &row.time,
                if row.advancement { 1 } else { 0 },
                row.seed_rank,
                row.id.to_string(),
            ),
        )?;
        if rows == 0 {
            return Err(MeetError::not_found(format!("Athlete heat {}", row.id)));
        }
        Ok(())
    }

    /// Flattened result rows for every athlete in every heat of a round.
    pub fn find_results_by_round(&self, round_id: Uuid) -> MeetResult<Vec<RoundResultRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT ah.athlete_id, ah.heat_id, a.name, a.chest_number, h.name,
                    ah.lane, ah.position, ah.time, ah.advancement
             FROM athlete_heats ah
             JOIN heats h ON h.id = ah.heat_id
             JOIN athletes a ON a.id = ah.athlete_id
             WHERE h.round_id = ?
             ORDER BY h.sequence, ah.lane",
        )?;
        let rows = stmt
            .query_map([round_id.to_string()], |row| {
                Ok(RoundResultRow {
                    athlete_id: parse_uuid(row.get::<_, String>(0)?),
                    heat_id: parse_uuid(row.get::<_, String>(1)?),
                    athlete_name: row.get(2)?,
                    chest_number: row.get(3)?,
                    heat_name: row.get(4)?,
                    lane: row.get(5)?,
                    position: row.get(6)?,
                    time: row.get(7)?,
                    advancement: row.get::<_, i32>(8)? != 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<Event> {
    Ok(Event {
        id: parse_uuid(row.get::<_, String>(0)?),
        name: row.get(1)?,
        sport_group: SportGroup::from_str(&row.get::<_, String>(2)?).unwrap_or(SportGroup::Other),
        created_at: parse_datetime(row.get::<_, String>(3)?),
    })
}

fn athlete_from_row(row: &Row<'_>) -> rusqlite::Result<Athlete> {
    Ok(Athlete {
        id: parse_uuid(row.get::<_, String>(0)?),
        name: row.get(1)?,
        chest_number: row.get(2)?,
        school: row.get(3)?,
        created_at: parse_datetime(row.get::<_, String>(4)?),
    })
}

fn round_from_row(row: &Row<'_>) -> rusqlite::Result<Round> {
    Ok(Round {
        id: parse_uuid(row.get::<_, String>(0)?),
        event_id: parse_uuid(row.get::<_, String>(1)?),
        kind: RoundKind::from_str(&row.get::<_, String>(2)?).unwrap_or(RoundKind::Heats),
        scheduled_at: row.get::<_, Option<String>>(3)?.map(parse_datetime),
        completed: row.get::<_, i32>(4)? != 0,
        created_at: parse_datetime(row.get::<_, String>(5)?),
    })
}

fn heat_from_row(row: &Row<'_>) -> rusqlite::Result<Heat> {
    let placement_json: String = row.get(4)?;
    let placement = serde_json::from_str(&placement_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Heat {
        id: parse_uuid(row.get::<_, String>(0)?),
        round_id: parse_uuid(row.get::<_, String>(1)?),
        name: row.get(2)?,
        sequence: row.get(3)?,
        placement,
        created_at: parse_datetime(row.get::<_, String>(5)?),
    })
}

fn athlete_heat_from_row(row: &Row<'_>) -> rusqlite::Result<AthleteHeat> {
    Ok(AthleteHeat {
        id: parse_uuid(row.get::<_, String>(0)?),
        athlete_id: parse_uuid(row.get::<_, String>(1)?),
        heat_id: parse_uuid(row.get::<_, String>(2)?),
        lane: row.get(3)?,
        position: row.get(4)?,
        time: row.get(5)?,
        advancement: row.get::<_, i32>(6)? != 0,
        seed_rank: row.get(7)?,
    })
}
