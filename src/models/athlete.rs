use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered competitor.
///
/// The chest number is the externally-worn identifier and is what heat
/// placement snapshots display, so it is unique across the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Athlete {
    pub id: Uuid,
    pub name: String,
    pub chest_number: String,
    pub school: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for registering a new athlete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAthleteInput {
    pub name: String,
    pub chest_number: String,
    pub school: Option<String>,
}

/// An athlete's enrollment in an event.
///
/// `entry_order` is the explicit registration order used to fill qualifying
/// heats. It is assigned at enrollment and never reused within an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEntry {
    pub event_id: Uuid,
    pub athlete_id: Uuid,
    pub entry_order: u32,
    pub registered_at: DateTime<Utc>,
}

/// Input for enrolling an existing athlete in an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollAthleteInput {
    pub athlete_id: Uuid,
}
