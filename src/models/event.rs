use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single timed event within a meet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub sport_group: SportGroup,
    pub created_at: DateTime<Utc>,
}

/// The sport an event belongs to, which decides the lane convention.
///
/// - `Athletics`: 8 lanes
/// - `Swimming` and `Other`: 6 lanes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SportGroup {
    Athletics,
    Swimming,
    Other,
}

impl SportGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Athletics => "athletics",
            Self::Swimming => "swimming",
            Self::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "athletics" => Some(Self::Athletics),
            "swimming" => Some(Self::Swimming),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    /// Number of lanes in a qualifying heat for this sport.
    pub fn lane_count(&self) -> usize {
        match self {
            Self::Athletics => 8,
            Self::Swimming | Self::Other => 6,
        }
    }
}

/// Input for creating a new event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventInput {
    pub name: String,
    pub sport_group: SportGroup,
}
