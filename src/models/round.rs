use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One stage of an event.
///
/// Rounds are created when an event is scheduled. The `completed` flag is set
/// by an operator once every heat in the round has recorded results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    pub id: Uuid,
    pub event_id: Uuid,
    pub kind: RoundKind,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// The stage a round represents.
///
/// - `Heats`: Qualifying heats built from the event roster
/// - `Semifinals`: Three cross-seeded heats built from the 24 best qualifiers
/// - `Final`: A single heat of auto-qualifiers and fastest losers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RoundKind {
    Heats,
    Semifinals,
    Final,
}

impl RoundKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Heats => "heats",
            Self::Semifinals => "semifinals",
            Self::Final => "final",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "heats" => Some(Self::Heats),
            "semifinals" => Some(Self::Semifinals),
            "final" => Some(Self::Final),
            _ => None,
        }
    }
}

/// Input for scheduling a round of an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoundInput {
    pub kind: RoundKind,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
}
