use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authoritative record of one athlete racing in one heat.
///
/// Created by the heat engine with a lane and no result. Position, time and
/// the advancement flag are written only by the result recorder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AthleteHeat {
    pub id: Uuid,
    pub athlete_id: Uuid,
    pub heat_id: Uuid,
    /// 1-based lane, unique within the heat.
    pub lane: u32,
    pub position: Option<u32>,
    /// Finishing time as `MM:SS:mmm`.
    pub time: Option<String>,
    pub advancement: bool,
    /// Rank the athlete carried into this round, for seeded rounds.
    pub seed_rank: Option<u32>,
}

/// Result fields submitted for an athlete after a heat has run.
/// Only the fields that are set are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssignResultInput {
    pub position: Option<u32>,
    pub time: Option<String>,
    pub advancement: Option<bool>,
}

/// Flattened view returned after recording a result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultView {
    pub athlete_id: Uuid,
    pub heat_id: Uuid,
    pub lane: u32,
    pub position: Option<u32>,
    pub time: Option<String>,
    pub advancement: bool,
}

impl From<&AthleteHeat> for ResultView {
    fn from(row: &AthleteHeat) -> Self {
        Self {
            athlete_id: row.athlete_id,
            heat_id: row.heat_id,
            lane: row.lane,
            position: row.position,
            time: row.time.clone(),
            advancement: row.advancement,
        }
    }
}

/// One row of a round's result sheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundResultRow {
    pub athlete_id: Uuid,
    pub heat_id: Uuid,
    pub athlete_name: String,
    pub chest_number: String,
    pub heat_name: String,
    pub lane: u32,
    pub position: Option<u32>,
    pub time: Option<String>,
    pub advancement: bool,
}

/// An athlete-heat row tagged with the sequence of the heat it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeatEntry {
    pub heat_sequence: u32,
    pub athlete_heat: AthleteHeat,
}
