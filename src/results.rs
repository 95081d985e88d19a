//! Result recorder.
//!
//! Attaches race outcomes to athlete-heat rows and mirrors position and time
//! into the heat's placement snapshot so the two never drift apart.

use uuid::Uuid;

use crate::db::Database;
use crate::error::{MeetError, MeetResult};
use crate::heats::timing::is_valid_finish_time;
use crate::models::*;

#[derive(Clone)]
pub struct ResultRecorder {
    db: Database,
}

impl ResultRecorder {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Records the provided result fields for one athlete in one heat.
    ///
    /// Unset fields keep their stored value, so repeated submissions are last
    /// write wins and never create rows.
    pub fn assign_result(
        &self,
        athlete_id: Uuid,
        heat_id: Uuid,
        input: AssignResultInput,
    ) -> MeetResult<ResultView> {
        if input.position == Some(0) {
            return Err(MeetError::precondition("Position must be 1 or greater"));
        }
        if let Some(time) = input.time.as_deref() {
            if !is_valid_finish_time(time) {
                return Err(MeetError::precondition(format!(
                    "Invalid finishing time {:?}, expected MM:SS:mmm",
                    time
                )));
            }
        }

        self.db.transaction(|store| {
            let mut row = store.find_athlete_heat(athlete_id, heat_id)?.ok_or_else(|| {
                MeetError::not_found(format!("Athlete {} in heat {}", athlete_id, heat_id))
            })?;
            let mut heat = store
                .find_heat(heat_id)?
                .ok_or_else(|| MeetError::not_found(format!("Heat {}", heat_id)))?;
            let athlete = store
                .find_athlete(athlete_id)?
                .ok_or_else(|| MeetError::not_found(format!("Athlete {}", athlete_id)))?;

            let entry = heat
                .placement
                .entry_mut(&athlete.chest_number)
                .ok_or_else(|| {
                    MeetError::not_found(format!(
                        "Chest number {} in {} placement",
                        athlete.chest_number, heat.name
                    ))
                })?;

            if let Some(position) = input.position {
                row.position = Some(position);
                entry.position = Some(position);
            }
            if let Some(time) = input.time {
                entry.time = Some(time.clone());
                row.time = Some(time);
            }
            if let Some(advancement) = input.advancement {
                row.advancement = advancement;
            }

            store.save_athlete_heat(&row)?;
            store.save_heat(&heat)?;

            tracing::info!(
                "Recorded result for {} in {}: position {:?}, time {:?}",
                athlete.chest_number,
                heat.name,
                row.position,
                row.time
            );

            Ok(ResultView::from(&row))
        })
    }

    /// Result sheet for every athlete in every heat of a round.
    pub fn get_results_by_round(&self, round_id: Uuid) -> MeetResult<Vec<RoundResultRow>> {
        self.db.with_store(|store| store.find_results_by_round(round_id))
    }

    /// Marks a round complete once an operator has checked its results.
    pub fn complete_round(&self, round_id: Uuid) -> MeetResult<Round> {
        self.db.transaction(|store| {
            let mut round = store
                .find_round(round_id)?
                .ok_or_else(|| MeetError::not_found(format!("Round {}", round_id)))?;
            round.completed = true;
            store.save_round(&round)?;
            tracing::info!("Round {} marked complete", round.id);
            Ok(round)
        })
    }
}
