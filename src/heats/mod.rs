//! Heat assignment engine.
//!
//! Builds the heats of a round and places every athlete in exactly one lane:
//!
//! - Qualifying heats are filled from the event roster in registration order,
//!   then the last heat is topped up if it fell below half strength.
//! - Semifinals cross-seed the 24 best-placed qualifiers into three heats.
//! - The final takes the top three of each semifinal plus the fastest losers.
//!
//! Each generation runs in one database transaction. The engine has no
//! duplicate guard: generating the same round twice creates a second set of
//! heats, so callers must serialize generation per round.

pub mod seeding;
pub mod timing;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{Database, Store};
use crate::error::{MeetError, MeetResult};
use crate::models::*;
use seeding::{
    seed_semifinals, select_finalists, HeatPartition, LaneMove, Qualification,
    SEEDED_HEAT_LANES, SEMIFINAL_FIELD,
};

/// Outcome of qualifying-heat generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualifierHeats {
    pub heats: Vec<Heat>,
    /// Balancing moves that could not be applied. The athletes involved
    /// stayed in their original lanes.
    pub skipped_moves: Vec<SkippedMove>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedMove {
    pub from_heat_id: Uuid,
    pub from_lane: u32,
    pub to_heat_id: Uuid,
    pub to_lane: u32,
    pub reason: String,
}

/// Outcome of final-heat generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalHeat {
    pub heat: Heat,
    pub athletes: Vec<AthleteHeat>,
    /// Selected athletes left over once every final lane was filled, in
    /// selection order. Seating is rank-major across heats, so with three full
    /// semifinals the third-placed auto-qualifier of the last heat and both
    /// fastest losers end up here.
    pub unseated: Vec<Uuid>,
}

#[derive(Clone)]
pub struct HeatEngine {
    db: Database,
}

impl HeatEngine {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Builds the qualifying heats of `round_id` from the event roster.
    pub fn generate_qualifier_heats(&self, round_id: Uuid) -> MeetResult<QualifierHeats> {
        self.db.transaction(|store| {
            let (round, event) = resolve_round(store, round_id)?;

            let athletes = store.find_athletes_by_event(event.id)?;
            if athletes.is_empty() {
                return Err(MeetError::not_found(format!(
                    "Athletes for event {}",
                    event.name
                )));
            }

            let lanes = event.sport_group.lane_count();
            let partition = HeatPartition::new(athletes.len(), lanes);

            let mut heats = Vec::with_capacity(partition.heat_count());
            for sequence in 1..=partition.heat_count() as u32 {
                heats.push(store.create_heat(
                    &format!("Heat {}", sequence),
                    round.id,
                    sequence,
                    lanes,
                )?);
            }

            for (index, athlete) in athletes.iter().enumerate() {
                let (heat_index, lane) = partition.slot_for(index);
                let heat = &mut heats[heat_index];
                heat.placement.occupy(lane, &athlete.chest_number)?;
                store.create_athlete_heat(athlete.id, heat.id, lane, None)?;
                tracing::debug!(
                    "Placed {} in {} lane {}",
                    athlete.chest_number,
                    heat.name,
                    lane
                );
            }

            let skipped_moves = apply_balancing(store, &mut heats, &partition.balancing_moves());

            for heat in &heats {
                store.save_heat(heat)?;
            }

            tracing::info!(
                "Generated {} qualifying heats for {} ({} athletes, {} lanes)",
                heats.len(),
                event.name,
                athletes.len(),
                lanes
            );

            Ok(QualifierHeats {
                heats,
                skipped_moves,
            })
        })
    }

    /// Seeds the semifinal heats of `round_id` from the event's qualifying round.
    pub fn generate_semifinal_heats(&self, round_id: Uuid) -> MeetResult<Vec<Heat>> {
        self.db.transaction(|store| {
            let (round, event) = resolve_round(store, round_id)?;
            let qualifying = store
                .find_round_by_event_and_kind(event.id, RoundKind::Heats)?
                .ok_or_else(|| {
                    MeetError::not_found(format!("Qualifying round for event {}", event.name))
                })?;

            let ranked = store
                .find_athlete_heats_by_round_ordered_by_position(qualifying.id, SEMIFINAL_FIELD as u32)?;
            let seeded = seed_semifinals(&ranked)?;

            let mut heats = Vec::with_capacity(seeded.len());
            for (index, group) in seeded.iter().enumerate() {
                let sequence = index as u32 + 1;
                let mut heat = store.create_heat(
                    &format!("Semifinal Heat {}", sequence),
                    round.id,
                    sequence,
                    SEEDED_HEAT_LANES,
                )?;

                for (lane_index, qualifier) in group.iter().enumerate() {
                    let lane = lane_index as u32 + 1;
                    let athlete = find_athlete(store, qualifier.athlete_id)?;
                    let seed_rank = rank_of(&ranked, qualifier);
                    heat.placement.occupy(lane, &athlete.chest_number)?;
                    store.create_athlete_heat(athlete.id, heat.id, lane, seed_rank)?;
                }

                store.save_heat(&heat)?;
                heats.push(heat);
            }

            tracing::info!("Seeded {} semifinal heats for {}", heats.len(), event.name);
            Ok(heats)
        })
    }

    /// Builds the final of `round_id` from the event's semifinal results.
    pub fn generate_final_heat(&self, round_id: Uuid) -> MeetResult<FinalHeat> {
        self.db.transaction(|store| {
            let (round, event) = resolve_round(store, round_id)?;
            let semifinal = store
                .find_round_by_event_and_kind(event.id, RoundKind::Semifinals)?
                .ok_or_else(|| {
                    MeetError::not_found(format!("Semifinal round for event {}", event.name))
                })?;

            let finalists = select_finalists(store.find_heat_entries_by_round(semifinal.id)?);
            let mut heat = store.create_heat("Final", round.id, 1, SEEDED_HEAT_LANES)?;

            let mut athletes = Vec::new();
            let mut unseated = Vec::new();
            for (index, finalist) in finalists.iter().enumerate() {
                let athlete_id = finalist.entry.athlete_heat.athlete_id;
                if index >= SEEDED_HEAT_LANES {
                    unseated.push(athlete_id);
                    continue;
                }

                let lane = index as u32 + 1;
                let athlete = find_athlete(store, athlete_id)?;
                heat.placement.occupy(lane, &athlete.chest_number)?;
                athletes.push(store.create_athlete_heat(
                    athlete.id,
                    heat.id,
                    lane,
                    Some(lane),
                )?);
                tracing::debug!(
                    "Final lane {}: {} ({})",
                    lane,
                    athlete.chest_number,
                    match finalist.qualification {
                        Qualification::Auto => "auto",
                        Qualification::FastestLoser => "fastest loser",
                    }
                );
            }

            if !unseated.is_empty() {
                tracing::warn!(
                    "{} qualified finalists for {} did not fit in {} lanes",
                    unseated.len(),
                    event.name,
                    SEEDED_HEAT_LANES
                );
            }

            store.save_heat(&heat)?;
            tracing::info!("Generated final for {} with {} athletes", event.name, athletes.len());

            Ok(FinalHeat {
                heat,
                athletes,
                unseated,
            })
        })
    }
}

fn resolve_round(store: &Store<'_>, round_id: Uuid) -> MeetResult<(Round, Event)> {
    let round = store
        .find_round(round_id)?
        .ok_or_else(|| MeetError::not_found(format!("Round {}", round_id)))?;
    let event = store
        .find_event(round.event_id)?
        .ok_or_else(|| MeetError::not_found(format!("Event {}", round.event_id)))?;
    Ok((round, event))
}

fn find_athlete(store: &Store<'_>, athlete_id: Uuid) -> MeetResult<Athlete> {
    store
        .find_athlete(athlete_id)?
        .ok_or_else(|| MeetError::not_found(format!("Athlete {}", athlete_id)))
}

fn rank_of(ranked: &[AthleteHeat], row: &AthleteHeat) -> Option<u32> {
    ranked
        .iter()
        .position(|r| r.id == row.id)
        .map(|i| i as u32 + 1)
}

/// Applies every balancing move in order. A move that fails is logged and
/// reported, and the remaining moves still run.
fn apply_balancing(store: &Store<'_>, heats: &mut [Heat], moves: &[LaneMove]) -> Vec<SkippedMove> {
    let mut skipped = Vec::new();
    for mv in moves {
        if let Err(e) = apply_move(store, heats, *mv) {
            tracing::warn!(
                "Skipping balancing move from heat {} lane {}: {}",
                mv.from_heat + 1,
                mv.from_lane,
                e
            );
            skipped.push(SkippedMove {
                from_heat_id: heats[mv.from_heat].id,
                from_lane: mv.from_lane,
                to_heat_id: heats[mv.to_heat].id,
                to_lane: mv.to_lane,
                reason: e.to_string(),
            });
        }
    }
    skipped
}

/// Moves one athlete between heats.
///
/// Everything is checked before the single write, so a failed move leaves the
/// athlete, both placements and the database untouched.
fn apply_move(store: &Store<'_>, heats: &mut [Heat], mv: LaneMove) -> MeetResult<()> {
    let chest_number = heats[mv.from_heat]
        .placement
        .chest_number_at(mv.from_lane)
        .ok_or_else(|| {
            MeetError::not_found(format!(
                "Athlete in {} lane {}",
                heats[mv.from_heat].name, mv.from_lane
            ))
        })?
        .to_string();

    let athlete = store
        .find_athlete_by_chest_number(&chest_number)?
        .ok_or_else(|| MeetError::not_found(format!("Athlete with chest number {}", chest_number)))?;
    let mut row = store
        .find_athlete_heat(athlete.id, heats[mv.from_heat].id)?
        .ok_or_else(|| {
            MeetError::not_found(format!(
                "Heat assignment for chest number {}",
                chest_number
            ))
        })?;
    heats[mv.to_heat]
        .placement
        .check_free(mv.to_lane, &chest_number)?;

    row.heat_id = heats[mv.to_heat].id;
    row.lane = mv.to_lane;
    store.save_athlete_heat(&row)?;

    heats[mv.from_heat].placement.clear(mv.from_lane);
    heats[mv.to_heat]
        .placement
        .occupy(mv.to_lane, &chest_number)?;

    tracing::debug!(
        "Moved {} to {} lane {}",
        chest_number,
        heats[mv.to_heat].name,
        mv.to_lane
    );
    Ok(())
}
