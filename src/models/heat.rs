use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// One race grouping within a round.
///
/// `sequence` is the 1-based ordinal of the heat inside its round and is the
/// ordering key every later stage groups by. The `placement` snapshot is the
/// display copy of who stands in which lane; [`super::AthleteHeat`] rows stay
/// authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Heat {
    pub id: Uuid,
    pub round_id: Uuid,
    pub name: String,
    pub sequence: u32,
    pub placement: Placement,
    pub created_at: DateTime<Utc>,
}

/// What a single lane of a heat holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "slot", rename_all = "snake_case")]
pub enum LaneSlot {
    Empty,
    Occupied(LaneEntry),
}

/// The snapshot copy of an athlete's lane, position and time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneEntry {
    pub chest_number: String,
    pub position: Option<u32>,
    pub time: Option<String>,
}

impl LaneEntry {
    pub fn new(chest_number: impl Into<String>) -> Self {
        Self {
            chest_number: chest_number.into(),
            position: None,
            time: None,
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PlacementError {
    #[error("Lane {lane} is outside a {lanes}-lane heat")]
    LaneOutOfRange { lane: u32, lanes: usize },

    #[error("Lane {0} is already occupied")]
    LaneOccupied(u32),

    #[error("Chest number {0} is already placed in this heat")]
    DuplicateChestNumber(String),
}

/// Fixed-length lane snapshot of a heat.
///
/// The length is set once at construction and never changes. A chest number
/// appears in at most one lane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Placement(Vec<LaneSlot>);

impl Placement {
    pub fn empty(lanes: usize) -> Self {
        Self(vec![LaneSlot::Empty; lanes])
    }

    pub fn lane_count(&self) -> usize {
        self.0.len()
    }

    pub fn slots(&self) -> &[LaneSlot] {
        &self.0
    }

    pub fn slot(&self, lane: u32) -> Option<&LaneSlot> {
        self.index(lane).map(|i| &self.0[i])
    }

    /// Chest number standing in `lane`, if any.
    pub fn chest_number_at(&self, lane: u32) -> Option<&str> {
        match self.slot(lane)? {
            LaneSlot::Occupied(entry) => Some(entry.chest_number.as_str()),
            LaneSlot::Empty => None,
        }
    }

    pub fn is_free(&self, lane: u32) -> bool {
        matches!(self.slot(lane), Some(LaneSlot::Empty))
    }

    /// Number of occupied lanes.
    pub fn occupied_count(&self) -> usize {
        self.0
            .iter()
            .filter(|slot| matches!(slot, LaneSlot::Occupied(_)))
            .count()
    }

    /// Iterates over `(lane, entry)` for every occupied lane in lane order.
    pub fn entries(&self) -> impl Iterator<Item = (u32, &LaneEntry)> {
        self.0.iter().enumerate().filter_map(|(i, slot)| match slot {
            LaneSlot::Occupied(entry) => Some((i as u32 + 1, entry)),
            LaneSlot::Empty => None,
        })
    }

    pub fn lane_of(&self, chest_number: &str) -> Option<u32> {
        self.entries()
            .find(|(_, entry)| entry.chest_number == chest_number)
            .map(|(lane, _)| lane)
    }

    pub fn entry_mut(&mut self, chest_number: &str) -> Option<&mut LaneEntry> {
        self.0.iter_mut().find_map(|slot| match slot {
            LaneSlot::Occupied(entry) if entry.chest_number == chest_number => Some(entry),
            _ => None,
        })
    }

    /// Checks that `chest_number` could be placed into `lane`.
    pub fn check_free(&self, lane: u32, chest_number: &str) -> Result<(), PlacementError> {
        let Some(index) = self.index(lane) else {
            return Err(PlacementError::LaneOutOfRange {
                lane,
                lanes: self.lane_count(),
            });
        };
        if self.lane_of(chest_number).is_some() {
            return Err(PlacementError::DuplicateChestNumber(chest_number.to_string()));
        }
        if matches!(self.0[index], LaneSlot::Occupied(_)) {
            return Err(PlacementError::LaneOccupied(lane));
        }
        Ok(())
    }

    pub fn occupy(&mut self, lane: u32, chest_number: &str) -> Result<(), PlacementError> {
        self.check_free(lane, chest_number)?;
        if let Some(index) = self.index(lane) {
            self.0[index] = LaneSlot::Occupied(LaneEntry::new(chest_number));
        }
        Ok(())
    }

    /// Empties `lane` and returns what stood there.
    pub fn clear(&mut self, lane: u32) -> Option<LaneEntry> {
        let index = self.index(lane)?;
        match std::mem::replace(&mut self.0[index], LaneSlot::Empty) {
            LaneSlot::Occupied(entry) => Some(entry),
            LaneSlot::Empty => None,
        }
    }

    fn index(&self, lane: u32) -> Option<usize> {
        let index = (lane as usize).checked_sub(1)?;
        (index < self.0.len()).then_some(index)
    }
}

/// A heat together with its athlete rows, used for heat-sheet responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatWithAthletes {
    #[serde(flatten)]
    pub heat: Heat,
    pub athletes: Vec<super::AthleteHeat>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_placement_has_fixed_length() {
        let placement = Placement::empty(8);
        assert_eq!(placement.lane_count(), 8);
        assert_eq!(placement.occupied_count(), 0);
        assert!(placement.slots().iter().all(|s| *s == LaneSlot::Empty));
    }

    #[test]
    fn occupy_writes_chest_number_into_lane() {
        let mut placement = Placement::empty(6);
        placement.occupy(3, "C-12").unwrap();

        assert_eq!(placement.chest_number_at(3), Some("C-12"));
        assert_eq!(placement.lane_of("C-12"), Some(3));
        assert_eq!(placement.occupied_count(), 1);
    }

    #[test]
    fn occupy_rejects_lane_zero_and_past_the_end() {
        let mut placement = Placement::empty(6);
        assert_eq!(
            placement.occupy(0, "A"),
            Err(PlacementError::LaneOutOfRange { lane: 0, lanes: 6 })
        );
        assert_eq!(
            placement.occupy(7, "A"),
            Err(PlacementError::LaneOutOfRange { lane: 7, lanes: 6 })
        );
    }

    #[test]
    fn occupy_rejects_taken_lane_and_duplicate_chest_number() {
        let mut placement = Placement::empty(8);
        placement.occupy(1, "A").unwrap();

        assert_eq!(placement.occupy(1, "B"), Err(PlacementError::LaneOccupied(1)));
        assert_eq!(
            placement.occupy(2, "A"),
            Err(PlacementError::DuplicateChestNumber("A".to_string()))
        );
    }

    #[test]
    fn clear_returns_previous_entry() {
        let mut placement = Placement::empty(8);
        placement.occupy(8, "Z").unwrap();

        let cleared = placement.clear(8).unwrap();
        assert_eq!(cleared.chest_number, "Z");
        assert!(placement.is_free(8));
        assert!(placement.clear(8).is_none());
    }

    #[test]
    fn entry_mut_updates_snapshot_in_place() {
        let mut placement = Placement::empty(8);
        placement.occupy(4, "X").unwrap();

        let entry = placement.entry_mut("X").unwrap();
        entry.position = Some(2);
        entry.time = Some("00:11:020".to_string());

        match placement.slot(4) {
            Some(LaneSlot::Occupied(e)) => {
                assert_eq!(e.position, Some(2));
                assert_eq!(e.time.as_deref(), Some("00:11:020"));
            }
            other => panic!("unexpected slot {:?}", other),
        }
    }

    #[test]
    fn serializes_as_tagged_slot_array() {
        let mut placement = Placement::empty(2);
        placement.occupy(2, "7").unwrap();

        let json = serde_json::to_value(&placement).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                { "slot": "empty" },
                { "slot": "occupied", "chest_number": "7", "position": null, "time": null }
            ])
        );

        let back: Placement = serde_json::from_value(json).unwrap();
        assert_eq!(back, placement);
    }
}
