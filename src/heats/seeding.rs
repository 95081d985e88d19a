//! Pure planning rules for round progression.
//!
//! Nothing in here touches the database: the engine asks these functions how
//! to partition a roster, which lanes to rebalance, how to cross-seed the
//! semifinals and who makes the final, then persists the answer.

use std::cmp::Ordering;

use super::timing::parse_finish_time;
use crate::error::{MeetError, MeetResult};
use crate::models::HeatEntry;

/// Number of qualifiers seeded into the semifinals.
pub const SEMIFINAL_FIELD: usize = 24;

/// Lanes in every semifinal and final heat.
pub const SEEDED_HEAT_LANES: usize = 8;

/// Top finishers per semifinal heat that go straight to the final.
pub const AUTO_QUALIFIERS_PER_HEAT: usize = 3;

/// Non-automatic finalists picked by time.
pub const FASTEST_LOSERS: usize = 2;

/// Snake-seeded semifinal table. Each row is one heat; each entry is a 1-based
/// qualifying rank, and its position in the row is the lane.
pub const SEMIFINAL_SEEDS: [[usize; SEEDED_HEAT_LANES]; 3] = [
    [1, 6, 7, 12, 13, 18, 19, 24],
    [2, 5, 8, 11, 14, 17, 20, 23],
    [3, 4, 9, 10, 15, 16, 21, 22],
];

/// How a roster of `athletes` splits into heats of `lanes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatPartition {
    pub lanes: usize,
    pub full_heats: usize,
    pub remainder: usize,
}

/// One athlete moved during balancing. Heats are 0-based indices, lanes 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneMove {
    pub from_heat: usize,
    pub from_lane: u32,
    pub to_heat: usize,
    pub to_lane: u32,
}

impl HeatPartition {
    pub fn new(athletes: usize, lanes: usize) -> Self {
        Self {
            lanes,
            full_heats: athletes / lanes,
            remainder: athletes % lanes,
        }
    }

    pub fn heat_count(&self) -> usize {
        self.full_heats + usize::from(self.remainder > 0)
    }

    pub fn min_heat_size(&self) -> usize {
        self.lanes / 2
    }

    /// Heat index and lane for the athlete at `index` in registration order,
    /// before balancing.
    pub fn slot_for(&self, index: usize) -> (usize, u32) {
        (index / self.lanes, (index % self.lanes) as u32 + 1)
    }

    /// Moves that top up an under-strength last heat from the last lanes of
    /// the heat before it. Empty when no balancing is needed.
    pub fn balancing_moves(&self) -> Vec<LaneMove> {
        let min = self.min_heat_size();
        if self.full_heats == 0 || self.remainder == 0 || self.remainder >= min {
            return Vec::new();
        }

        let count = min - self.remainder;
        let to_heat = self.heat_count() - 1;
        let from_heat = to_heat - 1;
        let first_from = self.lanes - count + 1;

        (0..count)
            .map(|k| LaneMove {
                from_heat,
                from_lane: (first_from + k) as u32,
                to_heat,
                to_lane: (self.remainder + 1 + k) as u32,
            })
            .collect()
    }

    /// Athletes per heat once every balancing move has been applied.
    pub fn balanced_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![self.lanes; self.full_heats];
        if self.remainder > 0 {
            sizes.push(self.remainder);
        }
        for mv in self.balancing_moves() {
            sizes[mv.from_heat] -= 1;
            sizes[mv.to_heat] += 1;
        }
        sizes
    }
}

/// Splits exactly [`SEMIFINAL_FIELD`] ranked qualifiers into three heats
/// following [`SEMIFINAL_SEEDS`]. Each returned heat is in lane order.
pub fn seed_semifinals<T: Clone>(ranked: &[T]) -> MeetResult<Vec<Vec<T>>> {
    if ranked.len() != SEMIFINAL_FIELD {
        return Err(MeetError::precondition(format!(
            "Invalid number of athletes for semifinal: expected {}, found {}",
            SEMIFINAL_FIELD,
            ranked.len()
        )));
    }

    Ok(SEMIFINAL_SEEDS
        .iter()
        .map(|heat| heat.iter().map(|rank| ranked[rank - 1].clone()).collect())
        .collect())
}

/// Why an athlete made the final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualification {
    /// Top three in their semifinal heat.
    Auto,
    /// Among the fastest non-automatic qualifiers.
    FastestLoser,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finalist {
    pub entry: HeatEntry,
    pub qualification: Qualification,
}

/// Picks the final field from semifinal results, in lane order.
///
/// Entries are grouped by heat sequence and ranked by position then time.
/// Rank 1 of every heat comes first, then rank 2 of every heat, then rank 3.
/// The two fastest of the rest follow; entries without a parseable time are
/// never picked as fastest losers. With three full semifinals this yields
/// more athletes than a final has lanes; the engine seats them in the order
/// returned here.
pub fn select_finalists(mut entries: Vec<HeatEntry>) -> Vec<Finalist> {
    entries.sort_by(|a, b| {
        a.heat_sequence
            .cmp(&b.heat_sequence)
            .then_with(|| none_last(a.athlete_heat.position, b.athlete_heat.position))
            .then_with(|| none_last(time_of(a), time_of(b)))
    });

    let mut heats: Vec<Vec<HeatEntry>> = Vec::new();
    for entry in entries {
        match heats.last_mut() {
            Some(group) if group[0].heat_sequence == entry.heat_sequence => group.push(entry),
            _ => heats.push(vec![entry]),
        }
    }

    let mut finalists = Vec::new();
    for rank in 0..AUTO_QUALIFIERS_PER_HEAT {
        for group in &heats {
            if let Some(entry) = group.get(rank) {
                finalists.push(Finalist {
                    entry: entry.clone(),
                    qualification: Qualification::Auto,
                });
            }
        }
    }

    let mut losers: Vec<(u64, &HeatEntry)> = heats
        .iter()
        .flat_map(|group| group.iter().skip(AUTO_QUALIFIERS_PER_HEAT))
        .filter_map(|entry| time_of(entry).map(|millis| (millis, entry)))
        .collect();
    losers.sort_by_key(|(millis, _)| *millis);

    finalists.extend(losers.into_iter().take(FASTEST_LOSERS).map(|(_, entry)| Finalist {
        entry: entry.clone(),
        qualification: Qualification::FastestLoser,
    }));
    finalists
}

fn time_of(entry: &HeatEntry) -> Option<u64> {
    entry.athlete_heat.time.as_deref().and_then(parse_finish_time)
}

fn none_last<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AthleteHeat;
    use uuid::Uuid;

    fn entry(heat_sequence: u32, position: Option<u32>, time: Option<&str>) -> HeatEntry {
        HeatEntry {
            heat_sequence,
            athlete_heat: AthleteHeat {
                id: Uuid::new_v4(),
                athlete_id: Uuid::new_v4(),
                heat_id: Uuid::new_v4(),
                lane: position.unwrap_or(8),
                position,
                time: time.map(str::to_string),
                advancement: false,
                seed_rank: None,
            },
        }
    }

    #[test]
    fn partition_counts_full_heats_and_remainder() {
        let p = HeatPartition::new(20, 8);
        assert_eq!((p.full_heats, p.remainder, p.heat_count()), (2, 4, 3));

        let p = HeatPartition::new(16, 8);
        assert_eq!((p.full_heats, p.remainder, p.heat_count()), (2, 0, 2));

        let p = HeatPartition::new(5, 6);
        assert_eq!((p.full_heats, p.remainder, p.heat_count()), (0, 5, 1));
    }

    #[test]
    fn slot_for_fills_heats_in_order() {
        let p = HeatPartition::new(10, 8);
        assert_eq!(p.slot_for(0), (0, 1));
        assert_eq!(p.slot_for(7), (0, 8));
        assert_eq!(p.slot_for(8), (1, 1));
        assert_eq!(p.slot_for(9), (1, 2));
    }

    #[test]
    fn ten_athletes_in_eight_lanes_balance_to_six_and_six() {
        let p = HeatPartition::new(10, 8);
        let moves = p.balancing_moves();

        assert_eq!(
            moves,
            vec![
                LaneMove { from_heat: 0, from_lane: 7, to_heat: 1, to_lane: 3 },
                LaneMove { from_heat: 0, from_lane: 8, to_heat: 1, to_lane: 4 },
            ]
        );
        assert_eq!(p.balanced_sizes(), vec![6, 6]);
    }

    #[test]
    fn remainder_at_minimum_is_left_alone() {
        let p = HeatPartition::new(20, 8);
        assert!(p.balancing_moves().is_empty());
        assert_eq!(p.balanced_sizes(), vec![8, 8, 4]);
    }

    #[test]
    fn six_lane_sport_balances_against_three() {
        let p = HeatPartition::new(13, 6);
        assert_eq!(p.min_heat_size(), 3);
        assert_eq!(p.balanced_sizes(), vec![6, 4, 3]);
    }

    #[test]
    fn single_short_heat_is_not_balanced() {
        let p = HeatPartition::new(3, 8);
        assert!(p.balancing_moves().is_empty());
        assert_eq!(p.balanced_sizes(), vec![3]);
    }

    #[test]
    fn every_heat_meets_minimum_when_roster_allows() {
        for lanes in [6usize, 8] {
            for n in (lanes / 2)..=60 {
                let sizes = HeatPartition::new(n, lanes).balanced_sizes();
                assert_eq!(sizes.iter().sum::<usize>(), n);
                if sizes.len() > 1 {
                    assert!(
                        sizes.iter().all(|s| *s >= lanes / 2 && *s <= lanes),
                        "n={} lanes={} sizes={:?}",
                        n,
                        lanes,
                        sizes
                    );
                }
            }
        }
    }

    #[test]
    fn semifinal_table_uses_every_rank_once() {
        let mut ranks: Vec<usize> = SEMIFINAL_SEEDS.iter().flatten().copied().collect();
        ranks.sort_unstable();
        assert_eq!(ranks, (1..=24).collect::<Vec<_>>());
    }

    #[test]
    fn seeds_semifinals_by_table() {
        let ranked: Vec<usize> = (1..=24).collect();
        let heats = seed_semifinals(&ranked).unwrap();

        assert_eq!(heats[0], vec![1, 6, 7, 12, 13, 18, 19, 24]);
        assert_eq!(heats[1], vec![2, 5, 8, 11, 14, 17, 20, 23]);
        assert_eq!(heats[2], vec![3, 4, 9, 10, 15, 16, 21, 22]);
    }

    #[test]
    fn rejects_semifinal_field_of_wrong_size() {
        for n in [23usize, 25, 0] {
            let ranked: Vec<usize> = (1..=n).collect();
            let err = seed_semifinals(&ranked).unwrap_err();
            assert!(matches!(err, MeetError::PreconditionFailed(_)), "n={}", n);
        }
    }

    #[test]
    fn final_takes_top_three_per_heat_then_two_fastest() {
        let mut entries = Vec::new();
        for heat in 1..=3u32 {
            for pos in 1..=8u32 {
                // heat 2 position 5 and heat 3 position 4 are the fastest losers
                let millis = match (heat, pos) {
                    (2, 5) => 10_100,
                    (3, 4) => 10_050,
                    _ => 10_000 + heat * 10 + pos * 100,
                };
                let time = format!("00:{:02}:{:03}", millis / 1000, millis % 1000);
                entries.push(entry(heat, Some(pos), Some(&time)));
            }
        }
        entries.reverse();

        let finalists = select_finalists(entries);
        assert_eq!(finalists.len(), 11);

        let autos: Vec<(u32, Option<u32>)> = finalists
            .iter()
            .filter(|f| f.qualification == Qualification::Auto)
            .map(|f| (f.entry.heat_sequence, f.entry.athlete_heat.position))
            .collect();
        assert_eq!(
            autos,
            vec![
                (1, Some(1)),
                (2, Some(1)),
                (3, Some(1)),
                (1, Some(2)),
                (2, Some(2)),
                (3, Some(2)),
                (1, Some(3)),
                (2, Some(3)),
                (3, Some(3)),
            ]
        );

        let losers: Vec<(u32, Option<u32>)> = finalists[9..]
            .iter()
            .map(|f| (f.entry.heat_sequence, f.entry.athlete_heat.position))
            .collect();
        assert_eq!(losers, vec![(3, Some(4)), (2, Some(5))]);
        assert!(finalists[9..]
            .iter()
            .all(|f| f.qualification == Qualification::FastestLoser));
    }

    #[test]
    fn fastest_losers_follow_auto_qualifiers() {
        // Two heats: six auto qualifiers leave room for two fastest losers
        let entries = vec![
            entry(1, Some(1), Some("00:10:000")),
            entry(1, Some(2), Some("00:10:100")),
            entry(1, Some(3), Some("00:10:200")),
            entry(1, Some(4), Some("00:10:900")),
            entry(1, Some(5), Some("00:11:000")),
            entry(2, Some(1), Some("00:10:050")),
            entry(2, Some(2), Some("00:10:150")),
            entry(2, Some(3), Some("00:10:250")),
            entry(2, Some(4), Some("00:10:300")),
            entry(2, Some(5), None),
            entry(2, Some(6), Some("bad time")),
        ];

        let finalists = select_finalists(entries);
        assert_eq!(finalists.len(), 8);

        let losers: Vec<(u32, Option<u32>)> = finalists
            .iter()
            .filter(|f| f.qualification == Qualification::FastestLoser)
            .map(|f| (f.entry.heat_sequence, f.entry.athlete_heat.position))
            .collect();
        assert_eq!(losers, vec![(2, Some(4)), (1, Some(4))]);
    }

    #[test]
    fn untimed_losers_are_never_promoted() {
        let entries = vec![
            entry(1, Some(1), Some("00:10:000")),
            entry(1, Some(2), Some("00:10:100")),
            entry(1, Some(3), Some("00:10:200")),
            entry(1, Some(4), None),
            entry(1, Some(5), Some("00:99:000")),
        ];

        let finalists = select_finalists(entries);
        assert_eq!(finalists.len(), 3);
        assert!(finalists.iter().all(|f| f.qualification == Qualification::Auto));
    }

    #[test]
    fn unplaced_entries_rank_after_placed_ones() {
        let entries = vec![
            entry(1, None, Some("00:09:000")),
            entry(1, Some(2), Some("00:10:100")),
            entry(1, Some(1), Some("00:10:000")),
            entry(1, Some(3), Some("00:10:200")),
        ];

        let finalists = select_finalists(entries);
        let positions: Vec<Option<u32>> = finalists
            .iter()
            .take(3)
            .map(|f| f.entry.athlete_heat.position)
            .collect();
        assert_eq!(positions, vec![Some(1), Some(2), Some(3)]);
        assert_eq!(finalists[3].qualification, Qualification::FastestLoser);
        assert_eq!(finalists[3].entry.athlete_heat.position, None);
    }
}
