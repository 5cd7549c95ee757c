use crate::board::{MatchBoard, SlotOrigin};
use crate::error::BracketError;
use crate::flow::{FlowGraph, SlotIndex};
use crate::registry::TeamRegistry;
use tracing::warn;

/// A fixed first-round placement: seed `seed` starts in `slot` of `match_id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeedPlacement {
  pub match_id: &'static str,
  pub slot: SlotIndex,
  pub seed: u32,
}

const fn place(match_id: &'static str, slot: SlotIndex, seed: u32) -> SeedPlacement {
  SeedPlacement { match_id, slot, seed }
}

/// Play-ins 5v12, 6v11, 7v10, 8v9; seeds 1, 4, 3, 2 wait in slot 1 of the
/// quarterfinals.
pub const PLAYOFF12_SEEDING: [SeedPlacement; 12] = [
  place("W-R1-M1", SlotIndex::One, 5),
  place("W-R1-M1", SlotIndex::Two, 12),
  place("W-R1-M2", SlotIndex::One, 6),
  place("W-R1-M2", SlotIndex::Two, 11),
  place("W-R1-M3", SlotIndex::One, 7),
  place("W-R1-M3", SlotIndex::Two, 10),
  place("W-R1-M4", SlotIndex::One, 8),
  place("W-R1-M4", SlotIndex::Two, 9),
  place("W-Q1", SlotIndex::One, 1),
  place("W-Q2", SlotIndex::One, 4),
  place("W-Q3", SlotIndex::One, 3),
  place("W-Q4", SlotIndex::One, 2),
];

/// Checks a pairing table against the flow: each placement must name a known
/// match, use a slot no edge feeds, and appear only once.
pub fn validate_seeding(flow: &FlowGraph, placements: &[SeedPlacement]) -> Result<(), BracketError> {
  for (idx, placement) in placements.iter().enumerate() {
    let invalid = |message: &str| BracketError::InvalidSeeding {
      seed: placement.seed,
      match_id: placement.match_id.to_string(),
      slot: placement.slot.number(),
      message: message.to_string(),
    };
    if placement.seed == 0 {
      return Err(invalid("seed must be positive"));
    }
    if !flow.contains(placement.match_id) {
      return Err(invalid("match is not part of the bracket"));
    }
    if flow.is_fed(placement.match_id, placement.slot) {
      return Err(invalid("slot is already fed by another match"));
    }
    let clash = placements[..idx].iter().any(|earlier| {
      earlier.seed == placement.seed
        || (earlier.match_id == placement.match_id && earlier.slot == placement.slot)
    });
    if clash {
      return Err(invalid("seed or slot is used twice"));
    }
  }
  Ok(())
}

/// Puts every seeded team into its first-round slot. Seeds the registry does
/// not know leave their slot empty.
pub fn seed_initial_teams(board: &mut MatchBoard, registry: &TeamRegistry, placements: &[SeedPlacement]) {
  for placement in placements {
    let team = registry.team(placement.seed);
    if team.is_none() {
      warn!("No team registered for seed {}; {} slot {} stays empty", placement.seed, placement.match_id, placement.slot.number());
    }
    board.place_team(
      placement.match_id,
      placement.slot,
      team,
      SlotOrigin::Seed { seed: placement.seed },
    );
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::registry::Team;

  fn registry(seeds: impl IntoIterator<Item = u32>) -> TeamRegistry {
    TeamRegistry::from_teams(
      seeds
        .into_iter()
        .map(|seed| Team {
          seed,
          name: format!("Team {seed}"),
          players: Vec::new(),
        })
        .collect(),
    )
  }

  #[test]
  fn test_playoff12_seeding_is_valid() {
    let flow = FlowGraph::playoff12().unwrap();
    assert!(validate_seeding(&flow, &PLAYOFF12_SEEDING).is_ok());
  }

  #[test]
  fn test_seeding_fills_first_round_only() {
    let flow = FlowGraph::playoff12().unwrap();
    let mut board = MatchBoard::new(flow.order().iter().map(String::as_str));
    seed_initial_teams(&mut board, &registry(1..=12), &PLAYOFF12_SEEDING);

    let play_in = board.get("W-R1-M1").unwrap();
    assert_eq!(play_in.slot(SlotIndex::One).team().unwrap().seed, 5);
    assert_eq!(play_in.slot(SlotIndex::Two).team().unwrap().seed, 12);
    assert_eq!(play_in.slot(SlotIndex::Two).origin(), &SlotOrigin::Seed { seed: 12 });

    let bye = board.get("W-Q4").unwrap();
    assert_eq!(bye.slot(SlotIndex::One).team().unwrap().seed, 2);
    assert!(bye.slot(SlotIndex::Two).is_empty());

    let filled = board
      .matches()
      .flat_map(|entry| entry.slots().iter())
      .filter(|slot| !slot.is_empty())
      .count();
    assert_eq!(filled, 12);
  }

  #[test]
  fn test_missing_team_leaves_slot_empty() {
    let flow = FlowGraph::playoff12().unwrap();
    let mut board = MatchBoard::new(flow.order().iter().map(String::as_str));
    seed_initial_teams(&mut board, &registry(1..=11), &PLAYOFF12_SEEDING);

    let slot = board.read_slot("W-R1-M1", SlotIndex::Two).unwrap();
    assert!(slot.is_empty());
    assert_eq!(slot.origin(), &SlotOrigin::Empty);
  }

  #[test]
  fn test_rejects_seed_on_fed_slot() {
    let flow = FlowGraph::playoff12().unwrap();
    let bad = [place("W-Q1", SlotIndex::Two, 1)];
    assert!(matches!(
      validate_seeding(&flow, &bad),
      Err(BracketError::InvalidSeeding { seed: 1, .. })
    ));
  }

  #[test]
  fn test_rejects_repeated_seed() {
    let flow = FlowGraph::playoff12().unwrap();
    let bad = [
      place("W-R1-M1", SlotIndex::One, 5),
      place("W-R1-M2", SlotIndex::One, 5),
    ];
    assert!(validate_seeding(&flow, &bad).is_err());
  }
}
