use crate::flow::{Outcome, SlotIndex};
use crate::registry::Team;
use serde::Serialize;
use std::{collections::HashMap, sync::Arc};

/// Why a slot holds what it holds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "from", rename_all = "camelCase")]
pub enum SlotOrigin {
  #[serde(rename_all = "camelCase")]
  Seed { seed: u32 },
  #[serde(rename_all = "camelCase")]
  FromMatch { match_id: String, outcome: Outcome },
  Empty,
}

impl SlotOrigin {
  pub fn from_match(match_id: &str, outcome: Outcome) -> Self {
    SlotOrigin::FromMatch {
      match_id: match_id.to_string(),
      outcome,
    }
  }

  pub fn is_fed_by(&self, source: &str) -> bool {
    matches!(self, SlotOrigin::FromMatch { match_id, .. } if match_id == source)
  }
}

/// Win/lose highlight of a slot once its match is decided.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotMark {
  Win,
  Lose,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Slot {
  team: Option<Arc<Team>>,
  origin: SlotOrigin,
  mark: Option<SlotMark>,
}

impl Slot {
  fn empty() -> Self {
    Slot {
      team: None,
      origin: SlotOrigin::Empty,
      mark: None,
    }
  }

  pub fn team(&self) -> Option<&Arc<Team>> {
    self.team.as_ref()
  }

  pub fn origin(&self) -> &SlotOrigin {
    &self.origin
  }

  pub fn mark(&self) -> Option<SlotMark> {
    self.mark
  }

  pub fn is_empty(&self) -> bool {
    self.team.is_none()
  }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BoardMatch {
  id: String,
  slots: [Slot; 2],
  winner: Option<SlotIndex>,
}

impl BoardMatch {
  fn new(id: &str) -> Self {
    BoardMatch {
      id: id.to_string(),
      slots: [Slot::empty(), Slot::empty()],
      winner: None,
    }
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn slot(&self, slot: SlotIndex) -> &Slot {
    &self.slots[slot.position()]
  }

  pub fn slots(&self) -> &[Slot; 2] {
    &self.slots
  }

  pub fn winner(&self) -> Option<SlotIndex> {
    self.winner
  }

  pub fn winning_team(&self) -> Option<&Arc<Team>> {
    self.winner.and_then(|slot| self.slot(slot).team())
  }
}

/// Runtime state of every match, in bracket order. Entries are created once and
/// only ever cleared, never removed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MatchBoard {
  matches: Vec<BoardMatch>,
  index: HashMap<String, usize>,
}

impl MatchBoard {
  pub fn new<'a, I>(match_ids: I) -> Self
  where
    I: IntoIterator<Item = &'a str>,
  {
    let mut matches = Vec::new();
    let mut index = HashMap::new();
    for id in match_ids {
      if index.contains_key(id) {
        continue;
      }
      matches.push(BoardMatch::new(id));
      index.insert(id.to_string(), matches.len() - 1);
    }
    MatchBoard { matches, index }
  }

  pub fn get(&self, match_id: &str) -> Option<&BoardMatch> {
    self.index.get(match_id).and_then(|idx| self.matches.get(*idx))
  }

  fn get_mut(&mut self, match_id: &str) -> Option<&mut BoardMatch> {
    let idx = *self.index.get(match_id)?;
    self.matches.get_mut(idx)
  }

  pub fn contains(&self, match_id: &str) -> bool {
    self.index.contains_key(match_id)
  }

  pub fn matches(&self) -> impl Iterator<Item = &BoardMatch> {
    self.matches.iter()
  }

  pub fn len(&self) -> usize {
    self.matches.len()
  }

  pub fn is_empty(&self) -> bool {
    self.matches.is_empty()
  }

  /// Overwrites a slot. A missing team or an `Empty` origin leaves the slot
  /// fully empty, so team and origin are always set and cleared together.
  /// Returns false for an unknown match.
  pub fn place_team(
    &mut self,
    match_id: &str,
    slot: SlotIndex,
    team: Option<Arc<Team>>,
    origin: SlotOrigin,
  ) -> bool {
    let Some(entry) = self.get_mut(match_id) else {
      return false;
    };
    let target = &mut entry.slots[slot.position()];
    match (team, origin) {
      (Some(team), origin) if origin != SlotOrigin::Empty => {
        target.team = Some(team);
        target.origin = origin;
      }
      _ => {
        target.team = None;
        target.origin = SlotOrigin::Empty;
      }
    }
    target.mark = None;
    true
  }

  pub fn read_slot(&self, match_id: &str, slot: SlotIndex) -> Option<&Slot> {
    self.get(match_id).map(|entry| entry.slot(slot))
  }

  pub fn winner(&self, match_id: &str) -> Option<SlotIndex> {
    self.get(match_id).and_then(|entry| entry.winner)
  }

  /// Records (or clears) the winner of one match and refreshes its slot marks.
  /// Touches nothing else on the board.
  pub fn decide(&mut self, match_id: &str, winner: Option<SlotIndex>) -> bool {
    let Some(entry) = self.get_mut(match_id) else {
      return false;
    };
    entry.winner = winner;
    for slot in SlotIndex::BOTH {
      entry.slots[slot.position()].mark = winner.map(|won| {
        if won == slot {
          SlotMark::Win
        } else {
          SlotMark::Lose
        }
      });
    }
    true
  }

  /// Every slot whose team was produced by `source`, in board order.
  pub fn slots_fed_by(&self, source: &str) -> Vec<(String, SlotIndex)> {
    let mut out = Vec::new();
    for entry in &self.matches {
      for slot in SlotIndex::BOTH {
        if entry.slot(slot).origin.is_fed_by(source) {
          out.push((entry.id.clone(), slot));
        }
      }
    }
    out
  }
}
