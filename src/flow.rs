use crate::error::BracketError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One of the two positions inside a match. Serialized as `1` / `2`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum SlotIndex {
  One,
  Two,
}

impl SlotIndex {
  pub const BOTH: [SlotIndex; 2] = [SlotIndex::One, SlotIndex::Two];

  pub fn from_number(value: u8) -> Option<Self> {
    match value {
      1 => Some(SlotIndex::One),
      2 => Some(SlotIndex::Two),
      _ => None,
    }
  }

  pub fn number(self) -> u8 {
    match self {
      SlotIndex::One => 1,
      SlotIndex::Two => 2,
    }
  }

  pub fn other(self) -> Self {
    match self {
      SlotIndex::One => SlotIndex::Two,
      SlotIndex::Two => SlotIndex::One,
    }
  }

  pub(crate) fn position(self) -> usize {
    match self {
      SlotIndex::One => 0,
      SlotIndex::Two => 1,
    }
  }
}

impl From<SlotIndex> for u8 {
  fn from(slot: SlotIndex) -> u8 {
    slot.number()
  }
}

impl TryFrom<u8> for SlotIndex {
  type Error = String;

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    SlotIndex::from_number(value).ok_or_else(|| format!("Slot must be 1 or 2, got {value}."))
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
  Win,
  Lose,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotTarget {
  pub match_id: String,
  pub slot: SlotIndex,
}

impl SlotTarget {
  pub fn new(match_id: &str, slot: SlotIndex) -> Self {
    SlotTarget {
      match_id: match_id.to_string(),
      slot,
    }
  }
}

/// Where a match's winner and (optionally) loser go next.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowEdge {
  pub win: SlotTarget,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub lose: Option<SlotTarget>,
}

impl FlowEdge {
  pub fn target(&self, outcome: Outcome) -> Option<&SlotTarget> {
    match outcome {
      Outcome::Win => Some(&self.win),
      Outcome::Lose => self.lose.as_ref(),
    }
  }
}

/// Immutable match graph: the topological order of every match plus the
/// outgoing edges of each non-terminal one.
#[derive(Clone, Debug)]
pub struct FlowGraph {
  order: Vec<String>,
  position: HashMap<String, usize>,
  edges: HashMap<String, FlowEdge>,
}

impl FlowGraph {
  pub fn new(order: Vec<String>, edges: Vec<(String, FlowEdge)>) -> Result<Self, BracketError> {
    let mut position = HashMap::with_capacity(order.len());
    for (idx, id) in order.iter().enumerate() {
      if position.insert(id.clone(), idx).is_some() {
        return Err(BracketError::DuplicateMatch(id.clone()));
      }
    }

    let mut fed: HashSet<(String, SlotIndex)> = HashSet::new();
    let mut edge_map = HashMap::with_capacity(edges.len());
    for (source, edge) in edges {
      let Some(source_pos) = position.get(&source).copied() else {
        return Err(BracketError::UnknownMatch {
          missing: source.clone(),
          source_match: source,
        });
      };
      for target in [Some(&edge.win), edge.lose.as_ref()].into_iter().flatten() {
        let Some(target_pos) = position.get(&target.match_id).copied() else {
          return Err(BracketError::UnknownMatch {
            missing: target.match_id.clone(),
            source_match: source,
          });
        };
        if target_pos <= source_pos {
          return Err(BracketError::BackEdge {
            source_match: source,
            target: target.match_id.clone(),
          });
        }
        if !fed.insert((target.match_id.clone(), target.slot)) {
          return Err(BracketError::SlotConflict {
            match_id: target.match_id.clone(),
            slot: target.slot.number(),
          });
        }
      }
      if edge_map.insert(source.clone(), edge).is_some() {
        return Err(BracketError::DuplicateMatch(source));
      }
    }

    Ok(FlowGraph {
      order,
      position,
      edges: edge_map,
    })
  }

  /// The 12-team double-elimination playoff: four play-in matches, byes for
  /// seeds 1-4, a four-round lower bracket, grand final and third place.
  pub fn playoff12() -> Result<Self, BracketError> {
    let order = PLAYOFF12_ORDER.iter().map(|id| id.to_string()).collect();
    let edges = PLAYOFF12_FLOW
      .iter()
      .map(|(source, (win_id, win_slot), lose)| {
        let edge = FlowEdge {
          win: SlotTarget::new(win_id, *win_slot),
          lose: lose.map(|(lose_id, lose_slot)| SlotTarget::new(lose_id, lose_slot)),
        };
        (source.to_string(), edge)
      })
      .collect();
    FlowGraph::new(order, edges)
  }

  pub fn successors(&self, match_id: &str) -> Option<&FlowEdge> {
    self.edges.get(match_id)
  }

  pub fn order(&self) -> &[String] {
    &self.order
  }

  pub fn contains(&self, match_id: &str) -> bool {
    self.position.contains_key(match_id)
  }

  pub fn position(&self, match_id: &str) -> Option<usize> {
    self.position.get(match_id).copied()
  }

  /// Whether some edge places a team into this slot.
  pub fn is_fed(&self, match_id: &str, slot: SlotIndex) -> bool {
    self.edges.values().any(|edge| {
      [Some(&edge.win), edge.lose.as_ref()]
        .into_iter()
        .flatten()
        .any(|target| target.match_id == match_id && target.slot == slot)
    })
  }

  pub fn len(&self) -> usize {
    self.order.len()
  }

  pub fn is_empty(&self) -> bool {
    self.order.is_empty()
  }
}

const PLAYOFF12_ORDER: [&str; 22] = [
  "W-R1-M1", "W-R1-M2", "W-R1-M3", "W-R1-M4",
  "W-Q1", "W-Q2", "W-Q3", "W-Q4",
  "W-S1", "W-S2",
  "W-F",
  "L-R1-M1", "L-R1-M2", "L-R1-M3", "L-R1-M4",
  "L-R2-M1", "L-R2-M2",
  "L-R3-M1", "L-R3-M2",
  "L-F",
  "GF", "P3",
];

type EdgeRow = (&'static str, (&'static str, SlotIndex), Option<(&'static str, SlotIndex)>);

const PLAYOFF12_FLOW: [EdgeRow; 20] = [
  // play-ins: 5v12, 6v11, 7v10, 8v9
  ("W-R1-M1", ("W-Q2", SlotIndex::Two), Some(("L-R1-M2", SlotIndex::Two))),
  ("W-R1-M2", ("W-Q3", SlotIndex::Two), Some(("L-R1-M3", SlotIndex::Two))),
  ("W-R1-M3", ("W-Q4", SlotIndex::Two), Some(("L-R1-M4", SlotIndex::Two))),
  ("W-R1-M4", ("W-Q1", SlotIndex::Two), Some(("L-R1-M1", SlotIndex::Two))),
  ("W-Q1", ("W-S1", SlotIndex::One), Some(("L-R1-M4", SlotIndex::One))),
  ("W-Q2", ("W-S1", SlotIndex::Two), Some(("L-R1-M1", SlotIndex::One))),
  ("W-Q3", ("W-S2", SlotIndex::One), Some(("L-R1-M2", SlotIndex::One))),
  ("W-Q4", ("W-S2", SlotIndex::Two), Some(("L-R1-M3", SlotIndex::One))),
  ("W-S1", ("W-F", SlotIndex::One), Some(("L-R3-M1", SlotIndex::One))),
  ("W-S2", ("W-F", SlotIndex::Two), Some(("L-R3-M2", SlotIndex::One))),
  ("W-F", ("GF", SlotIndex::One), Some(("P3", SlotIndex::One))),
  ("L-R1-M1", ("L-R2-M1", SlotIndex::One), None),
  ("L-R1-M2", ("L-R2-M1", SlotIndex::Two), None),
  ("L-R1-M3", ("L-R2-M2", SlotIndex::One), None),
  ("L-R1-M4", ("L-R2-M2", SlotIndex::Two), None),
  ("L-R2-M1", ("L-R3-M1", SlotIndex::Two), None),
  ("L-R2-M2", ("L-R3-M2", SlotIndex::Two), None),
  ("L-R3-M1", ("L-F", SlotIndex::One), None),
  ("L-R3-M2", ("L-F", SlotIndex::Two), None),
  ("L-F", ("GF", SlotIndex::Two), Some(("P3", SlotIndex::Two))),
];

#[cfg(test)]
mod tests {
  use super::*;

  fn edge(win: (&str, SlotIndex), lose: Option<(&str, SlotIndex)>) -> FlowEdge {
    FlowEdge {
      win: SlotTarget::new(win.0, win.1),
      lose: lose.map(|(id, slot)| SlotTarget::new(id, slot)),
    }
  }

  fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|id| id.to_string()).collect()
  }

  #[test]
  fn test_playoff12_layout() {
    let flow = FlowGraph::playoff12().unwrap();
    assert_eq!(flow.len(), 22);
    assert_eq!(flow.order().first().map(String::as_str), Some("W-R1-M1"));

    let play_in = flow.successors("W-R1-M1").unwrap();
    assert_eq!(play_in.win, SlotTarget::new("W-Q2", SlotIndex::Two));
    assert_eq!(play_in.lose, Some(SlotTarget::new("L-R1-M2", SlotIndex::Two)));

    assert!(flow.successors("L-R2-M1").unwrap().lose.is_none());
    assert!(flow.successors("GF").is_none());
    assert!(flow.successors("P3").is_none());
  }

  #[test]
  fn test_playoff12_edges_point_forward() {
    let flow = FlowGraph::playoff12().unwrap();
    for id in flow.order() {
      let Some(edge) = flow.successors(id) else {
        continue;
      };
      let from = flow.position(id).unwrap();
      assert!(flow.position(&edge.win.match_id).unwrap() > from, "{id} win");
      if let Some(lose) = &edge.lose {
        assert!(flow.position(&lose.match_id).unwrap() > from, "{id} lose");
      }
    }
  }

  #[test]
  fn test_byes_are_not_fed() {
    let flow = FlowGraph::playoff12().unwrap();
    assert!(!flow.is_fed("W-Q1", SlotIndex::One));
    assert!(flow.is_fed("W-Q1", SlotIndex::Two));
    assert!(!flow.is_fed("W-R1-M1", SlotIndex::One));
  }

  #[test]
  fn test_rejects_back_edge() {
    let err = FlowGraph::new(
      ids(&["A", "B"]),
      vec![("B".to_string(), edge(("A", SlotIndex::One), None))],
    )
    .unwrap_err();
    assert_eq!(
      err,
      BracketError::BackEdge {
        source_match: "B".to_string(),
        target: "A".to_string(),
      }
    );
  }

  #[test]
  fn test_rejects_unknown_target_and_duplicates() {
    let unknown = FlowGraph::new(
      ids(&["A"]),
      vec![("A".to_string(), edge(("Z", SlotIndex::One), None))],
    );
    assert!(matches!(unknown, Err(BracketError::UnknownMatch { .. })));

    let duplicate = FlowGraph::new(ids(&["A", "A"]), Vec::new());
    assert_eq!(duplicate.unwrap_err(), BracketError::DuplicateMatch("A".to_string()));
  }

  #[test]
  fn test_rejects_slot_fed_twice() {
    let err = FlowGraph::new(
      ids(&["A", "B", "C"]),
      vec![
        ("A".to_string(), edge(("C", SlotIndex::One), None)),
        ("B".to_string(), edge(("C", SlotIndex::One), None)),
      ],
    )
    .unwrap_err();
    assert_eq!(
      err,
      BracketError::SlotConflict {
        match_id: "C".to_string(),
        slot: 1,
      }
    );
  }

  #[test]
  fn test_slot_index_numbers() {
    assert_eq!(SlotIndex::from_number(1), Some(SlotIndex::One));
    assert_eq!(SlotIndex::from_number(3), None);
    assert_eq!(SlotIndex::Two.other(), SlotIndex::One);
    assert_eq!(serde_json::to_string(&SlotIndex::Two).unwrap(), "2");
    assert!(serde_json::from_str::<SlotIndex>("0").is_err());
  }
}
