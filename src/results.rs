use crate::flow::SlotIndex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// Declared outcomes keyed by match id. `None` means "clear this match".
/// Keys absent from the map leave their match untouched when applied.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResultsMap {
  entries: BTreeMap<String, Option<SlotIndex>>,
}

impl ResultsMap {
  pub fn new() -> Self {
    ResultsMap::default()
  }

  /// Reads a JSON object of `matchId -> 1 | 2`. Anything that is not an object
  /// yields an empty map; values other than 1 or 2 become "clear".
  pub fn from_value(value: &Value) -> Self {
    let mut results = ResultsMap::new();
    match value {
      Value::Object(map) => {
        for (match_id, raw) in map {
          let normalized = normalize_result(raw);
          if normalized.is_none() && !raw.is_null() {
            warn!("Result for {match_id} is not 1 or 2 ({raw}); treating it as undecided");
          }
          results.insert(match_id.clone(), normalized);
        }
      }
      Value::Null => {}
      other => {
        warn!("Ignoring results: expected an object, got {other}");
      }
    }
    results
  }

  pub fn insert(&mut self, match_id: impl Into<String>, winner: Option<SlotIndex>) {
    self.entries.insert(match_id.into(), winner);
  }

  /// `Some(None)` when the map explicitly clears the match, `None` when absent.
  pub fn get(&self, match_id: &str) -> Option<Option<SlotIndex>> {
    self.entries.get(match_id).copied()
  }

  pub fn contains(&self, match_id: &str) -> bool {
    self.entries.contains_key(match_id)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, Option<SlotIndex>)> {
    self.entries.iter().map(|(id, winner)| (id.as_str(), *winner))
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Layers `overrides` on top of `base`; an override key always wins.
  pub fn merged(base: &ResultsMap, overrides: &ResultsMap) -> ResultsMap {
    let mut entries = base.entries.clone();
    for (match_id, winner) in &overrides.entries {
      entries.insert(match_id.clone(), *winner);
    }
    ResultsMap { entries }
  }
}

impl<'de> Deserialize<'de> for ResultsMap {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    let value = Value::deserialize(deserializer)?;
    Ok(ResultsMap::from_value(&value))
  }
}

/// Accepts the numbers 1 and 2, also when written as strings ("2", " 1 ").
pub fn normalize_result(raw: &Value) -> Option<SlotIndex> {
  let number = match raw {
    Value::Number(n) => n.as_f64()?,
    Value::String(s) => s.trim().parse::<f64>().ok()?,
    _ => return None,
  };
  if number == 1.0 {
    Some(SlotIndex::One)
  } else if number == 2.0 {
    Some(SlotIndex::Two)
  } else {
    None
  }
}
