use serde::{Deserialize, Serialize};
use std::{
  collections::{btree_map::Entry, BTreeMap},
  sync::Arc,
};
use tracing::warn;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
  pub seed: u32,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub players: Vec<String>,
}

impl Team {
  pub fn display_name(&self) -> String {
    let trimmed = self.name.trim();
    if trimmed.is_empty() {
      format!("Team #{}", self.seed)
    } else {
      trimmed.to_string()
    }
  }
}

/// Seed-keyed lookup of the teams taking part. Teams are handed out as shared
/// `Arc`s so every slot holding a team points at the same record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TeamRegistry {
  by_seed: BTreeMap<u32, Arc<Team>>,
}

impl TeamRegistry {
  pub fn new() -> Self {
    TeamRegistry::default()
  }

  /// Builds the registry from raw document teams. Seed 0 and repeated seeds are
  /// dropped (first occurrence wins); blank names get their display fallback.
  pub fn from_teams(teams: Vec<Team>) -> Self {
    let mut by_seed = BTreeMap::new();
    for team in teams {
      if team.seed == 0 {
        warn!("Skipping team {:?}: seed must be positive", team.name);
        continue;
      }
      let name = team.display_name();
      match by_seed.entry(team.seed) {
        Entry::Occupied(_) => {
          warn!("Skipping team {:?}: seed {} is already taken", name, team.seed);
        }
        Entry::Vacant(slot) => {
          let players = team
            .players
            .into_iter()
            .map(|player| player.trim().to_string())
            .filter(|player| !player.is_empty())
            .collect();
          slot.insert(Arc::new(Team {
            seed: team.seed,
            name,
            players,
          }));
        }
      }
    }
    TeamRegistry { by_seed }
  }

  pub fn team(&self, seed: u32) -> Option<Arc<Team>> {
    self.by_seed.get(&seed).cloned()
  }

  /// Teams in seed order.
  pub fn teams(&self) -> impl Iterator<Item = &Arc<Team>> {
    self.by_seed.values()
  }

  pub fn len(&self) -> usize {
    self.by_seed.len()
  }

  pub fn is_empty(&self) -> bool {
    self.by_seed.is_empty()
  }
}
