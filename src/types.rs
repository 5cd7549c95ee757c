use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex};

use crate::board::{SlotMark, SlotOrigin};
use crate::engine::BracketEngine;
use crate::flow::SlotIndex;
use crate::registry::Team;

// ── Constants ──────────────────────────────────────────────────────────

pub const DEFAULT_DATA_SOURCE: &str = "data/playoff12.json";
pub const DEFAULT_STATS_JSON_BASE: &str = "stats/";
pub const DEFAULT_STATIC_DIR: &str = "public";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:17890";
pub const FETCH_ATTEMPTS: u32 = 3;
pub const FETCH_BACKOFF_MS: u64 = 500;
pub const USER_AGENT: &str = "playoff-bracket";

// ── Shared state type aliases ──────────────────────────────────────────

/// One lock around the whole board: a cascade is never observed half done.
pub type SharedBracket = Arc<Mutex<BracketRuntime>>;

// ── Config ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// Bracket document: a path relative to the repo root, or an http(s) URL.
    pub data_source: String,
    /// Optional JSON object of `matchId -> 1 | 2` that wins over the document.
    pub results_override_path: String,
    pub can_edit: bool,
    pub stats_json_base: String,
    pub raw_fallback: String,
    pub static_dir: String,
    pub bind_addr: String,
}

// ── Runtime ────────────────────────────────────────────────────────────

pub struct BracketRuntime {
    pub engine: BracketEngine,
    pub last_error: Option<String>,
    pub loaded_at: String,
    pub loaded_at_ms: u64,
}

impl BracketRuntime {
    pub fn snapshot(&self) -> BracketState {
        let matches = self
            .engine
            .board()
            .matches()
            .map(|entry| MatchState {
                id: entry.id().to_string(),
                winner: entry.winner(),
                slots: SlotIndex::BOTH
                    .iter()
                    .map(|slot| {
                        let current = entry.slot(*slot);
                        SlotState {
                            slot: *slot,
                            team: current.team().map(|team| team.as_ref().clone()),
                            origin: current.origin().clone(),
                            result: current.mark(),
                        }
                    })
                    .collect(),
            })
            .collect();

        BracketState {
            can_edit: self.engine.can_edit(),
            last_error: self.last_error.clone(),
            loaded_at: self.loaded_at.clone(),
            loaded_at_ms: self.loaded_at_ms,
            team_count: self.engine.registry().len(),
            matches,
        }
    }
}

#[derive(Clone)]
pub struct ServerState {
    pub bracket: SharedBracket,
    pub config: Arc<AppConfig>,
}

// ── Payloads ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketState {
    pub can_edit: bool,
    pub last_error: Option<String>,
    pub loaded_at: String,
    pub loaded_at_ms: u64,
    pub team_count: usize,
    pub matches: Vec<MatchState>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchState {
    pub id: String,
    pub winner: Option<SlotIndex>,
    pub slots: Vec<SlotState>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotState {
    pub slot: SlotIndex,
    pub team: Option<Team>,
    pub origin: SlotOrigin,
    pub result: Option<SlotMark>,
}

/// Body of `POST /matches/:id/winner`. Anything but 1 or 2 clears the match.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WinnerRequest {
    pub slot: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub error: String,
}
