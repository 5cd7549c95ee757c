use crate::config::*;
use crate::engine::{BracketEngine, EngineOptions};
use crate::error::BracketError;
use crate::registry::{Team, TeamRegistry};
use crate::results::ResultsMap;
use crate::types::*;
use serde::Deserialize;
use serde_json::Value;
use std::{fs, thread::sleep, time::Duration};
use tracing::{error, info, warn};

/// The bracket input: who plays, and which matches are already decided.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct BracketDocument {
  pub teams: Vec<Team>,
  pub results: ResultsMap,
}

pub fn fetch_text(url: &str) -> Result<String, BracketError> {
  let client = reqwest::blocking::Client::new();
  let mut last_err = String::new();
  let mut resp = None;
  for attempt in 0..FETCH_ATTEMPTS {
    if attempt > 0 {
      sleep(Duration::from_millis(FETCH_BACKOFF_MS * u64::from(attempt)));
    }
    match client.get(url).header("User-Agent", USER_AGENT).send() {
      Ok(r) => {
        resp = Some(r);
        break;
      }
      Err(e) => {
        last_err = format!("request failed (attempt {}): {e}", attempt + 1);
        warn!("fetch {url}: {last_err}");
      }
    }
  }
  let resp = resp.ok_or_else(|| BracketError::Fetch {
    url: url.to_string(),
    message: last_err,
  })?;
  let status = resp.status();
  if !status.is_success() {
    return Err(BracketError::Fetch {
      url: url.to_string(),
      message: format!("status {status}"),
    });
  }
  resp.text().map_err(|e| BracketError::Fetch {
    url: url.to_string(),
    message: format!("read failed: {e}"),
  })
}

/// Reads a path (relative to the repo root) or fetches an http(s) URL.
pub fn read_source(source: &str) -> Result<String, BracketError> {
  let trimmed = source.trim();
  if is_http_source(trimmed) {
    return fetch_text(trimmed);
  }
  let path = resolve_repo_path(trimmed);
  fs::read_to_string(&path).map_err(|e| BracketError::Read {
    path: path.display().to_string(),
    message: e.to_string(),
  })
}

pub fn parse_bracket_document(data: &str, label: &str) -> Result<BracketDocument, BracketError> {
  serde_json::from_str::<BracketDocument>(data).map_err(|e| BracketError::Parse {
    source_label: label.to_string(),
    message: e.to_string(),
  })
}

pub fn load_bracket_document(source: &str) -> Result<BracketDocument, BracketError> {
  let data = read_source(source)?;
  parse_bracket_document(&data, source.trim())
}

/// Optional results override. Unset means `None`; a missing or malformed file
/// is logged and treated as absent.
pub fn load_results_override(path: &str) -> Option<ResultsMap> {
  let trimmed = path.trim();
  if trimmed.is_empty() {
    return None;
  }
  let data = match read_source(trimmed) {
    Ok(data) => data,
    Err(err) => {
      warn!("Ignoring results override: {err}");
      return None;
    }
  };
  match serde_json::from_str::<Value>(&data) {
    Ok(value @ Value::Object(_)) => Some(ResultsMap::from_value(&value)),
    Ok(_) => {
      warn!("Ignoring results override {trimmed}: expected a JSON object");
      None
    }
    Err(e) => {
      warn!("Ignoring results override {trimmed}: {e}");
      None
    }
  }
}

/// Builds a runtime from an already loaded (or failed) document. On a document
/// failure the board is left seeded-only and the error is kept for display.
/// Only an invalid bracket layout is fatal.
pub fn build_runtime_from(
  document: Result<BracketDocument, BracketError>,
  overrides: Option<ResultsMap>,
  options: EngineOptions,
) -> Result<BracketRuntime, BracketError> {
  let (teams, results, last_error) = match document {
    Ok(document) => (document.teams, Some(document.results), None),
    Err(err) => {
      error!("Bracket document load error: {err}");
      (Vec::new(), None, Some(err.to_string()))
    }
  };

  let registry = TeamRegistry::from_teams(teams);
  let mut engine = BracketEngine::playoff12(registry, options)?;

  if let Some(results) = results {
    let merged = match overrides {
      Some(overrides) => ResultsMap::merged(&results, &overrides),
      None => results,
    };
    let applied = engine.apply_results(&merged);
    info!(
      "Bracket loaded: {} teams, {} of {} results applied",
      engine.registry().len(),
      applied,
      merged.len()
    );
  }

  Ok(BracketRuntime {
    engine,
    last_error,
    loaded_at: now_label(),
    loaded_at_ms: now_ms(),
  })
}

pub fn build_runtime(config: &AppConfig) -> Result<BracketRuntime, BracketError> {
  let document = load_bracket_document(&config.data_source);
  let overrides = load_results_override(&config.results_override_path);
  build_runtime_from(
    document,
    overrides,
    EngineOptions {
      can_edit: config.can_edit,
    },
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::flow::SlotIndex;
  use std::io::Write;

  const DOCUMENT: &str = r#"{
    "teams": [
      { "seed": 1, "name": "Alpha", "players": ["a1", "a2"] },
      { "seed": 5, "name": "Echo", "players": ["e1"] },
      { "seed": 12, "name": "Lima" }
    ],
    "results": { "W-R1-M1": 2, "W-Q2": 1 }
  }"#;

  fn seed_in(runtime: &BracketRuntime, match_id: &str, slot: SlotIndex) -> Option<u32> {
    runtime
      .engine
      .board()
      .read_slot(match_id, slot)
      .and_then(|s| s.team())
      .map(|team| team.seed)
  }

  #[test]
  fn test_parse_document() {
    let document = parse_bracket_document(DOCUMENT, "inline").unwrap();
    assert_eq!(document.teams.len(), 3);
    assert!(document.teams[2].players.is_empty());
    assert_eq!(document.results.get("W-R1-M1"), Some(Some(SlotIndex::Two)));
  }

  #[test]
  fn test_parse_error_names_source() {
    let err = parse_bracket_document("{ not json", "data/broken.json").unwrap_err();
    assert!(matches!(err, BracketError::Parse { ref source_label, .. } if source_label == "data/broken.json"));
  }

  #[test]
  fn test_runtime_applies_document_results() {
    let document = parse_bracket_document(DOCUMENT, "inline");
    let runtime = build_runtime_from(document, None, EngineOptions::default()).unwrap();

    assert!(runtime.last_error.is_none());
    assert_eq!(seed_in(&runtime, "W-Q2", SlotIndex::Two), Some(12));
    assert_eq!(seed_in(&runtime, "L-R1-M2", SlotIndex::Two), Some(5));
    // W-Q2 slot 1 is seed 4, which the document does not list.
    assert_eq!(runtime.engine.board().winner("W-Q2"), None);
  }

  #[test]
  fn test_override_wins_over_document() {
    let document = parse_bracket_document(DOCUMENT, "inline");
    let overrides = ResultsMap::from_value(&serde_json::json!({ "W-R1-M1": 1 }));
    let runtime = build_runtime_from(document, Some(overrides), EngineOptions::default()).unwrap();

    assert_eq!(runtime.engine.board().winner("W-R1-M1"), Some(SlotIndex::One));
    assert_eq!(seed_in(&runtime, "W-Q2", SlotIndex::Two), Some(5));
  }

  #[test]
  fn test_failed_document_leaves_seeded_board() {
    let failed = Err(BracketError::Read {
      path: "missing.json".to_string(),
      message: "not found".to_string(),
    });
    let overrides = ResultsMap::from_value(&serde_json::json!({ "W-R1-M1": 1 }));
    let runtime = build_runtime_from(failed, Some(overrides), EngineOptions::default()).unwrap();

    assert_eq!(runtime.last_error.as_deref(), Some("read missing.json: not found"));
    assert!(runtime.engine.registry().is_empty());
    assert!(runtime.engine.board().matches().all(|entry| entry.winner().is_none()));
  }

  #[test]
  fn test_load_document_and_override_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let doc_path = dir.path().join("bracket.json");
    fs::File::create(&doc_path)
      .unwrap()
      .write_all(DOCUMENT.as_bytes())
      .unwrap();
    let override_path = dir.path().join("override.json");
    fs::write(&override_path, r#"{ "W-Q2": 2 }"#).unwrap();
    let bad_override = dir.path().join("bad.json");
    fs::write(&bad_override, "[1, 2]").unwrap();

    let document = load_bracket_document(doc_path.to_str().unwrap()).unwrap();
    assert_eq!(document.teams.len(), 3);

    let overrides = load_results_override(override_path.to_str().unwrap()).unwrap();
    assert_eq!(overrides.get("W-Q2"), Some(Some(SlotIndex::Two)));
    assert!(load_results_override(bad_override.to_str().unwrap()).is_none());
    assert!(load_results_override("").is_none());
    assert!(load_results_override(dir.path().join("nope.json").to_str().unwrap()).is_none());
  }

  #[test]
  fn test_missing_document_is_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.json");
    let err = load_bracket_document(missing.to_str().unwrap()).unwrap_err();
    assert!(matches!(err, BracketError::Read { .. }));
  }
}
