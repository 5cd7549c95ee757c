use crate::config::*;
use crate::loader::fetch_text;
use crate::types::AppConfig;
use serde_json::Value;
use std::fs;
use tracing::{debug, warn};

/// Pulls the numeric account id out of a profile link such as
/// `https://site/accounts/123456-nick`.
pub fn account_id_from_url(url: &str) -> Option<String> {
  let (_, rest) = url.split_once("/accounts/")?;
  let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
  if digits.is_empty() || !rest[digits.len()..].starts_with('-') {
    return None;
  }
  Some(digits)
}

fn is_account_id(raw: &str) -> bool {
  !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit())
}

fn read_stats_text(base: &str, account_id: &str) -> Result<String, String> {
  let base = base.trim();
  if is_http_source(base) {
    let url = format!("{base}{account_id}.json?ts={}", now_ms());
    return fetch_text(&url).map_err(|e| e.to_string());
  }
  let path = resolve_repo_path(&format!("{base}{account_id}.json"));
  fs::read_to_string(&path).map_err(|e| format!("read {}: {e}", path.display()))
}

/// Loads the stats JSON for one player. The primary base is tried first, then
/// `raw_fallback` when it is set. A payload carrying an `error` string is
/// reported as that error.
pub fn load_player_stats(config: &AppConfig, account_id: &str) -> Result<Value, String> {
  let account_id = account_id.trim();
  if !is_account_id(account_id) {
    return Err(format!("Invalid account id '{account_id}'"));
  }

  let text = match read_stats_text(&config.stats_json_base, account_id) {
    Ok(text) => text,
    Err(primary) if !config.raw_fallback.trim().is_empty() => {
      debug!("Stats for {account_id} not at primary base ({primary}); trying fallback");
      read_stats_text(&config.raw_fallback, account_id).map_err(|e| {
        warn!("Stats for {account_id} unavailable: {e}");
        e
      })?
    }
    Err(primary) => {
      warn!("Stats for {account_id} unavailable: {primary}");
      return Err(primary);
    }
  };

  let data: Value =
    serde_json::from_str(&text).map_err(|e| format!("parse stats for {account_id}: {e}"))?;
  if let Some(message) = data.get("error").and_then(Value::as_str) {
    return Err(message.to_string());
  }
  Ok(data)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn config_for(base: &std::path::Path, fallback: Option<&std::path::Path>) -> AppConfig {
    AppConfig {
      stats_json_base: format!("{}/", base.display()),
      raw_fallback: fallback
        .map(|dir| format!("{}/", dir.display()))
        .unwrap_or_default(),
      ..AppConfig::default()
    }
  }

  #[test]
  fn test_account_id_from_url() {
    assert_eq!(
      account_id_from_url("https://faceit.example/ru/accounts/1234567-player_one"),
      Some("1234567".to_string())
    );
    assert_eq!(account_id_from_url("https://x/accounts/42-a/b"), Some("42".to_string()));
    assert_eq!(account_id_from_url("https://x/accounts/abc-a"), None);
    assert_eq!(account_id_from_url("https://x/accounts/123"), None);
    assert_eq!(account_id_from_url("https://x/players/123-a"), None);
    assert_eq!(account_id_from_url(""), None);
  }

  #[test]
  fn test_rejects_non_digit_id() {
    let config = AppConfig::default();
    assert!(load_player_stats(&config, "../secret").is_err());
    assert!(load_player_stats(&config, "").is_err());
    assert!(load_player_stats(&config, "12a").is_err());
  }

  #[test]
  fn test_reads_primary_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("77.json"), r#"{ "matches": 12, "kd": 1.4 }"#).unwrap();

    let stats = load_player_stats(&config_for(dir.path(), None), "77").unwrap();
    assert_eq!(stats, json!({ "matches": 12, "kd": 1.4 }));
  }

  #[test]
  fn test_falls_back_when_primary_missing() {
    let primary = tempfile::tempdir().unwrap();
    let fallback = tempfile::tempdir().unwrap();
    fs::write(fallback.path().join("88.json"), r#"{ "matches": 3 }"#).unwrap();

    let config = config_for(primary.path(), Some(fallback.path()));
    assert_eq!(load_player_stats(&config, "88").unwrap(), json!({ "matches": 3 }));

    let missing = config_for(primary.path(), None);
    assert!(load_player_stats(&missing, "88").is_err());
  }

  #[test]
  fn test_error_field_is_surfaced() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("99.json"), r#"{ "error": "profile is private" }"#).unwrap();
    fs::write(dir.path().join("100.json"), "not json").unwrap();

    let config = config_for(dir.path(), None);
    assert_eq!(load_player_stats(&config, "99").unwrap_err(), "profile is private");
    assert!(load_player_stats(&config, "100").unwrap_err().starts_with("parse stats for 100"));
  }
}
