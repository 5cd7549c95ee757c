use crate::types::*;
use chrono::Local;
use std::{
    env,
    fs,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

pub fn repo_root() -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

pub fn resolve_repo_path(raw: &str) -> PathBuf {
  let path = PathBuf::from(raw);
  if path.is_absolute() {
    path
  } else {
    repo_root().join(path)
  }
}

pub fn config_path() -> PathBuf {
  match env_default("BRACKET_CONFIG_PATH") {
    Some(raw) => resolve_repo_path(&raw),
    None => repo_root().join("config.json"),
  }
}

pub fn is_http_source(raw: &str) -> bool {
  let lower = raw.trim().to_ascii_lowercase();
  lower.starts_with("http://") || lower.starts_with("https://")
}

pub fn env_default(key: &str) -> Option<String> {
  env::var(key)
    .ok()
    .map(|value| value.trim().to_string())
    .filter(|value| !value.is_empty())
}

pub fn env_flag_true_default(key: &str, default: bool) -> bool {
  match env::var(key) {
    Ok(value) => {
      let value = value.trim().to_ascii_lowercase();
      matches!(value.as_str(), "1" | "true" | "yes" | "on")
    }
    Err(_) => default,
  }
}

fn fill_from_env(field: &mut String, key: &str, fallback: &str) {
  if field.trim().is_empty() {
    if let Some(value) = env_default(key) {
      *field = value;
    }
  }
  if field.trim().is_empty() {
    *field = fallback.to_string();
  }
}

pub fn apply_env_defaults(mut config: AppConfig) -> AppConfig {
  fill_from_env(&mut config.data_source, "BRACKET_DATA_SOURCE", DEFAULT_DATA_SOURCE);
  fill_from_env(&mut config.results_override_path, "BRACKET_RESULTS_PATH", "");
  fill_from_env(&mut config.stats_json_base, "STATS_JSON_BASE", DEFAULT_STATS_JSON_BASE);
  fill_from_env(&mut config.raw_fallback, "STATS_RAW_FALLBACK", "");
  fill_from_env(&mut config.static_dir, "BRACKET_STATIC_DIR", DEFAULT_STATIC_DIR);
  fill_from_env(&mut config.bind_addr, "BRACKET_BIND_ADDR", DEFAULT_BIND_ADDR);
  config.can_edit = env_flag_true_default("BRACKET_CAN_EDIT", config.can_edit);
  config
}

pub fn load_config_inner() -> Result<AppConfig, String> {
  let path = config_path();
  if !path.is_file() {
    return Ok(apply_env_defaults(AppConfig::default()));
  }
  let data = fs::read_to_string(&path).map_err(|e| format!("read config {}: {e}", path.display()))?;
  let config =
    serde_json::from_str::<AppConfig>(&data).map_err(|e| format!("parse config {}: {e}", path.display()))?;
  Ok(apply_env_defaults(config))
}

pub fn load_env_file() {
  let env_path = repo_root().join(".env");
  if !env_path.is_file() {
    return;
  }
  let contents = match fs::read_to_string(&env_path) {
    Ok(data) => data,
    Err(_) => return,
  };
  for line in contents.lines() {
    if let Some((key, value)) = parse_env_line(line) {
      if env::var_os(&key).is_none() {
        env::set_var(key, value);
      }
    }
  }
}

pub fn parse_env_line(line: &str) -> Option<(String, String)> {
  let trimmed = line.trim();
  if trimmed.is_empty() || trimmed.starts_with('#') {
    return None;
  }
  let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
  let (key, raw_value) = trimmed.split_once('=')?;
  let key = key.trim();
  if key.is_empty() {
    return None;
  }
  let mut value = raw_value.trim();
  if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
    value = &value[1..value.len() - 1];
  } else if value.starts_with('\'') && value.ends_with('\'') && value.len() >= 2 {
    value = &value[1..value.len() - 1];
  } else if let Some(idx) = value.find('#') {
    value = value[..idx].trim_end();
  }
  Some((key.to_string(), value.to_string()))
}

pub fn now_ms() -> u64 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .unwrap_or_default()
    .as_millis() as u64
}

pub fn now_label() -> String {
  Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn log_env_warnings(config: &AppConfig) {
  let mut warnings = Vec::new();

  if !is_http_source(&config.data_source) && !resolve_repo_path(&config.data_source).is_file() {
    warnings.push(format!(
      "Bracket document {} not found; the board will stay empty",
      config.data_source
    ));
  }
  if !config.results_override_path.trim().is_empty()
    && !resolve_repo_path(&config.results_override_path).is_file()
  {
    warnings.push(format!(
      "Results override {} not found; only document results apply",
      config.results_override_path
    ));
  }
  if !resolve_repo_path(&config.static_dir).is_dir() {
    warnings.push(format!("Static dir {} not found; only the JSON routes will answer", config.static_dir));
  }
  if config.can_edit {
    warnings.push("BRACKET_CAN_EDIT is on; anyone reaching the server can change results".to_string());
  }

  for msg in warnings {
    tracing::warn!("{}", msg);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_env_line() {
    assert_eq!(
      parse_env_line("export BRACKET_CAN_EDIT=\"true\""),
      Some(("BRACKET_CAN_EDIT".to_string(), "true".to_string()))
    );
    assert_eq!(
      parse_env_line("STATS_JSON_BASE=stats/ # local copy"),
      Some(("STATS_JSON_BASE".to_string(), "stats/".to_string()))
    );
    assert_eq!(parse_env_line("# comment"), None);
    assert_eq!(parse_env_line("=value"), None);
  }

  #[test]
  fn test_is_http_source() {
    assert!(is_http_source("https://example.org/data/playoff12.json"));
    assert!(is_http_source(" HTTP://host/x.json"));
    assert!(!is_http_source("data/playoff12.json"));
  }

  #[test]
  fn test_config_fields_keep_explicit_values() {
    let config = apply_env_defaults(AppConfig {
      data_source: "custom/bracket.json".to_string(),
      static_dir: "site".to_string(),
      bind_addr: "0.0.0.0:8080".to_string(),
      stats_json_base: "player-stats/".to_string(),
      ..AppConfig::default()
    });
    assert_eq!(config.data_source, "custom/bracket.json");
    assert_eq!(config.static_dir, "site");
    assert_eq!(config.bind_addr, "0.0.0.0:8080");
    assert_eq!(config.stats_json_base, "player-stats/");
  }

  #[test]
  fn test_config_deserializes_camel_case_with_defaults() {
    let config: AppConfig =
      serde_json::from_str(r#"{ "dataSource": "https://example.org/b.json", "canEdit": true }"#).unwrap();
    assert_eq!(config.data_source, "https://example.org/b.json");
    assert!(config.can_edit);
    assert!(config.static_dir.is_empty());
  }

  #[test]
  fn test_resolve_repo_path() {
    assert_eq!(resolve_repo_path("data/x.json"), repo_root().join("data/x.json"));
    assert!(resolve_repo_path("/tmp/x.json").is_absolute());
  }
}
