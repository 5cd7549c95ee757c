use crate::config::*;
use crate::flow::SlotIndex;
use crate::loader::build_runtime;
use crate::results::{normalize_result, ResultsMap};
use crate::stats::load_player_stats;
use crate::types::*;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

pub const EDIT_DISABLED: &str = "Editing is disabled.";

// ── Helpers ─────────────────────────────────────────────────────────────

/// Lock the mutex, then call `f` with the runtime.
fn with_runtime<F, R>(bracket: &SharedBracket, f: F) -> Result<R, String>
where
    F: FnOnce(&mut BracketRuntime) -> Result<R, String>,
{
    let mut guard = bracket.lock().map_err(|e| e.to_string())?;
    f(&mut guard)
}

/// Read-only access; recovers a poisoned lock.
fn read_runtime<F, R>(bracket: &SharedBracket, f: F) -> R
where
    F: FnOnce(&BracketRuntime) -> R,
{
    let guard = bracket.lock().unwrap_or_else(|e| e.into_inner());
    f(&guard)
}

fn check_edit_mode(runtime: &BracketRuntime) -> Result<(), String> {
    if !runtime.engine.can_edit() {
        return Err(EDIT_DISABLED.to_string());
    }
    Ok(())
}

fn check_match(runtime: &BracketRuntime, match_id: &str) -> Result<(), String> {
    if !runtime.engine.board().contains(match_id) {
        return Err(format!("Unknown match '{match_id}'."));
    }
    Ok(())
}

pub fn parse_slot(raw: u8) -> Result<SlotIndex, String> {
    SlotIndex::from_number(raw).ok_or_else(|| format!("Slot must be 1 or 2, got {raw}."))
}

// ── Commands ────────────────────────────────────────────────────────────

pub fn bracket_state(bracket: &SharedBracket) -> Result<BracketState, String> {
    Ok(read_runtime(bracket, BracketRuntime::snapshot))
}

pub fn bracket_results(bracket: &SharedBracket) -> Result<ResultsMap, String> {
    Ok(read_runtime(bracket, |runtime| runtime.engine.results()))
}

/// Click on a slot: pick it as winner, or clear the match when it already won.
pub fn bracket_toggle_slot(
    bracket: &SharedBracket,
    match_id: &str,
    slot: SlotIndex,
) -> Result<BracketState, String> {
    with_runtime(bracket, |runtime| {
        check_edit_mode(runtime)?;
        check_match(runtime, match_id)?;
        if runtime.engine.toggle(match_id, slot)? {
            info!("Toggled {match_id} slot {}", slot.number());
        }
        Ok(runtime.snapshot())
    })
}

/// Explicit result entry. `raw` follows results-file rules: 1 or 2 picks a
/// winner, anything else clears the match.
pub fn bracket_set_winner(
    bracket: &SharedBracket,
    match_id: &str,
    raw: &Value,
) -> Result<BracketState, String> {
    with_runtime(bracket, |runtime| {
        check_edit_mode(runtime)?;
        check_match(runtime, match_id)?;
        let winner = normalize_result(raw);
        if runtime.engine.set_winner(match_id, winner) {
            match winner {
                Some(slot) => info!("Set winner of {match_id} to slot {}", slot.number()),
                None => info!("Cleared {match_id}"),
            }
        }
        Ok(runtime.snapshot())
    })
}

/// Reloads the document and override from `config`. The new runtime replaces
/// the old one in a single swap. A layout error keeps the old one; a document
/// that fails to load keeps the old board and only records the failure.
pub fn bracket_reload(bracket: &SharedBracket, config: &AppConfig) -> Result<BracketState, String> {
    read_runtime(bracket, check_edit_mode)?;
    let next = build_runtime(config).map_err(|e| e.to_string())?;
    with_runtime(bracket, |runtime| {
        if let Some(err) = next.last_error.as_deref() {
            warn!("Reload failed, keeping the board from {}: {err}", runtime.loaded_at);
            runtime.last_error = Some(err.to_string());
            return Ok(runtime.snapshot());
        }
        *runtime = next;
        info!("Bracket reloaded at {}", runtime.loaded_at);
        Ok(runtime.snapshot())
    })
}

pub fn player_stats(config: &AppConfig, account_id: &str) -> Result<Value, String> {
    load_player_stats(config, account_id)
}

/// Builds the initial runtime; only an invalid layout is an error.
pub fn bootstrap_bracket(config: &AppConfig) -> Result<SharedBracket, String> {
    let runtime = build_runtime(config).map_err(|e| e.to_string())?;
    if let Some(err) = runtime.last_error.as_deref() {
        warn!("Serving a seeded-only bracket: {err}");
    }
    info!(
        "Bracket ready: {} teams, source {} ({})",
        runtime.engine.registry().len(),
        config.data_source,
        if is_http_source(&config.data_source) { "http" } else { "file" }
    );
    Ok(Arc::new(Mutex::new(runtime)))
}
