use crate::bracket_commands::*;
use crate::config::resolve_repo_path;
use crate::types::*;
use axum::{
    extract::{Path, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, get_service, post},
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::{error, info, warn};

const NO_STORE: [(&str, &str); 4] = [
    ("Content-Type", "application/json"),
    ("Cache-Control", "no-store"),
    ("Pragma", "no-cache"),
    ("Expires", "0"),
];

pub fn bracket_router(state: ServerState) -> Router {
    let static_files = get_service(ServeDir::new(resolve_repo_path(&state.config.static_dir)));

    Router::new()
        .route("/state.json", get(get_state_json))
        .route("/results.json", get(get_results_json))
        .route("/matches/:match_id/slots/:slot/toggle", post(post_toggle))
        .route("/matches/:match_id/winner", post(post_winner))
        .route("/reload", post(post_reload))
        .route("/stats/:account_id", get(get_stats))
        .fallback_service(static_files)
        .with_state(state)
}

pub async fn start_server(state: ServerState, addr: &str) {
    let app = bracket_router(state);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Bracket server failed to bind {addr}: {e}");
            return;
        }
    };
    info!("Bracket server listening at http://{addr}/");
    if let Err(e) = axum::serve(listener, app).await {
        error!("Bracket server error: {e}");
    }
}

// ── Responses ──────────────────────────────────────────────────────────

fn json_response<T: Serialize>(status: StatusCode, payload: &T) -> Response {
    let body = serde_json::to_string(payload).unwrap_or_else(|_| "{}".to_string());
    (status, NO_STORE, body).into_response()
}

fn error_status(err: &str) -> StatusCode {
    if err == EDIT_DISABLED {
        StatusCode::FORBIDDEN
    } else if err.starts_with("Unknown match") {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::BAD_REQUEST
    }
}

fn command_response<T: Serialize>(result: Result<T, String>) -> Response {
    match result {
        Ok(payload) => json_response(StatusCode::OK, &payload),
        Err(error) => {
            warn!("Bracket request rejected: {error}");
            json_response(error_status(&error), &ErrorPayload { error })
        }
    }
}

// ── Handlers ───────────────────────────────────────────────────────────

async fn get_state_json(AxumState(state): AxumState<ServerState>) -> Response {
    command_response(bracket_state(&state.bracket))
}

async fn get_results_json(AxumState(state): AxumState<ServerState>) -> Response {
    command_response(bracket_results(&state.bracket))
}

async fn post_toggle(
    AxumState(state): AxumState<ServerState>,
    Path((match_id, slot)): Path<(String, u8)>,
) -> Response {
    command_response(parse_slot(slot).and_then(|slot| bracket_toggle_slot(&state.bracket, &match_id, slot)))
}

async fn post_winner(
    AxumState(state): AxumState<ServerState>,
    Path(match_id): Path<String>,
    Json(body): Json<WinnerRequest>,
) -> Response {
    command_response(bracket_set_winner(&state.bracket, &match_id, &body.slot))
}

async fn post_reload(AxumState(state): AxumState<ServerState>) -> Response {
    let bracket = state.bracket.clone();
    let config = state.config.clone();
    let result = tokio::task::spawn_blocking(move || bracket_reload(&bracket, &config))
        .await
        .unwrap_or_else(|e| Err(format!("reload task failed: {e}")));
    match result {
        Err(error) if error != EDIT_DISABLED => {
            error!("Bracket reload failed: {error}");
            json_response(StatusCode::INTERNAL_SERVER_ERROR, &ErrorPayload { error })
        }
        other => command_response(other),
    }
}

async fn get_stats(
    AxumState(state): AxumState<ServerState>,
    Path(account_id): Path<String>,
) -> Response {
    let config = state.config.clone();
    let result = tokio::task::spawn_blocking(move || player_stats(&config, &account_id))
        .await
        .unwrap_or_else(|e| Err(format!("stats task failed: {e}")));
    match result {
        Ok(stats) => json_response(StatusCode::OK, &stats),
        Err(error) => json_response(StatusCode::NOT_FOUND, &ErrorPayload { error }),
    }
}
