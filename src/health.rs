use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use tracing::instrument;

use crate::{error::AppResult, state::AppState};

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(|| async { "ok" }))
        .route("/db-check", get(db_check))
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "HabitQuest API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "ok",
    }))
}

#[instrument(skip(state))]
async fn db_check(State(state): State<AppState>) -> AppResult<Json<Value>> {
    state.store()?.ping().await?;
    Ok(Json(json!({
        "status": "connected",
        "message": "Database connected successfully",
    })))
}
