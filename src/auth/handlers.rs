use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{AuthResponse, Availability, LoginRequest, RegisterRequest},
        services,
    },
    error::{AppError, AppResult},
    extract::AppJson,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/check-username/:username", get(check_username))
        .route("/auth/check-email/:email", get(check_email))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let store = state.store()?;
    let user = services::register(store, &payload.email, &payload.username, &payload.password)
        .await?;
    let token = state.tokens.issue(&user.email, None)?;
    Ok((StatusCode::CREATED, Json(AuthResponse::bearer(token, user))))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let store = state.store()?;
    let user = services::authenticate(store, &payload.email, &payload.password)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Incorrect email or password".into()))?;

    let token = state
        .tokens
        .issue(&user.email, Some(state.tokens.access_ttl()))?;
    info!(user_id = user.id, "user logged in");
    Ok(Json(AuthResponse::bearer(token, user)))
}

#[instrument(skip(state))]
pub async fn check_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Json<Availability>> {
    let available = services::check_username_available(state.store()?, &username).await?;
    Ok(Json(Availability { available }))
}

#[instrument(skip(state))]
pub async fn check_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> AppResult<Json<Availability>> {
    let available = services::check_email_available(state.store()?, &email).await?;
    Ok(Json(Availability { available }))
}

// TODO: return PublicUser from CurrentUser once the profile fields are settled.
pub async fn get_me() -> AppError {
    AppError::Unimplemented("Endpoint not implemented yet".into())
}
