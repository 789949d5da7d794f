use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::warn;

use super::{jwt::TokenService, repo_types::User};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
    storage::Store,
};

const INVALID_TOKEN: &str = "Invalid or expired token";

/// Maps a bearer token to the user it was issued for.
pub async fn resolve_session(
    store: &dyn Store,
    tokens: &TokenService,
    token: &str,
) -> AppResult<User> {
    let claims = tokens.validate(token).map_err(|_| {
        warn!("invalid or expired token");
        AppError::Unauthorized(INVALID_TOKEN.into())
    })?;
    let email = claims
        .sub
        .ok_or_else(|| AppError::Unauthorized(INVALID_TOKEN.into()))?;

    store.find_user_by_email(&email).await?.ok_or_else(|| {
        warn!(%email, "token subject has no user");
        AppError::Unauthorized(INVALID_TOKEN.into())
    })
}

/// Authenticated caller, resolved from the `Authorization: Bearer` header.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Read Authorization header
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Not authenticated".into()))?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let user = resolve_session(state.store()?, &state.tokens, token.trim()).await?;
        Ok(CurrentUser(user))
    }
}
