//! Bearer-token extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use utils::jwt::Claims;

use crate::{AppState, error::ApiError};

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Extractor for routes that require authentication. Rejects with 401 when
/// the Authorization header is missing or the token does not verify.
pub struct CurrentUser(pub Claims);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::Unauthorized("No autenticado.".to_string()))?;
        let claims = state
            .auth
            .verify_token(token)
            .map_err(|_| ApiError::Unauthorized("Sesión inválida o expirada.".to_string()))?;
        Ok(Self(claims))
    }
}

/// Extractor for routes that serve both anonymous and authenticated callers.
/// A present-but-invalid token is still a 401, not silent anonymity.
pub struct MaybeUser(pub Option<Claims>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match bearer_token(parts) {
            None => Ok(Self(None)),
            Some(token) => {
                let claims = state.auth.verify_token(token).map_err(|_| {
                    ApiError::Unauthorized("Sesión inválida o expirada.".to_string())
                })?;
                Ok(Self(Some(claims)))
            }
        }
    }
}
