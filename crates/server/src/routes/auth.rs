use axum::{
    Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{post, put},
};
use db::models::user::{User, UserSummary};
use serde::{Deserialize, Serialize};
use services::services::auth::{LoginRequest, RegisterRequest};
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError, session::CurrentUser};

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserSummary,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLocation {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<RegisterRequest>,
) -> Result<ResponseJson<ApiResponse<UserSummary>>, ApiError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email y contraseña son obligatorios.".to_string(),
        ));
    }
    let user = state.auth.register(&state.db.pool, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(UserSummary::from(&user))))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<LoginRequest>,
) -> Result<ResponseJson<ApiResponse<LoginResponse>>, ApiError> {
    let (user, token) = state
        .auth
        .login(&state.db.pool, &payload.email, &payload.password)
        .await?;
    Ok(ResponseJson(ApiResponse::success(LoginResponse {
        token,
        user: UserSummary::from(&user),
    })))
}

/// PUT /api/auth/location
/// Set or clear the caller's default coordinates.
pub async fn update_location(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    axum::Json(payload): axum::Json<UpdateLocation>,
) -> Result<ResponseJson<ApiResponse<UserSummary>>, ApiError> {
    match (payload.latitude, payload.longitude) {
        (Some(lat), Some(lon)) => {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                return Err(ApiError::BadRequest(
                    "Coordenadas fuera de rango.".to_string(),
                ));
            }
        }
        (None, None) => {}
        _ => {
            return Err(ApiError::BadRequest(
                "Latitud y longitud deben enviarse juntas.".to_string(),
            ));
        }
    }

    User::update_default_location(&state.db.pool, claims.sub, payload.latitude, payload.longitude)
        .await?;
    let user = User::find_by_id(&state.db.pool, claims.sub)
        .await?
        .ok_or_else(|| ApiError::NotFound("Usuario no encontrado.".to_string()))?;
    Ok(ResponseJson(ApiResponse::success(UserSummary::from(&user))))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new().nest(
        "/auth",
        Router::new()
            .route("/register", post(register))
            .route("/login", post(login))
            .route("/location", put(update_location)),
    )
}
