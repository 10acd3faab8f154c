use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use db::models::{
    activity::Activity,
    preference::{ActivityPreference, UpsertPreference},
};
use utils::response::ApiResponse;

use crate::{
    AppState,
    error::ApiError,
    session::{CurrentUser, MaybeUser},
};

/// GET /api/preferences
/// Anonymous callers get an empty list rather than a 401 so the client can
/// render defaults without a session.
pub async fn list_preferences(
    State(state): State<AppState>,
    MaybeUser(claims): MaybeUser,
) -> Result<ResponseJson<ApiResponse<Vec<ActivityPreference>>>, ApiError> {
    let preferences = match claims {
        Some(claims) => ActivityPreference::find_by_user(&state.db.pool, claims.sub).await?,
        None => Vec::new(),
    };
    Ok(ResponseJson(ApiResponse::success(preferences)))
}

/// POST /api/preferences
/// Upsert keyed on (user, activity); omitted fields keep their stored value.
pub async fn upsert_preference(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    axum::Json(payload): axum::Json<UpsertPreference>,
) -> Result<ResponseJson<ApiResponse<ActivityPreference>>, ApiError> {
    if Activity::find_by_id(&state.db.pool, payload.activity_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound(
            "La actividad especificada no existe.".to_string(),
        ));
    }

    let preference = ActivityPreference::upsert(
        &state.db.pool,
        claims.sub,
        payload.activity_id,
        &payload.values,
    )
    .await?;
    Ok(ResponseJson(ApiResponse::success(preference)))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new().nest(
        "/preferences",
        Router::new().route("/", get(list_preferences).post(upsert_preference)),
    )
}
