use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{delete, get},
};
use db::models::{
    activity::{Activity, CreateActivity},
    preference::ActivityPreference,
};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiError,
    session::{CurrentUser, MaybeUser},
};

/// GET /api/activities
/// Standard activities plus, for authenticated callers, their own.
pub async fn list_activities(
    State(state): State<AppState>,
    MaybeUser(claims): MaybeUser,
) -> Result<ResponseJson<ApiResponse<Vec<Activity>>>, ApiError> {
    let activities =
        Activity::find_visible(&state.db.pool, claims.map(|c| c.sub)).await?;
    Ok(ResponseJson(ApiResponse::success(activities)))
}

/// POST /api/activities
/// Creates the activity and, when thresholds are supplied, its initial
/// preference row in the same transaction.
pub async fn create_activity(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    axum::Json(payload): axum::Json<CreateActivity>,
) -> Result<ResponseJson<ApiResponse<Activity>>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "El nombre de la actividad es obligatorio.".to_string(),
        ));
    }

    let mut tx = state.db.pool.begin().await?;
    let activity = Activity::create(&mut *tx, Uuid::new_v4(), Some(claims.sub), &payload)
        .await
        .map_err(|err| {
            if err
                .as_database_error()
                .is_some_and(|e| e.is_unique_violation())
            {
                ApiError::Conflict(format!(
                    "Ya tienes una actividad llamada \"{}\".",
                    payload.name
                ))
            } else {
                ApiError::Database(err)
            }
        })?;
    if let Some(values) = &payload.preferences {
        ActivityPreference::create(&mut *tx, Uuid::new_v4(), claims.sub, activity.id, values)
            .await?;
    }
    tx.commit().await?;

    Ok(ResponseJson(ApiResponse::success(activity)))
}

/// DELETE /api/activities/{activity_id}
pub async fn delete_activity(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(activity_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let activity = Activity::find_by_id(&state.db.pool, activity_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Actividad no encontrada.".to_string()))?;
    if activity.is_standard() {
        return Err(ApiError::Forbidden(
            "No puedes eliminar actividades estándar.".to_string(),
        ));
    }
    if activity.user_id != Some(claims.sub) {
        return Err(ApiError::Forbidden(
            "No tienes permiso sobre esta actividad.".to_string(),
        ));
    }

    // Preferences and agenda items referencing it go with it (ON DELETE CASCADE).
    Activity::delete(&state.db.pool, activity_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new().nest(
        "/activities",
        Router::new()
            .route("/", get(list_activities).post(create_activity))
            .route("/{activity_id}", delete(delete_activity)),
    )
}
