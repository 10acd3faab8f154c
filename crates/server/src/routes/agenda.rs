use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::get,
};
use chrono::{NaiveDate, Utc};
use db::models::{
    activity::Activity,
    agenda::{AgendaItem, AgendaItemFields, AgendaItemWithActivity},
    user::User,
};
use serde::Deserialize;
use services::services::weather_check::WeatherCheck;
use utils::{clock, response::ApiResponse};
use uuid::Uuid;

use crate::{AppState, error::ApiError, session::CurrentUser};

/// Cap on the /upcoming listing.
const UPCOMING_LIMIT: i64 = 7;

#[derive(Debug, Deserialize)]
pub struct AgendaItemRequest {
    pub activity_id: Uuid,
    pub date: NaiveDate,
    /// `HH:MM` or `HH:MM:SS`.
    pub start_time: String,
    pub end_time: String,
    pub notes: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub recurrence: Option<String>,
    #[serde(default)]
    pub reminder_enabled: bool,
    pub reminder_offset_minutes: Option<i32>,
}

/// Validates a request body into an insertable field set. Coordinates must
/// come as a pair; when absent entirely they fall back to the caller's
/// default location. Disabling reminders clears the offset.
async fn validate_request(
    state: &AppState,
    user_id: Uuid,
    payload: &AgendaItemRequest,
) -> Result<AgendaItemFields, ApiError> {
    let activity = Activity::find_by_id(&state.db.pool, payload.activity_id)
        .await?
        .filter(|a| a.is_standard() || a.user_id == Some(user_id))
        .ok_or_else(|| ApiError::NotFound("La actividad especificada no existe.".to_string()))?;

    let start_time = clock::parse_time_of_day(&payload.start_time)
        .ok_or_else(|| ApiError::BadRequest("Formato de hora inválido.".to_string()))?;
    let end_time = clock::parse_time_of_day(&payload.end_time)
        .ok_or_else(|| ApiError::BadRequest("Formato de hora inválido.".to_string()))?;
    if end_time <= start_time {
        return Err(ApiError::BadRequest(
            "Hora de fin debe ser posterior a inicio.".to_string(),
        ));
    }

    let (latitude, longitude) = match (payload.latitude, payload.longitude) {
        (Some(lat), Some(lon)) => {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                return Err(ApiError::BadRequest(
                    "Coordenadas fuera de rango.".to_string(),
                ));
            }
            (Some(lat), Some(lon))
        }
        (None, None) => {
            let user = User::find_by_id(&state.db.pool, user_id).await?;
            match user.and_then(|u| u.default_latitude.zip(u.default_longitude)) {
                Some((lat, lon)) => (Some(lat), Some(lon)),
                None => (None, None),
            }
        }
        _ => {
            return Err(ApiError::BadRequest(
                "Latitud y longitud deben enviarse juntas.".to_string(),
            ));
        }
    };

    Ok(AgendaItemFields {
        activity_id: activity.id,
        date: payload.date,
        start_time,
        end_time,
        notes: payload.notes.clone(),
        latitude,
        longitude,
        recurrence: payload.recurrence.clone(),
        reminder_enabled: payload.reminder_enabled,
        reminder_offset_minutes: payload
            .reminder_offset_minutes
            .filter(|_| payload.reminder_enabled),
    })
}

/// Ownership check shared by the per-item routes.
async fn owned_item(
    state: &AppState,
    user_id: Uuid,
    event_id: Uuid,
) -> Result<AgendaItem, ApiError> {
    let item = AgendaItem::find_by_id(&state.db.pool, event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Evento no encontrado.".to_string()))?;
    if item.user_id != user_id {
        return Err(ApiError::Forbidden(
            "No tienes permiso sobre este evento.".to_string(),
        ));
    }
    Ok(item)
}

/// GET /api/agenda
pub async fn list_agenda(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<ResponseJson<ApiResponse<Vec<AgendaItemWithActivity>>>, ApiError> {
    let items =
        AgendaItem::find_from_date(&state.db.pool, claims.sub, Utc::now().date_naive()).await?;
    Ok(ResponseJson(ApiResponse::success(items)))
}

/// GET /api/agenda/upcoming
/// Next items, dropping any that already ended today.
pub async fn upcoming_agenda(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<ResponseJson<ApiResponse<Vec<AgendaItemWithActivity>>>, ApiError> {
    let now = Utc::now();
    let mut items = AgendaItem::find_upcoming(
        &state.db.pool,
        claims.sub,
        now.date_naive(),
        UPCOMING_LIMIT,
    )
    .await?;
    items.retain(|item| item.ends_after(now));
    Ok(ResponseJson(ApiResponse::success(items)))
}

/// POST /api/agenda
pub async fn create_agenda_item(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    axum::Json(payload): axum::Json<AgendaItemRequest>,
) -> Result<ResponseJson<ApiResponse<AgendaItemWithActivity>>, ApiError> {
    let fields = validate_request(&state, claims.sub, &payload).await?;
    let item = AgendaItem::create(&state.db.pool, Uuid::new_v4(), claims.sub, &fields).await?;
    let joined = AgendaItem::find_with_activity(&state.db.pool, item.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Evento no encontrado.".to_string()))?;
    Ok(ResponseJson(ApiResponse::success(joined)))
}

/// PUT /api/agenda/{event_id}
pub async fn update_agenda_item(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(event_id): Path<Uuid>,
    axum::Json(payload): axum::Json<AgendaItemRequest>,
) -> Result<ResponseJson<ApiResponse<AgendaItemWithActivity>>, ApiError> {
    owned_item(&state, claims.sub, event_id).await?;
    let fields = validate_request(&state, claims.sub, &payload).await?;
    let item = AgendaItem::update(&state.db.pool, event_id, &fields).await?;
    let joined = AgendaItem::find_with_activity(&state.db.pool, item.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Evento no encontrado.".to_string()))?;
    Ok(ResponseJson(ApiResponse::success(joined)))
}

/// DELETE /api/agenda/{event_id}
pub async fn delete_agenda_item(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(event_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    owned_item(&state, claims.sub, event_id).await?;
    AgendaItem::delete(&state.db.pool, event_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

/// GET /api/agenda/{event_id}/suitability
/// Evaluates the caller's thresholds against the forecast hour of the event.
pub async fn agenda_item_suitability(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(event_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<WeatherCheck>>, ApiError> {
    let item = owned_item(&state, claims.sub, event_id).await?;
    let check = state.suitability.check_item(&item).await?;
    Ok(ResponseJson(ApiResponse::success(check)))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new().nest(
        "/agenda",
        Router::new()
            .route("/", get(list_agenda).post(create_agenda_item))
            .route("/upcoming", get(upcoming_agenda))
            .route(
                "/{event_id}",
                axum::routing::put(update_agenda_item).delete(delete_agenda_item),
            )
            .route("/{event_id}/suitability", get(agenda_item_suitability)),
    )
}
