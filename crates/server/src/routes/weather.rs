use axum::{
    Router,
    extract::{Query, State},
    response::Json as ResponseJson,
    routing::get,
};
use serde::Deserialize;
use serde_json::Value;
use services::services::{
    geocode::GeocodeResult,
    weather_api::{FORECAST_DAYS, LocationQuery},
};
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError, session::CurrentUser};

#[derive(Debug, Deserialize)]
pub struct ForecastParams {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub city: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeParams {
    pub city: String,
}

fn location_query(params: &ForecastParams) -> Result<LocationQuery, ApiError> {
    match (params.lat, params.lon, params.city.as_deref()) {
        (Some(lat), Some(lon), _) => {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                return Err(ApiError::BadRequest(
                    "Coordenadas fuera de rango.".to_string(),
                ));
            }
            Ok(LocationQuery::Coordinates { lat, lon })
        }
        (None, None, Some(city)) if !city.trim().is_empty() => {
            Ok(LocationQuery::City(city.trim().to_string()))
        }
        _ => Err(ApiError::BadRequest(
            "Se requiere latitud/longitud o nombre de ciudad.".to_string(),
        )),
    }
}

/// GET /api/weather/data?lat&lon|city
/// Forecast passthrough: the provider payload is forwarded unmodified so
/// the client keeps access to every field.
pub async fn weather_data(
    State(state): State<AppState>,
    CurrentUser(_claims): CurrentUser,
    Query(params): Query<ForecastParams>,
) -> Result<ResponseJson<Value>, ApiError> {
    let query = location_query(&params)?;
    let payload = state.weather.forecast_json(&query, FORECAST_DAYS).await?;
    Ok(ResponseJson(payload))
}

/// GET /api/weather/geocode?city
pub async fn geocode(
    State(state): State<AppState>,
    Query(params): Query<GeocodeParams>,
) -> Result<ResponseJson<ApiResponse<Vec<GeocodeResult>>>, ApiError> {
    let city = params.city.trim();
    if city.is_empty() {
        return Err(ApiError::BadRequest(
            "Se requiere el nombre de la ciudad.".to_string(),
        ));
    }
    let results = state.geocode.search(city).await?;
    Ok(ResponseJson(ApiResponse::success(results)))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new().nest(
        "/weather",
        Router::new()
            .route("/data", get(weather_data))
            .route("/geocode", get(geocode)),
    )
}
