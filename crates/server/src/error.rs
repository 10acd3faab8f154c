//! API error type and its HTTP mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::services::{
    auth::AuthError,
    geocode::GeocodeError,
    suitability::SuitabilityError,
    weather_api::{WeatherApiError, provider_error_status},
};
use thiserror::Error;
use tracing::error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Weather(#[from] WeatherApiError),
    #[error(transparent)]
    Geocode(#[from] GeocodeError),
}

impl From<SuitabilityError> for ApiError {
    fn from(err: SuitabilityError) -> Self {
        match err {
            SuitabilityError::Database(e) => Self::Database(e),
            SuitabilityError::Weather(e) => Self::Weather(e),
        }
    }
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::Database(err) => {
                error!("database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error interno del servidor.".to_string(),
                )
            }
            Self::Auth(err) => match err {
                AuthError::EmailTaken => (
                    StatusCode::CONFLICT,
                    "El email ya está registrado.".to_string(),
                ),
                AuthError::UsernameTaken => (
                    StatusCode::CONFLICT,
                    "El nombre de usuario ya está en uso.".to_string(),
                ),
                AuthError::InvalidCredentials => (
                    StatusCode::UNAUTHORIZED,
                    "Credenciales inválidas.".to_string(),
                ),
                AuthError::Token(_) => (
                    StatusCode::UNAUTHORIZED,
                    "Sesión inválida o expirada.".to_string(),
                ),
                AuthError::Database(e) => {
                    error!("database error during auth: {e}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Error interno del servidor.".to_string(),
                    )
                }
                AuthError::Hash(e) => {
                    error!("password hashing error: {e}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Error interno del servidor.".to_string(),
                    )
                }
            },
            Self::Weather(err) => match err {
                WeatherApiError::Provider { code, message } => {
                    (provider_error_status(*code), message.clone())
                }
                WeatherApiError::MissingApiKey => {
                    error!("{err}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Servicio meteorológico no configurado.".to_string(),
                    )
                }
                other => {
                    error!("weather provider error: {other}");
                    (
                        StatusCode::BAD_GATEWAY,
                        "No se pudo obtener el pronóstico.".to_string(),
                    )
                }
            },
            Self::Geocode(err) => {
                error!("geocoding error: {err}");
                (
                    StatusCode::BAD_GATEWAY,
                    "No se pudo geocodificar la ubicación.".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        (status, Json(ApiResponse::<()>::error(&message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_surface_the_mapped_status() {
        let err = ApiError::Weather(WeatherApiError::Provider {
            code: 1006,
            message: "No matching location found.".to_string(),
        });
        let (status, message) = err.status_and_message();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(message, "No matching location found.");
    }

    #[test]
    fn database_errors_do_not_leak_details() {
        let err = ApiError::Database(sqlx::Error::RowNotFound);
        let (status, message) = err.status_and_message();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Error interno del servidor.");
    }
}
