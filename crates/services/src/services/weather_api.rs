//! WeatherAPI.com forecast client.

use std::fmt;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use super::forecast::ForecastResponse;

const WEATHER_API_URL: &str = "https://api.weatherapi.com/v1/forecast.json";

/// Forecast horizon requested from the provider. Agenda items beyond this
/// window evaluate to `sin_datos`.
pub const FORECAST_DAYS: u8 = 7;

#[derive(Debug, Clone, Error)]
pub enum WeatherApiError {
    #[error("missing api key: WEATHERAPI_API_KEY environment variable not set")]
    MissingApiKey,
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    /// Application-level error reported by the provider in the response
    /// body, e.g. code 1006 "No matching location found".
    #[error("provider error {code}: {message}")]
    Provider { code: i32, message: String },
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("json error: {0}")]
    Serde(String),
}

impl WeatherApiError {
    /// Returns true if the error is transient and should be retried.
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout => true,
            Self::Http { status, .. } => (500..=599).contains(status),
            _ => false,
        }
    }
}

/// Maps the provider's application error codes onto the HTTP status the
/// caller should see. Auth and quota problems on OUR key surface as 401,
/// malformed requests as 400, unknown locations as 404, disabled keys as
/// 403; anything unrecognized is a 502 from the upstream.
pub fn provider_error_status(code: i32) -> StatusCode {
    match code {
        1002 | 2006 => StatusCode::UNAUTHORIZED,
        1003 | 1005 | 9999 => StatusCode::BAD_REQUEST,
        1006 => StatusCode::NOT_FOUND,
        2007 | 2008 => StatusCode::FORBIDDEN,
        _ => StatusCode::BAD_GATEWAY,
    }
}

/// Location selector for a forecast request, rendered into the provider's
/// free-form `q` parameter.
#[derive(Debug, Clone)]
pub enum LocationQuery {
    Coordinates { lat: f64, lon: f64 },
    City(String),
}

impl fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coordinates { lat, lon } => write!(f, "{lat},{lon}"),
            Self::City(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WeatherApiClient {
    http: Client,
    api_key: String,
}

impl WeatherApiClient {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    /// Create a new client using the WEATHERAPI_API_KEY environment variable
    pub fn from_env() -> Result<Self, WeatherApiError> {
        let api_key =
            std::env::var("WEATHERAPI_API_KEY").map_err(|_| WeatherApiError::MissingApiKey)?;
        Self::new(api_key)
    }

    pub fn new(api_key: String) -> Result<Self, WeatherApiError> {
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("buentiempo/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WeatherApiError::Transport(e.to_string()))?;

        Ok(Self { http, api_key })
    }

    /// Fetch a forecast and return the raw provider payload. Exposed for
    /// the passthrough endpoint, which forwards the provider body as-is.
    pub async fn forecast_json(
        &self,
        query: &LocationQuery,
        days: u8,
    ) -> Result<Value, WeatherApiError> {
        (|| async { self.send_request(query, days).await })
            .retry(
                &ExponentialBuilder::default()
                    .with_min_delay(Duration::from_millis(500))
                    .with_max_delay(Duration::from_secs(5))
                    .with_max_times(2)
                    .with_jitter(),
            )
            .when(|e: &WeatherApiError| e.should_retry())
            .notify(|e, dur| {
                warn!(
                    "weather provider call failed, retrying after {:.2}s: {}",
                    dur.as_secs_f64(),
                    e
                )
            })
            .await
    }

    /// Fetch a forecast parsed into the typed model.
    pub async fn forecast(
        &self,
        query: &LocationQuery,
        days: u8,
    ) -> Result<ForecastResponse, WeatherApiError> {
        let raw = self.forecast_json(query, days).await?;
        serde_json::from_value(raw).map_err(|e| WeatherApiError::Serde(e.to_string()))
    }

    async fn send_request(
        &self,
        query: &LocationQuery,
        days: u8,
    ) -> Result<Value, WeatherApiError> {
        let res = self
            .http
            .get(WEATHER_API_URL)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", &query.to_string()),
                ("days", &days.to_string()),
                ("aqi", "no"),
                ("alerts", "no"),
                ("lang", "es"),
            ])
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = res.status();
        let body = res.text().await.map_err(map_reqwest_error)?;
        let value: Value = serde_json::from_str(&body)
            .map_err(|e| WeatherApiError::Serde(e.to_string()))?;

        // The provider reports application errors in the body (with a
        // non-2xx status) as {"error": {"code", "message"}}.
        if let Some(err) = value.get("error") {
            let code = err.get("code").and_then(Value::as_i64).unwrap_or(0) as i32;
            let message = err
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown provider error")
                .to_string();
            return Err(WeatherApiError::Provider { code, message });
        }
        if !status.is_success() {
            return Err(WeatherApiError::Http {
                status: status.as_u16(),
                body,
            });
        }

        Ok(value)
    }
}

fn map_reqwest_error(e: reqwest::Error) -> WeatherApiError {
    if e.is_timeout() {
        WeatherApiError::Timeout
    } else {
        WeatherApiError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_query_renders_for_provider() {
        let coords = LocationQuery::Coordinates {
            lat: 40.4168,
            lon: -3.7038,
        };
        assert_eq!(coords.to_string(), "40.4168,-3.7038");
        assert_eq!(
            LocationQuery::City("Valencia".to_string()).to_string(),
            "Valencia"
        );
    }

    #[test]
    fn provider_codes_map_to_http_statuses() {
        assert_eq!(provider_error_status(1002), StatusCode::UNAUTHORIZED);
        assert_eq!(provider_error_status(2006), StatusCode::UNAUTHORIZED);
        assert_eq!(provider_error_status(1003), StatusCode::BAD_REQUEST);
        assert_eq!(provider_error_status(1005), StatusCode::BAD_REQUEST);
        assert_eq!(provider_error_status(9999), StatusCode::BAD_REQUEST);
        assert_eq!(provider_error_status(1006), StatusCode::NOT_FOUND);
        assert_eq!(provider_error_status(2007), StatusCode::FORBIDDEN);
        assert_eq!(provider_error_status(2008), StatusCode::FORBIDDEN);
        assert_eq!(provider_error_status(1234), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn transient_errors_are_retryable() {
        assert!(WeatherApiError::Timeout.should_retry());
        assert!(WeatherApiError::Transport("reset".into()).should_retry());
        assert!(
            WeatherApiError::Http {
                status: 503,
                body: String::new()
            }
            .should_retry()
        );
        assert!(
            !WeatherApiError::Provider {
                code: 1006,
                message: String::new()
            }
            .should_retry()
        );
        assert!(!WeatherApiError::MissingApiKey.should_retry());
    }
}
