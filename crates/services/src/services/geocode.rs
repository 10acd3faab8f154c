//! Forward geocoding via the public Nominatim API.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use ts_rs::TS;

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Nominatim's usage policy requires an identifying User-Agent; anonymous
/// clients get blocked.
const USER_AGENT: &str = concat!(
    "buentiempo/",
    env!("CARGO_PKG_VERSION"),
    " (activity planner)"
);

const MAX_RESULTS: u8 = 5;

#[derive(Debug, Clone, Error)]
pub enum GeocodeError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("json error: {0}")]
    Serde(String),
}

/// Raw Nominatim hit. Coordinates arrive as strings and are parsed during
/// simplification.
#[derive(Debug, Clone, Deserialize)]
struct NominatimPlace {
    place_id: i64,
    lat: String,
    lon: String,
    display_name: String,
    #[serde(rename = "type")]
    place_type: Option<String>,
    address: Option<Value>,
}

/// A geocoding hit with coordinates ready for a forecast query.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct GeocodeResult {
    pub place_id: i64,
    pub display_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub place_type: Option<String>,
    pub address: Option<Value>,
}

fn simplify(places: Vec<NominatimPlace>) -> Vec<GeocodeResult> {
    places
        .into_iter()
        .filter_map(|p| {
            // Unparsable coordinates make the hit useless downstream.
            let latitude = p.lat.parse::<f64>().ok()?;
            let longitude = p.lon.parse::<f64>().ok()?;
            Some(GeocodeResult {
                place_id: p.place_id,
                display_name: p.display_name,
                latitude,
                longitude,
                place_type: p.place_type,
                address: p.address,
            })
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct GeocodeClient {
    http: Client,
}

impl GeocodeClient {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new() -> Result<Self, GeocodeError> {
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| GeocodeError::Transport(e.to_string()))?;
        Ok(Self { http })
    }

    /// Resolve a free-form place name to candidate coordinates.
    pub async fn search(&self, query: &str) -> Result<Vec<GeocodeResult>, GeocodeError> {
        let res = self
            .http
            .get(NOMINATIM_URL)
            .query(&[
                ("q", query),
                ("format", "jsonv2"),
                ("limit", &MAX_RESULTS.to_string()),
                ("addressdetails", "1"),
            ])
            .send()
            .await
            .map_err(|e| GeocodeError::Transport(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(GeocodeError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let places: Vec<NominatimPlace> = res
            .json()
            .await
            .map_err(|e| GeocodeError::Serde(e.to_string()))?;
        Ok(simplify(places))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simplify_parses_string_coordinates() {
        let places: Vec<NominatimPlace> = serde_json::from_value(serde_json::json!([
            {
                "place_id": 12345,
                "lat": "40.4167754",
                "lon": "-3.7037902",
                "display_name": "Madrid, Comunidad de Madrid, España",
                "type": "city",
                "address": {"city": "Madrid", "country": "España"}
            }
        ]))
        .unwrap();

        let results = simplify(places);
        assert_eq!(results.len(), 1);
        assert!((results[0].latitude - 40.4167754).abs() < 1e-9);
        assert!((results[0].longitude - (-3.7037902)).abs() < 1e-9);
        assert_eq!(results[0].place_type.as_deref(), Some("city"));
    }

    #[test]
    fn simplify_drops_unparsable_coordinates() {
        let places: Vec<NominatimPlace> = serde_json::from_value(serde_json::json!([
            {"place_id": 1, "lat": "not-a-number", "lon": "-3.70", "display_name": "x"},
            {"place_id": 2, "lat": "41.0", "lon": "2.1", "display_name": "y"}
        ]))
        .unwrap();

        let results = simplify(places);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].place_id, 2);
    }
}
