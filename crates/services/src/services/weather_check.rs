//! Weather suitability evaluator.
//!
//! Compares a user's per-activity thresholds against one hourly forecast
//! sample and classifies the hour as `ok`, `precaucion`, `no_ok` or
//! `sin_datos`, with a human-readable reason per triggered rule. The
//! function is pure and total: missing data degrades to `sin_datos` or a
//! `precaucion` advisory, it never errors.

use db::models::preference::ActivityPreference;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

use super::forecast::ForecastHour;

/// WeatherAPI condition codes that imply some form of precipitation
/// (rain, snow, sleet and thunderstorm variants). Closed list, taken from
/// the provider's published condition taxonomy; update here if the
/// provider revises it.
pub const PRECIPITATING_CONDITION_CODES: &[i32] = &[
    1063, 1066, 1069, 1072, 1087, 1114, 1117, 1150, 1153, 1168, 1171, 1180, 1183, 1186, 1189,
    1192, 1195, 1198, 1201, 1204, 1207, 1210, 1213, 1216, 1219, 1222, 1225, 1237, 1240, 1243,
    1246, 1249, 1252, 1255, 1258, 1261, 1264, 1273, 1276, 1279, 1282,
];

pub fn is_precipitating_code(code: i32) -> bool {
    PRECIPITATING_CONDITION_CODES.contains(&code)
}

/// Suitability classification. Variant order defines escalation severity:
/// `ok < precaucion < no_ok`; `sin_datos` sits outside the escalation and
/// is only assigned up front when no judgment is possible.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    TS,
    EnumString,
    Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Suitability {
    Ok,
    Precaucion,
    NoOk,
    SinDatos,
}

/// Result of one evaluation: a status plus the triggered-rule reasons, in
/// check order. `reasons` is empty exactly when the status is `ok`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct WeatherCheck {
    pub status: Suitability,
    pub reasons: Vec<String>,
}

impl WeatherCheck {
    pub fn sin_datos(reason: impl Into<String>) -> Self {
        Self {
            status: Suitability::SinDatos,
            reasons: vec![reason.into()],
        }
    }
}

/// Threshold inputs for the evaluator. Unset means "no constraint".
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct PreferenceThresholds {
    pub min_temp: Option<i32>,
    pub max_temp: Option<i32>,
    pub max_wind_speed: Option<i32>,
    pub max_precipitation_probability: Option<i32>,
    pub max_precipitation_intensity: Option<f64>,
    pub requires_no_precipitation: bool,
    pub max_uv: Option<i32>,
}

impl PreferenceThresholds {
    /// True when no dimension is constrained, in which case no judgment is
    /// possible and the evaluation is `sin_datos`.
    pub fn is_unconstrained(&self) -> bool {
        self.min_temp.is_none()
            && self.max_temp.is_none()
            && self.max_wind_speed.is_none()
            && self.max_precipitation_probability.is_none()
            && self.max_precipitation_intensity.is_none()
            && !self.requires_no_precipitation
            && self.max_uv.is_none()
    }
}

impl From<&ActivityPreference> for PreferenceThresholds {
    fn from(pref: &ActivityPreference) -> Self {
        Self {
            min_temp: pref.min_temp,
            max_temp: pref.max_temp,
            max_wind_speed: pref.max_wind_speed,
            max_precipitation_probability: pref.max_precipitation_probability,
            max_precipitation_intensity: pref.max_precipitation_intensity,
            requires_no_precipitation: pref.requires_no_precipitation,
            max_uv: pref.max_uv,
        }
    }
}

/// Rounds a reading for the reason strings. Halves round away from zero
/// (20.5 → 21), matching how the client has always displayed readings.
fn round_reading(value: f64) -> i64 {
    value.round() as i64
}

/// Evaluate one forecast hour against the thresholds.
///
/// Checks run in a fixed order (temperature, wind, precipitation veto,
/// precipitation probability, intensity advisory, UV) and only ever
/// escalate the status, never lower it. Temperature and wind breaches are
/// blocking (`no_ok`); a probability breach is advisory only and stays at
/// `precaucion` even at 100%, unlike the hard `requires_no_precipitation`
/// veto. The intensity check is best-effort: the forecast carries no real
/// intensity figure, so it can only flag that precipitation is expected.
pub fn evaluate(
    prefs: Option<&PreferenceThresholds>,
    forecast_hour: Option<&ForecastHour>,
) -> WeatherCheck {
    let Some(hour) = forecast_hour else {
        return WeatherCheck::sin_datos("No hay datos de pronóstico para esta hora.");
    };
    let Some(prefs) = prefs.filter(|p| !p.is_unconstrained()) else {
        return WeatherCheck::sin_datos("No has definido preferencias para esta actividad.");
    };

    let mut status = Suitability::Ok;
    let mut reasons: Vec<String> = Vec::new();

    // Temperature: out of band is blocking.
    match hour.temp_c {
        Some(temp) => {
            if let Some(min) = prefs.min_temp {
                if temp < f64::from(min) {
                    reasons.push(format!(
                        "Temp. ({}°C) < Mín. ({min}°C)",
                        round_reading(temp)
                    ));
                    status = status.max(Suitability::NoOk);
                }
            }
            if let Some(max) = prefs.max_temp {
                if temp > f64::from(max) {
                    reasons.push(format!(
                        "Temp. ({}°C) > Máx. ({max}°C)",
                        round_reading(temp)
                    ));
                    status = status.max(Suitability::NoOk);
                }
            }
        }
        None => {
            reasons.push("Info de temperatura no disponible.".to_string());
            status = status.max(Suitability::Precaucion);
        }
    }

    // Wind: over the bound is blocking.
    match hour.wind_kph {
        Some(wind) => {
            if let Some(max) = prefs.max_wind_speed {
                if wind > f64::from(max) {
                    reasons.push(format!(
                        "Viento ({} km/h) > Máx. ({max} km/h)",
                        round_reading(wind)
                    ));
                    status = status.max(Suitability::NoOk);
                }
            }
        }
        None => {
            reasons.push("Info de viento no disponible.".to_string());
            status = status.max(Suitability::Precaucion);
        }
    }

    let condition_code = hour.condition.as_ref().and_then(|c| c.code);
    let condition_text = hour
        .condition
        .as_ref()
        .and_then(|c| c.text.as_deref())
        .unwrap_or("")
        .to_lowercase();
    let is_precipitating = condition_code.is_some_and(is_precipitating_code);

    // Hard veto when the user requires dry conditions.
    if prefs.requires_no_precipitation && is_precipitating {
        reasons.push(format!(
            "Requiere sin precip. y pronóstico es \"{condition_text}\""
        ));
        status = status.max(Suitability::NoOk);
    }

    // Rain probability is inherently uncertain: advisory only, never no_ok.
    match hour.chance_of_rain {
        Some(chance) => {
            if let Some(max) = prefs.max_precipitation_probability {
                if chance > max {
                    reasons.push(format!("Prob. Lluvia ({chance}%) > Máx. ({max}%)"));
                    status = status.max(Suitability::Precaucion);
                }
            }
        }
        None => {
            reasons.push("Info de prob. lluvia no disponible.".to_string());
            status = status.max(Suitability::Precaucion);
        }
    }

    // No intensity data exists; flag that precipitation of unknown strength
    // is forecast so the user can verify.
    if prefs.max_precipitation_intensity.is_some() && is_precipitating {
        reasons.push(format!(
            "Precipitación pronosticada (\"{condition_text}\"). Verifica intensidad."
        ));
        status = status.max(Suitability::Precaucion);
    }

    // UV over the bound is advisory, never blocking.
    match hour.uv {
        Some(uv) => {
            if let Some(max) = prefs.max_uv {
                if uv > f64::from(max) {
                    reasons.push(format!(
                        "Índice UV ({}) > Máx. ({max})",
                        round_reading(uv)
                    ));
                    status = status.max(Suitability::Precaucion);
                }
            }
        }
        None => {
            reasons.push("Info de Índice UV no disponible.".to_string());
            status = status.max(Suitability::Precaucion);
        }
    }

    // Invariant guard: any collected reason implies at least precaucion.
    if status == Suitability::Ok && !reasons.is_empty() {
        status = Suitability::Precaucion;
    }

    WeatherCheck { status, reasons }
}
