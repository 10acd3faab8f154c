//! Per-event suitability: resolves the event's location and forecast hour,
//! loads the owner's thresholds and runs the evaluator.

use chrono::Timelike;
use db::models::{agenda::AgendaItem, preference::ActivityPreference, user::User};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::debug;

use super::weather_api::{FORECAST_DAYS, LocationQuery, WeatherApiClient, WeatherApiError};
use super::weather_check::{self, PreferenceThresholds, WeatherCheck};

#[derive(Debug, Error)]
pub enum SuitabilityError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Weather(#[from] WeatherApiError),
}

#[derive(Clone)]
pub struct SuitabilityService {
    pool: SqlitePool,
    weather: WeatherApiClient,
}

impl SuitabilityService {
    pub fn new(pool: SqlitePool, weather: WeatherApiClient) -> Self {
        Self { pool, weather }
    }

    /// Evaluate weather suitability for one agenda item at its start hour.
    ///
    /// Location comes from the item itself, falling back to the owner's
    /// default coordinates; with neither, the verdict is `sin_datos`
    /// without calling the provider. Provider and database failures are
    /// surfaced as errors, not folded into `sin_datos`.
    pub async fn check_item(&self, item: &AgendaItem) -> Result<WeatherCheck, SuitabilityError> {
        let Some((lat, lon)) = self.resolve_coordinates(item).await? else {
            return Ok(WeatherCheck::sin_datos(
                "Sin ubicación para consultar el pronóstico.",
            ));
        };

        let query = LocationQuery::Coordinates { lat, lon };
        let forecast = self.weather.forecast(&query, FORECAST_DAYS).await?;
        let hour = forecast.hour_for(item.date, item.start_time.hour());
        debug!(
            item_id = %item.id,
            date = %item.date,
            hour = item.start_time.hour(),
            found = hour.is_some(),
            "matched forecast hour"
        );
        // Outside the forecast window there is nothing to evaluate against;
        // skip the preference lookup entirely.
        let Some(hour) = hour else {
            return Ok(WeatherCheck::sin_datos(
                "No hay datos de pronóstico para esta hora.",
            ));
        };

        let preference =
            ActivityPreference::find_by_user_and_activity(&self.pool, item.user_id, item.activity_id)
                .await?;
        let thresholds = preference.as_ref().map(PreferenceThresholds::from);

        Ok(weather_check::evaluate(thresholds.as_ref(), Some(hour)))
    }

    async fn resolve_coordinates(
        &self,
        item: &AgendaItem,
    ) -> Result<Option<(f64, f64)>, sqlx::Error> {
        if let Some(coords) = item.latitude.zip(item.longitude) {
            return Ok(Some(coords));
        }
        let user = User::find_by_id(&self.pool, item.user_id).await?;
        Ok(user.and_then(|u| u.default_latitude.zip(u.default_longitude)))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime, Utc};
    use db::DBService;
    use uuid::Uuid;

    use super::*;
    use crate::services::weather_check::Suitability;

    fn service(db: &DBService) -> SuitabilityService {
        let weather = WeatherApiClient::new("test-key".to_string()).expect("weather client");
        SuitabilityService::new(db.pool.clone(), weather)
    }

    fn item(user_id: Uuid, latitude: Option<f64>, longitude: Option<f64>) -> AgendaItem {
        AgendaItem {
            id: Uuid::new_v4(),
            user_id,
            activity_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2030, 6, 1).unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            notes: None,
            latitude,
            longitude,
            recurrence: None,
            reminder_enabled: false,
            reminder_offset_minutes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    async fn user_with_defaults(db: &DBService, defaults: Option<(f64, f64)>) -> Uuid {
        let user = db::models::user::User::create(
            &db.pool,
            Uuid::new_v4(),
            "ana@example.com",
            None,
            "$2b$12$hash",
        )
        .await
        .unwrap();
        if let Some((lat, lon)) = defaults {
            db::models::user::User::update_default_location(
                &db.pool,
                user.id,
                Some(lat),
                Some(lon),
            )
            .await
            .unwrap();
        }
        user.id
    }

    #[tokio::test]
    async fn no_location_anywhere_is_sin_datos_without_calling_out() {
        let db = DBService::new_in_memory().await.unwrap();
        let service = service(&db);
        // Unknown owner, no coordinates on the item: no provider call happens.
        let check = service
            .check_item(&item(Uuid::new_v4(), None, None))
            .await
            .unwrap();
        assert_eq!(check.status, Suitability::SinDatos);
        assert_eq!(check.reasons.len(), 1);
        assert!(check.reasons[0].contains("Sin ubicación"));
    }

    #[tokio::test]
    async fn owner_without_defaults_is_also_sin_datos() {
        let db = DBService::new_in_memory().await.unwrap();
        let service = service(&db);
        let user_id = user_with_defaults(&db, None).await;
        let check = service.check_item(&item(user_id, None, None)).await.unwrap();
        assert_eq!(check.status, Suitability::SinDatos);
        assert!(check.reasons[0].contains("Sin ubicación"));
    }

    #[tokio::test]
    async fn item_coordinates_win_over_user_defaults() {
        let db = DBService::new_in_memory().await.unwrap();
        let service = service(&db);
        let user_id = user_with_defaults(&db, Some((41.39, 2.17))).await;
        let coords = service
            .resolve_coordinates(&item(user_id, Some(40.4168), Some(-3.7038)))
            .await
            .unwrap();
        assert_eq!(coords, Some((40.4168, -3.7038)));
    }

    #[tokio::test]
    async fn user_defaults_backfill_missing_item_coordinates() {
        let db = DBService::new_in_memory().await.unwrap();
        let service = service(&db);
        let user_id = user_with_defaults(&db, Some((41.39, 2.17))).await;
        let coords = service
            .resolve_coordinates(&item(user_id, None, None))
            .await
            .unwrap();
        assert_eq!(coords, Some((41.39, 2.17)));
    }
}
