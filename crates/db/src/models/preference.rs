use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// Per-user, per-activity weather thresholds. Every bound is optional;
/// an unset bound means "no constraint" for that dimension.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct ActivityPreference {
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity_id: Uuid,
    /// Acceptable temperature band, °C.
    pub min_temp: Option<i32>,
    pub max_temp: Option<i32>,
    /// Upper wind bound, km/h.
    pub max_wind_speed: Option<i32>,
    /// Upper rain-chance bound, percent 0-100.
    pub max_precipitation_probability: Option<i32>,
    /// Advisory bound, mm/h. The forecast carries no true intensity value.
    pub max_precipitation_intensity: Option<f64>,
    /// Hard veto when any precipitation is forecast.
    pub requires_no_precipitation: bool,
    pub max_uv: Option<i32>,
    /// Whether this preference participates in scheduling views.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Threshold fields as submitted from a form. `None` means "leave the stored
/// value untouched" on update and "use the column default" on create.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct PreferenceValues {
    pub min_temp: Option<i32>,
    pub max_temp: Option<i32>,
    pub max_wind_speed: Option<i32>,
    pub max_precipitation_probability: Option<i32>,
    pub max_precipitation_intensity: Option<f64>,
    pub requires_no_precipitation: Option<bool>,
    pub max_uv: Option<i32>,
    pub is_active: Option<bool>,
}

/// Request body for the preference upsert endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpsertPreference {
    pub activity_id: Uuid,
    #[serde(flatten)]
    pub values: PreferenceValues,
}

impl ActivityPreference {
    pub async fn find_by_user(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ActivityPreference>(
            r#"SELECT id, user_id, activity_id, min_temp, max_temp, max_wind_speed,
                      max_precipitation_probability, max_precipitation_intensity,
                      requires_no_precipitation, max_uv, is_active, created_at, updated_at
               FROM activity_preferences
               WHERE user_id = $1
               ORDER BY created_at ASC"#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_user_and_activity(
        pool: &SqlitePool,
        user_id: Uuid,
        activity_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ActivityPreference>(
            r#"SELECT id, user_id, activity_id, min_temp, max_temp, max_wind_speed,
                      max_precipitation_probability, max_precipitation_intensity,
                      requires_no_precipitation, max_uv, is_active, created_at, updated_at
               FROM activity_preferences
               WHERE user_id = $1 AND activity_id = $2"#,
        )
        .bind(user_id)
        .bind(activity_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create<'e, E>(
        executor: E,
        id: Uuid,
        user_id: Uuid,
        activity_id: Uuid,
        values: &PreferenceValues,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, ActivityPreference>(
            r#"INSERT INTO activity_preferences
                   (id, user_id, activity_id, min_temp, max_temp, max_wind_speed,
                    max_precipitation_probability, max_precipitation_intensity,
                    requires_no_precipitation, max_uv, is_active)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
               RETURNING id, user_id, activity_id, min_temp, max_temp, max_wind_speed,
                         max_precipitation_probability, max_precipitation_intensity,
                         requires_no_precipitation, max_uv, is_active, created_at, updated_at"#,
        )
        .bind(id)
        .bind(user_id)
        .bind(activity_id)
        .bind(values.min_temp)
        .bind(values.max_temp)
        .bind(values.max_wind_speed)
        .bind(values.max_precipitation_probability)
        .bind(values.max_precipitation_intensity)
        .bind(values.requires_no_precipitation.unwrap_or(false))
        .bind(values.max_uv)
        .bind(values.is_active.unwrap_or(true))
        .fetch_one(executor)
        .await
    }

    /// Create or partially update the preference for (user, activity).
    /// Fields left `None` in `values` keep their stored value.
    pub async fn upsert(
        pool: &SqlitePool,
        user_id: Uuid,
        activity_id: Uuid,
        values: &PreferenceValues,
    ) -> Result<Self, sqlx::Error> {
        match Self::find_by_user_and_activity(pool, user_id, activity_id).await? {
            None => Self::create(pool, Uuid::new_v4(), user_id, activity_id, values).await,
            Some(existing) => {
                sqlx::query_as::<_, ActivityPreference>(
                    r#"UPDATE activity_preferences
                       SET min_temp = $3, max_temp = $4, max_wind_speed = $5,
                           max_precipitation_probability = $6,
                           max_precipitation_intensity = $7,
                           requires_no_precipitation = $8, max_uv = $9, is_active = $10,
                           updated_at = CURRENT_TIMESTAMP
                       WHERE user_id = $1 AND activity_id = $2
                       RETURNING id, user_id, activity_id, min_temp, max_temp, max_wind_speed,
                                 max_precipitation_probability, max_precipitation_intensity,
                                 requires_no_precipitation, max_uv, is_active,
                                 created_at, updated_at"#,
                )
                .bind(user_id)
                .bind(activity_id)
                .bind(values.min_temp.or(existing.min_temp))
                .bind(values.max_temp.or(existing.max_temp))
                .bind(values.max_wind_speed.or(existing.max_wind_speed))
                .bind(
                    values
                        .max_precipitation_probability
                        .or(existing.max_precipitation_probability),
                )
                .bind(
                    values
                        .max_precipitation_intensity
                        .or(existing.max_precipitation_intensity),
                )
                .bind(
                    values
                        .requires_no_precipitation
                        .unwrap_or(existing.requires_no_precipitation),
                )
                .bind(values.max_uv.or(existing.max_uv))
                .bind(values.is_active.unwrap_or(existing.is_active))
                .fetch_one(pool)
                .await
            }
        }
    }
}
