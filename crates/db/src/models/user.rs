use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: Option<String>,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,
    /// Fallback coordinates for agenda items created without a location.
    pub default_latitude: Option<f64>,
    pub default_longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public view of a user, safe to return from auth endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            created_at: user.created_at,
        }
    }
}

impl User {
    pub async fn create(
        pool: &SqlitePool,
        id: Uuid,
        email: &str,
        username: Option<&str>,
        password_hash: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"INSERT INTO users (id, email, username, password_hash)
               VALUES ($1, $2, $3, $4)
               RETURNING id, email, username, password_hash,
                         default_latitude, default_longitude,
                         created_at, updated_at"#,
        )
        .bind(id)
        .bind(email)
        .bind(username)
        .bind(password_hash)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"SELECT id, email, username, password_hash,
                      default_latitude, default_longitude,
                      created_at, updated_at
               FROM users
               WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"SELECT id, email, username, password_hash,
                      default_latitude, default_longitude,
                      created_at, updated_at
               FROM users
               WHERE email = $1"#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    pub async fn update_default_location(
        pool: &SqlitePool,
        id: Uuid,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"UPDATE users
               SET default_latitude = $2, default_longitude = $3,
                   updated_at = CURRENT_TIMESTAMP
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(latitude)
        .bind(longitude)
        .execute(pool)
        .await?;
        Ok(())
    }
}
