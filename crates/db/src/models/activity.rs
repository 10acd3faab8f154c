use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

use super::preference::PreferenceValues;

/// An outdoor pursuit users can schedule. `user_id` is `None` for standard
/// activities suggested to everyone; those cannot be deleted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Activity {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub icon_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Activity {
    pub fn is_standard(&self) -> bool {
        self.user_id.is_none()
    }
}

/// Request body for creating an activity, optionally with its initial
/// weather preference in the same call.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateActivity {
    pub name: String,
    pub description: Option<String>,
    pub icon_name: Option<String>,
    pub preferences: Option<PreferenceValues>,
}

impl Activity {
    /// Standard activities plus, when a user is given, that user's own.
    pub async fn find_visible(
        pool: &SqlitePool,
        user_id: Option<Uuid>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Activity>(
            r#"SELECT id, user_id, name, description, icon_name, created_at, updated_at
               FROM activities
               WHERE user_id IS NULL OR ($1 IS NOT NULL AND user_id = $1)
               ORDER BY user_id IS NOT NULL, name ASC"#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Activity>(
            r#"SELECT id, user_id, name, description, icon_name, created_at, updated_at
               FROM activities
               WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create<'e, E>(
        executor: E,
        id: Uuid,
        user_id: Option<Uuid>,
        data: &CreateActivity,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Activity>(
            r#"INSERT INTO activities (id, user_id, name, description, icon_name)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING id, user_id, name, description, icon_name, created_at, updated_at"#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(&data.icon_name)
        .fetch_one(executor)
        .await
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM activities WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
