use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// A scheduled occurrence of an activity at a date and time window.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct AgendaItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub notes: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub recurrence: Option<String>,
    pub reminder_enabled: bool,
    pub reminder_offset_minutes: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AgendaItem {
    /// Whether the item's end instant (date + end time, UTC) is after `now`.
    /// Used to drop already-finished items from the upcoming view.
    pub fn ends_after(&self, now: DateTime<Utc>) -> bool {
        Utc.from_utc_datetime(&self.date.and_time(self.end_time)) > now
    }
}

/// Activity fields joined into agenda listings for display.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct AgendaActivitySummary {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub icon_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct AgendaItemWithActivity {
    #[serde(flatten)]
    #[ts(flatten)]
    pub item: AgendaItem,
    pub activity: AgendaActivitySummary,
}

impl std::ops::Deref for AgendaItemWithActivity {
    type Target = AgendaItem;
    fn deref(&self) -> &Self::Target {
        &self.item
    }
}

/// Flat row shape for the agenda × activity join.
#[derive(Debug, FromRow)]
struct AgendaItemRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub notes: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub recurrence: Option<String>,
    pub reminder_enabled: bool,
    pub reminder_offset_minutes: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub activity_user_id: Option<Uuid>,
    pub activity_name: String,
    pub activity_icon_name: Option<String>,
}

impl From<AgendaItemRow> for AgendaItemWithActivity {
    fn from(row: AgendaItemRow) -> Self {
        Self {
            activity: AgendaActivitySummary {
                id: row.activity_id,
                user_id: row.activity_user_id,
                name: row.activity_name,
                icon_name: row.activity_icon_name,
            },
            item: AgendaItem {
                id: row.id,
                user_id: row.user_id,
                activity_id: row.activity_id,
                date: row.date,
                start_time: row.start_time,
                end_time: row.end_time,
                notes: row.notes,
                latitude: row.latitude,
                longitude: row.longitude,
                recurrence: row.recurrence,
                reminder_enabled: row.reminder_enabled,
                reminder_offset_minutes: row.reminder_offset_minutes,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        }
    }
}

const JOINED_SELECT: &str = r#"SELECT
    ag.id, ag.user_id, ag.activity_id, ag.date, ag.start_time, ag.end_time,
    ag.notes, ag.latitude, ag.longitude, ag.recurrence,
    ag.reminder_enabled, ag.reminder_offset_minutes, ag.created_at, ag.updated_at,
    a.user_id AS activity_user_id, a.name AS activity_name, a.icon_name AS activity_icon_name
FROM agenda_items ag
JOIN activities a ON a.id = ag.activity_id"#;

/// Validated field set for inserting or replacing an agenda item. Raw request
/// parsing (time strings, coordinate checks) happens at the route layer.
#[derive(Debug, Clone)]
pub struct AgendaItemFields {
    pub activity_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub notes: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub recurrence: Option<String>,
    pub reminder_enabled: bool,
    pub reminder_offset_minutes: Option<i32>,
}

impl AgendaItem {
    pub async fn find_from_date(
        pool: &SqlitePool,
        user_id: Uuid,
        from: NaiveDate,
    ) -> Result<Vec<AgendaItemWithActivity>, sqlx::Error> {
        let rows = sqlx::query_as::<_, AgendaItemRow>(&format!(
            "{JOINED_SELECT}\nWHERE ag.user_id = $1 AND ag.date >= $2\nORDER BY ag.date ASC, ag.start_time ASC"
        ))
        .bind(user_id)
        .bind(from)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn find_upcoming(
        pool: &SqlitePool,
        user_id: Uuid,
        from: NaiveDate,
        limit: i64,
    ) -> Result<Vec<AgendaItemWithActivity>, sqlx::Error> {
        let rows = sqlx::query_as::<_, AgendaItemRow>(&format!(
            "{JOINED_SELECT}\nWHERE ag.user_id = $1 AND ag.date >= $2\nORDER BY ag.date ASC, ag.start_time ASC\nLIMIT $3"
        ))
        .bind(user_id)
        .bind(from)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, AgendaItem>(
            r#"SELECT id, user_id, activity_id, date, start_time, end_time, notes,
                      latitude, longitude, recurrence, reminder_enabled,
                      reminder_offset_minutes, created_at, updated_at
               FROM agenda_items
               WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_with_activity(
        pool: &SqlitePool,
        id: Uuid,
    ) -> Result<Option<AgendaItemWithActivity>, sqlx::Error> {
        let row = sqlx::query_as::<_, AgendaItemRow>(&format!("{JOINED_SELECT}\nWHERE ag.id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(Into::into))
    }

    pub async fn create(
        pool: &SqlitePool,
        id: Uuid,
        user_id: Uuid,
        fields: &AgendaItemFields,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, AgendaItem>(
            r#"INSERT INTO agenda_items
                   (id, user_id, activity_id, date, start_time, end_time, notes,
                    latitude, longitude, recurrence, reminder_enabled, reminder_offset_minutes)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
               RETURNING id, user_id, activity_id, date, start_time, end_time, notes,
                         latitude, longitude, recurrence, reminder_enabled,
                         reminder_offset_minutes, created_at, updated_at"#,
        )
        .bind(id)
        .bind(user_id)
        .bind(fields.activity_id)
        .bind(fields.date)
        .bind(fields.start_time)
        .bind(fields.end_time)
        .bind(&fields.notes)
        .bind(fields.latitude)
        .bind(fields.longitude)
        .bind(&fields.recurrence)
        .bind(fields.reminder_enabled)
        .bind(fields.reminder_offset_minutes)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        fields: &AgendaItemFields,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, AgendaItem>(
            r#"UPDATE agenda_items
               SET activity_id = $2, date = $3, start_time = $4, end_time = $5,
                   notes = $6, latitude = $7, longitude = $8, recurrence = $9,
                   reminder_enabled = $10, reminder_offset_minutes = $11,
                   updated_at = CURRENT_TIMESTAMP
               WHERE id = $1
               RETURNING id, user_id, activity_id, date, start_time, end_time, notes,
                         latitude, longitude, recurrence, reminder_enabled,
                         reminder_offset_minutes, created_at, updated_at"#,
        )
        .bind(id)
        .bind(fields.activity_id)
        .bind(fields.date)
        .bind(fields.start_time)
        .bind(fields.end_time)
        .bind(&fields.notes)
        .bind(fields.latitude)
        .bind(fields.longitude)
        .bind(&fields.recurrence)
        .bind(fields.reminder_enabled)
        .bind(fields.reminder_offset_minutes)
        .fetch_one(pool)
        .await
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM agenda_items WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(date: NaiveDate, end: NaiveTime) -> AgendaItem {
        AgendaItem {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            activity_id: Uuid::new_v4(),
            date,
            start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            end_time: end,
            notes: None,
            latitude: None,
            longitude: None,
            recurrence: None,
            reminder_enabled: false,
            reminder_offset_minutes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn ends_after_is_strict_on_the_end_instant() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let end = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        let it = item(date, end);

        let before = Utc.with_ymd_and_hms(2025, 6, 1, 9, 59, 59).unwrap();
        let at_end = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 1).unwrap();

        assert!(it.ends_after(before));
        assert!(!it.ends_after(at_end));
        assert!(!it.ends_after(after));
    }

    #[test]
    fn ends_after_keeps_future_days() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let end = NaiveTime::from_hms_opt(0, 30, 0).unwrap();
        let it = item(date, end);
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 23, 0, 0).unwrap();
        assert!(it.ends_after(now));
    }
}
