//! SQLite implementation of the ProgressRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::adapters::sqlite::{parse_datetime, parse_optional_datetime};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{CompletedTasks, ProgressRecord};
use crate::domain::ports::ProgressRepository;

/// Progress store backed by the `progress_records` table.
#[derive(Clone)]
pub struct SqliteProgressRepository {
    pool: SqlitePool,
}

impl SqliteProgressRepository {
    /// Store over an already migrated pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProgressRepository for SqliteProgressRepository {
    async fn load(&self, user_id: &str) -> DomainResult<Option<ProgressRecord>> {
        let row: Option<ProgressRow> = sqlx::query_as(
            "SELECT user_id, gratitude_done, journal_done, pomodoro_done, todo_done, streak, last_active_at, last_streak_update_at, created_at, updated_at FROM progress_records WHERE user_id = ?"
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn save(&self, record: &ProgressRecord) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO progress_records (user_id, gratitude_done, journal_done, pomodoro_done, todo_done,
                   streak, last_active_at, last_streak_update_at, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(user_id) DO UPDATE SET
                   gratitude_done = excluded.gratitude_done,
                   journal_done = excluded.journal_done,
                   pomodoro_done = excluded.pomodoro_done,
                   todo_done = excluded.todo_done,
                   streak = excluded.streak,
                   last_active_at = excluded.last_active_at,
                   last_streak_update_at = excluded.last_streak_update_at,
                   updated_at = excluded.updated_at"#
        )
        .bind(&record.user_id)
        .bind(record.completed_tasks.gratitude)
        .bind(record.completed_tasks.journal)
        .bind(record.completed_tasks.pomodoro)
        .bind(record.completed_tasks.todo)
        .bind(i64::from(record.streak))
        .bind(record.last_active_at.to_rfc3339())
        .bind(record.last_streak_update_at.map(|t| t.to_rfc3339()))
        .bind(record.created_at.to_rfc3339())
        .bind(record.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, user_id: &str) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM progress_records WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_user_ids(&self) -> DomainResult<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT user_id FROM progress_records ORDER BY user_id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}

#[derive(sqlx::FromRow)]
struct ProgressRow {
    user_id: String,
    gratitude_done: bool,
    journal_done: bool,
    pomodoro_done: bool,
    todo_done: bool,
    streak: i64,
    last_active_at: String,
    last_streak_update_at: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ProgressRow> for ProgressRecord {
    type Error = DomainError;

    fn try_from(row: ProgressRow) -> Result<Self, Self::Error> {
        let streak = u32::try_from(row.streak)
            .map_err(|_| DomainError::SerializationError(format!("Invalid streak: {}", row.streak)))?;

        Ok(ProgressRecord {
            user_id: row.user_id,
            completed_tasks: CompletedTasks {
                gratitude: row.gratitude_done,
                journal: row.journal_done,
                pomodoro: row.pomodoro_done,
                todo: row.todo_done,
            },
            streak,
            last_active_at: parse_datetime(&row.last_active_at)?,
            last_streak_update_at: parse_optional_datetime(row.last_streak_update_at)?,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;
    use crate::domain::models::TaskKind;
    use chrono::{TimeZone, Utc};

    async fn setup_test_repo() -> SqliteProgressRepository {
        let pool = create_migrated_test_pool().await.unwrap();
        SqliteProgressRepository::new(pool)
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let repo = setup_test_repo().await;
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 15).unwrap();
        let mut record = ProgressRecord::new("user-1", now);
        record.completed_tasks.set(TaskKind::Journal, true);
        record.streak = 4;
        record.last_streak_update_at = Some(now);

        repo.save(&record).await.unwrap();

        let loaded = repo.load("user-1").await.unwrap().unwrap();
        assert_eq!(loaded, record);
    }

    #[tokio::test]
    async fn test_load_missing_returns_none() {
        let repo = setup_test_repo().await;
        assert!(repo.load("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_overwrites_but_keeps_created_at() {
        let repo = setup_test_repo().await;
        let created = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        let mut record = ProgressRecord::new("user-1", created);
        repo.save(&record).await.unwrap();

        let later = Utc.with_ymd_and_hms(2024, 6, 2, 9, 0, 0).unwrap();
        record.streak = 2;
        record.updated_at = later;
        record.created_at = later;
        repo.save(&record).await.unwrap();
        // Saving the same state twice is harmless.
        repo.save(&record).await.unwrap();

        let loaded = repo.load("user-1").await.unwrap().unwrap();
        assert_eq!(loaded.streak, 2);
        assert_eq!(loaded.updated_at, later);
        assert_eq!(loaded.created_at, created);
    }

    #[tokio::test]
    async fn test_delete_and_list() {
        let repo = setup_test_repo().await;
        let now = Utc::now();
        for id in ["b", "a", "c"] {
            repo.save(&ProgressRecord::new(id, now)).await.unwrap();
        }

        assert_eq!(repo.list_user_ids().await.unwrap(), vec!["a", "b", "c"]);
        assert!(repo.delete("b").await.unwrap());
        assert!(!repo.delete("b").await.unwrap());
        assert_eq!(repo.list_user_ids().await.unwrap(), vec!["a", "c"]);
    }
}
