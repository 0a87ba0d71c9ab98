/// SQLite-backed token store
use crate::{
    db::models::EmergencyAccessRow,
    emergency::{EmergencyAccessToken, TokenStore},
    error::{ApiError, ApiResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// Emergency access tokens in the `emergency_access` table
#[derive(Clone)]
pub struct SqliteTokenStore {
    db: SqlitePool,
}

impl SqliteTokenStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TokenStore for SqliteTokenStore {
    async fn insert(&self, token: &EmergencyAccessToken) -> ApiResult<()> {
        sqlx::query(
            "INSERT INTO emergency_access (id, subject_id, secret, issued_by, issued_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&token.id)
        .bind(&token.subject_id)
        .bind(&token.secret)
        .bind(&token.issued_by)
        .bind(token.issued_at)
        .bind(token.expires_at)
        .execute(&self.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                ApiError::Internal("Emergency access secret collision".to_string())
            }
            other => ApiError::Database(other),
        })?;

        Ok(())
    }

    async fn find_by_subject_and_secret(
        &self,
        subject_id: &str,
        secret: &str,
    ) -> ApiResult<Option<EmergencyAccessToken>> {
        let row: Option<EmergencyAccessRow> = sqlx::query_as(
            "SELECT id, subject_id, secret, issued_by, issued_at, expires_at
             FROM emergency_access
             WHERE subject_id = ?1 AND secret = ?2",
        )
        .bind(subject_id)
        .bind(secret)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(EmergencyAccessToken::from))
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> ApiResult<u64> {
        let result = sqlx::query("DELETE FROM emergency_access WHERE expires_at < ?1")
            .bind(now)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected())
    }
}
