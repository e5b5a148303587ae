//! Server-side session repository.
//!
//! A session row is keyed by the SHA-256 of the session token's id, so a
//! leaked table does not yield usable tokens.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{SessionUserEntity, UserSessionEntity};
use crate::metrics::QueryTimer;

/// Repository for the user_sessions table.
#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<UserSessionEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_session");
        let result = sqlx::query_as::<_, UserSessionEntity>(
            r#"
            INSERT INTO user_sessions (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, token_hash, expires_at, created_at, last_used_at
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// A live session joined with its user, touching `last_used_at`.
    pub async fn find_active_with_user(
        &self,
        token_hash: &str,
    ) -> Result<Option<SessionUserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_active_session");
        let result = sqlx::query_as::<_, SessionUserEntity>(
            r#"
            WITH touched AS (
                UPDATE user_sessions
                SET last_used_at = NOW()
                WHERE token_hash = $1 AND expires_at > NOW()
                RETURNING id, user_id, expires_at
            )
            SELECT t.id AS session_id, u.id AS user_id, u.name, u.email, u.role,
                   u.ministry_id, t.expires_at
            FROM touched t
            JOIN users u ON u.id = t.user_id
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn delete(&self, session_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Ends every session of a user.
    pub async fn delete_for_user(&self, user_id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Removes expired rows; called opportunistically at login.
    pub async fn delete_expired(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
