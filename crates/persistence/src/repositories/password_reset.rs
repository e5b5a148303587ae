//! Password reset token repository.

use chrono::{DateTime, Utc};
use domain::models::NewLogEntry;
use sqlx::PgPool;

use crate::entities::{PasswordResetTokenEntity, UserEntity};
use crate::metrics::QueryTimer;
use crate::repositories::LogRepository;

/// Repository for the password_reset_tokens table.
#[derive(Clone)]
pub struct PasswordResetRepository {
    pool: PgPool,
}

impl PasswordResetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Stores a new token hash. Earlier unused tokens of the user are retired.
    pub async fn create_token(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordResetTokenEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_password_reset_token");
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE password_reset_tokens SET used = TRUE WHERE user_id = $1 AND used = FALSE")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let token = sqlx::query_as::<_, PasswordResetTokenEntity>(
            r#"
            INSERT INTO password_reset_tokens (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, token_hash, expires_at, used, created_at
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(token)
    }

    pub async fn find_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<PasswordResetTokenEntity>, sqlx::Error> {
        sqlx::query_as::<_, PasswordResetTokenEntity>(
            r#"
            SELECT id, user_id, token_hash, expires_at, used, created_at
            FROM password_reset_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
    }

    /// Consumes a token and sets the new password in one transaction: the
    /// token is marked used only if it is unused and unexpired, the user's
    /// sessions are ended and the log row is written. `None` means the token
    /// was not usable and nothing changed.
    pub async fn consume_and_reset<F>(
        &self,
        token_hash: &str,
        password_hash: &str,
        log: F,
    ) -> Result<Option<UserEntity>, sqlx::Error>
    where
        F: FnOnce(&UserEntity) -> NewLogEntry + Send,
    {
        let timer = QueryTimer::new("consume_password_reset_token");
        let mut tx = self.pool.begin().await?;

        let user_id = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE password_reset_tokens
            SET used = TRUE
            WHERE token_hash = $1 AND used = FALSE AND expires_at > NOW()
            RETURNING user_id
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(user_id) = user_id else {
            return Ok(None);
        };

        let user = sqlx::query_as::<_, UserEntity>(
            r#"
            UPDATE users
            SET password_hash = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING id, name, email, password_hash, role, ministry_id,
                      created_at, last_login, updated_at
            "#,
        )
        .bind(password_hash)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(user) = user else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM user_sessions WHERE user_id = $1")
            .bind(user.id)
            .execute(&mut *tx)
            .await?;

        LogRepository::append(&mut tx, &log(&user)).await?;

        tx.commit().await?;
        timer.record();
        Ok(Some(user))
    }
}
