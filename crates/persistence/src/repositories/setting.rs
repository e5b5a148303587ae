//! System settings repository.

use domain::models::NewLogEntry;
use sqlx::PgPool;

use crate::entities::SystemSettingEntity;
use crate::metrics::QueryTimer;
use crate::repositories::LogRepository;

/// Repository for the system_settings key/value table.
#[derive(Clone)]
pub struct SettingRepository {
    pool: PgPool,
}

impl SettingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Every stored setting.
    pub async fn get_all(&self) -> Result<Vec<SystemSettingEntity>, sqlx::Error> {
        let timer = QueryTimer::new("get_all_settings");
        let result = sqlx::query_as::<_, SystemSettingEntity>(
            r#"
            SELECT setting_key, setting_value, updated_at
            FROM system_settings
            ORDER BY setting_key
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// A single stored value.
    pub async fn get_value(&self, key: &str) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT setting_value FROM system_settings WHERE setting_key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
    }

    /// Writes every pair in one upsert, with its log row, in one transaction.
    pub async fn upsert_all(
        &self,
        pairs: &[(String, String)],
        log: &NewLogEntry,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("upsert_settings");
        let (keys, values): (Vec<String>, Vec<String>) = pairs.iter().cloned().unzip();

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO system_settings (setting_key, setting_value, updated_at)
            SELECT key, value, NOW()
            FROM UNNEST($1::TEXT[], $2::TEXT[]) AS s(key, value)
            ON CONFLICT (setting_key)
            DO UPDATE SET setting_value = EXCLUDED.setting_value, updated_at = NOW()
            "#,
        )
        .bind(&keys)
        .bind(&values)
        .execute(&mut *tx)
        .await?;

        LogRepository::append(&mut tx, log).await?;

        tx.commit().await?;
        timer.record();
        Ok(result.rows_affected())
    }
}
