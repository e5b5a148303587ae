//! Ministry repository for database operations.

use domain::models::{MinistryStatus, NewLogEntry};
use sqlx::PgPool;

use crate::entities::{MinistryEntity, MinistryOptionEntity, MinistryWithCountsEntity};
use crate::metrics::QueryTimer;
use crate::repositories::LogRepository;

/// Repository for the ministries table.
#[derive(Clone)]
pub struct MinistryRepository {
    pool: PgPool,
}

impl MinistryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<MinistryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_ministry_by_id");
        let result = sqlx::query_as::<_, MinistryEntity>(
            r#"
            SELECT id, name, abbreviation, status, created_at
            FROM ministries
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// All ministries with user and request counts, by name.
    pub async fn list_with_counts(&self) -> Result<Vec<MinistryWithCountsEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_ministries_with_counts");
        let result = sqlx::query_as::<_, MinistryWithCountsEntity>(
            r#"
            SELECT m.id, m.name, m.abbreviation, m.status, m.created_at,
                   (SELECT COUNT(*) FROM users u WHERE u.ministry_id = m.id) AS user_count,
                   (SELECT COUNT(*) FROM data_requests r
                     WHERE r.requesting_ministry_id = m.id) AS outgoing_requests,
                   (SELECT COUNT(*) FROM data_requests r
                     WHERE r.target_ministry_id = m.id) AS incoming_requests
            FROM ministries m
            ORDER BY m.name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Dropdown options. With `active_only` inactive ministries are left out.
    pub async fn list_options(
        &self,
        active_only: bool,
    ) -> Result<Vec<MinistryOptionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_ministry_options");
        let result = sqlx::query_as::<_, MinistryOptionEntity>(
            r#"
            SELECT id, name, abbreviation
            FROM ministries
            WHERE NOT $1 OR status = 'active'
            ORDER BY name ASC
            "#,
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Whether another ministry already uses this abbreviation.
    pub async fn abbreviation_exists(
        &self,
        abbreviation: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM ministries
                WHERE LOWER(abbreviation) = LOWER($1) AND ($2::BIGINT IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(abbreviation.trim())
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn create<F>(
        &self,
        name: &str,
        abbreviation: &str,
        log: F,
    ) -> Result<MinistryEntity, sqlx::Error>
    where
        F: FnOnce(&MinistryEntity) -> NewLogEntry + Send,
    {
        let timer = QueryTimer::new("create_ministry");
        let mut tx = self.pool.begin().await?;

        let ministry = sqlx::query_as::<_, MinistryEntity>(
            r#"
            INSERT INTO ministries (name, abbreviation, status)
            VALUES ($1, $2, 'active')
            RETURNING id, name, abbreviation, status, created_at
            "#,
        )
        .bind(name.trim())
        .bind(abbreviation.trim().to_uppercase())
        .fetch_one(&mut *tx)
        .await?;

        LogRepository::append(&mut tx, &log(&ministry)).await?;

        tx.commit().await?;
        timer.record();
        Ok(ministry)
    }

    pub async fn update<F>(
        &self,
        id: i64,
        name: &str,
        abbreviation: &str,
        status: MinistryStatus,
        log: F,
    ) -> Result<Option<MinistryEntity>, sqlx::Error>
    where
        F: FnOnce(&MinistryEntity) -> NewLogEntry + Send,
    {
        let timer = QueryTimer::new("update_ministry");
        let mut tx = self.pool.begin().await?;

        let ministry = sqlx::query_as::<_, MinistryEntity>(
            r#"
            UPDATE ministries
            SET name = $1, abbreviation = $2, status = $3
            WHERE id = $4
            RETURNING id, name, abbreviation, status, created_at
            "#,
        )
        .bind(name.trim())
        .bind(abbreviation.trim().to_uppercase())
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(ministry) = ministry else {
            return Ok(None);
        };

        LogRepository::append(&mut tx, &log(&ministry)).await?;

        tx.commit().await?;
        timer.record();
        Ok(Some(ministry))
    }

    /// Delete a ministry. Its users keep their accounts without a ministry;
    /// requests to or from it are removed.
    pub async fn delete<F>(&self, id: i64, log: F) -> Result<Option<MinistryEntity>, sqlx::Error>
    where
        F: FnOnce(&MinistryEntity) -> NewLogEntry + Send,
    {
        let timer = QueryTimer::new("delete_ministry");
        let mut tx = self.pool.begin().await?;

        let ministry = sqlx::query_as::<_, MinistryEntity>(
            r#"
            DELETE FROM ministries
            WHERE id = $1
            RETURNING id, name, abbreviation, status, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(ministry) = ministry else {
            return Ok(None);
        };

        LogRepository::append(&mut tx, &log(&ministry)).await?;

        tx.commit().await?;
        timer.record();
        Ok(Some(ministry))
    }
}
