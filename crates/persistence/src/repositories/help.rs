//! Help center repository.

use domain::models::{NewLogEntry, RequestPriority};
use sqlx::PgPool;

use crate::entities::{FaqEntity, HelpRequestEntity, ResourceEntity};
use crate::metrics::QueryTimer;
use crate::repositories::LogRepository;

/// Values for a new help request.
#[derive(Debug, Clone)]
pub struct NewHelpRequest<'a> {
    pub user_id: i64,
    pub name: &'a str,
    pub email: &'a str,
    pub subject: &'a str,
    pub message: &'a str,
    pub priority: RequestPriority,
}

/// Repository for help_requests, faqs and resources.
#[derive(Clone)]
pub struct HelpRepository {
    pool: PgPool,
}

impl HelpRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_faqs(&self) -> Result<Vec<FaqEntity>, sqlx::Error> {
        sqlx::query_as::<_, FaqEntity>(
            "SELECT id, question, answer, category FROM faqs ORDER BY sort_order, id",
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn list_resources(&self) -> Result<Vec<ResourceEntity>, sqlx::Error> {
        sqlx::query_as::<_, ResourceEntity>(
            "SELECT id, title, description, url, category FROM resources ORDER BY category, title",
        )
        .fetch_all(&self.pool)
        .await
    }

    /// A user's own help requests, newest first.
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<HelpRequestEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_help_requests_for_user");
        let result = sqlx::query_as::<_, HelpRequestEntity>(
            r#"
            SELECT id, user_id, name, email, subject, message, priority, status, created_at
            FROM help_requests
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Stores a request as `pending` with its log row.
    pub async fn create<F>(
        &self,
        request: NewHelpRequest<'_>,
        log: F,
    ) -> Result<HelpRequestEntity, sqlx::Error>
    where
        F: FnOnce(&HelpRequestEntity) -> NewLogEntry + Send,
    {
        let timer = QueryTimer::new("create_help_request");
        let mut tx = self.pool.begin().await?;

        let help_request = sqlx::query_as::<_, HelpRequestEntity>(
            r#"
            INSERT INTO help_requests (user_id, name, email, subject, message, priority, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'pending')
            RETURNING id, user_id, name, email, subject, message, priority, status, created_at
            "#,
        )
        .bind(request.user_id)
        .bind(request.name)
        .bind(request.email)
        .bind(request.subject.trim())
        .bind(request.message.trim())
        .bind(request.priority.as_str())
        .fetch_one(&mut *tx)
        .await?;

        LogRepository::append(&mut tx, &log(&help_request)).await?;

        tx.commit().await?;
        timer.record();
        Ok(help_request)
    }
}
