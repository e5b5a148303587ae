//! Activity log repository.
//!
//! The log is append-only: this repository inserts and reads, it never
//! updates or deletes.

use domain::models::{LogFilter, NewLogEntry};
use shared::validation::like_pattern;
use sqlx::{PgConnection, PgPool};

use crate::entities::LogEntity;
use crate::metrics::QueryTimer;

const LOG_SELECT: &str = r#"
    SELECT l.id, l.user_id,
           COALESCE(u.name, l.actor_name) AS user_name,
           COALESCE(u.email, l.actor_email) AS user_email,
           m.name AS ministry_name, l.action, l.table_name, l.record_id,
           l.details, l.ip_address, l.created_at
    FROM logs l
    LEFT JOIN users u ON u.id = l.user_id
    LEFT JOIN ministries m ON m.id = COALESCE(u.ministry_id, l.actor_ministry_id)
"#;

/// Builds the WHERE clause for a log filter, tracking parameter positions.
struct LogFilterBuilder {
    conditions: Vec<String>,
    param_count: i32,
}

impl LogFilterBuilder {
    fn build(filter: &LogFilter) -> Self {
        let mut conditions = Vec::new();
        let mut param_count = 0;

        if filter.action.is_some() {
            param_count += 1;
            conditions.push(format!("l.action = ${}", param_count));
        }

        if filter.user.is_some() {
            param_count += 1;
            conditions.push(format!(
                "COALESCE(u.name, l.actor_name) ILIKE ${}",
                param_count
            ));
        }

        if filter.date_from.is_some() {
            param_count += 1;
            conditions.push(format!("l.created_at::date >= ${}", param_count));
        }

        if filter.date_to.is_some() {
            param_count += 1;
            conditions.push(format!("l.created_at::date <= ${}", param_count));
        }

        if filter.scope_ministry_id.is_some() {
            param_count += 1;
            conditions.push(format!(
                "COALESCE(u.ministry_id, l.actor_ministry_id) = ${}",
                param_count
            ));
        }

        Self {
            conditions,
            param_count,
        }
    }

    fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }

    fn param_count(&self) -> i32 {
        self.param_count
    }
}

/// Binds the filter values in the order `LogFilterBuilder` numbered them.
macro_rules! bind_log_filters {
    ($builder:expr, $filter:expr) => {{
        let mut b = $builder;
        if let Some(ref action) = $filter.action {
            b = b.bind(action);
        }
        if let Some(ref user) = $filter.user {
            b = b.bind(like_pattern(user));
        }
        if let Some(ref date_from) = $filter.date_from {
            b = b.bind(date_from);
        }
        if let Some(ref date_to) = $filter.date_to {
            b = b.bind(date_to);
        }
        if let Some(ref ministry_id) = $filter.scope_ministry_id {
            b = b.bind(ministry_id);
        }
        b
    }};
}

/// Repository for the logs table.
#[derive(Clone)]
pub struct LogRepository {
    pool: PgPool,
}

impl LogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Appends an entry on an open connection or transaction. The actor's
    /// name, email and ministry are copied onto the row.
    pub async fn append(conn: &mut PgConnection, entry: &NewLogEntry) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("append_log");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO logs (user_id, action, table_name, record_id, details, ip_address,
                              actor_name, actor_email, actor_ministry_id)
            SELECT actor.id, $2, $3, $4, $5, $6, u.name, u.email, u.ministry_id
            FROM (SELECT $1::BIGINT AS id) AS actor
            LEFT JOIN users u ON u.id = actor.id
            RETURNING id
            "#,
        )
        .bind(entry.user_id)
        .bind(&entry.action)
        .bind(&entry.table_name)
        .bind(entry.record_id)
        .bind(&entry.details)
        .bind(&entry.ip_address)
        .fetch_one(conn)
        .await;
        timer.record();
        result
    }

    /// Appends an entry outside any transaction.
    pub async fn insert(&self, entry: &NewLogEntry) -> Result<i64, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        Self::append(&mut *conn, entry).await
    }

    /// Lists matching rows, newest first. `limit` of `None` returns every row.
    pub async fn list(
        &self,
        filter: &LogFilter,
        limit: Option<i64>,
    ) -> Result<Vec<LogEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_logs");
        let builder = LogFilterBuilder::build(filter);

        let limit_clause = match limit {
            Some(_) => format!("LIMIT ${}", builder.param_count() + 1),
            None => String::new(),
        };
        let sql = format!(
            "{} {} ORDER BY l.created_at DESC, l.id DESC {}",
            LOG_SELECT,
            builder.where_clause(),
            limit_clause
        );

        let mut query = bind_log_filters!(sqlx::query_as::<_, LogEntity>(&sql), filter);
        if let Some(limit) = limit {
            query = query.bind(limit);
        }

        let result = query.fetch_all(&self.pool).await;
        timer.record();
        result
    }

    /// Distinct action names for the filter dropdown.
    pub async fn distinct_actions(
        &self,
        scope_ministry_id: Option<i64>,
    ) -> Result<Vec<String>, sqlx::Error> {
        let timer = QueryTimer::new("distinct_log_actions");
        let result = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT l.action
            FROM logs l
            LEFT JOIN users u ON u.id = l.user_id
            WHERE $1::BIGINT IS NULL OR COALESCE(u.ministry_id, l.actor_ministry_id) = $1
            ORDER BY l.action
            "#,
        )
        .bind(scope_ministry_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Most recent rows, optionally limited to actors of one ministry.
    pub async fn recent(
        &self,
        limit: i64,
        scope_ministry_id: Option<i64>,
    ) -> Result<Vec<LogEntity>, sqlx::Error> {
        let filter = LogFilter::default().scoped_to_ministry(scope_ministry_id);
        self.list(&filter, Some(limit)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_empty_filter_has_no_where_clause() {
        let builder = LogFilterBuilder::build(&LogFilter::default());
        assert_eq!(builder.where_clause(), "");
        assert_eq!(builder.param_count(), 0);
    }

    #[test]
    fn test_all_predicates_numbered_in_order() {
        let filter = LogFilter {
            action: Some("user_created".to_string()),
            user: Some("jane".to_string()),
            date_from: NaiveDate::from_ymd_opt(2024, 1, 1),
            date_to: NaiveDate::from_ymd_opt(2024, 1, 31),
            scope_ministry_id: Some(3),
        };
        let builder = LogFilterBuilder::build(&filter);
        assert_eq!(
            builder.where_clause(),
            "WHERE l.action = $1 AND COALESCE(u.name, l.actor_name) ILIKE $2 \
             AND l.created_at::date >= $3 AND l.created_at::date <= $4 \
             AND COALESCE(u.ministry_id, l.actor_ministry_id) = $5"
        );
        assert_eq!(builder.param_count(), 5);
    }

    #[test]
    fn test_partial_filter_numbering() {
        let filter = LogFilter {
            date_to: NaiveDate::from_ymd_opt(2024, 2, 1),
            scope_ministry_id: Some(9),
            ..Default::default()
        };
        let builder = LogFilterBuilder::build(&filter);
        assert_eq!(
            builder.where_clause(),
            "WHERE l.created_at::date <= $1 AND COALESCE(u.ministry_id, l.actor_ministry_id) = $2"
        );
    }
}
