//! Data request repository for database operations.

use domain::models::{
    DataRequestFilter, NewLogEntry, PriorityBreakdown, RequestPriority, RequestStatCards,
    RequestStatus, RequestStatusBreakdown,
};
use shared::validation::like_pattern;
use sqlx::{PgConnection, PgPool};

use crate::entities::DataRequestEntity;
use crate::metrics::QueryTimer;
use crate::repositories::LogRepository;

const REQUEST_SELECT: &str = r#"
    SELECT r.id, r.title, r.description, r.request_type, r.status, r.priority,
           r.requesting_ministry_id, rm.name AS requesting_ministry_name,
           r.target_ministry_id, tm.name AS target_ministry_name,
           r.requested_by, u.name AS requester_name, r.requested_date,
           r.response_date, r.approved_by, r.response_note, r.responded_at
    FROM data_requests r
    LEFT JOIN ministries rm ON rm.id = r.requesting_ministry_id
    LEFT JOIN ministries tm ON tm.id = r.target_ministry_id
    LEFT JOIN users u ON u.id = r.requested_by
"#;

/// Builds the WHERE clause for a request filter, tracking parameter positions.
struct RequestFilterBuilder {
    conditions: Vec<String>,
    param_count: i32,
}

impl RequestFilterBuilder {
    fn build(filter: &DataRequestFilter) -> Self {
        let mut conditions = Vec::new();
        let mut param_count = 0;

        if filter.status.is_some() {
            param_count += 1;
            conditions.push(format!("r.status = ${}", param_count));
        }

        if filter.priority.is_some() {
            param_count += 1;
            conditions.push(format!("r.priority = ${}", param_count));
        }

        if filter.ministry_id.is_some() {
            param_count += 1;
            conditions.push(format!(
                "(r.requesting_ministry_id = ${0} OR r.target_ministry_id = ${0})",
                param_count
            ));
        }

        if filter.search.is_some() {
            param_count += 1;
            conditions.push(format!(
                "(r.title ILIKE ${0} OR r.description ILIKE ${0} OR u.name ILIKE ${0})",
                param_count
            ));
        }

        if filter.scope_ministry_id.is_some() {
            param_count += 1;
            conditions.push(format!(
                "(r.requesting_ministry_id = ${0} OR r.target_ministry_id = ${0})",
                param_count
            ));
        }

        if filter.requested_by.is_some() {
            param_count += 1;
            conditions.push(format!("r.requested_by = ${}", param_count));
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

/// Binds the filter values in the order `RequestFilterBuilder` numbered them.
macro_rules! bind_request_filters {
    ($builder:expr, $filter:expr) => {{
        let mut b = $builder;
        if let Some(ref status) = $filter.status {
            b = b.bind(status);
        }
        if let Some(ref priority) = $filter.priority {
            b = b.bind(priority);
        }
        if let Some(ref ministry_id) = $filter.ministry_id {
            b = b.bind(ministry_id);
        }
        if let Some(ref search) = $filter.search {
            b = b.bind(like_pattern(search));
        }
        if let Some(ref scope) = $filter.scope_ministry_id {
            b = b.bind(scope);
        }
        if let Some(ref requested_by) = $filter.requested_by {
            b = b.bind(requested_by);
        }
        b
    }};
}

/// Values for a new request.
#[derive(Debug, Clone)]
pub struct NewDataRequest<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub request_type: &'a str,
    pub priority: RequestPriority,
    pub requesting_ministry_id: i64,
    pub target_ministry_id: i64,
    pub requested_by: i64,
}

/// Repository for the data_requests table.
#[derive(Clone)]
pub struct DataRequestRepository {
    pool: PgPool,
}

impl DataRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_joined(
        conn: &mut PgConnection,
        id: i64,
    ) -> Result<Option<DataRequestEntity>, sqlx::Error> {
        let sql = format!("{} WHERE r.id = $1", REQUEST_SELECT);
        sqlx::query_as::<_, DataRequestEntity>(&sql)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<DataRequestEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_data_request_by_id");
        let mut conn = self.pool.acquire().await?;
        let result = Self::fetch_joined(&mut conn, id).await;
        timer.record();
        result
    }

    /// Matching requests, newest first. `limit` of `None` returns every row.
    pub async fn list(
        &self,
        filter: &DataRequestFilter,
        limit: Option<i64>,
    ) -> Result<Vec<DataRequestEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_data_requests");
        let builder = RequestFilterBuilder::build(filter);

        let limit_clause = match limit {
            Some(_) => format!("LIMIT ${}", builder.param_count() + 1),
            None => String::new(),
        };
        let sql = format!(
            "{} {} ORDER BY r.requested_date DESC, r.id DESC {}",
            REQUEST_SELECT,
            builder.where_clause(),
            limit_clause
        );

        let mut query = bind_request_filters!(sqlx::query_as::<_, DataRequestEntity>(&sql), filter);
        if let Some(limit) = limit {
            query = query.bind(limit);
        }

        let result = query.fetch_all(&self.pool).await;
        timer.record();
        result
    }

    /// Counts grouped by `column` (`status` or `priority`) over the scope of
    /// `filter` only; the list predicates are ignored.
    async fn grouped_counts(
        &self,
        filter: &DataRequestFilter,
        column: &str,
    ) -> Result<Vec<(String, i64)>, sqlx::Error> {
        let scope = DataRequestFilter {
            scope_ministry_id: filter.scope_ministry_id,
            requested_by: filter.requested_by,
            ..Default::default()
        };
        let builder = RequestFilterBuilder::build(&scope);
        let sql = format!(
            r#"
            SELECT r.{0}, COUNT(*)
            FROM data_requests r
            LEFT JOIN users u ON u.id = r.requested_by
            {1}
            GROUP BY r.{0}
            "#,
            column,
            builder.where_clause()
        );
        bind_request_filters!(sqlx::query_as::<_, (String, i64)>(&sql), scope)
            .fetch_all(&self.pool)
            .await
    }

    /// Request counts by status within the scope of `filter`.
    pub async fn status_counts(
        &self,
        filter: &DataRequestFilter,
    ) -> Result<RequestStatusBreakdown, sqlx::Error> {
        let timer = QueryTimer::new("count_data_requests_by_status");
        let rows = self.grouped_counts(filter, "status").await?;
        timer.record();
        Ok(RequestStatusBreakdown::from_counts(
            rows.iter().map(|(status, count)| (status.as_str(), *count)),
        ))
    }

    /// Stat cards for a list view, computed without the list predicates.
    pub async fn stat_cards(
        &self,
        filter: &DataRequestFilter,
    ) -> Result<RequestStatCards, sqlx::Error> {
        let timer = QueryTimer::new("data_request_stat_cards");
        let (statuses, priorities) = tokio::try_join!(
            self.grouped_counts(filter, "status"),
            self.grouped_counts(filter, "priority"),
        )?;
        timer.record();

        Ok(RequestStatCards {
            by_status: RequestStatusBreakdown::from_counts(
                statuses.iter().map(|(status, count)| (status.as_str(), *count)),
            ),
            by_priority: PriorityBreakdown::from_counts(
                priorities.iter().map(|(priority, count)| (priority.as_str(), *count)),
            ),
        })
    }

    pub async fn create<F>(
        &self,
        new_request: NewDataRequest<'_>,
        log: F,
    ) -> Result<DataRequestEntity, sqlx::Error>
    where
        F: FnOnce(&DataRequestEntity) -> NewLogEntry + Send,
    {
        let timer = QueryTimer::new("create_data_request");
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO data_requests (
                title, description, request_type, status, priority,
                requesting_ministry_id, target_ministry_id, requested_by
            )
            VALUES ($1, $2, $3, 'pending', $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(new_request.title.trim())
        .bind(new_request.description.trim())
        .bind(new_request.request_type.trim())
        .bind(new_request.priority.as_str())
        .bind(new_request.requesting_ministry_id)
        .bind(new_request.target_ministry_id)
        .bind(new_request.requested_by)
        .fetch_one(&mut *tx)
        .await?;

        let request = Self::fetch_joined(&mut tx, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        LogRepository::append(&mut tx, &log(&request)).await?;

        tx.commit().await?;
        timer.record();
        Ok(request)
    }

    /// Record a response. Any status may be set. With `scope_target_ministry_id`
    /// the request must be addressed to that ministry.
    pub async fn respond<F>(
        &self,
        id: i64,
        scope_target_ministry_id: Option<i64>,
        status: RequestStatus,
        response_note: Option<&str>,
        responder_id: i64,
        log: F,
    ) -> Result<Option<DataRequestEntity>, sqlx::Error>
    where
        F: FnOnce(&DataRequestEntity) -> NewLogEntry + Send,
    {
        let timer = QueryTimer::new("respond_data_request");
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE data_requests
            SET status = $1,
                response_note = $2,
                response_date = NOW(),
                responded_at = NOW(),
                approved_by = CASE WHEN $6 THEN $3 ELSE approved_by END
            WHERE id = $4 AND ($5::BIGINT IS NULL OR target_ministry_id = $5)
            RETURNING id
            "#,
        )
        .bind(status.as_str())
        .bind(response_note.map(str::trim).filter(|note| !note.is_empty()))
        .bind(responder_id)
        .bind(id)
        .bind(scope_target_ministry_id)
        .bind(status == RequestStatus::Approved)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(id) = updated else {
            return Ok(None);
        };

        let request = Self::fetch_joined(&mut tx, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        LogRepository::append(&mut tx, &log(&request)).await?;

        tx.commit().await?;
        timer.record();
        Ok(Some(request))
    }

    pub async fn delete<F>(&self, id: i64, log: F) -> Result<Option<DataRequestEntity>, sqlx::Error>
    where
        F: FnOnce(&DataRequestEntity) -> NewLogEntry + Send,
    {
        let timer = QueryTimer::new("delete_data_request");
        let mut tx = self.pool.begin().await?;

        let Some(request) = Self::fetch_joined(&mut tx, id).await? else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM data_requests WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        LogRepository::append(&mut tx, &log(&request)).await?;

        tx.commit().await?;
        timer.record();
        Ok(Some(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unfiltered_has_no_where_clause() {
        let builder = RequestFilterBuilder::build(&DataRequestFilter::default());
        assert_eq!(builder.where_clause(), "");
        assert_eq!(builder.param_count(), 0);
    }

    #[test]
    fn test_status_ministry_search_filter() {
        let filter = DataRequestFilter {
            status: Some("approved".to_string()),
            ministry_id: Some(3),
            search: Some("budget".to_string()),
            ..Default::default()
        };
        let builder = RequestFilterBuilder::build(&filter);
        assert_eq!(
            builder.where_clause(),
            "WHERE r.status = $1 \
             AND (r.requesting_ministry_id = $2 OR r.target_ministry_id = $2) \
             AND (r.title ILIKE $3 OR r.description ILIKE $3 OR u.name ILIKE $3)"
        );
        assert_eq!(builder.param_count(), 3);
    }

    #[test]
    fn test_scope_predicates_follow_list_predicates() {
        let filter = DataRequestFilter {
            priority: Some("high".to_string()),
            scope_ministry_id: Some(4),
            requested_by: Some(12),
            ..Default::default()
        };
        let builder = RequestFilterBuilder::build(&filter);
        assert_eq!(
            builder.where_clause(),
            "WHERE r.priority = $1 \
             AND (r.requesting_ministry_id = $2 OR r.target_ministry_id = $2) \
             AND r.requested_by = $3"
        );
    }
}
