//! Analytics aggregates over requests and users.

use chrono::NaiveDate;
use domain::models::{
    monthly_series, trend_start, AnalyticsReport, DataRequestFilter, LabelCount,
    MinistryRanking, RateSummary, TOP_MINISTRIES_LIMIT,
};
use sqlx::{PgPool, Row};

use crate::metrics::QueryTimer;
use crate::repositories::{DataRequestRepository, UserRepository};

/// Which side of a request a ministry ranking counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingSide {
    Requesting,
    Target,
}

impl RankingSide {
    fn column(&self) -> &'static str {
        match self {
            RankingSide::Requesting => "requesting_ministry_id",
            RankingSide::Target => "target_ministry_id",
        }
    }
}

/// Repository for analytics aggregates.
#[derive(Clone)]
pub struct AnalyticsRepository {
    pool: PgPool,
    users: UserRepository,
    requests: DataRequestRepository,
}

impl AnalyticsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            requests: DataRequestRepository::new(pool.clone()),
            pool,
        }
    }

    /// Full analytics report; the monthly trend ends at `today`'s month.
    pub async fn report(&self, today: NaiveDate) -> Result<AnalyticsReport, sqlx::Error> {
        let timer = QueryTimer::new("analytics_report");
        let unscoped = DataRequestFilter::default();

        let (months, cards, by_type, by_role, requesting, target, user_totals) = tokio::try_join!(
            self.requests_by_month(trend_start(today)),
            self.requests.stat_cards(&unscoped),
            self.requests_by_type(),
            self.users.count_by_role(None),
            self.top_ministries(RankingSide::Requesting),
            self.top_ministries(RankingSide::Target),
            self.user_totals(),
        )?;
        timer.record();

        let (total_users, new_users) = user_totals;

        Ok(AnalyticsReport {
            total_users,
            new_users_last_30_days: new_users,
            requests_by_month: monthly_series(today, months),
            rates: RateSummary::compute(&cards.by_status, new_users, total_users),
            requests_by_status: cards.by_status,
            requests_by_priority: cards.by_priority,
            requests_by_type: by_type,
            users_by_role: by_role,
            top_requesting_ministries: requesting,
            top_target_ministries: target,
        })
    }

    async fn requests_by_month(&self, since: NaiveDate) -> Result<Vec<(String, i64)>, sqlx::Error> {
        sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT to_char(date_trunc('month', requested_date), 'YYYY-MM') AS month,
                   COUNT(*) AS count
            FROM data_requests
            WHERE requested_date >= $1::date
            GROUP BY 1
            ORDER BY 1
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
    }

    async fn requests_by_type(&self) -> Result<Vec<LabelCount>, sqlx::Error> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT request_type, COUNT(*) AS count
            FROM data_requests
            GROUP BY request_type
            ORDER BY COUNT(*) DESC, request_type ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(label, count)| LabelCount { label, count })
            .collect())
    }

    /// Top ministries by request count, ties broken by name.
    pub async fn top_ministries(
        &self,
        side: RankingSide,
    ) -> Result<Vec<MinistryRanking>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT m.id, m.name, m.abbreviation, COUNT(*) AS count
            FROM data_requests r
            JOIN ministries m ON m.id = r.{}
            GROUP BY m.id, m.name, m.abbreviation
            ORDER BY COUNT(*) DESC, m.name ASC
            LIMIT $1
            "#,
            side.column()
        );
        let rows = sqlx::query_as::<_, (i64, String, String, i64)>(&sql)
            .bind(TOP_MINISTRIES_LIMIT)
            .fetch_all(&self.pool)
            .await?;

        Ok(MinistryRanking::rank(rows))
    }

    async fn user_totals(&self) -> Result<(i64, i64), sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total_users,
                COUNT(*) FILTER (WHERE created_at >= NOW() - INTERVAL '30 days') AS new_users
            FROM users
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok((
            row.get::<i64, _>("total_users"),
            row.get::<i64, _>("new_users"),
        ))
    }
}
