//! Dashboard aggregates.
//!
//! Each dashboard is assembled from independent queries run concurrently.
//! Any failure fails the whole dashboard; callers decide how to degrade.

use domain::models::{
    AdminDashboard, DataRequestFilter, LabelCount, MinistryDashboard, RateSummary,
    RecentActivity, RecentRequest, UserDashboard,
};
use sqlx::{PgPool, Row};

use crate::metrics::QueryTimer;
use crate::repositories::{DataRequestRepository, LogRepository, UserRepository};

pub const RECENT_REQUESTS_LIMIT: i64 = 5;
pub const RECENT_ACTIVITY_LIMIT: i64 = 10;

/// Headline counts for the admin dashboard.
#[derive(Debug, Clone, Copy, Default)]
struct SystemCounts {
    total_users: i64,
    total_ministries: i64,
    active_ministries: i64,
    total_requests: i64,
    pending_requests: i64,
    requests_last_30_days: i64,
    requests_this_week: i64,
    users_this_month: i64,
    new_users_last_30_days: i64,
}

/// Headline counts for one ministry.
#[derive(Debug, Clone, Default)]
struct MinistryCounts {
    ministry_name: String,
    users_in_ministry: i64,
    incoming_requests: i64,
    outgoing_requests: i64,
    pending_incoming: i64,
    requests_last_30_days: i64,
    new_users_last_30_days: i64,
}

/// Repository for dashboard aggregates.
#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
    users: UserRepository,
    requests: DataRequestRepository,
    logs: LogRepository,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            requests: DataRequestRepository::new(pool.clone()),
            logs: LogRepository::new(pool.clone()),
            pool,
        }
    }

    /// System-wide dashboard.
    pub async fn admin_dashboard(&self) -> Result<AdminDashboard, sqlx::Error> {
        let timer = QueryTimer::new("admin_dashboard");
        let unscoped = DataRequestFilter::default();

        let (counts, by_status, by_role, by_ministry, recent_requests, recent_activity) = tokio::try_join!(
            self.system_counts(),
            self.requests.status_counts(&unscoped),
            self.users.count_by_role(None),
            self.users_by_ministry(),
            self.requests.list(&unscoped, Some(RECENT_REQUESTS_LIMIT)),
            self.logs.recent(RECENT_ACTIVITY_LIMIT, None),
        )?;
        timer.record();

        Ok(AdminDashboard {
            total_users: counts.total_users,
            total_ministries: counts.total_ministries,
            active_ministries: counts.active_ministries,
            total_requests: counts.total_requests,
            pending_requests: counts.pending_requests,
            requests_last_30_days: counts.requests_last_30_days,
            requests_this_week: counts.requests_this_week,
            users_this_month: counts.users_this_month,
            new_users_last_30_days: counts.new_users_last_30_days,
            rates: RateSummary::compute(
                &by_status,
                counts.new_users_last_30_days,
                counts.total_users,
            ),
            requests_by_status: by_status,
            users_by_role: by_role,
            users_by_ministry: by_ministry,
            recent_requests: recent_requests.into_iter().map(RecentRequest::from).collect(),
            recent_activity: recent_activity.into_iter().map(RecentActivity::from).collect(),
        })
    }

    /// Dashboard of one ministry: its users and requests it sent or received.
    pub async fn ministry_dashboard(&self, ministry_id: i64) -> Result<MinistryDashboard, sqlx::Error> {
        let timer = QueryTimer::new("ministry_dashboard");
        let scoped = DataRequestFilter::default().scoped_to_ministry(ministry_id);

        let (counts, by_status, by_role, recent_requests, recent_activity) = tokio::try_join!(
            self.ministry_counts(ministry_id),
            self.requests.status_counts(&scoped),
            self.users.count_by_role(Some(ministry_id)),
            self.requests.list(&scoped, Some(RECENT_REQUESTS_LIMIT)),
            self.logs.recent(RECENT_ACTIVITY_LIMIT, Some(ministry_id)),
        )?;
        timer.record();

        Ok(MinistryDashboard {
            ministry_id,
            rates: RateSummary::compute(
                &by_status,
                counts.new_users_last_30_days,
                counts.users_in_ministry,
            ),
            ministry_name: counts.ministry_name,
            users_in_ministry: counts.users_in_ministry,
            incoming_requests: counts.incoming_requests,
            outgoing_requests: counts.outgoing_requests,
            pending_incoming: counts.pending_incoming,
            requests_last_30_days: counts.requests_last_30_days,
            new_users_last_30_days: counts.new_users_last_30_days,
            requests_by_status: by_status,
            users_by_role: by_role,
            recent_requests: recent_requests.into_iter().map(RecentRequest::from).collect(),
            recent_activity: recent_activity.into_iter().map(RecentActivity::from).collect(),
        })
    }

    /// Dashboard of a regular user: own requests plus their ministry's totals.
    pub async fn user_dashboard(
        &self,
        user_id: i64,
        ministry_id: Option<i64>,
    ) -> Result<UserDashboard, sqlx::Error> {
        let timer = QueryTimer::new("user_dashboard");
        let own = DataRequestFilter::default().requested_by(user_id);

        let (my_requests, recent_requests) = tokio::try_join!(
            self.requests.status_counts(&own),
            self.requests.list(&own, Some(RECENT_REQUESTS_LIMIT)),
        )?;

        let ministry = match ministry_id {
            Some(id) => Some(self.ministry_counts(id).await?),
            None => None,
        };
        timer.record();

        Ok(UserDashboard {
            my_requests,
            ministry_name: ministry.as_ref().map(|m| m.ministry_name.clone()),
            ministry_incoming: ministry.as_ref().map(|m| m.incoming_requests).unwrap_or(0),
            ministry_outgoing: ministry.as_ref().map(|m| m.outgoing_requests).unwrap_or(0),
            recent_requests: recent_requests.into_iter().map(RecentRequest::from).collect(),
        })
    }

    async fn system_counts(&self) -> Result<SystemCounts, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS total_users,
                (SELECT COUNT(*) FROM ministries) AS total_ministries,
                (SELECT COUNT(*) FROM ministries WHERE status = 'active') AS active_ministries,
                (SELECT COUNT(*) FROM data_requests) AS total_requests,
                (SELECT COUNT(*) FROM data_requests WHERE status = 'pending') AS pending_requests,
                (SELECT COUNT(*) FROM data_requests
                  WHERE requested_date >= NOW() - INTERVAL '30 days') AS requests_last_30_days,
                (SELECT COUNT(*) FROM data_requests
                  WHERE requested_date >= date_trunc('week', NOW())) AS requests_this_week,
                (SELECT COUNT(*) FROM users
                  WHERE created_at >= date_trunc('month', NOW())) AS users_this_month,
                (SELECT COUNT(*) FROM users
                  WHERE created_at >= NOW() - INTERVAL '30 days') AS new_users_last_30_days
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(SystemCounts {
            total_users: row.get::<i64, _>("total_users"),
            total_ministries: row.get::<i64, _>("total_ministries"),
            active_ministries: row.get::<i64, _>("active_ministries"),
            total_requests: row.get::<i64, _>("total_requests"),
            pending_requests: row.get::<i64, _>("pending_requests"),
            requests_last_30_days: row.get::<i64, _>("requests_last_30_days"),
            requests_this_week: row.get::<i64, _>("requests_this_week"),
            users_this_month: row.get::<i64, _>("users_this_month"),
            new_users_last_30_days: row.get::<i64, _>("new_users_last_30_days"),
        })
    }

    async fn ministry_counts(&self, ministry_id: i64) -> Result<MinistryCounts, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT name FROM ministries WHERE id = $1) AS ministry_name,
                (SELECT COUNT(*) FROM users WHERE ministry_id = $1) AS users_in_ministry,
                (SELECT COUNT(*) FROM data_requests
                  WHERE target_ministry_id = $1) AS incoming_requests,
                (SELECT COUNT(*) FROM data_requests
                  WHERE requesting_ministry_id = $1) AS outgoing_requests,
                (SELECT COUNT(*) FROM data_requests
                  WHERE target_ministry_id = $1 AND status = 'pending') AS pending_incoming,
                (SELECT COUNT(*) FROM data_requests
                  WHERE (requesting_ministry_id = $1 OR target_ministry_id = $1)
                    AND requested_date >= NOW() - INTERVAL '30 days') AS requests_last_30_days,
                (SELECT COUNT(*) FROM users
                  WHERE ministry_id = $1
                    AND created_at >= NOW() - INTERVAL '30 days') AS new_users_last_30_days
            "#,
        )
        .bind(ministry_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(MinistryCounts {
            ministry_name: row
                .get::<Option<String>, _>("ministry_name")
                .unwrap_or_default(),
            users_in_ministry: row.get::<i64, _>("users_in_ministry"),
            incoming_requests: row.get::<i64, _>("incoming_requests"),
            outgoing_requests: row.get::<i64, _>("outgoing_requests"),
            pending_incoming: row.get::<i64, _>("pending_incoming"),
            requests_last_30_days: row.get::<i64, _>("requests_last_30_days"),
            new_users_last_30_days: row.get::<i64, _>("new_users_last_30_days"),
        })
    }

    async fn users_by_ministry(&self) -> Result<Vec<LabelCount>, sqlx::Error> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT COALESCE(m.name, 'Unassigned') AS label, COUNT(u.id) AS count
            FROM users u
            LEFT JOIN ministries m ON m.id = u.ministry_id
            GROUP BY m.name
            ORDER BY COUNT(u.id) DESC, label ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(label, count)| LabelCount { label, count })
            .collect())
    }
}
