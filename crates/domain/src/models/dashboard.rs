//! Dashboard view models.
//!
//! Every dashboard derives `Default` so a failed aggregate query can still be
//! rendered as zeros next to an error banner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::data_request::{RequestPriority, RequestStatus, RequestStatusBreakdown};
use super::stats::{growth_rate, humanize_label};
use super::user::RoleBreakdown;

/// A labelled count for distribution charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCount {
    pub label: String,
    pub count: i64,
}

/// Approval, completion and growth rates, percentages with one decimal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RateSummary {
    pub approval_rate: f64,
    pub completion_rate: f64,
    pub growth_rate: f64,
}

impl RateSummary {
    /// Rates over a request breakdown plus user growth (`new_users` out of
    /// `total_users`).
    pub fn compute(requests: &RequestStatusBreakdown, new_users: i64, total_users: i64) -> Self {
        Self {
            approval_rate: requests.approval_rate(),
            completion_rate: requests.completion_rate(),
            growth_rate: growth_rate(new_users, total_users),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentRequest {
    pub id: i64,
    pub title: String,
    pub status: RequestStatus,
    pub priority: RequestPriority,
    pub requesting_ministry: Option<String>,
    pub target_ministry: Option<String>,
    pub requested_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentActivity {
    pub id: i64,
    pub user_name: Option<String>,
    pub action: String,
    pub action_label: String,
    pub details: String,
    pub created_at: DateTime<Utc>,
}

impl RecentActivity {
    pub fn new(
        id: i64,
        user_name: Option<String>,
        action: String,
        details: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        let action_label = humanize_label(&action);
        Self {
            id,
            user_name,
            action,
            action_label,
            details,
            created_at,
        }
    }
}

/// System-wide dashboard for admins and super admins.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AdminDashboard {
    pub total_users: i64,
    pub total_ministries: i64,
    pub active_ministries: i64,
    pub total_requests: i64,
    pub pending_requests: i64,
    pub requests_last_30_days: i64,
    pub requests_this_week: i64,
    pub users_this_month: i64,
    pub new_users_last_30_days: i64,
    pub requests_by_status: RequestStatusBreakdown,
    pub users_by_role: RoleBreakdown,
    pub users_by_ministry: Vec<LabelCount>,
    pub recent_requests: Vec<RecentRequest>,
    pub recent_activity: Vec<RecentActivity>,
    pub rates: RateSummary,
}

/// Dashboard of one ministry for its admin.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MinistryDashboard {
    pub ministry_id: i64,
    pub ministry_name: String,
    pub users_in_ministry: i64,
    pub incoming_requests: i64,
    pub outgoing_requests: i64,
    pub pending_incoming: i64,
    pub requests_last_30_days: i64,
    pub new_users_last_30_days: i64,
    /// Requests where the ministry is requester or target.
    pub requests_by_status: RequestStatusBreakdown,
    pub users_by_role: RoleBreakdown,
    pub recent_requests: Vec<RecentRequest>,
    pub recent_activity: Vec<RecentActivity>,
    pub rates: RateSummary,
}

/// Dashboard of a regular user.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserDashboard {
    pub my_requests: RequestStatusBreakdown,
    pub ministry_name: Option<String>,
    pub ministry_incoming: i64,
    pub ministry_outgoing: i64,
    pub recent_requests: Vec<RecentRequest>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dashboard_is_all_zero() {
        let dashboard = AdminDashboard::default();
        assert_eq!(dashboard.total_users, 0);
        assert_eq!(dashboard.rates, RateSummary::default());
        assert!(dashboard.recent_requests.is_empty());
    }

    #[test]
    fn test_rate_summary() {
        let requests = RequestStatusBreakdown {
            total: 10,
            pending: 3,
            approved: 4,
            rejected: 1,
            completed: 2,
        };
        let rates = RateSummary::compute(&requests, 5, 25);
        assert_eq!(rates.approval_rate, 40.0);
        assert_eq!(rates.completion_rate, 20.0);
        assert_eq!(rates.growth_rate, 25.0);
    }

    #[test]
    fn test_rate_summary_with_no_data() {
        let rates = RateSummary::compute(&RequestStatusBreakdown::default(), 0, 0);
        assert_eq!(rates, RateSummary::default());
    }

    #[test]
    fn test_recent_activity_label() {
        let activity = RecentActivity::new(
            1,
            Some("Jane Doe".to_string()),
            "user_created".to_string(),
            "Created user jane@gov.example".to_string(),
            Utc::now(),
        );
        assert_eq!(activity.action_label, "User Created");
    }
}
