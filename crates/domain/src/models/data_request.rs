//! Data request domain models.
//!
//! A data request is raised by one ministry against another. Status changes
//! are unconstrained: any respond handler may move a request to any status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use super::ministry::MinistryOption;
use super::stats::percentage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 4] = [
        RequestStatus::Pending,
        RequestStatus::Approved,
        RequestStatus::Rejected,
        RequestStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Completed => "completed",
        }
    }

    /// Activity log action recorded when a request is moved to this status.
    pub fn log_action(&self) -> String {
        format!("request_{}", self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(RequestStatus::Pending),
            "approved" => Ok(RequestStatus::Approved),
            "rejected" => Ok(RequestStatus::Rejected),
            "completed" => Ok(RequestStatus::Completed),
            _ => Err(format!("Invalid request status: {}", s)),
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RequestPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl RequestPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestPriority::Low => "low",
            RequestPriority::Medium => "medium",
            RequestPriority::High => "high",
            RequestPriority::Urgent => "urgent",
        }
    }
}

impl FromStr for RequestPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(RequestPriority::Low),
            "medium" => Ok(RequestPriority::Medium),
            "high" => Ok(RequestPriority::High),
            "urgent" => Ok(RequestPriority::Urgent),
            _ => Err(format!("Invalid request priority: {}", s)),
        }
    }
}

impl fmt::Display for RequestPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A data request joined with ministry and requester names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataRequest {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub request_type: String,
    pub status: RequestStatus,
    pub priority: RequestPriority,
    pub requesting_ministry_id: i64,
    pub requesting_ministry_name: Option<String>,
    pub target_ministry_id: i64,
    pub target_ministry_name: Option<String>,
    pub requested_by: Option<i64>,
    pub requester_name: Option<String>,
    pub requested_date: DateTime<Utc>,
    pub response_date: Option<DateTime<Utc>>,
    pub approved_by: Option<i64>,
    pub response_note: Option<String>,
    pub responded_at: Option<DateTime<Utc>>,
}

/// Raw list query string. Values are free text until normalized.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataRequestQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub ministry: Option<String>,
    pub search: Option<String>,
}

/// Normalized list predicates. `None` means the predicate is omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataRequestFilter {
    pub status: Option<String>,
    pub priority: Option<String>,
    /// Matches the requesting OR the target ministry.
    pub ministry_id: Option<i64>,
    /// Title, description or requester name, case-insensitive substring.
    pub search: Option<String>,
    /// Restricts to requests involving this ministry (ministry admin view).
    pub scope_ministry_id: Option<i64>,
    /// Restricts to requests submitted by this user.
    pub requested_by: Option<i64>,
}

impl DataRequestFilter {
    /// Builds predicates from a query string. A ministry value that is not a
    /// number is ignored like `all`.
    pub fn from_query(query: &DataRequestQuery) -> Self {
        use shared::validation::normalize_filter;

        Self {
            status: normalize_filter(query.status.as_deref()).map(|s| s.to_lowercase()),
            priority: normalize_filter(query.priority.as_deref()).map(|p| p.to_lowercase()),
            ministry_id: normalize_filter(query.ministry.as_deref())
                .and_then(|m| m.parse::<i64>().ok()),
            search: normalize_filter(query.search.as_deref()),
            scope_ministry_id: None,
            requested_by: None,
        }
    }

    pub fn scoped_to_ministry(mut self, ministry_id: i64) -> Self {
        self.scope_ministry_id = Some(ministry_id);
        self
    }

    pub fn requested_by(mut self, user_id: i64) -> Self {
        self.requested_by = Some(user_id);
        self
    }
}

/// Request counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestStatusBreakdown {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    pub completed: i64,
}

impl RequestStatusBreakdown {
    /// Folds `(status, count)` rows. Unknown statuses only count toward the total.
    pub fn from_counts<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, i64)>,
    {
        let mut breakdown = Self::default();
        for (status, count) in rows {
            breakdown.total += count;
            match status.parse::<RequestStatus>() {
                Ok(RequestStatus::Pending) => breakdown.pending += count,
                Ok(RequestStatus::Approved) => breakdown.approved += count,
                Ok(RequestStatus::Rejected) => breakdown.rejected += count,
                Ok(RequestStatus::Completed) => breakdown.completed += count,
                Err(_) => {}
            }
        }
        breakdown
    }

    pub fn approval_rate(&self) -> f64 {
        percentage(self.approved, self.total)
    }

    pub fn completion_rate(&self) -> f64 {
        percentage(self.completed, self.total)
    }
}

/// Request counts by priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityBreakdown {
    pub low: i64,
    pub medium: i64,
    pub high: i64,
    pub urgent: i64,
}

impl PriorityBreakdown {
    pub fn from_counts<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, i64)>,
    {
        let mut breakdown = Self::default();
        for (priority, count) in rows {
            match priority.parse::<RequestPriority>() {
                Ok(RequestPriority::Low) => breakdown.low += count,
                Ok(RequestPriority::Medium) => breakdown.medium += count,
                Ok(RequestPriority::High) => breakdown.high += count,
                Ok(RequestPriority::Urgent) => breakdown.urgent += count,
                Err(_) => {}
            }
        }
        breakdown
    }
}

/// Stat cards shown above a request list. Always computed without the list
/// filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestStatCards {
    pub by_status: RequestStatusBreakdown,
    pub by_priority: PriorityBreakdown,
}

/// Request list view.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DataRequestListResponse {
    pub requests: Vec<DataRequest>,
    pub total: usize,
    pub stats: RequestStatCards,
    pub filters: DataRequestQuery,
    pub ministries: Vec<MinistryOption>,
}

/// New-request form.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDataRequest {
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    #[validate(length(max = 200, message = "Title must be at most 200 characters"))]
    pub title: String,
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub description: String,
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    #[validate(length(max = 100, message = "Request type must be at most 100 characters"))]
    pub request_type: String,
    #[serde(default)]
    pub priority: RequestPriority,
    pub target_ministry_id: i64,
}

/// Approve/reject/complete form.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RespondToRequest {
    pub status: RequestStatus,
    #[validate(length(max = 2000, message = "Response note must be at most 2000 characters"))]
    pub response_note: Option<String>,
}
