//! Activity log domain models.
//!
//! The activity log is append-only. Every mutation handler writes exactly one
//! entry in the same transaction as the change it describes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of rows shown on screen. The CSV export is not capped.
pub const LOG_SCREEN_LIMIT: i64 = 100;

/// Actions written by the portal itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogAction {
    Login,
    Logout,
    UserRegistered,
    UserCreated,
    UserUpdated,
    UserDeleted,
    PasswordReset,
    PasswordChanged,
    ProfileUpdated,
    RequestCreated,
    RequestDeleted,
    MinistryCreated,
    MinistryUpdated,
    MinistryDeleted,
    SettingsUpdated,
    HelpRequested,
}

impl LogAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogAction::Login => "login",
            LogAction::Logout => "logout",
            LogAction::UserRegistered => "user_registered",
            LogAction::UserCreated => "user_created",
            LogAction::UserUpdated => "user_updated",
            LogAction::UserDeleted => "user_deleted",
            LogAction::PasswordReset => "password_reset",
            LogAction::PasswordChanged => "password_changed",
            LogAction::ProfileUpdated => "profile_updated",
            LogAction::RequestCreated => "request_created",
            LogAction::RequestDeleted => "request_deleted",
            LogAction::MinistryCreated => "ministry_created",
            LogAction::MinistryUpdated => "ministry_updated",
            LogAction::MinistryDeleted => "ministry_deleted",
            LogAction::SettingsUpdated => "settings_updated",
            LogAction::HelpRequested => "help_requested",
        }
    }
}

impl fmt::Display for LogAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A log row joined with the actor's name, email and ministry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub ministry_name: Option<String>,
    pub action: String,
    pub table_name: Option<String>,
    pub record_id: Option<i64>,
    pub details: String,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A log row to append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLogEntry {
    pub user_id: Option<i64>,
    pub action: String,
    pub table_name: Option<String>,
    pub record_id: Option<i64>,
    pub details: String,
    pub ip_address: Option<String>,
}

/// Raw viewer query string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogQuery {
    pub action: Option<String>,
    pub user: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

/// Normalized viewer predicates. Screen view and CSV export share them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    /// Exact action match.
    pub action: Option<String>,
    /// Actor name substring.
    pub user: Option<String>,
    /// Inclusive, compared on the calendar date of `created_at`.
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    /// Only rows whose actor belongs to this ministry.
    pub scope_ministry_id: Option<i64>,
}

impl LogFilter {
    /// Builds predicates from a query string. Dates must be `YYYY-MM-DD`;
    /// anything else is ignored.
    pub fn from_query(query: &LogQuery) -> Self {
        use shared::validation::normalize_filter;

        let parse_date = |value: Option<&str>| {
            normalize_filter(value)
                .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok())
        };

        Self {
            action: normalize_filter(query.action.as_deref()),
            user: normalize_filter(query.user.as_deref()),
            date_from: parse_date(query.date_from.as_deref()),
            date_to: parse_date(query.date_to.as_deref()),
            scope_ministry_id: None,
        }
    }

    pub fn scoped_to_ministry(mut self, ministry_id: Option<i64>) -> Self {
        self.scope_ministry_id = ministry_id;
        self
    }
}

/// Log viewer view.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LogListResponse {
    pub logs: Vec<LogEntry>,
    pub total: usize,
    /// True when the screen cap cut the result short.
    pub truncated: bool,
    pub actions: Vec<String>,
    pub filters: LogQuery,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_names() {
        assert_eq!(LogAction::UserCreated.as_str(), "user_created");
        assert_eq!(LogAction::SettingsUpdated.to_string(), "settings_updated");
        assert_eq!(LogAction::PasswordReset.as_str(), "password_reset");
    }

    #[test]
    fn test_filter_from_query() {
        let query = LogQuery {
            action: Some("user_created".to_string()),
            user: Some("jane".to_string()),
            date_from: Some("2024-01-01".to_string()),
            date_to: Some("2024-01-31".to_string()),
        };
        let filter = LogFilter::from_query(&query).scoped_to_ministry(Some(3));
        assert_eq!(filter.action.as_deref(), Some("user_created"));
        assert_eq!(filter.user.as_deref(), Some("jane"));
        assert_eq!(filter.date_from, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(filter.date_to, NaiveDate::from_ymd_opt(2024, 1, 31));
        assert_eq!(filter.scope_ministry_id, Some(3));
    }

    #[test]
    fn test_filter_ignores_bad_dates_and_all() {
        let query = LogQuery {
            action: Some("all".to_string()),
            user: Some(" ".to_string()),
            date_from: Some("01/02/2024".to_string()),
            date_to: Some("".to_string()),
        };
        assert_eq!(LogFilter::from_query(&query), LogFilter::default());
    }
}
