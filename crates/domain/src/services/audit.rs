//! Activity log entry builder.
//!
//! Route handlers describe what they changed with a fluent builder and hand
//! the result to the log repository inside their transaction.

use crate::models::{LogAction, NewLogEntry};

/// Builder for activity log entries.
#[derive(Debug, Clone)]
pub struct LogEntryBuilder {
    user_id: Option<i64>,
    action: String,
    table_name: Option<String>,
    record_id: Option<i64>,
    details: String,
    ip_address: Option<String>,
}

impl LogEntryBuilder {
    /// Entry for an action performed by a signed-in user.
    pub fn user_action(user_id: i64, action: LogAction) -> Self {
        Self::custom(Some(user_id), action.as_str())
    }

    /// Entry with a free-form action name, e.g. `request_approved`.
    pub fn custom(user_id: Option<i64>, action: impl Into<String>) -> Self {
        Self {
            user_id,
            action: action.into(),
            table_name: None,
            record_id: None,
            details: String::new(),
            ip_address: None,
        }
    }

    /// Set the row being acted upon.
    pub fn on_record(mut self, table_name: impl Into<String>, record_id: i64) -> Self {
        self.table_name = Some(table_name.into());
        self.record_id = Some(record_id);
        self
    }

    /// Set just the table (settings have no single row id).
    pub fn on_table(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    pub fn with_ip(mut self, ip: Option<String>) -> Self {
        self.ip_address = ip;
        self
    }

    pub fn build(self) -> NewLogEntry {
        NewLogEntry {
            user_id: self.user_id,
            action: self.action,
            table_name: self.table_name,
            record_id: self.record_id,
            details: self.details,
            ip_address: self.ip_address,
        }
    }
}

/// Detail strings for common entries. User entries always name the affected
/// account by email.
pub mod log_details {
    pub fn user_created(name: &str, email: &str, role: &str) -> String {
        format!("Created user {} ({}) with role {}", name, email, role)
    }

    pub fn user_updated(name: &str, email: &str) -> String {
        format!("Updated user {} ({})", name, email)
    }

    pub fn user_deleted(name: &str, email: &str) -> String {
        format!("Deleted user {} ({})", name, email)
    }

    pub fn password_reset(name: &str, email: &str) -> String {
        format!("Reset password for {} ({})", name, email)
    }

    pub fn request_status(title: &str, status: &str) -> String {
        format!("Marked request \"{}\" as {}", title, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_action_entry() {
        let entry = LogEntryBuilder::user_action(7, LogAction::UserCreated)
            .on_record("users", 42)
            .with_details(log_details::user_created("Jane Doe", "jane@gov.example", "admin"))
            .with_ip(Some("10.0.0.5".to_string()))
            .build();

        assert_eq!(entry.user_id, Some(7));
        assert_eq!(entry.action, "user_created");
        assert_eq!(entry.table_name.as_deref(), Some("users"));
        assert_eq!(entry.record_id, Some(42));
        assert!(entry.details.contains("jane@gov.example"));
        assert_eq!(entry.ip_address.as_deref(), Some("10.0.0.5"));
    }

    #[test]
    fn test_custom_action_without_actor() {
        let entry = LogEntryBuilder::custom(None, "password_reset")
            .on_table("users")
            .build();
        assert_eq!(entry.user_id, None);
        assert_eq!(entry.action, "password_reset");
        assert_eq!(entry.record_id, None);
        assert!(entry.details.is_empty());
    }

    #[test]
    fn test_detail_helpers_identify_user() {
        for details in [
            log_details::user_updated("Jane", "jane@gov.example"),
            log_details::user_deleted("Jane", "jane@gov.example"),
            log_details::password_reset("Jane", "jane@gov.example"),
        ] {
            assert!(details.contains("jane@gov.example"));
        }
    }
}
