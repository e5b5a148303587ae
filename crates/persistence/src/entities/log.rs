//! Activity log entity.

use chrono::{DateTime, Utc};
use domain::models::{LogEntry, RecentActivity};
use sqlx::FromRow;

/// A logs row joined with the actor's name, email and ministry.
#[derive(Debug, Clone, FromRow)]
pub struct LogEntity {
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

impl From<LogEntity> for LogEntry {
    fn from(entity: LogEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            user_name: entity.user_name,
            user_email: entity.user_email,
            ministry_name: entity.ministry_name,
            action: entity.action,
            table_name: entity.table_name,
            record_id: entity.record_id,
            details: entity.details,
            ip_address: entity.ip_address,
            created_at: entity.created_at,
        }
    }
}

impl From<LogEntity> for RecentActivity {
    fn from(entity: LogEntity) -> Self {
        RecentActivity::new(
            entity.id,
            entity.user_name,
            entity.action,
            entity.details,
            entity.created_at,
        )
    }
}
