//! System setting entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the system_settings table.
#[derive(Debug, Clone, FromRow)]
pub struct SystemSettingEntity {
    pub setting_key: String,
    pub setting_value: String,
    pub updated_at: DateTime<Utc>,
}
