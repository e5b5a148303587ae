//! Data request entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{DataRequest, RecentRequest, RequestPriority, RequestStatus};
use sqlx::FromRow;
use std::str::FromStr;

/// A data_requests row joined with ministry and requester names.
#[derive(Debug, Clone, FromRow)]
pub struct DataRequestEntity {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub request_type: String,
    pub status: String,
    pub priority: String,
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

impl DataRequestEntity {
    pub fn status(&self) -> RequestStatus {
        RequestStatus::from_str(&self.status).unwrap_or_default()
    }

    pub fn priority(&self) -> RequestPriority {
        RequestPriority::from_str(&self.priority).unwrap_or_default()
    }
}

impl From<DataRequestEntity> for DataRequest {
    fn from(entity: DataRequestEntity) -> Self {
        Self {
            status: entity.status(),
            priority: entity.priority(),
            id: entity.id,
            title: entity.title,
            description: entity.description,
            request_type: entity.request_type,
            requesting_ministry_id: entity.requesting_ministry_id,
            requesting_ministry_name: entity.requesting_ministry_name,
            target_ministry_id: entity.target_ministry_id,
            target_ministry_name: entity.target_ministry_name,
            requested_by: entity.requested_by,
            requester_name: entity.requester_name,
            requested_date: entity.requested_date,
            response_date: entity.response_date,
            approved_by: entity.approved_by,
            response_note: entity.response_note,
            responded_at: entity.responded_at,
        }
    }
}

impl From<DataRequestEntity> for RecentRequest {
    fn from(entity: DataRequestEntity) -> Self {
        Self {
            status: entity.status(),
            priority: entity.priority(),
            id: entity.id,
            title: entity.title,
            requesting_ministry: entity.requesting_ministry_name,
            target_ministry: entity.target_ministry_name,
            requested_date: entity.requested_date,
        }
    }
}
