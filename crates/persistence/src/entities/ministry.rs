//! Ministry entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::{Ministry, MinistryOption, MinistryStatus, MinistryWithCounts};
use sqlx::FromRow;
use std::str::FromStr;

/// Database row mapping for the ministries table.
#[derive(Debug, Clone, FromRow)]
pub struct MinistryEntity {
    pub id: i64,
    pub name: String,
    pub abbreviation: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl MinistryEntity {
    pub fn is_active(&self) -> bool {
        self.status == MinistryStatus::Active.as_str()
    }
}

impl From<MinistryEntity> for Ministry {
    fn from(entity: MinistryEntity) -> Self {
        Self {
            id: entity.id,
            status: MinistryStatus::from_str(&entity.status).unwrap_or(MinistryStatus::Inactive),
            name: entity.name,
            abbreviation: entity.abbreviation,
            created_at: entity.created_at,
        }
    }
}

/// Ministry row with user and request counts.
#[derive(Debug, Clone, FromRow)]
pub struct MinistryWithCountsEntity {
    pub id: i64,
    pub name: String,
    pub abbreviation: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub user_count: i64,
    pub outgoing_requests: i64,
    pub incoming_requests: i64,
}

impl From<MinistryWithCountsEntity> for MinistryWithCounts {
    fn from(entity: MinistryWithCountsEntity) -> Self {
        Self {
            ministry: MinistryEntity {
                id: entity.id,
                name: entity.name,
                abbreviation: entity.abbreviation,
                status: entity.status,
                created_at: entity.created_at,
            }
            .into(),
            user_count: entity.user_count,
            outgoing_requests: entity.outgoing_requests,
            incoming_requests: entity.incoming_requests,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct MinistryOptionEntity {
    pub id: i64,
    pub name: String,
    pub abbreviation: String,
}

impl From<MinistryOptionEntity> for MinistryOption {
    fn from(entity: MinistryOptionEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            abbreviation: entity.abbreviation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ministry_entity_status() {
        let entity = MinistryEntity {
            id: 3,
            name: "Ministry of Finance".to_string(),
            abbreviation: "MOF".to_string(),
            status: "active".to_string(),
            created_at: Utc::now(),
        };
        assert!(entity.is_active());
        let ministry: Ministry = entity.into();
        assert_eq!(ministry.status, MinistryStatus::Active);
    }
}
