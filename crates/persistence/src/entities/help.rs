//! Help center entities.

use chrono::{DateTime, Utc};
use domain::models::{Faq, HelpRequest, HelpRequestStatus, HelpResource, RequestPriority};
use sqlx::FromRow;
use std::str::FromStr;

#[derive(Debug, Clone, FromRow)]
pub struct HelpRequestEntity {
    pub id: i64,
    pub user_id: Option<i64>,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub priority: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<HelpRequestEntity> for HelpRequest {
    fn from(entity: HelpRequestEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            name: entity.name,
            email: entity.email,
            subject: entity.subject,
            message: entity.message,
            priority: RequestPriority::from_str(&entity.priority).unwrap_or_default(),
            status: HelpRequestStatus::from_str(&entity.status).unwrap_or_default(),
            created_at: entity.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct FaqEntity {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub category: String,
}

impl From<FaqEntity> for Faq {
    fn from(entity: FaqEntity) -> Self {
        Self {
            id: entity.id,
            question: entity.question,
            answer: entity.answer,
            category: entity.category,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ResourceEntity {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub url: String,
    pub category: String,
}

impl From<ResourceEntity> for HelpResource {
    fn from(entity: ResourceEntity) -> Self {
        Self {
            id: entity.id,
            title: entity.title,
            description: entity.description,
            url: entity.url,
            category: entity.category,
        }
    }
}
