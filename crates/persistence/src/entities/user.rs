//! User and session entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::{initials, humanize_label, UserRole};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// Database row mapping for the users table.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub ministry_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl UserEntity {
    /// Stored role. The column is constrained, anything else is treated as a
    /// plain user.
    pub fn role(&self) -> UserRole {
        UserRole::from_str(&self.role).unwrap_or(UserRole::User)
    }
}

impl From<UserEntity> for domain::models::User {
    fn from(entity: UserEntity) -> Self {
        let role = entity.role();
        Self {
            id: entity.id,
            name: entity.name,
            email: entity.email,
            password_hash: entity.password_hash,
            role,
            ministry_id: entity.ministry_id,
            created_at: entity.created_at,
            last_login: entity.last_login,
            updated_at: entity.updated_at,
        }
    }
}

/// User row joined with the ministry name.
#[derive(Debug, Clone, FromRow)]
pub struct UserSummaryEntity {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub ministry_id: Option<i64>,
    pub ministry_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<UserSummaryEntity> for domain::models::UserSummary {
    fn from(entity: UserSummaryEntity) -> Self {
        let role = UserRole::from_str(&entity.role).unwrap_or(UserRole::User);
        Self {
            initials: initials(&entity.name),
            role_label: humanize_label(role.as_str()),
            id: entity.id,
            name: entity.name,
            email: entity.email,
            role,
            ministry_id: entity.ministry_id,
            ministry_name: entity.ministry_name,
            created_at: entity.created_at,
            last_login: entity.last_login,
        }
    }
}

/// Database row mapping for the user_sessions table.
#[derive(Debug, Clone, FromRow)]
pub struct UserSessionEntity {
    pub id: Uuid,
    pub user_id: i64,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
}

/// A live session joined with its user, as resolved by the session guard.
#[derive(Debug, Clone, FromRow)]
pub struct SessionUserEntity {
    pub session_id: Uuid,
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub ministry_id: Option<i64>,
    pub expires_at: DateTime<Utc>,
}

impl SessionUserEntity {
    pub fn role(&self) -> UserRole {
        UserRole::from_str(&self.role).unwrap_or(UserRole::User)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::{User, UserSummary};

    fn summary_entity(role: &str) -> UserSummaryEntity {
        UserSummaryEntity {
            id: 5,
            name: "Jane Doe".to_string(),
            email: "jane@gov.example".to_string(),
            role: role.to_string(),
            ministry_id: Some(3),
            ministry_name: Some("Ministry of Finance".to_string()),
            created_at: Utc::now(),
            last_login: None,
        }
    }

    #[test]
    fn test_user_entity_to_domain() {
        let now = Utc::now();
        let entity = UserEntity {
            id: 1,
            name: "Amina Yusuf".to_string(),
            email: "amina@gov.example".to_string(),
            password_hash: "$argon2id$...".to_string(),
            role: "super_admin".to_string(),
            ministry_id: None,
            created_at: now,
            last_login: Some(now),
            updated_at: now,
        };
        let user: User = entity.into();
        assert_eq!(user.role, UserRole::SuperAdmin);
        assert_eq!(user.last_login, Some(now));
    }

    #[test]
    fn test_summary_labels() {
        let summary: UserSummary = summary_entity("super_admin").into();
        assert_eq!(summary.role_label, "Super Admin");
        assert_eq!(summary.initials, "JD");
    }

    #[test]
    fn test_unknown_role_reads_as_user() {
        let summary: UserSummary = summary_entity("guest").into();
        assert_eq!(summary.role, UserRole::User);
    }
}
