//! Password reset token entity.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the password_reset_tokens table. Only the SHA-256
/// of the emailed token is stored.
#[derive(Debug, Clone, FromRow)]
pub struct PasswordResetTokenEntity {
    pub id: i64,
    pub user_id: i64,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

impl PasswordResetTokenEntity {
    /// Unused and not yet expired at `now`.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        !self.used && self.expires_at > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token(used: bool, expires_in: Duration) -> PasswordResetTokenEntity {
        let now = Utc::now();
        PasswordResetTokenEntity {
            id: 1,
            user_id: 2,
            token_hash: "a".repeat(64),
            expires_at: now + expires_in,
            used,
            created_at: now,
        }
    }

    #[test]
    fn test_is_usable() {
        let now = Utc::now();
        assert!(token(false, Duration::minutes(30)).is_usable(now));
        assert!(!token(true, Duration::minutes(30)).is_usable(now));
        assert!(!token(false, Duration::minutes(-1)).is_usable(now));
    }
}
