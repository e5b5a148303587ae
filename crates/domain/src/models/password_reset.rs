//! Self-service password reset.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Lifetime of an emailed reset token.
pub const RESET_TOKEN_TTL_MINUTES: i64 = 60;

/// Shared by unknown, used and expired tokens so callers cannot tell them apart.
pub const INVALID_RESET_TOKEN_MESSAGE: &str = "Invalid or expired reset token";

/// Response to a forgot-password submission, identical whether or not the
/// address exists.
pub const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account exists for that email, a password reset link has been sent.";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetTokenQuery {
    pub token: Option<String>,
}

/// Result of checking a reset link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResetTokenStatus {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ResetTokenStatus {
    pub fn valid() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    pub fn invalid() -> Self {
        Self {
            valid: false,
            message: Some(INVALID_RESET_TOKEN_MESSAGE.to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_reset_passwords"))]
pub struct ResetWithTokenRequest {
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub token: String,
    #[validate(custom(function = "shared::validation::validate_password_length"))]
    pub password: String,
    pub confirm_password: String,
}

fn validate_reset_passwords(req: &ResetWithTokenRequest) -> Result<(), validator::ValidationError> {
    super::user::passwords_match(&req.password, &req.confirm_password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_status_carries_generic_message() {
        let status = ResetTokenStatus::invalid();
        assert!(!status.valid);
        assert_eq!(status.message.as_deref(), Some(INVALID_RESET_TOKEN_MESSAGE));

        let json = serde_json::to_value(ResetTokenStatus::valid()).unwrap();
        assert_eq!(json, serde_json::json!({ "valid": true }));
    }

    #[test]
    fn test_reset_request_validation() {
        let ok = ResetWithTokenRequest {
            token: "ab".repeat(32),
            password: "newpass".to_string(),
            confirm_password: "newpass".to_string(),
        };
        assert!(ok.validate().is_ok());

        let mismatch = ResetWithTokenRequest {
            confirm_password: "other-pass".to_string(),
            ..ok.clone()
        };
        assert!(mismatch.validate().is_err());

        let short = ResetWithTokenRequest {
            password: "abc".to_string(),
            confirm_password: "abc".to_string(),
            ..ok
        };
        assert!(short.validate().is_err());
    }
}
