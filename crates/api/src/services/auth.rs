//! Authentication service: login, server-side sessions, self-registration
//! and the password reset flow.

use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Utc};
use domain::models::{LogAction, RegisterRequest, SettingKey, UserRole, RESET_TOKEN_TTL_MINUTES};
use domain::services::{log_details, LogEntryBuilder};
use persistence::entities::UserEntity;
use persistence::repositories::{
    LogRepository, MinistryRepository, NewUser, PasswordResetRepository, SessionRepository,
    SettingRepository, UserRepository,
};
use shared::crypto::{generate_secure_token, sha256_hex};
use shared::jwt::{extract_user_id, JwtConfig, JwtError};
use shared::password::{hash_password, verify_password, PasswordError};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::SessionContext;
use crate::services::cookies::CookieHelper;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Please select a valid ministry")]
    InvalidMinistry,

    #[error("Invalid or expired reset token")]
    InvalidResetToken,

    #[error("Token error: {0}")]
    TokenError(#[from] JwtError),

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            AuthError::EmailAlreadyExists => ApiError::Conflict(err.to_string()),
            AuthError::InvalidMinistry | AuthError::InvalidResetToken => {
                ApiError::Validation(err.to_string())
            }
            AuthError::DatabaseError(db_err) => ApiError::from(db_err),
            AuthError::TokenError(e) => ApiError::Internal(format!("Token error: {}", e)),
            AuthError::PasswordError(e) => ApiError::from(e),
        }
    }
}

/// A session just written to the session table.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub max_age_secs: i64,
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub user: UserEntity,
    pub session: IssuedSession,
    pub landing_path: &'static str,
}

/// Authentication service.
pub struct AuthService {
    jwt: JwtConfig,
    cookies: CookieHelper,
    default_timeout_minutes: i64,
    users: UserRepository,
    ministries: MinistryRepository,
    sessions: SessionRepository,
    resets: PasswordResetRepository,
    settings: SettingRepository,
    logs: LogRepository,
}

impl AuthService {
    pub fn new(state: &AppState) -> Result<Self, AuthError> {
        let session = &state.config.session;
        let jwt = JwtConfig::with_leeway(&session.secret, session.leeway_secs)?;
        let pool = state.pool.clone();

        Ok(Self {
            jwt,
            cookies: CookieHelper::new(session),
            default_timeout_minutes: session.default_timeout_minutes,
            users: UserRepository::new(pool.clone()),
            ministries: MinistryRepository::new(pool.clone()),
            sessions: SessionRepository::new(pool.clone()),
            resets: PasswordResetRepository::new(pool.clone()),
            settings: SettingRepository::new(pool.clone()),
            logs: LogRepository::new(pool),
        })
    }

    pub fn cookies(&self) -> &CookieHelper {
        &self.cookies
    }

    /// Resolve the caller from the request's session token.
    ///
    /// `Ok(None)` covers every "not signed in" case: no token, a token that
    /// fails verification, or no live session row for it.
    pub async fn resolve_session(
        &self,
        headers: &HeaderMap,
    ) -> Result<Option<SessionContext>, AuthError> {
        let Some(token) = self.cookies.extract_session_token(headers) else {
            return Ok(None);
        };

        let claims = match self.jwt.validate_token(token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!("Session token rejected: {}", e);
                return Ok(None);
            }
        };
        let Ok(user_id) = extract_user_id(&claims) else {
            return Ok(None);
        };

        let session = self
            .sessions
            .find_active_with_user(&sha256_hex(&claims.jti))
            .await?;

        Ok(session
            .filter(|s| s.user_id == user_id)
            .map(SessionContext::from))
    }

    /// Verify credentials and open a session.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        ip: Option<String>,
    ) -> Result<LoginResult, AuthError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let valid = match verify_password(password, &user.password_hash) {
            Ok(valid) => valid,
            Err(e) => {
                warn!(user_id = user.id, "Stored password hash unusable: {}", e);
                false
            }
        };
        if !valid {
            return Err(AuthError::InvalidCredentials);
        }

        self.users.update_last_login(user.id).await?;
        let session = self.start_session(user.id).await?;

        self.logs
            .insert(
                &LogEntryBuilder::user_action(user.id, LogAction::Login)
                    .on_record("users", user.id)
                    .with_details(format!("{} signed in", user.email))
                    .with_ip(ip)
                    .build(),
            )
            .await?;

        if let Err(e) = self.sessions.delete_expired().await {
            warn!("Failed to prune expired sessions: {}", e);
        }

        info!(user_id = user.id, role = %user.role, "User signed in");

        let landing_path = user.role().home_path(user.ministry_id.is_some());
        Ok(LoginResult {
            user,
            session,
            landing_path,
        })
    }

    /// End the caller's session.
    pub async fn logout(&self, session: &SessionContext, ip: Option<String>) -> Result<(), AuthError> {
        let removed = self.sessions.delete(session.session_id).await?;
        if !removed {
            debug!(user_id = session.user_id, "Session already gone at logout");
        }

        self.logs
            .insert(
                &LogEntryBuilder::user_action(session.user_id, LogAction::Logout)
                    .on_record("users", session.user_id)
                    .with_details(format!("{} signed out", session.user_email))
                    .with_ip(ip)
                    .build(),
            )
            .await?;

        Ok(())
    }

    /// Create a regular account in an active ministry.
    pub async fn register(
        &self,
        request: &RegisterRequest,
        ip: Option<String>,
    ) -> Result<UserEntity, AuthError> {
        let ministry = self.ministries.find_by_id(request.ministry_id).await?;
        if !ministry.map(|m| m.is_active()).unwrap_or(false) {
            return Err(AuthError::InvalidMinistry);
        }

        if self.users.email_exists(&request.email, None).await? {
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = hash_password(&request.password)?;
        let user = self
            .users
            .create(
                NewUser {
                    name: &request.name,
                    email: &request.email,
                    password_hash: &password_hash,
                    role: UserRole::User,
                    ministry_id: Some(request.ministry_id),
                },
                |user| {
                    LogEntryBuilder::user_action(user.id, LogAction::UserRegistered)
                        .on_record("users", user.id)
                        .with_details(format!("Registered account {} ({})", user.name, user.email))
                        .with_ip(ip)
                        .build()
                },
            )
            .await?;

        info!(user_id = user.id, ministry_id = request.ministry_id, "User registered");
        Ok(user)
    }

    /// Issue a reset token for the account with this email, if any.
    ///
    /// Returns the account and the raw token to email; only its hash is stored.
    pub async fn forgot_password(
        &self,
        email: &str,
    ) -> Result<Option<(UserEntity, String)>, AuthError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            debug!("Password reset requested for unknown email");
            return Ok(None);
        };

        let token = generate_secure_token();
        let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);
        self.resets
            .create_token(user.id, &sha256_hex(&token), expires_at)
            .await?;

        info!(user_id = user.id, "Password reset token generated");
        Ok(Some((user, token)))
    }

    /// Whether a reset token can still be used.
    pub async fn check_reset_token(&self, token: &str) -> Result<bool, AuthError> {
        let stored = self.resets.find_by_hash(&sha256_hex(token)).await?;
        Ok(stored.map(|t| t.is_usable(Utc::now())).unwrap_or(false))
    }

    /// Consume a reset token and set the new password. All sessions of the
    /// account end.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
        ip: Option<String>,
    ) -> Result<UserEntity, AuthError> {
        let password_hash = hash_password(new_password)?;

        let user = self
            .resets
            .consume_and_reset(&sha256_hex(token), &password_hash, |user| {
                LogEntryBuilder::user_action(user.id, LogAction::PasswordReset)
                    .on_record("users", user.id)
                    .with_details(log_details::password_reset(&user.name, &user.email))
                    .with_ip(ip)
                    .build()
            })
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        info!(user_id = user.id, "Password reset via token, sessions cleared");
        Ok(user)
    }

    /// Session lifetime from the `session_timeout` setting, falling back to
    /// configuration.
    async fn session_timeout_minutes(&self) -> i64 {
        match self.settings.get_value(SettingKey::SessionTimeout.as_str()).await {
            Ok(value) => parse_timeout(value.as_deref()).unwrap_or(self.default_timeout_minutes),
            Err(e) => {
                warn!("Failed to read session timeout setting: {}", e);
                self.default_timeout_minutes
            }
        }
    }

    async fn start_session(&self, user_id: i64) -> Result<IssuedSession, AuthError> {
        let max_age_secs = self.session_timeout_minutes().await * 60;
        let (token, jti) = self.jwt.generate_session_token(user_id, max_age_secs)?;
        let expires_at = Utc::now() + Duration::seconds(max_age_secs);

        self.sessions
            .create(user_id, &sha256_hex(&jti), expires_at)
            .await?;

        Ok(IssuedSession {
            token,
            expires_at,
            max_age_secs,
        })
    }
}

fn parse_timeout(value: Option<&str>) -> Option<i64> {
    value
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|minutes| *minutes > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn test_parse_timeout() {
        assert_eq!(parse_timeout(Some("45")), Some(45));
        assert_eq!(parse_timeout(Some(" 15 ")), Some(15));
        assert_eq!(parse_timeout(Some("0")), None);
        assert_eq!(parse_timeout(Some("-5")), None);
        assert_eq!(parse_timeout(Some("soon")), None);
        assert_eq!(parse_timeout(None), None);
    }

    #[test]
    fn test_auth_error_statuses() {
        let cases = [
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::EmailAlreadyExists, StatusCode::CONFLICT),
            (AuthError::InvalidMinistry, StatusCode::BAD_REQUEST),
            (AuthError::InvalidResetToken, StatusCode::BAD_REQUEST),
            (
                AuthError::DatabaseError(sqlx::Error::PoolTimedOut),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), status);
        }
    }

    #[test]
    fn test_invalid_credentials_message() {
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Invalid email or password"
        );
        assert_eq!(
            AuthError::InvalidResetToken.to_string(),
            domain::models::INVALID_RESET_TOKEN_MESSAGE
        );
    }
}
