//! Admin bootstrap service for initial setup.
//!
//! Creates the first super admin on startup if configured via environment
//! variables. Does nothing once any super admin exists.

use domain::models::{LogAction, UserRole};
use domain::services::{log_details, LogEntryBuilder};
use persistence::repositories::{NewUser, UserRepository};
use shared::password::{hash_password, PasswordError, MIN_PASSWORD_LENGTH};
use shared::validation::validate_password_length;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::config::AdminBootstrapConfig;

/// Error types for admin bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] PasswordError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// What bootstrap did on this start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    NotConfigured,
    AlreadyProvisioned,
    Created(i64),
}

/// Bootstrap a super admin if configured and none exists yet.
///
/// Called after migrations on startup.
pub async fn bootstrap_admin(
    pool: &PgPool,
    config: &AdminBootstrapConfig,
) -> Result<BootstrapOutcome, BootstrapError> {
    if config.bootstrap_email.trim().is_empty() {
        return Ok(BootstrapOutcome::NotConfigured);
    }

    if config.bootstrap_password.is_empty() {
        warn!(
            "PORTAL__ADMIN__BOOTSTRAP_EMAIL is set but PORTAL__ADMIN__BOOTSTRAP_PASSWORD is empty - skipping bootstrap"
        );
        return Ok(BootstrapOutcome::NotConfigured);
    }

    validate_bootstrap_config(config)?;

    let users = UserRepository::new(pool.clone());
    if users.super_admin_exists().await? {
        info!("Super admin already exists - skipping bootstrap");
        return Ok(BootstrapOutcome::AlreadyProvisioned);
    }

    if users.email_exists(&config.bootstrap_email, None).await? {
        warn!(
            email = %config.bootstrap_email,
            "Bootstrap email belongs to an existing account - skipping bootstrap"
        );
        return Ok(BootstrapOutcome::AlreadyProvisioned);
    }

    let password_hash = hash_password(&config.bootstrap_password)?;

    let user = users
        .create(
            NewUser {
                name: config.bootstrap_name.trim(),
                email: config.bootstrap_email.trim(),
                password_hash: &password_hash,
                role: UserRole::SuperAdmin,
                ministry_id: None,
            },
            |user| {
                LogEntryBuilder::custom(None, LogAction::UserCreated.as_str())
                    .on_record("users", user.id)
                    .with_details(log_details::user_created(
                        &user.name,
                        &user.email,
                        UserRole::SuperAdmin.as_str(),
                    ))
                    .build()
            },
        )
        .await?;

    info!(
        email = %user.email,
        user_id = user.id,
        "Bootstrap super admin created successfully"
    );

    warn!(
        "SECURITY: Remove PORTAL__ADMIN__BOOTSTRAP_EMAIL and PORTAL__ADMIN__BOOTSTRAP_PASSWORD \
         from configuration after initial setup"
    );

    Ok(BootstrapOutcome::Created(user.id))
}

fn validate_bootstrap_config(config: &AdminBootstrapConfig) -> Result<(), BootstrapError> {
    if !config.bootstrap_email.contains('@') {
        return Err(BootstrapError::Config(format!(
            "bootstrap email '{}' is not an email address",
            config.bootstrap_email
        )));
    }

    if validate_password_length(&config.bootstrap_password).is_err() {
        return Err(BootstrapError::Config(format!(
            "bootstrap password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    if config.bootstrap_name.trim().is_empty() {
        return Err(BootstrapError::Config("bootstrap name must not be blank".into()));
    }

    Ok(())
}
