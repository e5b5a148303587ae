//! The caller's own account.

use axum::{extract::State, Json};
use domain::models::{ChangePasswordRequest, LogAction, UpdateProfileRequest, User};
use domain::services::LogEntryBuilder;
use persistence::repositories::{MinistryRepository, UserRepository};
use serde::Serialize;
use shared::password::{hash_password, verify_password};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ClientIp, SessionContext};
use crate::routes::page::{ActionResponse, Page};

#[derive(Debug, Default, Serialize)]
pub struct ProfileView {
    pub user: Option<User>,
    pub ministry_name: Option<String>,
}

async fn load_profile(state: &AppState, user_id: i64) -> Result<ProfileView, sqlx::Error> {
    let Some(user) = UserRepository::new(state.pool.clone())
        .find_by_id(user_id)
        .await?
    else {
        return Ok(ProfileView::default());
    };

    let ministry_name = match user.ministry_id {
        Some(id) => MinistryRepository::new(state.pool.clone())
            .find_by_id(id)
            .await?
            .map(|m| m.name),
        None => None,
    };

    Ok(ProfileView {
        user: Some(user.into()),
        ministry_name,
    })
}

/// GET /profile
pub async fn get_profile(
    State(state): State<AppState>,
    session: SessionContext,
) -> Json<Page<ProfileView>> {
    let result = load_profile(&state, session.user_id).await;
    Json(Page::load(&session, result, "your profile"))
}

/// PUT /profile
pub async fn update_profile(
    State(state): State<AppState>,
    session: SessionContext,
    ip: ClientIp,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    request.validate()?;

    let users = UserRepository::new(state.pool.clone());
    if users
        .email_exists(&request.email, Some(session.user_id))
        .await?
    {
        return Err(ApiError::Conflict("Email already exists".into()));
    }

    let ip = ip.into_inner();
    users
        .update_profile(session.user_id, &request.name, &request.email, |user| {
            LogEntryBuilder::user_action(session.user_id, LogAction::ProfileUpdated)
                .on_record("users", user.id)
                .with_details(format!("Updated profile: {} ({})", user.name, user.email))
                .with_ip(ip)
                .build()
        })
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(ActionResponse::ok("Profile updated successfully")))
}

/// POST /profile/password
pub async fn change_password(
    State(state): State<AppState>,
    session: SessionContext,
    ip: ClientIp,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    request.validate()?;

    let users = UserRepository::new(state.pool.clone());
    let user = users
        .find_by_id(session.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    // A stored hash that cannot be parsed never matches.
    if !verify_password(&request.current_password, &user.password_hash).unwrap_or(false) {
        return Err(ApiError::Validation(
            "Current password is incorrect".into(),
        ));
    }

    let password_hash = hash_password(&request.new_password)?;
    let ip = ip.into_inner();
    users
        .update_password(session.user_id, None, &password_hash, |user| {
            LogEntryBuilder::user_action(session.user_id, LogAction::PasswordChanged)
                .on_record("users", user.id)
                .with_details("Changed own password")
                .with_ip(ip)
                .build()
        })
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    tracing::info!(user_id = session.user_id, "Password changed");

    Ok(Json(ActionResponse::ok("Password changed successfully")))
}
