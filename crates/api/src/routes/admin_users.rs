//! System-wide user management for admins and super admins.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::{
    CreateUserRequest, LogAction, MinistryOption, ResetUserPasswordRequest, UpdateUserRequest,
    UserListQuery, UserListResponse, UserRole, UserSummary,
};
use domain::services::{log_details, LogEntryBuilder};
use persistence::repositories::{
    MinistryRepository, NewUser, UserChanges, UserListFilter, UserRepository,
};
use serde::Serialize;
use shared::password::hash_password;
use shared::validation::normalize_filter;
use sqlx::PgPool;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ClientIp, SessionContext};
use crate::routes::page::{ActionResponse, Page};

/// User list with the ministries for the filter and edit dropdowns.
#[derive(Debug, Default, Serialize)]
pub struct UsersView {
    #[serde(flatten)]
    pub list: UserListResponse,
    pub ministries: Vec<MinistryOption>,
}

/// Normalizes list query parameters. Unknown roles are ignored.
pub(crate) fn list_filter(query: &UserListQuery) -> UserListFilter {
    UserListFilter {
        role: normalize_filter(query.role.as_deref())
            .and_then(|r| r.parse::<UserRole>().ok())
            .map(|r| r.as_str().to_string()),
        ministry_id: normalize_filter(query.ministry_id.as_deref())
            .and_then(|m| m.parse::<i64>().ok()),
        search: normalize_filter(query.search.as_deref()),
    }
}

/// Users matching `filter` plus role counts within `scope_ministry_id`.
pub(crate) async fn load_user_list(
    pool: &PgPool,
    filter: &UserListFilter,
    scope_ministry_id: Option<i64>,
) -> Result<UserListResponse, sqlx::Error> {
    let users = UserRepository::new(pool.clone());
    let (rows, by_role) = tokio::try_join!(
        users.list(filter),
        users.count_by_role(scope_ministry_id)
    )?;

    let users: Vec<UserSummary> = rows.into_iter().map(UserSummary::from).collect();
    Ok(UserListResponse {
        total: users.len(),
        users,
        by_role,
    })
}

/// Fails unless the ministry exists.
async fn ensure_ministry_exists(pool: &PgPool, ministry_id: Option<i64>) -> Result<(), ApiError> {
    let Some(id) = ministry_id else {
        return Ok(());
    };
    match MinistryRepository::new(pool.clone()).find_by_id(id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::Validation("Selected ministry does not exist".into())),
    }
}

fn ensure_can_assign(session: &SessionContext, role: UserRole) -> Result<(), ApiError> {
    if session.role.can_assign(role) {
        Ok(())
    } else {
        Err(ApiError::Validation(
            "Only a super admin can assign the super admin role".into(),
        ))
    }
}

pub(crate) fn ensure_can_manage(
    session: &SessionContext,
    target: UserRole,
) -> Result<(), ApiError> {
    if session.role.can_manage(target) {
        Ok(())
    } else {
        Err(ApiError::Validation(
            "Only a super admin can modify a super admin account".into(),
        ))
    }
}

/// Loads the target account and refuses it when the caller may not manage it.
async fn ensure_target_manageable(
    users: &UserRepository,
    session: &SessionContext,
    id: i64,
) -> Result<(), ApiError> {
    let target = users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    ensure_can_manage(session, target.role())
}

/// GET /admin/users
pub async fn list_users(
    State(state): State<AppState>,
    session: SessionContext,
    Query(query): Query<UserListQuery>,
) -> Json<Page<UsersView>> {
    let filter = list_filter(&query);
    let ministries = MinistryRepository::new(state.pool.clone());

    let result = async {
        let (list, options) = tokio::try_join!(
            load_user_list(&state.pool, &filter, None),
            ministries.list_options(false)
        )?;
        Ok::<_, sqlx::Error>(UsersView {
            list,
            ministries: options.into_iter().map(MinistryOption::from).collect(),
        })
    }
    .await;

    Json(Page::load(&session, result, "users"))
}

/// POST /admin/users
pub async fn create_user(
    State(state): State<AppState>,
    session: SessionContext,
    ip: ClientIp,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<ActionResponse>), ApiError> {
    request.validate()?;
    ensure_can_assign(&session, request.role)?;
    ensure_ministry_exists(&state.pool, request.ministry_id).await?;

    let users = UserRepository::new(state.pool.clone());
    if users.email_exists(&request.email, None).await? {
        return Err(ApiError::Conflict("Email already exists".into()));
    }

    let password_hash = hash_password(&request.password)?;
    let ip = ip.into_inner();
    let user = users
        .create(
            NewUser {
                name: &request.name,
                email: &request.email,
                password_hash: &password_hash,
                role: request.role,
                ministry_id: request.ministry_id,
            },
            |user| {
                LogEntryBuilder::user_action(session.user_id, LogAction::UserCreated)
                    .on_record("users", user.id)
                    .with_details(log_details::user_created(
                        &user.name,
                        &user.email,
                        &user.role,
                    ))
                    .with_ip(ip)
                    .build()
            },
        )
        .await?;

    tracing::info!(user_id = user.id, created_by = session.user_id, "User created");

    Ok((
        StatusCode::CREATED,
        Json(ActionResponse::ok("User added successfully").with_id(user.id)),
    ))
}

/// PUT /admin/users/:id
pub async fn update_user(
    State(state): State<AppState>,
    session: SessionContext,
    ip: ClientIp,
    Path(id): Path<i64>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    request.validate()?;
    ensure_can_assign(&session, request.role)?;
    ensure_ministry_exists(&state.pool, request.ministry_id).await?;

    let users = UserRepository::new(state.pool.clone());
    ensure_target_manageable(&users, &session, id).await?;
    if users.email_exists(&request.email, Some(id)).await? {
        return Err(ApiError::Conflict("Email already exists".into()));
    }

    let ip = ip.into_inner();
    let user = users
        .update(
            id,
            None,
            UserChanges {
                name: &request.name,
                email: &request.email,
                role: request.role,
                ministry_id: request.ministry_id,
            },
            |user| {
                LogEntryBuilder::user_action(session.user_id, LogAction::UserUpdated)
                    .on_record("users", user.id)
                    .with_details(log_details::user_updated(&user.name, &user.email))
                    .with_ip(ip)
                    .build()
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(
        ActionResponse::ok("User updated successfully").with_id(user.id),
    ))
}

/// DELETE /admin/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    session: SessionContext,
    ip: ClientIp,
    Path(id): Path<i64>,
) -> Result<Json<ActionResponse>, ApiError> {
    let users = UserRepository::new(state.pool.clone());
    ensure_target_manageable(&users, &session, id).await?;

    let ip = ip.into_inner();
    let user = users
        .delete(id, None, |user| {
            LogEntryBuilder::user_action(session.user_id, LogAction::UserDeleted)
                .on_record("users", user.id)
                .with_details(log_details::user_deleted(&user.name, &user.email))
                .with_ip(ip)
                .build()
        })
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    tracing::info!(user_id = user.id, deleted_by = session.user_id, "User deleted");

    Ok(Json(
        ActionResponse::ok("User deleted successfully").with_id(user.id),
    ))
}

/// POST /admin/users/:id/reset-password
pub async fn reset_user_password(
    State(state): State<AppState>,
    session: SessionContext,
    ip: ClientIp,
    Path(id): Path<i64>,
    Json(request): Json<ResetUserPasswordRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    request.validate()?;

    let users = UserRepository::new(state.pool.clone());
    ensure_target_manageable(&users, &session, id).await?;

    let password_hash = hash_password(&request.new_password)?;
    let ip = ip.into_inner();
    let user = users
        .update_password(id, None, &password_hash, |user| {
            LogEntryBuilder::user_action(session.user_id, LogAction::PasswordReset)
                .on_record("users", user.id)
                .with_details(log_details::password_reset(&user.name, &user.email))
                .with_ip(ip)
                .build()
        })
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(
        ActionResponse::ok("Password reset successfully").with_id(user.id),
    ))
}
