//! Ministry admin views. Every query and mutation is confined to the caller's
//! ministry as read from the users table by the session guard.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::{
    CreateUserRequest, DataRequestFilter, DataRequestListResponse, DataRequestQuery, LogAction,
    ResetUserPasswordRequest, RespondToRequest, UpdateUserRequest, UserListQuery, UserRole,
};
use domain::services::{log_details, LogEntryBuilder};
use persistence::repositories::{DataRequestRepository, NewUser, UserChanges, UserRepository};
use shared::password::hash_password;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ClientIp, SessionContext};
use crate::routes::admin_users::{ensure_can_manage, list_filter, load_user_list, UsersView};
use crate::routes::data_requests::load_request_list;
use crate::routes::page::{ActionResponse, Page};

const USER_NOT_IN_MINISTRY: &str = "User not found in your ministry";
const REQUEST_NOT_IN_MINISTRY: &str = "Request not found in your ministry";

fn ministry_of(session: &SessionContext) -> Result<i64, ApiError> {
    session
        .administered_ministry()
        .ok_or_else(|| ApiError::Validation("Your account is not assigned to a ministry".into()))
}

/// Ministry admins manage regular users and fellow admins only.
fn ensure_ministry_role(role: UserRole) -> Result<(), ApiError> {
    match role {
        UserRole::User | UserRole::Admin => Ok(()),
        UserRole::SuperAdmin => Err(ApiError::Validation(
            "Ministry admins can only assign the user or admin role".into(),
        )),
    }
}

/// The target must belong to the ministry and be manageable by the caller.
async fn ensure_member(
    users: &UserRepository,
    session: &SessionContext,
    id: i64,
    ministry_id: i64,
) -> Result<(), ApiError> {
    let target = users
        .find_in_ministry(id, ministry_id)
        .await?
        .ok_or_else(|| ApiError::Validation(USER_NOT_IN_MINISTRY.into()))?;
    ensure_can_manage(session, target.role())
}

/// GET /ministry/users
pub async fn list_users(
    State(state): State<AppState>,
    session: SessionContext,
    Query(query): Query<UserListQuery>,
) -> Json<Page<UsersView>> {
    let Some(ministry_id) = session.administered_ministry() else {
        return Json(Page::new(&session, UsersView::default()));
    };

    let mut filter = list_filter(&query);
    filter.ministry_id = Some(ministry_id);

    let result = load_user_list(&state.pool, &filter, Some(ministry_id))
        .await
        .map(|list| UsersView {
            list,
            ministries: Vec::new(),
        });
    Json(Page::load(&session, result, "users"))
}

/// POST /ministry/users
pub async fn create_user(
    State(state): State<AppState>,
    session: SessionContext,
    ip: ClientIp,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<ActionResponse>), ApiError> {
    request.validate()?;
    let ministry_id = ministry_of(&session)?;
    ensure_ministry_role(request.role)?;

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
                ministry_id: Some(ministry_id),
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

    tracing::info!(
        user_id = user.id,
        ministry_id,
        created_by = session.user_id,
        "Ministry user created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ActionResponse::ok("User added successfully").with_id(user.id)),
    ))
}

/// PUT /ministry/users/:id
pub async fn update_user(
    State(state): State<AppState>,
    session: SessionContext,
    ip: ClientIp,
    Path(id): Path<i64>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    request.validate()?;
    let ministry_id = ministry_of(&session)?;
    ensure_ministry_role(request.role)?;

    let users = UserRepository::new(state.pool.clone());
    ensure_member(&users, &session, id, ministry_id).await?;
    if users.email_exists(&request.email, Some(id)).await? {
        return Err(ApiError::Conflict("Email already exists".into()));
    }

    let ip = ip.into_inner();
    let user = users
        .update(
            id,
            Some(ministry_id),
            UserChanges {
                name: &request.name,
                email: &request.email,
                role: request.role,
                ministry_id: Some(ministry_id),
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
        .ok_or_else(|| ApiError::Validation(USER_NOT_IN_MINISTRY.into()))?;

    Ok(Json(
        ActionResponse::ok("User updated successfully").with_id(user.id),
    ))
}

/// DELETE /ministry/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    session: SessionContext,
    ip: ClientIp,
    Path(id): Path<i64>,
) -> Result<Json<ActionResponse>, ApiError> {
    let ministry_id = ministry_of(&session)?;
    if id == session.user_id {
        return Err(ApiError::Validation(
            "You cannot delete your own account".into(),
        ));
    }

    let users = UserRepository::new(state.pool.clone());
    ensure_member(&users, &session, id, ministry_id).await?;

    let ip = ip.into_inner();
    let user = users
        .delete(id, Some(ministry_id), |user| {
            LogEntryBuilder::user_action(session.user_id, LogAction::UserDeleted)
                .on_record("users", user.id)
                .with_details(log_details::user_deleted(&user.name, &user.email))
                .with_ip(ip)
                .build()
        })
        .await?
        .ok_or_else(|| ApiError::Validation(USER_NOT_IN_MINISTRY.into()))?;

    tracing::info!(
        user_id = user.id,
        ministry_id,
        deleted_by = session.user_id,
        "Ministry user deleted"
    );

    Ok(Json(
        ActionResponse::ok("User deleted successfully").with_id(user.id),
    ))
}

/// POST /ministry/users/:id/reset-password
pub async fn reset_user_password(
    State(state): State<AppState>,
    session: SessionContext,
    ip: ClientIp,
    Path(id): Path<i64>,
    Json(request): Json<ResetUserPasswordRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    request.validate()?;
    let ministry_id = ministry_of(&session)?;

    let users = UserRepository::new(state.pool.clone());
    ensure_member(&users, &session, id, ministry_id).await?;

    let password_hash = hash_password(&request.new_password)?;
    let ip = ip.into_inner();
    let user = users
        .update_password(id, Some(ministry_id), &password_hash, |user| {
            LogEntryBuilder::user_action(session.user_id, LogAction::PasswordReset)
                .on_record("users", user.id)
                .with_details(log_details::password_reset(&user.name, &user.email))
                .with_ip(ip)
                .build()
        })
        .await?
        .ok_or_else(|| ApiError::Validation(USER_NOT_IN_MINISTRY.into()))?;

    Ok(Json(
        ActionResponse::ok("Password reset successfully").with_id(user.id),
    ))
}

/// GET /ministry/requests
///
/// Incoming and outgoing requests. Stat cards cover every request involving
/// the ministry regardless of the list filters.
pub async fn list_requests(
    State(state): State<AppState>,
    session: SessionContext,
    Query(query): Query<DataRequestQuery>,
) -> Json<Page<DataRequestListResponse>> {
    let Some(ministry_id) = session.administered_ministry() else {
        return Json(Page::new(&session, DataRequestListResponse::default()));
    };

    let filter = DataRequestFilter::from_query(&query).scoped_to_ministry(ministry_id);
    let result = load_request_list(&state.pool, &filter, query).await;
    Json(Page::load(&session, result, "data requests"))
}

/// POST /ministry/requests/:id/respond
///
/// Only requests addressed to the caller's ministry can be answered.
pub async fn respond_to_request(
    State(state): State<AppState>,
    session: SessionContext,
    ip: ClientIp,
    Path(id): Path<i64>,
    Json(request): Json<RespondToRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    request.validate()?;
    let ministry_id = ministry_of(&session)?;

    let ip = ip.into_inner();
    let status = request.status;
    let updated = DataRequestRepository::new(state.pool.clone())
        .respond(
            id,
            Some(ministry_id),
            status,
            request.response_note.as_deref(),
            session.user_id,
            |row| {
                LogEntryBuilder::custom(Some(session.user_id), status.log_action())
                    .on_record("data_requests", row.id)
                    .with_details(log_details::request_status(&row.title, status.as_str()))
                    .with_ip(ip)
                    .build()
            },
        )
        .await?
        .ok_or_else(|| ApiError::Validation(REQUEST_NOT_IN_MINISTRY.into()))?;

    tracing::info!(
        request_id = updated.id,
        ministry_id,
        status = status.as_str(),
        "Incoming request answered"
    );

    Ok(Json(
        ActionResponse::ok(format!("Request {} successfully", status.as_str())).with_id(updated.id),
    ))
}
