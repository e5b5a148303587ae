//! Ministry management for admins.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::{
    CreateMinistryRequest, LogAction, MinistryStatus, MinistryWithCounts, UpdateMinistryRequest,
};
use domain::services::LogEntryBuilder;
use persistence::repositories::MinistryRepository;
use serde::Serialize;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ClientIp, SessionContext};
use crate::routes::page::{ActionResponse, Page};

#[derive(Debug, Default, Serialize)]
pub struct MinistriesView {
    pub ministries: Vec<MinistryWithCounts>,
    pub total: usize,
    pub active: usize,
}

impl MinistriesView {
    fn new(ministries: Vec<MinistryWithCounts>) -> Self {
        let active = ministries
            .iter()
            .filter(|m| m.ministry.status == MinistryStatus::Active)
            .count();
        Self {
            total: ministries.len(),
            active,
            ministries,
        }
    }
}

async fn ensure_unique_abbreviation(
    repo: &MinistryRepository,
    abbreviation: &str,
    exclude_id: Option<i64>,
) -> Result<(), ApiError> {
    if repo.abbreviation_exists(abbreviation, exclude_id).await? {
        return Err(ApiError::Conflict("Abbreviation already exists".into()));
    }
    Ok(())
}

/// GET /admin/ministries
pub async fn list_ministries(
    State(state): State<AppState>,
    session: SessionContext,
) -> Json<Page<MinistriesView>> {
    let result = MinistryRepository::new(state.pool.clone())
        .list_with_counts()
        .await
        .map(|rows| MinistriesView::new(rows.into_iter().map(MinistryWithCounts::from).collect()));
    Json(Page::load(&session, result, "ministries"))
}

/// POST /admin/ministries
pub async fn create_ministry(
    State(state): State<AppState>,
    session: SessionContext,
    ip: ClientIp,
    Json(request): Json<CreateMinistryRequest>,
) -> Result<(StatusCode, Json<ActionResponse>), ApiError> {
    request.validate()?;

    let repo = MinistryRepository::new(state.pool.clone());
    ensure_unique_abbreviation(&repo, &request.abbreviation, None).await?;

    let ip = ip.into_inner();
    let ministry = repo
        .create(&request.name, &request.abbreviation, |m| {
            LogEntryBuilder::user_action(session.user_id, LogAction::MinistryCreated)
                .on_record("ministries", m.id)
                .with_details(format!("Created ministry: {} ({})", m.name, m.abbreviation))
                .with_ip(ip)
                .build()
        })
        .await?;

    tracing::info!(ministry_id = ministry.id, created_by = session.user_id, "Ministry created");

    Ok((
        StatusCode::CREATED,
        Json(ActionResponse::ok("Ministry added successfully").with_id(ministry.id)),
    ))
}

/// PUT /admin/ministries/:id
pub async fn update_ministry(
    State(state): State<AppState>,
    session: SessionContext,
    ip: ClientIp,
    Path(id): Path<i64>,
    Json(request): Json<UpdateMinistryRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    request.validate()?;

    let repo = MinistryRepository::new(state.pool.clone());
    ensure_unique_abbreviation(&repo, &request.abbreviation, Some(id)).await?;

    let ip = ip.into_inner();
    let ministry = repo
        .update(id, &request.name, &request.abbreviation, request.status, |m| {
            LogEntryBuilder::user_action(session.user_id, LogAction::MinistryUpdated)
                .on_record("ministries", m.id)
                .with_details(format!("Updated ministry: {} ({})", m.name, m.status))
                .with_ip(ip)
                .build()
        })
        .await?
        .ok_or_else(|| ApiError::NotFound("Ministry not found".into()))?;

    Ok(Json(
        ActionResponse::ok("Ministry updated successfully").with_id(ministry.id),
    ))
}

/// DELETE /admin/ministries/:id
pub async fn delete_ministry(
    State(state): State<AppState>,
    session: SessionContext,
    ip: ClientIp,
    Path(id): Path<i64>,
) -> Result<Json<ActionResponse>, ApiError> {
    let ip = ip.into_inner();
    let ministry = MinistryRepository::new(state.pool.clone())
        .delete(id, |m| {
            LogEntryBuilder::user_action(session.user_id, LogAction::MinistryDeleted)
                .on_record("ministries", m.id)
                .with_details(format!("Deleted ministry: {}", m.name))
                .with_ip(ip)
                .build()
        })
        .await?
        .ok_or_else(|| ApiError::NotFound("Ministry not found".into()))?;

    tracing::info!(ministry_id = ministry.id, deleted_by = session.user_id, "Ministry deleted");

    Ok(Json(
        ActionResponse::ok("Ministry deleted successfully").with_id(ministry.id),
    ))
}
