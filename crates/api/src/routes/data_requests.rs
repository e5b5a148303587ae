//! Data request listing, submission and responses.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::{
    CreateDataRequest, DataRequest, DataRequestFilter, DataRequestListResponse, DataRequestQuery,
    LogAction, MinistryOption, RespondToRequest,
};
use domain::services::{log_details, LogEntryBuilder};
use persistence::repositories::{DataRequestRepository, MinistryRepository, NewDataRequest};
use sqlx::PgPool;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ClientIp, SessionContext};
use crate::routes::page::{ActionResponse, Page};

/// Filtered list, stat cards over the filter's scope only, and the ministry
/// dropdown.
pub(crate) async fn load_request_list(
    pool: &PgPool,
    filter: &DataRequestFilter,
    query: DataRequestQuery,
) -> Result<DataRequestListResponse, sqlx::Error> {
    let requests = DataRequestRepository::new(pool.clone());
    let ministries = MinistryRepository::new(pool.clone());

    let (rows, stats, options) = tokio::try_join!(
        requests.list(filter, None),
        requests.stat_cards(filter),
        ministries.list_options(false),
    )?;

    let requests: Vec<DataRequest> = rows.into_iter().map(DataRequest::from).collect();
    Ok(DataRequestListResponse {
        total: requests.len(),
        requests,
        stats,
        filters: query,
        ministries: options.into_iter().map(MinistryOption::from).collect(),
    })
}

/// GET /admin/requests
pub async fn list_requests(
    State(state): State<AppState>,
    session: SessionContext,
    Query(query): Query<DataRequestQuery>,
) -> Json<Page<DataRequestListResponse>> {
    let filter = DataRequestFilter::from_query(&query);
    let result = load_request_list(&state.pool, &filter, query).await;
    Json(Page::load(&session, result, "data requests"))
}

/// GET /requests/my
pub async fn my_requests(
    State(state): State<AppState>,
    session: SessionContext,
    Query(query): Query<DataRequestQuery>,
) -> Json<Page<DataRequestListResponse>> {
    let filter = DataRequestFilter::from_query(&query).requested_by(session.user_id);
    let result = load_request_list(&state.pool, &filter, query).await;
    Json(Page::load(&session, result, "your requests"))
}

/// POST /requests
///
/// The requesting ministry is the caller's own.
pub async fn create_request(
    State(state): State<AppState>,
    session: SessionContext,
    ip: ClientIp,
    Json(request): Json<CreateDataRequest>,
) -> Result<(StatusCode, Json<ActionResponse>), ApiError> {
    request.validate()?;

    let Some(own_ministry_id) = session.ministry_id else {
        return Err(ApiError::Validation(
            "You must belong to a ministry to submit requests".into(),
        ));
    };
    if request.target_ministry_id == own_ministry_id {
        return Err(ApiError::Validation(
            "You cannot submit a request to your own ministry".into(),
        ));
    }

    let target = MinistryRepository::new(state.pool.clone())
        .find_by_id(request.target_ministry_id)
        .await?;
    match target {
        Some(ministry) if ministry.is_active() => {}
        _ => {
            return Err(ApiError::Validation(
                "Please select a valid target ministry".into(),
            ))
        }
    }

    let ip = ip.into_inner();
    let created = DataRequestRepository::new(state.pool.clone())
        .create(
            NewDataRequest {
                title: &request.title,
                description: &request.description,
                request_type: &request.request_type,
                priority: request.priority,
                requesting_ministry_id: own_ministry_id,
                target_ministry_id: request.target_ministry_id,
                requested_by: session.user_id,
            },
            |row| {
                LogEntryBuilder::user_action(session.user_id, LogAction::RequestCreated)
                    .on_record("data_requests", row.id)
                    .with_details(format!("Submitted data request: {}", row.title))
                    .with_ip(ip)
                    .build()
            },
        )
        .await?;

    tracing::info!(
        request_id = created.id,
        requesting_ministry_id = own_ministry_id,
        target_ministry_id = request.target_ministry_id,
        "Data request submitted"
    );

    Ok((
        StatusCode::CREATED,
        Json(ActionResponse::ok("Request submitted successfully").with_id(created.id)),
    ))
}

/// POST /admin/requests/:id/respond
pub async fn respond_to_request(
    State(state): State<AppState>,
    session: SessionContext,
    ip: ClientIp,
    Path(id): Path<i64>,
    Json(request): Json<RespondToRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    request.validate()?;

    let ip = ip.into_inner();
    let status = request.status;
    let updated = DataRequestRepository::new(state.pool.clone())
        .respond(
            id,
            None,
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
        .ok_or_else(|| ApiError::NotFound("Request not found".into()))?;

    Ok(Json(
        ActionResponse::ok(format!("Request {} successfully", status.as_str()))
            .with_id(updated.id),
    ))
}

/// DELETE /admin/requests/:id
pub async fn delete_request(
    State(state): State<AppState>,
    session: SessionContext,
    ip: ClientIp,
    Path(id): Path<i64>,
) -> Result<Json<ActionResponse>, ApiError> {
    let ip = ip.into_inner();
    let deleted = DataRequestRepository::new(state.pool.clone())
        .delete(id, |row| {
            LogEntryBuilder::user_action(session.user_id, LogAction::RequestDeleted)
                .on_record("data_requests", row.id)
                .with_details(format!("Deleted data request: {}", row.title))
                .with_ip(ip)
                .build()
        })
        .await?
        .ok_or_else(|| ApiError::NotFound("Request not found".into()))?;

    tracing::info!(request_id = deleted.id, deleted_by = session.user_id, "Data request deleted");

    Ok(Json(
        ActionResponse::ok("Request deleted successfully").with_id(deleted.id),
    ))
}
