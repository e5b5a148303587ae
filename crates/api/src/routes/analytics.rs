//! Analytics for admins.

use axum::{extract::State, Json};
use chrono::Utc;
use domain::models::AnalyticsReport;
use persistence::repositories::AnalyticsRepository;

use crate::app::AppState;
use crate::extractors::SessionContext;
use crate::routes::page::Page;

/// GET /admin/analytics
pub async fn analytics(
    State(state): State<AppState>,
    session: SessionContext,
) -> Json<Page<AnalyticsReport>> {
    let result = AnalyticsRepository::new(state.pool.clone())
        .report(Utc::now().date_naive())
        .await;
    Json(Page::load(&session, result, "analytics"))
}
