//! Dashboards for each role.

use axum::{extract::State, Json};
use domain::models::{AdminDashboard, MinistryDashboard, UserDashboard};
use persistence::repositories::DashboardRepository;

use crate::app::AppState;
use crate::extractors::SessionContext;
use crate::routes::page::Page;

const DASHBOARD: &str = "dashboard statistics";

/// GET /admin/dashboard
pub async fn admin_dashboard(
    State(state): State<AppState>,
    session: SessionContext,
) -> Json<Page<AdminDashboard>> {
    let result = DashboardRepository::new(state.pool.clone())
        .admin_dashboard()
        .await;
    Json(Page::load(&session, result, DASHBOARD))
}

/// GET /ministry/dashboard
pub async fn ministry_dashboard(
    State(state): State<AppState>,
    session: SessionContext,
) -> Json<Page<MinistryDashboard>> {
    // The guard admits only admins bound to a ministry.
    let Some(ministry_id) = session.administered_ministry() else {
        return Json(Page::new(&session, MinistryDashboard::default()));
    };

    let result = DashboardRepository::new(state.pool.clone())
        .ministry_dashboard(ministry_id)
        .await;
    Json(Page::load(&session, result, DASHBOARD))
}

/// GET /dashboard
pub async fn user_dashboard(
    State(state): State<AppState>,
    session: SessionContext,
) -> Json<Page<UserDashboard>> {
    let result = DashboardRepository::new(state.pool.clone())
        .user_dashboard(session.user_id, session.ministry_id)
        .await;
    Json(Page::load(&session, result, DASHBOARD))
}
