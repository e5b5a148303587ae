//! Session guard middleware.
//!
//! Each guard resolves the caller from the session cookie, checks the role
//! the route group needs and stores the [`SessionContext`] in request
//! extensions. Every failure, including an unexpected database error, ends
//! in a redirect to the login page.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, error};

use crate::app::AppState;
use crate::extractors::session::{LoginRedirect, SessionContext};
use crate::services::auth::AuthService;

/// Privilege a route group requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Any signed-in account.
    Session,
    /// Admin or super admin.
    Admin,
    SuperAdmin,
    /// Admin bound to a ministry.
    MinistryAdmin,
}

impl Access {
    pub fn permits(&self, session: &SessionContext) -> bool {
        match self {
            Access::Session => true,
            Access::Admin => session.is_admin(),
            Access::SuperAdmin => session.is_super_admin(),
            Access::MinistryAdmin => session.administered_ministry().is_some(),
        }
    }
}

async fn guard(access: Access, state: &AppState, mut req: Request<Body>, next: Next) -> Response {
    let auth = match AuthService::new(state) {
        Ok(auth) => auth,
        Err(e) => {
            error!("Session guard unavailable: {}", e);
            return LoginRedirect.into_response();
        }
    };

    let session = match auth.resolve_session(req.headers()).await {
        Ok(Some(session)) => session,
        Ok(None) => return LoginRedirect.into_response(),
        Err(e) => {
            error!("Failed to resolve session: {}", e);
            return LoginRedirect.into_response();
        }
    };

    if !access.permits(&session) {
        debug!(
            user_id = session.user_id,
            role = %session.role,
            required = ?access,
            path = %req.uri().path(),
            "Insufficient role for route"
        );
        return LoginRedirect.into_response();
    }

    req.extensions_mut().insert(session);
    next.run(req).await
}

pub async fn require_session(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    guard(Access::Session, &state, req, next).await
}

pub async fn require_admin(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    guard(Access::Admin, &state, req, next).await
}

pub async fn require_super_admin(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    guard(Access::SuperAdmin, &state, req, next).await
}

pub async fn require_ministry_admin(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    guard(Access::MinistryAdmin, &state, req, next).await
}
