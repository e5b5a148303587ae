//! Session context extractor.
//!
//! The session guard middleware resolves the caller and stores a
//! [`SessionContext`] in request extensions; handlers take it as an argument.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use domain::models::{initials, UserRole};
use persistence::entities::SessionUserEntity;
use serde::Serialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::services::auth::AuthService;

/// Where every authorization failure is sent.
pub const LOGIN_PATH: &str = "/login";

/// The signed-in caller, rebuilt from the session and users tables on every
/// request.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: Uuid,
    pub user_id: i64,
    pub user_name: String,
    pub user_email: String,
    pub role: UserRole,
    pub ministry_id: Option<i64>,
}

impl From<SessionUserEntity> for SessionContext {
    fn from(entity: SessionUserEntity) -> Self {
        let role = entity.role();
        Self {
            session_id: entity.session_id,
            user_id: entity.user_id,
            user_name: entity.name,
            user_email: entity.email,
            role,
            ministry_id: entity.ministry_id,
        }
    }
}

impl SessionContext {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == UserRole::SuperAdmin
    }

    /// The ministry this caller administers: role admin with a ministry.
    pub fn administered_ministry(&self) -> Option<i64> {
        match self.role {
            UserRole::Admin => self.ministry_id,
            _ => None,
        }
    }

    /// Public part of the caller shown on every page.
    pub fn viewer(&self) -> Viewer {
        Viewer {
            id: self.user_id,
            name: self.user_name.clone(),
            email: self.user_email.clone(),
            role: self.role,
            ministry_id: self.ministry_id,
            initials: initials(&self.user_name),
        }
    }
}

/// Caller summary embedded in page view models.
#[derive(Debug, Clone, Serialize)]
pub struct Viewer {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub ministry_id: Option<i64>,
    pub initials: String,
}

/// Rejection used when no session context is present.
#[derive(Debug)]
pub struct LoginRedirect;

impl IntoResponse for LoginRedirect {
    fn into_response(self) -> Response {
        Redirect::to(LOGIN_PATH).into_response()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for SessionContext {
    type Rejection = LoginRedirect;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionContext>()
            .cloned()
            .ok_or(LoginRedirect)
    }
}

/// Session context if the request carries a live session, for public pages.
#[derive(Debug, Clone)]
pub struct OptionalSession(pub Option<SessionContext>);

#[async_trait]
impl FromRequestParts<AppState> for OptionalSession {
    type Rejection = LoginRedirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<SessionContext>() {
            return Ok(OptionalSession(Some(session.clone())));
        }

        let auth = match AuthService::new(state) {
            Ok(auth) => auth,
            Err(_) => return Ok(OptionalSession(None)),
        };
        let session = auth.resolve_session(&parts.headers).await.ok().flatten();
        Ok(OptionalSession(session))
    }
}
