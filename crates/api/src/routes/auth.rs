//! Sign-in, sign-out and staff self-registration.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use domain::models::{LoginRequest, MinistryOption, RegisterRequest};
use persistence::repositories::MinistryRepository;
use serde::Serialize;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ClientIp, OptionalSession, SessionContext, LOGIN_PATH};
use crate::middleware::metrics::record_login_attempt;
use crate::routes::page::{degrade, ActionResponse};
use crate::services::auth::{AuthError, AuthService};

/// Login page state.
#[derive(Debug, Serialize)]
pub struct LoginPage {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

/// Registration page: the ministries a new account can join.
#[derive(Debug, Default, Serialize)]
pub struct RegisterPage {
    pub ministries: Vec<MinistryOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn auth_service(state: &AppState) -> Result<AuthService, ApiError> {
    AuthService::new(state).map_err(|e| {
        tracing::error!(error = %e, "Failed to initialize auth service");
        ApiError::from(e)
    })
}

/// GET /login
pub async fn login_page(OptionalSession(session): OptionalSession) -> Json<LoginPage> {
    let redirect = session
        .as_ref()
        .map(|s| s.role.home_path(s.ministry_id.is_some()).to_string());

    Json(LoginPage {
        authenticated: session.is_some(),
        redirect,
    })
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    ip: ClientIp,
    Json(request): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<ActionResponse>), ApiError> {
    request.validate()?;

    let auth = auth_service(&state)?;
    let result = match auth
        .login(&request.email, &request.password, ip.into_inner())
        .await
    {
        Ok(result) => result,
        Err(e) => {
            record_login_attempt("failure");
            if matches!(e, AuthError::InvalidCredentials) {
                tracing::info!("Failed sign-in attempt");
            }
            return Err(e.into());
        }
    };
    record_login_attempt("success");

    let mut headers = HeaderMap::new();
    auth.cookies().add_session_cookie(
        &mut headers,
        &result.session.token,
        result.session.max_age_secs,
    );

    Ok((
        headers,
        Json(
            ActionResponse::ok(format!("Welcome back, {}", result.user.name))
                .with_redirect(result.landing_path),
        ),
    ))
}

/// POST /logout
pub async fn logout(
    State(state): State<AppState>,
    session: SessionContext,
    ip: ClientIp,
) -> Response {
    let mut headers = HeaderMap::new();

    match AuthService::new(&state) {
        Ok(auth) => {
            if let Err(e) = auth.logout(&session, ip.into_inner()).await {
                tracing::error!(error = %e, user_id = session.user_id, "Failed to end session");
            }
            auth.cookies().add_clear_cookie(&mut headers);
        }
        Err(e) => tracing::error!(error = %e, "Failed to initialize auth service"),
    }

    (headers, Redirect::to(LOGIN_PATH)).into_response()
}

/// GET /register
pub async fn register_page(State(state): State<AppState>) -> Json<RegisterPage> {
    let result = MinistryRepository::new(state.pool.clone())
        .list_options(true)
        .await
        .map(|rows| rows.into_iter().map(MinistryOption::from).collect());
    let (ministries, error) = degrade(result, "ministries");

    Json(RegisterPage { ministries, error })
}

/// POST /register
pub async fn register(
    State(state): State<AppState>,
    ip: ClientIp,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ActionResponse>), ApiError> {
    request.validate()?;

    let user = auth_service(&state)?
        .register(&request, ip.into_inner())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(
            ActionResponse::ok("Registration successful. You can now sign in.")
                .with_id(user.id)
                .with_redirect(LOGIN_PATH),
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_requires_both_fields() {
        let request = LoginRequest {
            email: "".to_string(),
            password: "secret1".to_string(),
        };
        let err: ApiError = request.validate().unwrap_err().into();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_login_page_serialization() {
        let page = LoginPage {
            authenticated: false,
            redirect: None,
        };
        assert_eq!(
            serde_json::to_value(&page).unwrap(),
            serde_json::json!({ "authenticated": false })
        );
    }
}
