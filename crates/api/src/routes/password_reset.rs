//! Self-service password reset: request a link, check it, use it once.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use domain::models::{
    ForgotPasswordRequest, ResetTokenQuery, ResetTokenStatus, ResetWithTokenRequest,
    FORGOT_PASSWORD_MESSAGE,
};
use tracing::{error, warn};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ClientIp, LOGIN_PATH};
use crate::routes::page::ActionResponse;
use crate::services::auth::AuthService;

/// POST /forgot-password
///
/// Answers the same way whether or not the address has an account.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    request.validate()?;

    let auth = AuthService::new(&state)?;
    match auth.forgot_password(&request.email).await {
        Ok(Some((user, token))) => {
            if let Err(e) = state
                .email
                .send_password_reset_email(&user.email, &user.name, &token)
                .await
            {
                warn!(error = %e, user_id = user.id, "Failed to send password reset email");
            }
        }
        Ok(None) => {}
        Err(e) => error!(error = %e, "Failed to issue password reset token"),
    }

    Ok(Json(ActionResponse::ok(FORGOT_PASSWORD_MESSAGE)))
}

/// GET /reset-password?token=...
pub async fn check_reset_link(
    State(state): State<AppState>,
    Query(query): Query<ResetTokenQuery>,
) -> Json<ResetTokenStatus> {
    let Some(token) = query.token.filter(|t| !t.trim().is_empty()) else {
        return Json(ResetTokenStatus::invalid());
    };

    let valid = match AuthService::new(&state) {
        Ok(auth) => auth.check_reset_token(token.trim()).await.unwrap_or_else(|e| {
            error!(error = %e, "Failed to check reset token");
            false
        }),
        Err(e) => {
            error!(error = %e, "Failed to initialize auth service");
            false
        }
    };

    Json(if valid {
        ResetTokenStatus::valid()
    } else {
        ResetTokenStatus::invalid()
    })
}

/// POST /reset-password
///
/// Consumes the token, sets the password and ends every session of the
/// account, including the one in this browser.
pub async fn reset_password(
    State(state): State<AppState>,
    ip: ClientIp,
    Json(request): Json<ResetWithTokenRequest>,
) -> Result<(HeaderMap, Json<ActionResponse>), ApiError> {
    request.validate()?;

    let auth = AuthService::new(&state)?;
    auth.reset_password(request.token.trim(), &request.password, ip.into_inner())
        .await?;

    let mut headers = HeaderMap::new();
    auth.cookies().add_clear_cookie(&mut headers);

    Ok((
        headers,
        Json(
            ActionResponse::ok("Your password has been reset. Please sign in.")
                .with_redirect(LOGIN_PATH),
        ),
    ))
}
