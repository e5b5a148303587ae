//! Help center.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::{CreateHelpRequest, Faq, HelpCenter, HelpRequest, HelpResource, LogAction};
use domain::services::LogEntryBuilder;
use persistence::repositories::{HelpRepository, NewHelpRequest};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ClientIp, SessionContext};
use crate::routes::page::{degrade, ActionResponse, Page};
use crate::services::HelpNotification;

const SUBMITTED: &str = "Your help request has been submitted. Our support team will contact you soon.";
const SUBMITTED_WITHOUT_EMAIL: &str =
    "Your help request has been submitted, but the notification email could not be sent.";

async fn load_help_content(
    repo: &HelpRepository,
    user_id: i64,
) -> Result<(Vec<Faq>, Vec<HelpResource>, Vec<HelpRequest>), sqlx::Error> {
    let (faqs, resources, requests) = tokio::try_join!(
        repo.list_faqs(),
        repo.list_resources(),
        repo.list_for_user(user_id),
    )?;
    Ok((
        faqs.into_iter().map(Faq::from).collect(),
        resources.into_iter().map(HelpResource::from).collect(),
        requests.into_iter().map(HelpRequest::from).collect(),
    ))
}

/// GET /help
pub async fn help_center(
    State(state): State<AppState>,
    session: SessionContext,
) -> Json<Page<HelpCenter>> {
    let repo = HelpRepository::new(state.pool.clone());
    let ((faqs, resources, my_requests), error) =
        degrade(load_help_content(&repo, session.user_id).await, "help center");

    let center = HelpCenter {
        faqs,
        resources,
        my_requests,
        support_email: state.email.support_address().to_string(),
    };
    Json(Page::new(&session, center).with_error(error))
}

/// POST /help
///
/// The request is stored before the help desk is emailed; a failed email
/// only softens the response.
pub async fn submit_help_request(
    State(state): State<AppState>,
    session: SessionContext,
    ip: ClientIp,
    Json(request): Json<CreateHelpRequest>,
) -> Result<(StatusCode, Json<ActionResponse>), ApiError> {
    request.validate()?;

    let ip = ip.into_inner();
    let stored = HelpRepository::new(state.pool.clone())
        .create(
            NewHelpRequest {
                user_id: session.user_id,
                name: &session.user_name,
                email: &session.user_email,
                subject: &request.subject,
                message: &request.message,
                priority: request.priority,
            },
            |row| {
                LogEntryBuilder::user_action(session.user_id, LogAction::HelpRequested)
                    .on_record("help_requests", row.id)
                    .with_details(format!("Submitted help request: {}", row.subject))
                    .with_ip(ip)
                    .build()
            },
        )
        .await?;

    let notification = HelpNotification {
        request_id: stored.id,
        name: &stored.name,
        email: &stored.email,
        subject: &stored.subject,
        message: &stored.message,
        priority: &stored.priority,
    };
    let message = match state.email.send_help_request_notification(&notification).await {
        Ok(()) => SUBMITTED,
        Err(e) => {
            tracing::warn!(error = %e, help_request_id = stored.id, "Failed to send help request notification");
            SUBMITTED_WITHOUT_EMAIL
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(ActionResponse::ok(message).with_id(stored.id)),
    ))
}
