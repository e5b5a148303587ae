//! Activity log viewer and CSV export.

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use domain::models::{LogEntry, LogFilter, LogListResponse, LogQuery, LOG_SCREEN_LIMIT};
use persistence::repositories::LogRepository;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::SessionContext;
use crate::middleware::metrics::record_log_export;
use crate::routes::page::Page;

const CSV_HEADER: &str = "ID,Date,User,Email,Ministry,Action,Table,Record ID,Details,IP Address";

/// Rows a caller may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogScope {
    All,
    Ministry(i64),
    /// Non-admin without a ministry.
    Nothing,
}

impl LogScope {
    fn for_session(session: &SessionContext) -> Self {
        if session.is_admin() {
            return LogScope::All;
        }
        match session.ministry_id {
            Some(id) => LogScope::Ministry(id),
            None => LogScope::Nothing,
        }
    }

    fn ministry_id(self) -> Option<i64> {
        match self {
            LogScope::Ministry(id) => Some(id),
            _ => None,
        }
    }
}

async fn load_logs(
    repo: &LogRepository,
    filter: &LogFilter,
    scope: LogScope,
    query: LogQuery,
) -> Result<LogListResponse, sqlx::Error> {
    // One extra row tells whether the screen cap cut the list.
    let (mut rows, actions) = tokio::try_join!(
        repo.list(filter, Some(LOG_SCREEN_LIMIT + 1)),
        repo.distinct_actions(scope.ministry_id()),
    )?;

    let truncated = rows.len() as i64 > LOG_SCREEN_LIMIT;
    rows.truncate(LOG_SCREEN_LIMIT as usize);

    let logs: Vec<LogEntry> = rows.into_iter().map(LogEntry::from).collect();
    Ok(LogListResponse {
        total: logs.len(),
        logs,
        truncated,
        actions,
        filters: query,
    })
}

/// GET /activity-logs
pub async fn list_logs(
    State(state): State<AppState>,
    session: SessionContext,
    Query(query): Query<LogQuery>,
) -> Json<Page<LogListResponse>> {
    let scope = LogScope::for_session(&session);
    if scope == LogScope::Nothing {
        return Json(Page::new(
            &session,
            LogListResponse {
                filters: query,
                ..Default::default()
            },
        ));
    }

    let filter = LogFilter::from_query(&query).scoped_to_ministry(scope.ministry_id());
    let repo = LogRepository::new(state.pool.clone());
    let result = load_logs(&repo, &filter, scope, query).await;
    Json(Page::load(&session, result, "activity logs"))
}

/// GET /activity-logs/export
///
/// Same predicates as the screen view, without the row cap.
pub async fn export_logs(
    State(state): State<AppState>,
    session: SessionContext,
    Query(query): Query<LogQuery>,
) -> Result<Response, ApiError> {
    let scope = LogScope::for_session(&session);
    let logs: Vec<LogEntry> = match scope {
        LogScope::Nothing => Vec::new(),
        _ => {
            let filter = LogFilter::from_query(&query).scoped_to_ministry(scope.ministry_id());
            LogRepository::new(state.pool.clone())
                .list(&filter, None)
                .await?
                .into_iter()
                .map(LogEntry::from)
                .collect()
        }
    };

    record_log_export(logs.len());
    tracing::info!(user_id = session.user_id, rows = logs.len(), "Activity log exported");

    let filename = format!(
        "attachment; filename=\"activity_logs_{}.csv\"",
        Utc::now().format("%Y-%m-%d")
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, filename),
        ],
        generate_csv(&logs),
    )
        .into_response())
}

fn generate_csv(logs: &[LogEntry]) -> String {
    let mut csv = String::with_capacity(64 * (logs.len() + 1));
    csv.push_str(CSV_HEADER);
    csv.push('\n');

    for log in logs {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{}\n",
            log.id,
            log.created_at.format("%Y-%m-%d %H:%M:%S"),
            escape_csv(log.user_name.as_deref().unwrap_or("System")),
            escape_csv(log.user_email.as_deref().unwrap_or("")),
            escape_csv(log.ministry_name.as_deref().unwrap_or("")),
            escape_csv(&log.action),
            escape_csv(log.table_name.as_deref().unwrap_or("")),
            log.record_id.map(|id| id.to_string()).unwrap_or_default(),
            escape_csv(&log.details),
            escape_csv(log.ip_address.as_deref().unwrap_or("")),
        ));
    }

    csv
}

fn escape_csv(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use domain::models::UserRole;
    use uuid::Uuid;

    fn session(role: UserRole, ministry_id: Option<i64>) -> SessionContext {
        SessionContext {
            session_id: Uuid::new_v4(),
            user_id: 4,
            user_name: "Kofi Mensah".to_string(),
            user_email: "kofi@gov.example".to_string(),
            role,
            ministry_id,
        }
    }

    fn entry(id: i64, details: &str) -> LogEntry {
        LogEntry {
            id,
            user_id: Some(4),
            user_name: Some("Kofi Mensah".to_string()),
            user_email: Some("kofi@gov.example".to_string()),
            ministry_name: Some("Ministry of Finance".to_string()),
            action: "user_created".to_string(),
            table_name: Some("users".to_string()),
            record_id: Some(12),
            details: details.to_string(),
            ip_address: Some("10.0.0.1".to_string()),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_escape_csv_simple() {
        assert_eq!(escape_csv("hello"), "hello");
        assert_eq!(escape_csv("hello,world"), "\"hello,world\"");
        assert_eq!(escape_csv("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_csv("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_csv_header_only_when_empty() {
        assert_eq!(generate_csv(&[]), format!("{}\n", CSV_HEADER));
    }

    #[test]
    fn test_csv_row_layout() {
        let csv = generate_csv(&[entry(9, "Created user: Jane, jane@gov.example")]);
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(
            row,
            "9,2024-03-01 09:30:00,Kofi Mensah,kofi@gov.example,Ministry of Finance,\
             user_created,users,12,\"Created user: Jane, jane@gov.example\",10.0.0.1"
        );
    }

    #[test]
    fn test_csv_has_no_row_cap() {
        let logs: Vec<LogEntry> = (1..=150).map(|id| entry(id, "x")).collect();
        assert_eq!(generate_csv(&logs).lines().count(), 151);
    }

    #[test]
    fn test_scope_by_role() {
        assert_eq!(
            LogScope::for_session(&session(UserRole::Admin, Some(2))),
            LogScope::All
        );
        assert_eq!(
            LogScope::for_session(&session(UserRole::SuperAdmin, None)),
            LogScope::All
        );
        assert_eq!(
            LogScope::for_session(&session(UserRole::User, Some(2))),
            LogScope::Ministry(2)
        );
        assert_eq!(
            LogScope::for_session(&session(UserRole::User, None)),
            LogScope::Nothing
        );
    }
}
