//! System settings: every admin can read them, only super admins save.

use axum::{extract::State, Json};
use domain::models::{LogAction, SystemSettings, UpdateSettingsRequest, BACKUP_FREQUENCIES};
use domain::services::LogEntryBuilder;
use persistence::repositories::SettingRepository;
use serde::Serialize;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ClientIp, SessionContext};
use crate::routes::page::{degrade, Page};

#[derive(Debug, Serialize)]
pub struct SettingsView {
    pub settings: SystemSettings,
    pub can_edit: bool,
    pub backup_frequencies: [&'static str; 3],
}

#[derive(Debug, Serialize)]
pub struct SettingsSaved {
    pub success: bool,
    pub message: String,
    pub settings: SystemSettings,
}

async fn load_settings(repo: &SettingRepository) -> Result<SystemSettings, sqlx::Error> {
    let rows = repo.get_all().await?;
    Ok(SystemSettings::from_pairs(
        rows.into_iter().map(|row| (row.setting_key, row.setting_value)),
    ))
}

/// GET /admin/settings
pub async fn get_settings(
    State(state): State<AppState>,
    session: SessionContext,
) -> Json<Page<SettingsView>> {
    let repo = SettingRepository::new(state.pool.clone());
    let (settings, error) = degrade(load_settings(&repo).await, "settings");

    let view = SettingsView {
        settings,
        can_edit: session.is_super_admin(),
        backup_frequencies: BACKUP_FREQUENCIES,
    };
    Json(Page::new(&session, view).with_error(error))
}

/// POST /admin/settings
///
/// Writes every key, then answers with what storage now holds.
pub async fn update_settings(
    State(state): State<AppState>,
    session: SessionContext,
    ip: ClientIp,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<Json<SettingsSaved>, ApiError> {
    request.validate()?;

    let pairs = SystemSettings::from(request).to_pairs();
    let log = LogEntryBuilder::user_action(session.user_id, LogAction::SettingsUpdated)
        .on_table("system_settings")
        .with_details(format!("Updated {} system settings", pairs.len()))
        .with_ip(ip.into_inner())
        .build();

    let repo = SettingRepository::new(state.pool.clone());
    repo.upsert_all(&pairs, &log).await?;

    let settings = load_settings(&repo).await?;
    tracing::info!(updated_by = session.user_id, "System settings updated");

    Ok(Json(SettingsSaved {
        success: true,
        message: "Settings saved successfully".to_string(),
        settings,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saved_settings_serialization() {
        let saved = SettingsSaved {
            success: true,
            message: "Settings saved successfully".to_string(),
            settings: SystemSettings::default(),
        };
        let json = serde_json::to_value(&saved).unwrap();
        assert_eq!(json["settings"]["session_timeout"], 30);
        assert_eq!(json["settings"]["backup_frequency"], "daily");
    }
}
