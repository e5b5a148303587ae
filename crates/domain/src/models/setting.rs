//! System settings.
//!
//! Settings are a fixed set of keys stored as text in `system_settings`.
//! Reading coerces each value to its type; a missing or unparsable value
//! falls back to the key's default.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::{Validate, ValidationError};

pub const BACKUP_FREQUENCIES: [&str; 3] = ["daily", "weekly", "monthly"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    SiteName,
    BackupFrequency,
    SessionTimeout,
    NotificationEmail,
    MaintenanceMode,
    DataRetention,
    MaxFileSize,
    EmailNotifications,
}

impl SettingKey {
    pub const ALL: [SettingKey; 8] = [
        SettingKey::SiteName,
        SettingKey::BackupFrequency,
        SettingKey::SessionTimeout,
        SettingKey::NotificationEmail,
        SettingKey::MaintenanceMode,
        SettingKey::DataRetention,
        SettingKey::MaxFileSize,
        SettingKey::EmailNotifications,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::SiteName => "site_name",
            SettingKey::BackupFrequency => "backup_frequency",
            SettingKey::SessionTimeout => "session_timeout",
            SettingKey::NotificationEmail => "notification_email",
            SettingKey::MaintenanceMode => "maintenance_mode",
            SettingKey::DataRetention => "data_retention",
            SettingKey::MaxFileSize => "max_file_size",
            SettingKey::EmailNotifications => "email_notifications",
        }
    }
}

impl FromStr for SettingKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SettingKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("Unknown setting: {}", s))
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Typed view of every setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemSettings {
    pub site_name: String,
    pub backup_frequency: String,
    /// Minutes.
    pub session_timeout: i64,
    pub notification_email: String,
    pub maintenance_mode: bool,
    /// Days. Stored only, no job applies it.
    pub data_retention: i64,
    /// Megabytes.
    pub max_file_size: i64,
    pub email_notifications: bool,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            site_name: "Inter-Ministry Data Exchange".to_string(),
            backup_frequency: "daily".to_string(),
            session_timeout: 30,
            notification_email: "admin@gov.example".to_string(),
            maintenance_mode: false,
            data_retention: 365,
            max_file_size: 10,
            email_notifications: true,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" | "" => Some(false),
        _ => None,
    }
}

fn parse_positive(value: &str) -> Option<i64> {
    value.trim().parse::<i64>().ok().filter(|v| *v > 0)
}

impl SystemSettings {
    /// Coerces stored `(key, value)` rows. Unknown keys are ignored.
    pub fn from_pairs<I, K, V>(rows: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut settings = Self::default();
        for (key, value) in rows {
            let value = value.as_ref();
            let Ok(key) = key.as_ref().parse::<SettingKey>() else {
                continue;
            };
            match key {
                SettingKey::SiteName => {
                    if !value.trim().is_empty() {
                        settings.site_name = value.to_string();
                    }
                }
                SettingKey::BackupFrequency => {
                    if BACKUP_FREQUENCIES.contains(&value) {
                        settings.backup_frequency = value.to_string();
                    }
                }
                SettingKey::SessionTimeout => {
                    if let Some(v) = parse_positive(value) {
                        settings.session_timeout = v;
                    }
                }
                SettingKey::NotificationEmail => {
                    if value.contains('@') {
                        settings.notification_email = value.to_string();
                    }
                }
                SettingKey::MaintenanceMode => {
                    if let Some(v) = parse_bool(value) {
                        settings.maintenance_mode = v;
                    }
                }
                SettingKey::DataRetention => {
                    if let Some(v) = parse_positive(value) {
                        settings.data_retention = v;
                    }
                }
                SettingKey::MaxFileSize => {
                    if let Some(v) = parse_positive(value) {
                        settings.max_file_size = v;
                    }
                }
                SettingKey::EmailNotifications => {
                    if let Some(v) = parse_bool(value) {
                        settings.email_notifications = v;
                    }
                }
            }
        }
        settings
    }

    /// Every key with its stored text form.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        SettingKey::ALL
            .iter()
            .map(|key| {
                let value = match key {
                    SettingKey::SiteName => self.site_name.clone(),
                    SettingKey::BackupFrequency => self.backup_frequency.clone(),
                    SettingKey::SessionTimeout => self.session_timeout.to_string(),
                    SettingKey::NotificationEmail => self.notification_email.clone(),
                    SettingKey::MaintenanceMode => bool_text(self.maintenance_mode),
                    SettingKey::DataRetention => self.data_retention.to_string(),
                    SettingKey::MaxFileSize => self.max_file_size.to_string(),
                    SettingKey::EmailNotifications => bool_text(self.email_notifications),
                };
                (key.as_str().to_string(), value)
            })
            .collect()
    }
}

fn bool_text(value: bool) -> String {
    if value { "1" } else { "0" }.to_string()
}

fn validate_backup_frequency(value: &str) -> Result<(), ValidationError> {
    if BACKUP_FREQUENCIES.contains(&value) {
        Ok(())
    } else {
        let mut err = ValidationError::new("backup_frequency");
        err.message = Some("Backup frequency must be daily, weekly or monthly".into());
        Err(err)
    }
}

/// Settings form. Checkboxes absent from the submission are `false`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateSettingsRequest {
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    #[validate(length(max = 100, message = "Site name must be at most 100 characters"))]
    pub site_name: String,
    #[validate(custom(function = "validate_backup_frequency"))]
    pub backup_frequency: String,
    #[validate(range(min = 5, max = 1440, message = "Session timeout must be between 5 and 1440 minutes"))]
    pub session_timeout: i64,
    #[validate(email(message = "Invalid notification email"))]
    pub notification_email: String,
    #[serde(default)]
    pub maintenance_mode: bool,
    #[validate(range(min = 30, max = 3650, message = "Data retention must be between 30 and 3650 days"))]
    pub data_retention: i64,
    #[validate(range(min = 1, max = 100, message = "Max file size must be between 1 and 100 MB"))]
    pub max_file_size: i64,
    #[serde(default)]
    pub email_notifications: bool,
}

impl From<UpdateSettingsRequest> for SystemSettings {
    fn from(req: UpdateSettingsRequest) -> Self {
        Self {
            site_name: req.site_name.trim().to_string(),
            backup_frequency: req.backup_frequency,
            session_timeout: req.session_timeout,
            notification_email: req.notification_email.trim().to_string(),
            maintenance_mode: req.maintenance_mode,
            data_retention: req.data_retention,
            max_file_size: req.max_file_size,
            email_notifications: req.email_notifications,
        }
    }
}
