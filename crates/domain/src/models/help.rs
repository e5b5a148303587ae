//! Help center models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use super::data_request::RequestPriority;

/// Help requests are only ever written as `Pending`; the other states exist
/// in storage for support staff working outside the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum HelpRequestStatus {
    #[default]
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "resolved")]
    Resolved,
}

impl HelpRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HelpRequestStatus::Pending => "pending",
            HelpRequestStatus::InProgress => "in-progress",
            HelpRequestStatus::Resolved => "resolved",
        }
    }
}

impl FromStr for HelpRequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(HelpRequestStatus::Pending),
            "in-progress" | "in_progress" => Ok(HelpRequestStatus::InProgress),
            "resolved" => Ok(HelpRequestStatus::Resolved),
            _ => Err(format!("Invalid help request status: {}", s)),
        }
    }
}

impl fmt::Display for HelpRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelpRequest {
    pub id: i64,
    pub user_id: Option<i64>,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub priority: RequestPriority,
    pub status: HelpRequestStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Faq {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelpResource {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub url: String,
    pub category: String,
}

/// Help center view.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HelpCenter {
    pub faqs: Vec<Faq>,
    pub resources: Vec<HelpResource>,
    pub my_requests: Vec<HelpRequest>,
    pub support_email: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateHelpRequest {
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    #[validate(length(max = 200, message = "Subject must be at most 200 characters"))]
    pub subject: String,
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    #[validate(length(max = 5000, message = "Message must be at most 5000 characters"))]
    pub message: String,
    #[serde(default)]
    pub priority: RequestPriority,
}
