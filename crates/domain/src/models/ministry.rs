//! Ministry domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Whether a ministry accepts new requests and registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MinistryStatus {
    #[default]
    Active,
    Inactive,
}

impl MinistryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MinistryStatus::Active => "active",
            MinistryStatus::Inactive => "inactive",
        }
    }
}

impl FromStr for MinistryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(MinistryStatus::Active),
            "inactive" => Ok(MinistryStatus::Inactive),
            _ => Err(format!("Invalid ministry status: {}", s)),
        }
    }
}

impl fmt::Display for MinistryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A government ministry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ministry {
    pub id: i64,
    pub name: String,
    pub abbreviation: String,
    pub status: MinistryStatus,
    pub created_at: DateTime<Utc>,
}

/// Ministry row with activity counts for the ministries list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinistryWithCounts {
    #[serde(flatten)]
    pub ministry: Ministry,
    pub user_count: i64,
    pub outgoing_requests: i64,
    pub incoming_requests: i64,
}

/// Id/name pair for filter dropdowns and registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinistryOption {
    pub id: i64,
    pub name: String,
    pub abbreviation: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateMinistryRequest {
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    #[validate(length(max = 150, message = "Name must be at most 150 characters"))]
    pub name: String,
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    #[validate(length(max = 20, message = "Abbreviation must be at most 20 characters"))]
    pub abbreviation: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateMinistryRequest {
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    #[validate(length(max = 150, message = "Name must be at most 150 characters"))]
    pub name: String,
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    #[validate(length(max = 20, message = "Abbreviation must be at most 20 characters"))]
    pub abbreviation: String,
    #[serde(default)]
    pub status: MinistryStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_through_str() {
        assert_eq!("active".parse::<MinistryStatus>().unwrap(), MinistryStatus::Active);
        assert_eq!("INACTIVE".parse::<MinistryStatus>().unwrap(), MinistryStatus::Inactive);
        assert!("archived".parse::<MinistryStatus>().is_err());
        assert_eq!(MinistryStatus::Inactive.to_string(), "inactive");
    }

    #[test]
    fn test_create_ministry_requires_abbreviation() {
        let req = CreateMinistryRequest {
            name: "Ministry of Finance".to_string(),
            abbreviation: " ".to_string(),
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("abbreviation"));
    }

    #[test]
    fn test_update_ministry_status_defaults_to_active() {
        let req: UpdateMinistryRequest =
            serde_json::from_str(r#"{"name":"Ministry of Health","abbreviation":"MOH"}"#).unwrap();
        assert_eq!(req.status, MinistryStatus::Active);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_with_counts_flattens_ministry() {
        let row = MinistryWithCounts {
            ministry: Ministry {
                id: 3,
                name: "Ministry of Finance".to_string(),
                abbreviation: "MOF".to_string(),
                status: MinistryStatus::Active,
                created_at: Utc::now(),
            },
            user_count: 4,
            outgoing_requests: 2,
            incoming_requests: 7,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["abbreviation"], "MOF");
        assert_eq!(json["incoming_requests"], 7);
    }
}
