//! User account domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Account role. Ordering follows privilege: `User < Admin < SuperAdmin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
    SuperAdmin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
            UserRole::SuperAdmin => "super_admin",
        }
    }

    /// Admin or super admin.
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::SuperAdmin)
    }

    /// Only a super admin may hand out the super admin role.
    pub fn can_assign(&self, target: UserRole) -> bool {
        target != UserRole::SuperAdmin || *self == UserRole::SuperAdmin
    }

    /// Super admin accounts are edited, reset and deleted by super admins only.
    pub fn can_manage(&self, target: UserRole) -> bool {
        self.can_assign(target)
    }

    /// Landing page after login.
    pub fn home_path(&self, has_ministry: bool) -> &'static str {
        match self {
            UserRole::SuperAdmin => "/admin/dashboard",
            UserRole::Admin if has_ministry => "/ministry/dashboard",
            UserRole::Admin => "/admin/dashboard",
            UserRole::User => "/dashboard",
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            "super_admin" => Ok(UserRole::SuperAdmin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub ministry_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// User row for list views, joined with the ministry name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub role_label: String,
    pub ministry_id: Option<i64>,
    pub ministry_name: Option<String>,
    pub initials: String,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// User counts by role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleBreakdown {
    pub user: i64,
    pub admin: i64,
    pub super_admin: i64,
}

/// Query parameters for user lists.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserListQuery {
    pub role: Option<String>,
    pub ministry_id: Option<String>,
    pub search: Option<String>,
}

/// User list view.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserSummary>,
    pub total: usize,
    pub by_role: RoleBreakdown,
}

/// Add-user form.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(custom(function = "shared::validation::validate_password_length"))]
    pub password: String,
    pub role: UserRole,
    pub ministry_id: Option<i64>,
}

/// Edit-user form. Only presence is checked.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub name: String,
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub email: String,
    pub role: UserRole,
    pub ministry_id: Option<i64>,
}

/// Admin-initiated password reset.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ResetUserPasswordRequest {
    #[validate(custom(function = "shared::validation::validate_password_length"))]
    pub new_password: String,
}

/// Login form.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub email: String,
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub password: String,
}

/// Staff self-registration form.
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_registration_passwords"))]
pub struct RegisterRequest {
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(custom(function = "shared::validation::validate_password_length"))]
    pub password: String,
    pub confirm_password: String,
    pub ministry_id: i64,
}

fn validate_registration_passwords(req: &RegisterRequest) -> Result<(), validator::ValidationError> {
    passwords_match(&req.password, &req.confirm_password)
}

/// Own-profile form.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Own-password form.
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_change_passwords"))]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(custom(function = "shared::validation::validate_password_length"))]
    pub new_password: String,
    pub confirm_password: String,
}

fn validate_change_passwords(req: &ChangePasswordRequest) -> Result<(), validator::ValidationError> {
    passwords_match(&req.new_password, &req.confirm_password)
}

pub(crate) fn passwords_match(password: &str, confirm: &str) -> Result<(), validator::ValidationError> {
    if password == confirm {
        Ok(())
    } else {
        let mut err = validator::ValidationError::new("password_mismatch");
        err.message = Some("Passwords do not match".into());
        Err(err)
    }
}

/// Avatar initials: first letter of the first two words, upper-cased.
pub fn initials(name: &str) -> String {
    let letters: String = name
        .split_whitespace()
        .take(2)
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect();

    if letters.is_empty() {
        "?".to_string()
    } else {
        letters
    }
}
