//! Repository implementations for database operations.

pub mod analytics;
pub mod dashboard;
pub mod data_request;
pub mod help;
pub mod log;
pub mod ministry;
pub mod password_reset;
pub mod session;
pub mod setting;
pub mod user;

pub use analytics::{AnalyticsRepository, RankingSide};
pub use dashboard::{DashboardRepository, RECENT_ACTIVITY_LIMIT, RECENT_REQUESTS_LIMIT};
pub use data_request::{DataRequestRepository, NewDataRequest};
pub use help::{HelpRepository, NewHelpRequest};
pub use log::LogRepository;
pub use ministry::MinistryRepository;
pub use password_reset::PasswordResetRepository;
pub use session::SessionRepository;
pub use setting::SettingRepository;
pub use user::{NewUser, UserChanges, UserListFilter, UserRepository};
