//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod data_request;
pub mod help;
pub mod log;
pub mod ministry;
pub mod password_reset;
pub mod setting;
pub mod user;

pub use data_request::DataRequestEntity;
pub use help::{FaqEntity, HelpRequestEntity, ResourceEntity};
pub use log::LogEntity;
pub use ministry::{MinistryEntity, MinistryOptionEntity, MinistryWithCountsEntity};
pub use password_reset::PasswordResetTokenEntity;
pub use setting::SystemSettingEntity;
pub use user::{SessionUserEntity, UserEntity, UserSessionEntity, UserSummaryEntity};
