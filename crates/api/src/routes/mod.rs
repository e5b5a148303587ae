//! HTTP route handlers.

pub mod activity_logs;
pub mod admin_users;
pub mod analytics;
pub mod auth;
pub mod dashboard;
pub mod data_requests;
pub mod health;
pub mod help;
pub mod ministries;
pub mod ministry_admin;
pub mod page;
pub mod password_reset;
pub mod profile;
pub mod settings;
