//! Domain layer for the ministry data exchange portal.
//!
//! This crate contains:
//! - Domain models (User, Ministry, DataRequest, LogEntry, settings)
//! - Request/response types with validation rules
//! - Statistics formulas shared by the dashboards
//! - The activity log entry builder

pub mod models;
pub mod services;
