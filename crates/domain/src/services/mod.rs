//! Domain services.

pub mod audit;

pub use audit::{log_details, LogEntryBuilder};
