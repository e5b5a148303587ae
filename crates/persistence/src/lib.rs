//! Persistence layer for the ministry data-exchange portal.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations, each mutation writing its activity log row
//!   in the same transaction
//! - Query timing metrics

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
