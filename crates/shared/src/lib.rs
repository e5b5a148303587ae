//! Shared utilities for the ministry data exchange portal.
//!
//! This crate provides functionality used across all other crates:
//! - Token hashing and generation
//! - Password hashing with Argon2id
//! - Session token (JWT) encoding and validation
//! - Common validation logic

pub mod crypto;
pub mod jwt;
pub mod password;
pub mod validation;
