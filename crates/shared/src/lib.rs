//! Shared utilities and common types for the M365 inventory tools.
//!
//! This crate provides common functionality used across all other crates:
//! - Access token claim introspection (granted scopes, expiry)
//! - Validation of values interpolated into request URLs

pub mod token;
pub mod validation;
