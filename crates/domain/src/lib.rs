//! Domain layer for the M365 inventory tools.
//!
//! This crate contains:
//! - Domain models (Graph batch sub-requests, Teams device resources, output records)
//! - Batch planning, lookup de-duplication and record joining

pub mod models;
pub mod services;
