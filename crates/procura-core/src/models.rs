//! Domain models for the marketplace.
//!
//! These are the core types shared across all crates.

pub mod bid;
pub mod employee;
pub mod feedback;
pub mod organization;
pub mod tender;
