//! Procura Core: domain models, error types and repository traits for
//! the tender marketplace.

pub mod error;
pub mod models;
pub mod repository;

pub use error::{ErrorKind, ProcuraError, ProcuraResult};
