//! Domain layer - Pure business abstractions
//!
//! This layer contains NO framework dependencies (no SeaORM queries, no Axum).
//! Only loan policy rules, trait definitions and domain error types.

pub mod errors;
pub mod policy;
pub mod repositories;

pub use errors::{DomainError, ErrorKind};
pub use policy::{CopyStatus, LoanStatus, PatronStatus, ReaderLevel, Situation};
pub use repositories::*;
