//! # kban-identity-core
//!
//! KBAN issuance core.
//!
//! This crate is responsible for:
//! - Building checksum-validated KBAN identifiers
//! - Binding session tokens and auth codes to an identifier
//! - Verifying presented credentials
//! - Keeping an append-only audit trail of lifecycle events
//!
//! Callers are expected to have authorized the request already; nothing here
//! checks who is asking.

#![warn(clippy::all)]

pub mod audit;
pub mod builder;
pub mod errors;
pub mod service;
pub mod store;
pub mod traits;
pub mod types;

pub use audit::StorageAuditLog;
pub use builder::{build_kban, build_kban_with_rng, KbanParts};
pub use errors::{KbanError, Result};
pub use service::{InMemoryKbanService, KbanService};
pub use store::StorageIdentityStore;
pub use traits::{AuditLog, IdentityStore, KbanCore};
pub use types::*;
