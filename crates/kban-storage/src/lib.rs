//! # kban-storage
//!
//! Storage abstraction layer for KBAN issuance.
//!
//! The [`Storage`] trait is a column-family key/value interface. The only
//! implementation shipped here is [`MemoryStorage`]; a durable backend can be
//! substituted without touching callers.

#![warn(clippy::all)]

pub mod column_families;
pub mod errors;
pub mod memory_impl;
pub mod traits;

pub use column_families::*;
pub use errors::{Result, StorageError};
pub use memory_impl::MemoryStorage;
pub use traits::{Batch, BatchExt, Storage};
