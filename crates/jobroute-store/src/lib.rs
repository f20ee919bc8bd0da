//! jobroute record store
//!
//! Collection-oriented record storage used by the job routing engines.
//!
//! This crate provides:
//! - `RecordStore` trait with create/list/delete and paginated full listing
//! - Equality filters rendered as `field="value"`
//! - PocketBase HTTP client with lazily established admin session
//! - In-memory store with fault injection for dry runs and tests

pub mod error;
pub mod memory;
pub mod pocketbase;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use pocketbase::{Credentials, PocketBaseClient};
pub use store::{Filter, Record, RecordPage, RecordStore};
