//! Jobroute
//!
//! Expands manufacturing work orders into jobs, operation routes and
//! machine assignments on a PocketBase store, and reverses them.
//!
//! This crate provides:
//! - Work order form validation and request building
//! - Expansion engine with per-record error collection
//! - Reversal engine with child-first cascading deletes
//! - Environment-driven configuration

pub mod config;
pub mod engine;
pub mod form;
pub mod operations;
pub mod random;
pub mod records;
pub mod report;
pub mod request;

pub use config::{AppConfig, Collections, ConfigError};
pub use engine::{dry_run_store, ExpansionEngine, ReversalEngine};
pub use form::{QuantityPolicy, ValidationError, WorkOrderForm};
pub use operations::{Operation, OPERATIONS};
pub use random::{RandomSource, ScriptedRandom};
pub use report::{BatchError, ExpansionReport, RevertReport};
pub use request::{ExpansionRequest, SubIdEntry};
