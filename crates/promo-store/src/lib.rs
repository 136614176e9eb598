//! Persistence for jobs and batches.
//!
//! Jobs are written through to a SQLite table so history survives
//! restarts; the in-memory layer keeps status polling cheap while a
//! pipeline is running. Batches are memory-only, with terminal items
//! mirrored into the job table by the pipeline.

pub mod batch_registry;
pub mod db;
pub mod error;
pub mod job_store;

pub use batch_registry::BatchRegistry;
pub use db::Database;
pub use error::{StoreError, StoreResult};
pub use job_store::JobStore;
