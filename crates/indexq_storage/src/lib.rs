//! # IndexQ Storage
//!
//! The host storage engine contract for IndexQ, and an in-memory engine
//! that implements it.
//!
//! IndexQ compiles queries into index range scans; the engine underneath
//! owns the data. An engine provides:
//!
//! - Named, versioned stores with an upgrade hook ([`StoreFactory`],
//!   [`SchemaUpgrade`])
//! - Tables keyed by a primary key, with named secondary indexes
//! - Read-only and read-write transactions ([`StorageEngine`],
//!   [`Transaction`]) with range scans over any index ([`KeyRange`])
//!
//! ## Design Principles
//!
//! - The engine knows nothing about predicates or result merging
//! - One writer at a time; readers see a snapshot
//! - Rows handed out are copies, never references into engine state
//!
//! ## Available Engines
//!
//! - [`MemoryFactory`] - For testing and ephemeral stores

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod engine;
mod error;
mod memory;
mod range;

pub use engine::{
    IndexOptions, SchemaUpgrade, StorageEngine, StoreFactory, Transaction, TransactionMode,
    WriteMode,
};
pub use error::{StorageError, StorageResult};
pub use memory::{MemoryEngine, MemoryFactory, MemoryTransaction};
pub use range::KeyRange;
