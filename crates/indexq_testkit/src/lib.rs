//! # IndexQ Testkit
//!
//! Test utilities for IndexQ.
//!
//! This crate provides:
//! - Fixtures: the people schema, its sample rows and connection helpers
//! - Property-based test generators using proptest
//! - A naive oracle that evaluates queries row by row
//! - Cross-crate integration test helpers
//! - Concurrency stress helpers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use indexq_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn test_with_people() {
//!     let conn = people_connection().await;
//!     let rows = conn.select(PEOPLE, &Query::new().eq("age", 69)).await.unwrap();
//!     assert_eq!(rows.len(), 2);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;
pub mod oracle;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
    pub use crate::oracle::*;
    pub use crate::stress::*;
    pub use indexq_codec::{Row, Value};
    pub use indexq_core::{AddOptions, Config, Connection, CoreError, Query};
}

pub use fixtures::*;
pub use generators::*;
pub use integration::*;
pub use oracle::*;
pub use stress::*;
