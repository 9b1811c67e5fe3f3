//! Test support utilities for the tables bridge workspace.
//!
//! This crate provides shared testing infrastructure:
//! - Seeded reference stores (`Clients`, `Orders`) and store builders
//! - A recording script engine and container for driving hosted pages
//! - Property-based generators for grouped tables
//! - Assertion helpers for bridge errors and JSON payloads
//!
//! # Example Usage
//!
//! ```
//! use testsupport::prelude::*;
//! use bridge::Control;
//! use common::GroupCountStrategy;
//!
//! let control = Control::new(orders_store(), GroupCountStrategy::PointQueries);
//! let data = control.query("Orders", "").unwrap().unwrap();
//! assert_eq!(data.get_collection_size(0).unwrap(), 2);
//! ```

pub mod assertions;
pub mod fakes;
pub mod fixtures;
pub mod proptest_generators;

/// Convenient re-exports for common testing patterns.
pub mod prelude {
    pub use crate::assertions::*;
    pub use crate::fakes::*;
    pub use crate::fixtures::*;
}
