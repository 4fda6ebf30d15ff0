//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - catalog vocabulary (`MetricCategory`, `Resolution`, `ContentKind`)
//! - scanned entities (`Site`, `DataFile`, `SiteCatalog`)
//! - run configuration (`DashboardConfig`)

pub mod types;

pub use types::*;
