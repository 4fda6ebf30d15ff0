//! Input/output helpers.
//!
//! - CSV table loading + normalization (`loader`)
//! - injected table caches (`cache`)
//! - chart CSV exports and raw downloads (`export`)
//! - catalog JSON listing (`catalog`)

pub mod cache;
pub mod catalog;
pub mod export;
pub mod loader;

pub use cache::{FileStamp, ModTimeCache, NoCache, TableCache};
pub use catalog::*;
pub use export::*;
pub use loader::{DataLoader, LoadedTable, TimeField, ValueColumn};
