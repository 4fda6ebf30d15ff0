//! Aggregations over loaded tables.
//!
//! - trailing rolling means (`rolling`)
//! - percentiles and duration curves (`percentile`)
//! - per-year and per-month distributions (`distribution`)
//! - scenario summaries, bands and hourly profiles (`profile`)

pub mod distribution;
pub mod percentile;
pub mod profile;
pub mod rolling;

pub use distribution::*;
pub use percentile::*;
pub use profile::*;
pub use rolling::*;

/// Why an aggregation could not be computed for a table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatsError {
    #[error("missing column `{0}`")]
    MissingColumn(String),

    #[error("no rows for month {0}")]
    NoRowsForMonth(u32),

    #[error("not enough values (need {needed}, found {found})")]
    NotEnoughValues { needed: usize, found: usize },

    #[error("no year column or scenario-year columns to group by")]
    NoYearGrouping,
}
