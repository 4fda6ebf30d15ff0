//! `portfolio-dash` library crate.
//!
//! The binary (`pdash`) is a thin wrapper around this library so that:
//!
//! - catalog, loading and aggregation logic is testable without spawning processes
//! - the CLI and the TUI share one set of chart builders
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod catalog;
pub mod chart;
pub mod cli;
pub mod domain;
pub mod error;
pub mod io;
pub mod plot;
pub mod report;
pub mod stats;
pub mod tui;
