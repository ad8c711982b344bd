//! Output module for persisting harvest results
//!
//! This module handles:
//! - Writing one record file per discovered detail page
//! - Saving the raw index page for inspection
//! - Tallying and summarising run statistics

mod sink;
pub mod stats;

pub use sink::{format_record, record_file_name, Sink, RECORD_SUFFIX};
pub use stats::{log_summary, HarvestStats, StatsSnapshot};
