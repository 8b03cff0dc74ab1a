//! ng-data: Tabular data for the agent
//!
//! Uploaded CSV files and the summary tables derived from them live in a
//! per-session [`TableStore`]. [`Table`] carries the row operations the data
//! tools expose: preview, select/filter/sort, describe, sample and histogram.

pub mod sample;
pub mod stats;
pub mod store;
pub mod table;

pub use sample::sample_rows;
pub use stats::{describe, histogram, Histogram};
pub use store::{FileRecord, SummaryRecord, TableStore};
pub use table::{DType, Filter, FilterOp, Table};
