//! Dataset ingestion and preprocessing.
//!
//! Turns a heterogeneous tabular record set into per-experiment numeric
//! arrays: resolve the four logical columns (optionally by auto-detection),
//! drop unusable rows, group measurements by experiment in first-seen order
//! and derive per-group statistics.

pub mod columns;
pub mod error;
pub mod preprocess;
pub mod table;

pub use columns::{ColumnSpec, LogicalColumn, ResolvedColumns};
pub use error::{DataError, DataResult};
pub use preprocess::{preprocess, Experiment, GroupedTable, PreprocessSummary};
pub use table::RawTable;
