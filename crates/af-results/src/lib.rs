//! Result assembly and persistence.
//!
//! Flattens the per-model results tree into one wide row per experiment,
//! selects the best and worst model per row over finite residual scores,
//! renders CSV artifacts and stores them under content-hashed run ids.

pub mod error;
pub mod export;
pub mod hash;
pub mod select;
pub mod series;
pub mod store;
pub mod types;
pub mod wide;

pub use error::{ResultsError, ResultsResult};
pub use export::{render_processed_csv, render_wide_csv};
pub use hash::compute_run_id;
pub use select::{best_fit_subset, select_best};
pub use series::{join_series, parse_series};
pub use store::{RunArtifacts, RunStore};
pub use types::RunManifest;
pub use wide::{adapt, ModelCells, WideRow, WideTable};
