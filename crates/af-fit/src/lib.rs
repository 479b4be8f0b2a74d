//! Bulk fitting: every enabled model against every experiment.
//!
//! The bulk fitter drives the single-fit solver over the whole grouped
//! dataset, either sequentially or on a fixed-size worker pool, with
//! cooperative cancellation and serialized monotonic progress reporting.
//! Per-fit failures are recorded in the results tree and never abort a run;
//! configuration problems fail the run before any fitting starts.

pub mod bulk;
pub mod cancel;
pub mod config;
pub mod error;
pub mod settings;
pub mod tree;

pub use bulk::{fit_all, BulkOutcome, ProgressFn};
pub use cancel::CancelToken;
pub use config::{resolve_configs, ResolvedConfigs, ResolvedModelConfig};
pub use error::{FitError, FitResult};
pub use settings::{FitSettings, ModelSettings};
pub use tree::{ModelSeries, ResultsTree};
