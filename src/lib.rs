//! Aggregation of threshold-signature benchmark measurements.
//!
//! Criterion `raw.csv` files (and HotStuff QC latency logs) are read per
//! experiment cell, rescaled to a display unit, reduced to medians and
//! arranged in a [`ResultMatrix`] that the renderer and exporters consume.
//! The [`frost`] and [`multisig`] modules hold the workloads the benches
//! measure.

pub mod config;
pub mod export;
pub mod extract;
pub mod frost;
pub mod layout;
pub mod matrix;
pub mod multisig;
pub mod protocol;
pub mod render;
pub mod stats;
pub mod units;

pub use config::{AnalysisConfig, ConfigError};
pub use extract::{Extraction, MeasurementSample, MeasurementSeries, SourceStatus, extract};
pub use layout::{CriterionLayout, FieldLayout, SourceLocation, SourceResolver};
pub use matrix::{CellResult, Distribution, MatrixBuilder, ResultMatrix};
pub use protocol::{ExperimentCell, Phase, Protocol, ScaleConfig};
pub use stats::{AggregatedResult, format_sig_figs, median};
pub use units::{NormalizedSeries, TimeUnit, normalize};
