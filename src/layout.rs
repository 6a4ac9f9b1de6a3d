//! Where each experiment cell's measurements live on disk.

use crate::protocol::{ExperimentCell, Phase};
use std::path::PathBuf;

/// Field layout of a measurement file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldLayout {
    /// Criterion `raw.csv`: `sample_measured_value`, `iteration_count`, optional `unit`.
    Criterion,
    /// Consensus run: `latency_s` in seconds, optional `session_count`.
    ViewLatency,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceLocation {
    pub path: PathBuf,
    pub layout: FieldLayout,
}

impl SourceLocation {
    pub fn new(path: impl Into<PathBuf>, layout: FieldLayout) -> Self {
        Self {
            path: path.into(),
            layout,
        }
    }
}

/// Maps a cell to the file holding its measurements.
pub trait SourceResolver {
    fn resolve(&self, cell: &ExperimentCell) -> SourceLocation;
}

impl<F> SourceResolver for F
where
    F: Fn(&ExperimentCell) -> SourceLocation,
{
    fn resolve(&self, cell: &ExperimentCell) -> SourceLocation {
        self(cell)
    }
}

/// The results tree produced by running the benches with
/// `CRITERION_HOME=<root>/<t>-out-of-<n>`.
///
/// ```text
/// <root>/21-out-of-30/frost/frost_signing/base/raw.csv
/// <root>/21-out-of-30/hotstuff/roast/qc_latency.csv
/// ```
#[derive(Clone, Debug)]
pub struct CriterionLayout {
    root: PathBuf,
}

impl CriterionLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SourceResolver for CriterionLayout {
    fn resolve(&self, cell: &ExperimentCell) -> SourceLocation {
        let scale_dir = self.root.join(cell.scale.dir_name());
        let protocol = cell.protocol.key();
        match cell.phase {
            Phase::ViewLatency => SourceLocation::new(
                scale_dir
                    .join("hotstuff")
                    .join(protocol)
                    .join("qc_latency.csv"),
                FieldLayout::ViewLatency,
            ),
            phase => SourceLocation::new(
                scale_dir
                    .join(protocol)
                    .join(format!("{protocol}_{}", phase.key()))
                    .join("base")
                    .join("raw.csv"),
                FieldLayout::Criterion,
            ),
        }
    }
}
