//! Builds the (scale x protocol x phase) result table.

use crate::extract::{Extraction, SourceStatus, extract};
use crate::layout::SourceResolver;
use crate::protocol::{ExperimentCell, Phase, Protocol, ScaleConfig, default_scales};
use crate::stats::{AggregatedResult, median};
use crate::units::{NormalizedSeries, TimeUnit, normalize};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Outcome for a single cell, including how much of its source was usable.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CellResult {
    pub result: AggregatedResult,
    pub samples: usize,
    pub skipped_rows: usize,
    pub status: SourceStatus,
}

/// A flattened matrix entry, the export format.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatrixRow {
    pub threshold: u32,
    pub system_size: u32,
    pub protocol: Protocol,
    pub phase: Phase,
    pub unit: &'static str,
    pub median: Option<f64>,
    pub samples: usize,
    pub skipped_rows: usize,
    pub status: SourceStatus,
}

/// One cell's full series, for distribution plots.
#[derive(Clone, Debug, PartialEq)]
pub struct Distribution {
    pub cell: ExperimentCell,
    pub series: NormalizedSeries,
}

#[derive(Clone, Debug)]
pub struct ResultMatrix {
    unit: TimeUnit,
    scales: Vec<ScaleConfig>,
    cells: BTreeMap<ExperimentCell, CellResult>,
}

impl ResultMatrix {
    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// Scales in the order they were declared.
    pub fn scales(&self) -> &[ScaleConfig] {
        &self.scales
    }

    pub fn get(&self, cell: &ExperimentCell) -> Option<&CellResult> {
        self.cells.get(cell)
    }

    /// `None` when the cell was never attempted (inapplicable or undeclared).
    pub fn result(&self, scale: ScaleConfig, protocol: Protocol, phase: Phase) -> Option<AggregatedResult> {
        self.get(&ExperimentCell::new(scale, protocol, phase))
            .map(|cell| cell.result)
    }

    /// Medians for one series across every declared scale; missing data is `None`.
    pub fn row(&self, protocol: Protocol, phase: Phase) -> Option<Vec<Option<f64>>> {
        if !self.has_series(protocol, phase) {
            return None;
        }
        Some(
            self.scales
                .iter()
                .map(|&scale| self.result(scale, protocol, phase).and_then(|r| r.value()))
                .collect(),
        )
    }

    pub fn has_series(&self, protocol: Protocol, phase: Phase) -> bool {
        self.cells
            .keys()
            .any(|cell| cell.protocol == protocol && cell.phase == phase)
    }

    /// The (protocol, phase) series present for `phases`, phase-major.
    pub fn series_keys(&self, phases: &[Phase]) -> Vec<(Protocol, Phase)> {
        phases
            .iter()
            .flat_map(|&phase| Protocol::ALL.into_iter().map(move |protocol| (protocol, phase)))
            .filter(|&(protocol, phase)| self.has_series(protocol, phase))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn missing(&self) -> usize {
        self.cells.values().filter(|c| c.result.is_missing()).count()
    }

    pub fn rows(&self) -> Vec<MatrixRow> {
        self.cells
            .iter()
            .map(|(cell, result)| MatrixRow {
                threshold: cell.scale.threshold(),
                system_size: cell.scale.system_size(),
                protocol: cell.protocol,
                phase: cell.phase,
                unit: self.unit.label(),
                median: result.result.value(),
                samples: result.samples,
                skipped_rows: result.skipped_rows,
                status: result.status,
            })
            .collect()
    }
}

pub struct MatrixBuilder<R> {
    resolver: R,
    unit: TimeUnit,
    scales: Vec<ScaleConfig>,
    protocols: Vec<Protocol>,
    phases: Vec<Phase>,
}

impl<R: SourceResolver> MatrixBuilder<R> {
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            unit: TimeUnit::default(),
            scales: default_scales(),
            protocols: Protocol::ALL.to_vec(),
            phases: Phase::ALL.to_vec(),
        }
    }

    pub fn unit(mut self, unit: TimeUnit) -> Self {
        self.unit = unit;
        self
    }

    pub fn scales(mut self, scales: impl IntoIterator<Item = ScaleConfig>) -> Self {
        self.scales = scales.into_iter().collect();
        self
    }

    pub fn protocols(mut self, protocols: impl IntoIterator<Item = Protocol>) -> Self {
        self.protocols = protocols.into_iter().collect();
        self
    }

    pub fn phases(mut self, phases: impl IntoIterator<Item = Phase>) -> Self {
        self.phases = phases.into_iter().collect();
        self
    }

    /// Applicable cells in scale, phase, protocol order.
    pub fn cells(&self) -> impl Iterator<Item = ExperimentCell> + '_ {
        self.scales.iter().flat_map(move |&scale| {
            self.phases.iter().flat_map(move |&phase| {
                self.protocols
                    .iter()
                    .map(move |&protocol| ExperimentCell::new(scale, protocol, phase))
                    .filter(ExperimentCell::is_applicable)
            })
        })
    }

    pub fn build(&self) -> ResultMatrix {
        let mut cells = BTreeMap::new();
        for cell in self.cells() {
            let (result, _) = self.evaluate(&cell);
            cells.insert(cell, result);
        }

        let matrix = ResultMatrix {
            unit: self.unit,
            scales: self.scales.clone(),
            cells,
        };
        info!(
            cells = matrix.len(),
            missing = matrix.missing(),
            unit = %self.unit,
            "built result matrix"
        );
        matrix
    }

    /// Every non-empty series measured at `scale`.
    pub fn distributions(&self, scale: ScaleConfig) -> Vec<Distribution> {
        self.cells()
            .filter(|cell| cell.scale == scale)
            .filter_map(|cell| {
                let (_, series) = self.evaluate(&cell);
                (!series.values.is_empty()).then_some(Distribution { cell, series })
            })
            .collect()
    }

    fn evaluate(&self, cell: &ExperimentCell) -> (CellResult, NormalizedSeries) {
        let location = self.resolver.resolve(cell);
        let Extraction {
            series,
            skipped_rows,
            status,
        } = extract(&location);

        let normalized = normalize(series.as_slice(), self.unit);
        let result = median(&normalized.values);
        debug!(
            scale = %cell.scale,
            protocol = %cell.protocol,
            phase = %cell.phase,
            samples = normalized.values.len(),
            median = %result,
            "evaluated cell"
        );
        (
            CellResult {
                result,
                samples: normalized.values.len(),
                skipped_rows,
                status,
            },
            normalized,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{FieldLayout, SourceLocation};
    use std::path::PathBuf;

    fn nowhere(cell: &ExperimentCell) -> SourceLocation {
        SourceLocation::new(
            PathBuf::from("/nonexistent/sigbench").join(cell.scale.dir_name()),
            FieldLayout::Criterion,
        )
    }

    #[test]
    fn test_inapplicable_cells_are_never_attempted() {
        let builder = MatrixBuilder::new(nowhere);
        let attempted: Vec<_> = builder.cells().collect();
        assert!(attempted.iter().all(ExperimentCell::is_applicable));
        assert!(
            !attempted
                .iter()
                .any(|c| c.protocol == Protocol::Multisig && c.phase == Phase::Aggregation)
        );
        // 4 frost + 4 multisig + 1 roast phases per scale
        assert_eq!(attempted.len(), 9 * default_scales().len());
    }

    #[test]
    fn test_missing_sources_degrade_to_missing_cells() {
        let scale = ScaleConfig::new(3, 4).unwrap();
        let matrix = MatrixBuilder::new(nowhere)
            .scales([scale])
            .phases(Phase::SIGNATURE)
            .build();

        assert!(!matrix.is_empty());
        assert_eq!(matrix.len(), 7);
        assert_eq!(matrix.missing(), 7);
        let cell = matrix
            .get(&ExperimentCell::new(scale, Protocol::Frost, Phase::Aggregation))
            .unwrap();
        assert_eq!(cell.status, SourceStatus::Missing);
        assert!(cell.result.is_missing());
        assert_eq!(matrix.result(scale, Protocol::Multisig, Phase::Aggregation), None);
    }

    #[test]
    fn test_rows_follow_declared_scale_order() {
        let scales = [ScaleConfig::new(7, 10).unwrap(), ScaleConfig::new(3, 4).unwrap()];
        let matrix = MatrixBuilder::new(nowhere).scales(scales).build();
        assert_eq!(matrix.scales(), &scales);
        assert_eq!(matrix.row(Protocol::Frost, Phase::Signing), Some(vec![None, None]));
        assert_eq!(matrix.row(Protocol::Roast, Phase::Signing), None);
    }

    #[test]
    fn test_series_keys_are_phase_major() {
        let matrix = MatrixBuilder::new(nowhere)
            .scales([ScaleConfig::new(3, 4).unwrap()])
            .build();
        let keys = matrix.series_keys(&[Phase::Signing, Phase::Aggregation, Phase::ViewLatency]);
        assert_eq!(
            keys,
            vec![
                (Protocol::Frost, Phase::Signing),
                (Protocol::Multisig, Phase::Signing),
                (Protocol::Frost, Phase::Aggregation),
                (Protocol::Multisig, Phase::ViewLatency),
                (Protocol::Roast, Phase::ViewLatency),
            ]
        );
    }

    #[test]
    fn test_protocol_filter() {
        let matrix = MatrixBuilder::new(nowhere)
            .scales([ScaleConfig::new(3, 4).unwrap()])
            .protocols([Protocol::Roast])
            .build();
        assert_eq!(matrix.len(), 1);
        assert_eq!(matrix.rows()[0].phase, Phase::ViewLatency);
    }

    #[test]
    fn test_no_applicable_cells_is_empty() {
        let matrix = MatrixBuilder::new(nowhere)
            .scales([ScaleConfig::new(3, 4).unwrap()])
            .protocols([Protocol::Roast])
            .phases(Phase::SIGNATURE)
            .build();
        assert!(matrix.is_empty());
        assert_eq!(matrix.missing(), 0);
    }
}
