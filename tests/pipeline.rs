use sigbench::export;
use sigbench::{
    AggregatedResult, CriterionLayout, ExperimentCell, FieldLayout, MatrixBuilder, Phase, Protocol, ScaleConfig,
    SourceLocation, SourceResolver, SourceStatus, TimeUnit,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const HEADER: &str = "group,function,value,throughput_num,throughput_type,sample_measured_value,unit,iteration_count";

/// A results tree in a temporary directory.
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, relative: impl AsRef<Path>, content: &str) {
        let path = self.root().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn criterion(&self, scale: ScaleConfig, protocol: Protocol, phase: Phase, samples_ns: &[f64]) {
        let mut csv = String::from(HEADER);
        for sample in samples_ns {
            csv.push_str(&format!("\n{0},{0}_{1},,,,{2},ns,1", protocol.key(), phase.key(), sample));
        }
        let cell = ExperimentCell::new(scale, protocol, phase);
        let path = CriterionLayout::new(self.root()).resolve(&cell).path;
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, csv).unwrap();
    }
}

fn small() -> ScaleConfig {
    ScaleConfig::new(3, 4).unwrap()
}

#[test]
fn test_end_to_end_medians_in_microseconds() {
    let fixture = Fixture::new();
    fixture.criterion(small(), Protocol::Frost, Phase::Signing, &[2000.0, 4000.0, 6000.0]);
    fixture.criterion(small(), Protocol::Multisig, Phase::Signing, &[1000.0, 3000.0]);

    let matrix = MatrixBuilder::new(CriterionLayout::new(fixture.root()))
        .unit(TimeUnit::Microseconds)
        .scales([small()])
        .phases(Phase::SIGNATURE)
        .build();

    assert_eq!(
        matrix.result(small(), Protocol::Frost, Phase::Signing),
        Some(AggregatedResult::Median(4.0))
    );
    assert_eq!(
        matrix.result(small(), Protocol::Multisig, Phase::Signing),
        Some(AggregatedResult::Median(2.0))
    );

    let aggregation = matrix
        .get(&ExperimentCell::new(small(), Protocol::Frost, Phase::Aggregation))
        .unwrap();
    assert!(aggregation.result.is_missing());
    assert_ne!(aggregation.result, AggregatedResult::Median(0.0));
    assert_eq!(aggregation.status, SourceStatus::Missing);

    assert_eq!(matrix.result(small(), Protocol::Multisig, Phase::Aggregation), None);
    assert_eq!(matrix.len(), 7);
    assert_eq!(matrix.missing(), 5);
}

#[test]
fn test_nanosecond_medians_and_sample_counts() {
    let fixture = Fixture::new();
    fixture.criterion(small(), Protocol::Frost, Phase::Signing, &[2000.0, 4000.0, 6000.0]);

    let matrix = MatrixBuilder::new(CriterionLayout::new(fixture.root()))
        .unit(TimeUnit::Nanoseconds)
        .scales([small()])
        .protocols([Protocol::Frost])
        .phases([Phase::Signing])
        .build();
    let cell = matrix
        .get(&ExperimentCell::new(small(), Protocol::Frost, Phase::Signing))
        .unwrap();
    assert_eq!(cell.result, AggregatedResult::Median(4000.0));
    assert_eq!(cell.samples, 3);
    assert_eq!(cell.skipped_rows, 0);
    assert_eq!(cell.status, SourceStatus::Found);
}

#[test]
fn test_malformed_rows_are_counted_not_fatal() {
    let fixture = Fixture::new();
    fixture.write(
        "3-out-of-4/frost/frost_verify/base/raw.csv",
        "sample_measured_value,iteration_count\n9000,3\n1000,0\n,2\nbogus,1\n",
    );

    let matrix = MatrixBuilder::new(CriterionLayout::new(fixture.root()))
        .unit(TimeUnit::Nanoseconds)
        .scales([small()])
        .protocols([Protocol::Frost])
        .phases([Phase::Verification])
        .build();
    let cell = matrix
        .get(&ExperimentCell::new(small(), Protocol::Frost, Phase::Verification))
        .unwrap();
    assert_eq!(cell.result, AggregatedResult::Median(3000.0));
    assert_eq!(cell.samples, 1);
    assert_eq!(cell.skipped_rows, 3);
}

#[test]
fn test_sparse_grid_across_scales() {
    let fixture = Fixture::new();
    let large = ScaleConfig::new(667, 1000).unwrap();
    fixture.criterion(small(), Protocol::Frost, Phase::Initiation, &[1_000_000.0]);
    fixture.criterion(large, Protocol::Multisig, Phase::Initiation, &[5_000_000.0, 7_000_000.0]);

    let matrix = MatrixBuilder::new(CriterionLayout::new(fixture.root()))
        .unit(TimeUnit::Milliseconds)
        .scales([small(), large])
        .phases([Phase::Initiation])
        .build();

    assert_eq!(matrix.row(Protocol::Frost, Phase::Initiation), Some(vec![Some(1.0), None]));
    assert_eq!(matrix.row(Protocol::Multisig, Phase::Initiation), Some(vec![None, Some(6.0)]));
}

#[test]
fn test_view_latency_cells() {
    let fixture = Fixture::new();
    fixture.write(
        "3-out-of-4/hotstuff/roast/qc_latency.csv",
        "view,latency_s,session_count\n1,0.010,1\n2,0.030,1\n3,0.020,2\n",
    );
    fixture.write("3-out-of-4/hotstuff/multisig/qc_latency.csv", "view,latency_s\n1,0.004\n2,0.006\n");

    let matrix = MatrixBuilder::new(CriterionLayout::new(fixture.root()))
        .scales([small()])
        .protocols([Protocol::Roast, Protocol::Multisig])
        .phases([Phase::ViewLatency])
        .build();

    let roast = matrix.result(small(), Protocol::Roast, Phase::ViewLatency).unwrap().value().unwrap();
    let multisig = matrix.result(small(), Protocol::Multisig, Phase::ViewLatency).unwrap().value().unwrap();
    assert!((roast - 20.0).abs() < 1e-9);
    assert!((multisig - 5.0).abs() < 1e-9);
}

#[test]
fn test_distributions_skip_empty_series() {
    let fixture = Fixture::new();
    fixture.criterion(small(), Protocol::Frost, Phase::Signing, &[2000.0, 4000.0]);
    fixture.criterion(small(), Protocol::Multisig, Phase::Verification, &[8000.0]);

    let distributions = MatrixBuilder::new(CriterionLayout::new(fixture.root()))
        .unit(TimeUnit::Microseconds)
        .scales([small()])
        .phases(Phase::SIGNATURE)
        .distributions(small());

    let cells: Vec<_> = distributions.iter().map(|d| (d.cell.protocol, d.cell.phase)).collect();
    assert_eq!(
        cells,
        vec![(Protocol::Frost, Phase::Signing), (Protocol::Multisig, Phase::Verification)]
    );
    assert_eq!(distributions[0].series.values, vec![2.0, 4.0]);
}

#[test]
fn test_injected_resolver() {
    let fixture = Fixture::new();
    fixture.write("flat/frost-signing.csv", "sample_measured_value,iteration_count\n500,1\n");

    let root = fixture.root().join("flat");
    let resolver = move |cell: &ExperimentCell| {
        SourceLocation::new(
            root.join(format!("{}-{}.csv", cell.protocol.key(), cell.phase.key())),
            FieldLayout::Criterion,
        )
    };
    let matrix = MatrixBuilder::new(resolver)
        .unit(TimeUnit::Nanoseconds)
        .scales([small()])
        .phases([Phase::Signing])
        .build();
    assert_eq!(
        matrix.result(small(), Protocol::Frost, Phase::Signing),
        Some(AggregatedResult::Median(500.0))
    );
    assert!(matrix.result(small(), Protocol::Multisig, Phase::Signing).unwrap().is_missing());
}

#[test]
fn test_export_round_trip_through_files() {
    let fixture = Fixture::new();
    fixture.criterion(small(), Protocol::Frost, Phase::Signing, &[2000.0, 4000.0, 6000.0]);

    let matrix = MatrixBuilder::new(CriterionLayout::new(fixture.root()))
        .unit(TimeUnit::Microseconds)
        .scales([small()])
        .protocols([Protocol::Frost])
        .phases([Phase::Signing, Phase::Aggregation])
        .build();

    let out = fixture.root().join("out/matrix.json");
    export::export_to_path(&matrix, export::ExportFormat::Json, &out).unwrap();
    let rows: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    let signing = rows.iter().find(|r| r["phase"] == "signing").unwrap();
    assert_eq!(signing["median"], 4.0);
    assert_eq!(signing["unit"], "µs");
    let aggregation = rows.iter().find(|r| r["phase"] == "aggregation").unwrap();
    assert!(aggregation["median"].is_null());
}
