//! Reads one measurement file into a series of per-iteration durations (ns).
//!
//! Nothing here fails: a missing file, a broken header or a bad row all
//! degrade to fewer samples, and the degradation is reported on [`Extraction`].

use crate::layout::{FieldLayout, SourceLocation};
use crate::units::TimeUnit;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use std::fs::File;
use std::io;
use tracing::{debug, warn};

const NANOS_PER_SECOND: f64 = 1e9;

/// One recorded duration together with the iterations it covers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeasurementSample {
    pub raw_ns: f64,
    pub iterations: f64,
}

impl MeasurementSample {
    /// `None` unless the iteration count is positive and the duration is a
    /// non-negative finite number.
    pub fn per_iteration_ns(&self) -> Option<f64> {
        if self.iterations > 0.0 && self.raw_ns.is_finite() && self.raw_ns >= 0.0 {
            Some(self.raw_ns / self.iterations)
        } else {
            None
        }
    }
}

/// Per-iteration durations in file order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeasurementSeries(Vec<f64>);

impl MeasurementSeries {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<f64>> for MeasurementSeries {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Found,
    Missing,
    Unreadable,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Extraction {
    pub series: MeasurementSeries,
    pub skipped_rows: usize,
    pub status: SourceStatus,
}

impl Extraction {
    fn empty(status: SourceStatus) -> Self {
        Self {
            series: MeasurementSeries::default(),
            skipped_rows: 0,
            status,
        }
    }
}

pub fn extract(location: &SourceLocation) -> Extraction {
    let file = match File::open(&location.path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(path = %location.path.display(), "measurement source missing");
            return Extraction::empty(SourceStatus::Missing);
        }
        Err(e) => {
            warn!(path = %location.path.display(), error = %e, "measurement source unreadable");
            return Extraction::empty(SourceStatus::Unreadable);
        }
    };

    let extraction = extract_from_reader(file, location.layout);
    if extraction.skipped_rows > 0 {
        debug!(
            path = %location.path.display(),
            skipped = extraction.skipped_rows,
            kept = extraction.series.len(),
            "skipped malformed rows"
        );
    }
    extraction
}

pub fn extract_from_reader<R: io::Read>(reader: R, layout: FieldLayout) -> Extraction {
    let mut csv = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let columns = match csv.headers() {
        Ok(headers) => Columns::locate(headers, layout),
        Err(e) => {
            warn!(error = %e, "could not read header row");
            return Extraction::empty(SourceStatus::Unreadable);
        }
    };

    let mut values = Vec::new();
    let mut skipped_rows = 0;
    for (row, record) in csv.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) if e.is_io_error() => {
                warn!(row = row + 1, error = %e, "stopped reading measurement source");
                break;
            }
            Err(_) => {
                skipped_rows += 1;
                continue;
            }
        };
        match columns.sample(&record).and_then(|s| s.per_iteration_ns()) {
            Some(value) => values.push(value),
            None => skipped_rows += 1,
        }
    }

    Extraction {
        series: MeasurementSeries(values),
        skipped_rows,
        status: SourceStatus::Found,
    }
}

enum Columns {
    Criterion {
        sample: Option<usize>,
        iterations: Option<usize>,
        unit: Option<usize>,
    },
    ViewLatency {
        latency: Option<usize>,
    },
}

impl Columns {
    fn locate(headers: &StringRecord, layout: FieldLayout) -> Self {
        let find = |name: &str| headers.iter().position(|h| h == name);
        match layout {
            FieldLayout::Criterion => Columns::Criterion {
                sample: find("sample_measured_value"),
                iterations: find("iteration_count"),
                unit: find("unit"),
            },
            // session_count is optional and does not affect the latency sample
            FieldLayout::ViewLatency => Columns::ViewLatency {
                latency: find("latency_s"),
            },
        }
    }

    fn sample(&self, record: &StringRecord) -> Option<MeasurementSample> {
        match *self {
            Columns::Criterion {
                sample,
                iterations,
                unit,
            } => {
                let factor = match unit.and_then(|i| record.get(i)) {
                    None | Some("") => 1.0,
                    Some(unit) => unit.parse::<TimeUnit>().ok()?.factor(),
                };
                Some(MeasurementSample {
                    raw_ns: number(record, sample)? * factor,
                    iterations: number(record, iterations)?,
                })
            }
            Columns::ViewLatency { latency } => Some(MeasurementSample {
                raw_ns: number(record, latency)? * NANOS_PER_SECOND,
                iterations: 1.0,
            }),
        }
    }
}

fn number(record: &StringRecord, column: Option<usize>) -> Option<f64> {
    let field = record.get(column?)?;
    field.parse::<f64>().ok().filter(|v| v.is_finite())
}
