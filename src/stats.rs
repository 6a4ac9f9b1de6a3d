//! Median aggregation and compact number formatting for chart labels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The statistic attached to one experiment cell.
///
/// `Missing` is never conflated with a zero median; serialized it becomes `null`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum AggregatedResult {
    Median(f64),
    Missing,
}

impl AggregatedResult {
    pub fn is_missing(&self) -> bool {
        matches!(self, AggregatedResult::Missing)
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            AggregatedResult::Median(v) => Some(*v),
            AggregatedResult::Missing => None,
        }
    }
}

impl From<Option<f64>> for AggregatedResult {
    fn from(value: Option<f64>) -> Self {
        value.map_or(AggregatedResult::Missing, AggregatedResult::Median)
    }
}

impl From<AggregatedResult> for Option<f64> {
    fn from(result: AggregatedResult) -> Self {
        result.value()
    }
}

impl fmt::Display for AggregatedResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregatedResult::Median(v) => f.write_str(&format_sig_figs(*v)),
            AggregatedResult::Missing => f.write_str("-"),
        }
    }
}

/// Median of `values`, averaging the two middle elements for even lengths.
///
/// NaN entries are ignored; an input with nothing left is `Missing`.
pub fn median(values: &[f64]) -> AggregatedResult {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return AggregatedResult::Missing;
    }
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        let (lo, hi) = (sorted[mid - 1], sorted[mid]);
        lo + (hi - lo) / 2.0
    } else {
        sorted[mid]
    };
    AggregatedResult::Median(median)
}

/// Renders `value` with at most four significant figures.
///
/// Magnitudes of 10,000 and above, or non-zero magnitudes below 0.001, switch
/// to scientific notation (`1.235e+04`).
pub fn format_sig_figs(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude >= 10_000.0 || (magnitude > 0.0 && magnitude < 0.001) {
        return scientific(value);
    }

    if magnitude == 0.0 || !magnitude.is_finite() {
        return format!("{value:.3}");
    }

    let exponent = magnitude.log10().floor() as i32;
    let decimals = (3 - exponent).max(0) as usize;
    let fixed = format!("{value:.decimals$}");
    let rounded = fixed.parse::<f64>().map_or(magnitude, f64::abs);
    if rounded >= 10_000.0 {
        return scientific(value);
    }
    // Rounding carried into the next power of ten: drop one decimal to stay at four figures.
    if rounded >= 10f64.powi(exponent + 1) && decimals > 0 {
        let decimals = decimals - 1;
        return format!("{value:.decimals$}");
    }
    fixed
}

fn scientific(value: f64) -> String {
    let formatted = format!("{value:.3e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => match exponent.parse::<i32>() {
            Ok(exp) => {
                let sign = if exp < 0 { '-' } else { '+' };
                format!("{mantissa}e{sign}{:02}", exp.abs())
            }
            Err(_) => formatted,
        },
        None => formatted,
    }
}
