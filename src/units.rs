use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Display unit for durations. Raw measurements are always nanoseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeUnit {
    #[serde(rename = "ns")]
    Nanoseconds,
    #[serde(rename = "us", alias = "µs")]
    Microseconds,
    #[default]
    #[serde(rename = "ms")]
    Milliseconds,
    #[serde(rename = "s")]
    Seconds,
}

impl TimeUnit {
    /// Nanoseconds per one of this unit.
    pub fn factor(&self) -> f64 {
        match self {
            TimeUnit::Nanoseconds => 1.0,
            TimeUnit::Microseconds => 1e3,
            TimeUnit::Milliseconds => 1e6,
            TimeUnit::Seconds => 1e9,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeUnit::Nanoseconds => "ns",
            TimeUnit::Microseconds => "µs",
            TimeUnit::Milliseconds => "ms",
            TimeUnit::Seconds => "s",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ns" => Ok(TimeUnit::Nanoseconds),
            "us" | "µs" => Ok(TimeUnit::Microseconds),
            "ms" => Ok(TimeUnit::Milliseconds),
            "s" => Ok(TimeUnit::Seconds),
            other => Err(format!("unknown time unit '{other}', expected ns, us, ms or s")),
        }
    }
}

/// A series rescaled into a display unit.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedSeries {
    pub values: Vec<f64>,
    pub unit: TimeUnit,
}

impl NormalizedSeries {
    pub fn label(&self) -> &'static str {
        self.unit.label()
    }

    /// Back to nanoseconds.
    pub fn to_base(&self) -> Vec<f64> {
        let factor = self.unit.factor();
        self.values.iter().map(|v| v * factor).collect()
    }
}

pub fn normalize(base_ns: &[f64], unit: TimeUnit) -> NormalizedSeries {
    let factor = unit.factor();
    NormalizedSeries {
        values: base_ns.iter().map(|v| v / factor).collect(),
        unit,
    }
}
