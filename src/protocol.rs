//! The experiment space: scale configurations, protocols and their phases.
//!
//! Which protocol defines which phase is a closed table ([`Protocol::defines`]).
//! Everything that walks the experiment grid consults it instead of probing
//! for files.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScaleError {
    #[error("threshold must be at least 1 (system size {system_size})")]
    ZeroThreshold { system_size: u32 },

    #[error("threshold {threshold} exceeds system size {system_size}")]
    ThresholdTooLarge { threshold: u32, system_size: u32 },
}

/// A `threshold`-out-of-`system_size` experiment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawScale", into = "RawScale")]
pub struct ScaleConfig {
    threshold: u32,
    system_size: u32,
}

#[derive(Clone, Copy, Serialize, Deserialize)]
struct RawScale {
    threshold: u32,
    system_size: u32,
}

impl TryFrom<RawScale> for ScaleConfig {
    type Error = ScaleError;

    fn try_from(raw: RawScale) -> Result<Self, Self::Error> {
        ScaleConfig::new(raw.threshold, raw.system_size)
    }
}

impl From<ScaleConfig> for RawScale {
    fn from(scale: ScaleConfig) -> Self {
        RawScale {
            threshold: scale.threshold,
            system_size: scale.system_size,
        }
    }
}

impl ScaleConfig {
    pub fn new(threshold: u32, system_size: u32) -> Result<Self, ScaleError> {
        if threshold == 0 {
            return Err(ScaleError::ZeroThreshold { system_size });
        }
        if threshold > system_size {
            return Err(ScaleError::ThresholdTooLarge {
                threshold,
                system_size,
            });
        }
        Ok(Self {
            threshold,
            system_size,
        })
    }

    /// The Byzantine quorum for `system_size` participants, `ceil((2n + 1) / 3)`.
    pub fn byzantine(system_size: u32) -> Result<Self, ScaleError> {
        // At most `system_size` for any n >= 1, so the narrowing is lossless.
        let threshold = (2 * u64::from(system_size) + 1 + 2) / 3;
        Self::new(threshold as u32, system_size)
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn system_size(&self) -> u32 {
        self.system_size
    }

    /// Directory name used by the results tree, e.g. `21-out-of-30`.
    pub fn dir_name(&self) -> String {
        format!("{}-out-of-{}", self.threshold, self.system_size)
    }
}

/// Short axis label, e.g. `21/30`.
impl fmt::Display for ScaleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.threshold, self.system_size)
    }
}

/// The grid the thesis benchmarks were run on.
pub fn default_scales() -> Vec<ScaleConfig> {
    [
        (3, 4),
        (7, 10),
        (21, 30),
        (34, 50),
        (67, 100),
        (334, 500),
        (667, 1000),
    ]
    .into_iter()
    .map(|(threshold, system_size)| ScaleConfig {
        threshold,
        system_size,
    })
    .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Frost,
    Multisig,
    Roast,
}

impl Protocol {
    pub const ALL: [Protocol; 3] = [Protocol::Frost, Protocol::Multisig, Protocol::Roast];

    /// Directory and file-name key.
    pub fn key(&self) -> &'static str {
        match self {
            Protocol::Frost => "frost",
            Protocol::Multisig => "multisig",
            Protocol::Roast => "roast",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Protocol::Frost => "FROST",
            Protocol::Multisig => "Multisig",
            Protocol::Roast => "ROAST",
        }
    }

    /// Whether `phase` was ever measured for this protocol.
    pub fn defines(&self, phase: Phase) -> bool {
        use Phase::*;
        match self {
            Protocol::Frost => matches!(phase, Initiation | Signing | Aggregation | Verification),
            Protocol::Multisig => matches!(phase, Initiation | Signing | Verification | ViewLatency),
            Protocol::Roast => matches!(phase, ViewLatency),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Protocol::ALL
            .into_iter()
            .find(|p| p.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown protocol '{s}', expected frost, multisig or roast"))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Initiation,
    Signing,
    Aggregation,
    Verification,
    /// Per-view quorum certificate latency of a HotStuff-style run.
    ViewLatency,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Initiation,
        Phase::Signing,
        Phase::Aggregation,
        Phase::Verification,
        Phase::ViewLatency,
    ];

    /// Phases measured by the signature benchmarks, in plotting order.
    pub const SIGNATURE: [Phase; 4] = [
        Phase::Initiation,
        Phase::Signing,
        Phase::Aggregation,
        Phase::Verification,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Phase::Initiation => "initiation",
            Phase::Signing => "signing",
            Phase::Aggregation => "aggregation",
            Phase::Verification => "verify",
            Phase::ViewLatency => "qc_latency",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Phase::Initiation => "Initiation",
            Phase::Signing => "Signing",
            Phase::Aggregation => "Aggregation",
            Phase::Verification => "Verification",
            Phase::ViewLatency => "QC Latency",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Phase::ALL
            .into_iter()
            .find(|p| p.key().eq_ignore_ascii_case(s) || p.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown phase '{s}'"))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExperimentCell {
    pub scale: ScaleConfig,
    pub protocol: Protocol,
    pub phase: Phase,
}

impl ExperimentCell {
    pub fn new(scale: ScaleConfig, protocol: Protocol, phase: Phase) -> Self {
        Self {
            scale,
            protocol,
            phase,
        }
    }

    pub fn is_applicable(&self) -> bool {
        self.protocol.defines(self.phase)
    }

    /// Legend label, e.g. `FROST Signing`.
    pub fn series_label(&self) -> String {
        format!("{} {}", self.protocol.label(), self.phase.label())
    }
}
