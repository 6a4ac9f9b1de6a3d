//! Analysis configuration, loaded from an optional TOML file.
//!
//! ```toml
//! root = "benchmark-results"
//! unit = "ms"
//! output_dir = "plots"
//! scales = [
//!     { threshold = 3, system_size = 4 },
//!     { threshold = 21, system_size = 30 },
//! ]
//! ```

use crate::layout::CriterionLayout;
use crate::protocol::{ScaleConfig, default_scales};
use crate::units::TimeUnit;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("scale {0} declared more than once")]
    DuplicateScale(ScaleConfig),

    #[error("no scale configurations declared")]
    NoScales,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Directory holding one `<t>-out-of-<n>` tree per scale.
    pub root: PathBuf,
    pub unit: TimeUnit,
    pub output_dir: PathBuf,
    pub scales: Vec<ScaleConfig>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("benchmark-results"),
            unit: TimeUnit::Milliseconds,
            output_dir: PathBuf::from("plots"),
            scales: default_scales(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scales.is_empty() {
            return Err(ConfigError::NoScales);
        }
        let mut seen = BTreeSet::new();
        for scale in &self.scales {
            if !seen.insert(scale) {
                return Err(ConfigError::DuplicateScale(*scale));
            }
        }
        Ok(())
    }

    pub fn layout(&self) -> CriterionLayout {
        CriterionLayout::new(&self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_thesis_grid() {
        let config = AnalysisConfig::default();
        assert_eq!(config.scales.len(), 7);
        assert_eq!(config.unit, TimeUnit::Milliseconds);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AnalysisConfig = toml::from_str(
            r#"
            root = "/srv/bench"
            unit = "us"
            scales = [{ threshold = 3, system_size = 4 }]
            "#,
        )
        .unwrap();
        assert_eq!(config.root, PathBuf::from("/srv/bench"));
        assert_eq!(config.unit, TimeUnit::Microseconds);
        assert_eq!(config.output_dir, PathBuf::from("plots"));
        assert_eq!(config.scales, vec![ScaleConfig::new(3, 4).unwrap()]);
    }

    #[test]
    fn test_invalid_scale_rejected_on_load() {
        let parsed = toml::from_str::<AnalysisConfig>(
            "scales = [{ threshold = 11, system_size = 10 }]",
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn test_unknown_keys_and_units_rejected() {
        assert!(toml::from_str::<AnalysisConfig>("rot = \"x\"").is_err());
        assert!(toml::from_str::<AnalysisConfig>("unit = \"minutes\"").is_err());
    }

    #[test]
    fn test_empty_scales_rejected() {
        let config: AnalysisConfig = toml::from_str("scales = []").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::NoScales)));
    }

    #[test]
    fn test_duplicate_scales_rejected() {
        let config: AnalysisConfig = toml::from_str(
            "scales = [{ threshold = 3, system_size = 4 }, { threshold = 3, system_size = 4 }]",
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateScale(_))
        ));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = AnalysisConfig::from_path(Path::new("/nonexistent/sigbench.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/sigbench.toml"));
    }
}
