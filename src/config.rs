//! Calculation settings, loadable from a JSON file.

use crate::{ProminenceError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Thresholds and reporting options for a prominence run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProminenceConfig {
    /// Peaks lower than this are dropped.
    pub min_elevation: Option<f64>,
    /// Peaks with less prominence than this are dropped.
    pub min_prominence: f64,
    /// Keep at most this many peaks after sorting.
    pub limit: Option<usize>,
    /// Prominence reported for the highest peak of each connected area.
    /// When unset, its height above the lowest cell of the grid is used.
    pub infinity_replacement: Option<f64>,
}

impl Default for ProminenceConfig {
    fn default() -> Self {
        ProminenceConfig {
            min_elevation: None,
            min_prominence: 1.0,
            limit: None,
            infinity_replacement: None,
        }
    }
}

impl ProminenceConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: ProminenceConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.min_prominence.is_finite() || self.min_prominence < 0.0 {
            return Err(ProminenceError::InvalidConfig(format!(
                "min_prominence must be a non-negative number, got {}",
                self.min_prominence
            )));
        }
        if let Some(e) = self.min_elevation {
            if e.is_nan() {
                return Err(ProminenceError::InvalidConfig("min_elevation is NaN".into()));
            }
        }
        if let Some(r) = self.infinity_replacement {
            if r.is_nan() {
                return Err(ProminenceError::InvalidConfig(
                    "infinity_replacement is NaN".into(),
                ));
            }
        }
        if self.limit == Some(0) {
            return Err(ProminenceError::InvalidConfig("limit must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ProminenceConfig = serde_json::from_str(r#"{"limit": 50}"#).unwrap();
        assert_eq!(config.limit, Some(50));
        assert_eq!(config.min_prominence, 1.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let negative = ProminenceConfig {
            min_prominence: -1.0,
            ..Default::default()
        };
        assert!(matches!(negative.validate(), Err(ProminenceError::InvalidConfig(_))));

        let zero_limit = ProminenceConfig {
            limit: Some(0),
            ..Default::default()
        };
        assert!(zero_limit.validate().is_err());
    }

    #[test]
    fn test_from_json_file() {
        let path = std::env::temp_dir().join(format!("morse_prominence_config_{}.json", std::process::id()));
        std::fs::write(&path, r#"{"min_prominence": 150.0, "min_elevation": 300.0}"#).unwrap();
        let config = ProminenceConfig::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(config.min_prominence, 150.0);
        assert_eq!(config.min_elevation, Some(300.0));
    }
}
