//! Application configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory where reports are written when no output path is given.
    pub output_dir: PathBuf,

    /// Default event decoding settings.
    pub decode: DecodeDefaults,

    /// Default judgement settings.
    pub analysis: AnalysisDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default event decoding parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodeDefaults {
    /// Decoding strategy: "ordered" or "independent".
    pub strategy: String,

    /// Number of real swing events (excluding the "no event" column).
    pub num_events: usize,
}

/// Default judgement parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisDefaults {
    /// Camera view: "side" or "front".
    pub view: String,

    /// Standard-range band used for judging: "loose", "standard", "strict".
    pub band: String,

    /// Minimum NotStandard run length that survives the streak filter.
    pub min_streak: usize,

    /// Minimum population samples before a standard range is emitted.
    pub min_samples: usize,

    /// Landmarks with a visibility score below this are treated as missing.
    #[serde(default)]
    pub min_visibility: f64,

    /// Per-metric overrides keyed by metric name (e.g. "hip_heading"),
    /// merged over the view's default weights.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rules: BTreeMap<String, MetricRuleOverride>,
}

/// Partial judging rule for one metric. Unset fields keep the view default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricRuleOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_is_bad: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_is_bad: Option<bool>,

    /// "between" or "abs_within".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "swingcheck=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            decode: DecodeDefaults::default(),
            analysis: AnalysisDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DecodeDefaults {
    fn default() -> Self {
        Self {
            strategy: "ordered".to_string(),
            num_events: 8,
        }
    }
}

impl Default for AnalysisDefaults {
    fn default() -> Self {
        Self {
            view: "side".to_string(),
            band: "standard".to_string(),
            min_streak: 3,
            min_samples: 50,
            min_visibility: 0.0,
            rules: BTreeMap::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit path, falling back to defaults.
    pub fn load_from(config_path: &Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&config_file_path())
    }

    /// Save config to an explicit path.
    pub fn save_to(&self, config_path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("swingcheck").join("config.json")
}

/// Default report directory.
fn default_output_dir() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local").join("share")
        });
    base.join("swingcheck").join("reports")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_pipeline() {
        let config = AppConfig::default();
        assert_eq!(config.decode.strategy, "ordered");
        assert_eq!(config.decode.num_events, 8);
        assert_eq!(config.analysis.band, "standard");
        assert_eq!(config.analysis.min_streak, 3);
        assert_eq!(config.analysis.min_samples, 50);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("swingcheck_missing_config.json");
        let _ = std::fs::remove_file(&path);
        let config = AppConfig::load_from(&path);
        assert_eq!(config.analysis.view, "side");
    }

    #[test]
    fn unparsable_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("swingcheck_broken_config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let config = AppConfig::load_from(&path);
        assert_eq!(config.logging.level, "info");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn save_and_reload() {
        let dir = std::env::temp_dir().join("swingcheck_config_roundtrip");
        let path = dir.join("config.json");
        let _ = std::fs::remove_dir_all(&dir);

        let mut config = AppConfig::default();
        config.analysis.band = "strict".to_string();
        config.analysis.min_streak = 5;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path);
        assert_eq!(loaded.analysis.band, "strict");
        assert_eq!(loaded.analysis.min_streak, 5);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn rule_overrides_are_optional() {
        let json = r#"{
            "view": "front",
            "band": "standard",
            "min_streak": 3,
            "min_samples": 50,
            "rules": {"hip_face_angle": {"weight": 2.0, "low_is_bad": false}}
        }"#;
        let analysis: AnalysisDefaults = serde_json::from_str(json).unwrap();
        let hip = &analysis.rules["hip_face_angle"];
        assert_eq!(hip.weight, Some(2.0));
        assert_eq!(hip.low_is_bad, Some(false));
        assert_eq!(hip.high_is_bad, None);
        assert_eq!(analysis.min_visibility, 0.0);

        let without: AnalysisDefaults = serde_json::from_str(
            r#"{"view":"side","band":"loose","min_streak":3,"min_samples":50}"#,
        )
        .unwrap();
        assert!(without.rules.is_empty());
    }
}
