//! Standard-range tables: per-metric `[low, high]` bands derived from a
//! reference population.
//!
//! A table is built offline (see the processing crate's range builder),
//! stored as JSON, and narrowed to a single band with
//! [`StandardRangeTable::select`] before judging.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::metric::Metric;

/// Which percentile pair defines a band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BandKind {
    /// P5 / P95.
    Loose,
    /// P10 / P90.
    #[default]
    Standard,
    /// P15 / P85.
    Strict,
    /// Any other percentile pair, in percent.
    Custom { low_pct: f64, high_pct: f64 },
}

impl BandKind {
    /// The bands built when none are requested explicitly.
    pub const DEFAULTS: [BandKind; 3] = [BandKind::Loose, BandKind::Standard, BandKind::Strict];

    /// `(low, high)` percentiles in percent.
    pub fn percentiles(&self) -> (f64, f64) {
        match *self {
            Self::Loose => (5.0, 95.0),
            Self::Standard => (10.0, 90.0),
            Self::Strict => (15.0, 85.0),
            Self::Custom { low_pct, high_pct } => (low_pct, high_pct),
        }
    }
}

impl fmt::Display for BandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loose => f.write_str("loose"),
            Self::Standard => f.write_str("standard"),
            Self::Strict => f.write_str("strict"),
            Self::Custom { low_pct, high_pct } => write!(f, "p{low_pct}-p{high_pct}"),
        }
    }
}

impl FromStr for BandKind {
    type Err = ModelError;

    /// Accepts `loose`, `standard`, `strict`, or a custom pair written
    /// `p20-p80` / `20-80`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "loose" => return Ok(Self::Loose),
            "standard" => return Ok(Self::Standard),
            "strict" => return Ok(Self::Strict),
            _ => {}
        }

        let parse_pct = |part: &str| -> Option<f64> {
            part.trim().trim_start_matches('p').parse::<f64>().ok()
        };
        let (low, high) = s
            .split_once('-')
            .and_then(|(l, h)| Some((parse_pct(l)?, parse_pct(h)?)))
            .ok_or_else(|| {
                ModelError::invalid(format!(
                    "unknown band '{s}' (expected loose|standard|strict|pLOW-pHIGH)"
                ))
            })?;

        if !(0.0..=100.0).contains(&low) || !(0.0..=100.0).contains(&high) || low >= high {
            return Err(ModelError::invalid(format!(
                "band percentiles must satisfy 0 <= low < high <= 100, got {low}-{high}"
            )));
        }

        Ok(Self::Custom {
            low_pct: low,
            high_pct: high,
        })
    }
}

/// Thresholds of one band for one table entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandThresholds {
    pub band: BandKind,
    #[serde(with = "crate::serde_nan")]
    pub low: f64,
    #[serde(with = "crate::serde_nan")]
    pub high: f64,
}

/// Reference statistics for one `(event, metric)` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeEntry {
    /// Event index for keyframe ranges, `None` for continuous ranges.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_index: Option<usize>,
    pub metric: Metric,
    /// Number of finite samples the entry was computed from.
    pub sample_count: usize,
    #[serde(with = "crate::serde_nan")]
    pub median: f64,
    pub bands: Vec<BandThresholds>,
}

impl RangeEntry {
    pub fn band(&self, band: &BandKind) -> Option<&BandThresholds> {
        self.bands.iter().find(|b| b.band == *band)
    }
}

/// Population-derived reference ranges.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StandardRangeTable {
    /// Minimum finite sample count required for non-NaN thresholds.
    pub min_samples: usize,
    pub entries: Vec<RangeEntry>,
}

impl StandardRangeTable {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        crate::files::load_json(path)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        crate::files::save_json(path, self)
    }

    pub fn entry(&self, event_index: Option<usize>, metric: Metric) -> Option<&RangeEntry> {
        self.entries
            .iter()
            .find(|e| e.event_index == event_index && e.metric == metric)
    }

    /// Narrow the table to one band.
    ///
    /// Entries that lack the band are carried with NaN thresholds so that
    /// judging against them yields `missing` rather than silently passing.
    pub fn select(&self, band: &BandKind) -> RangeSelection {
        let thresholds = self
            .entries
            .iter()
            .map(|entry| {
                let (low, high) = entry
                    .band(band)
                    .map(|b| (b.low, b.high))
                    .unwrap_or((f64::NAN, f64::NAN));
                (
                    (entry.event_index, entry.metric),
                    Thresholds {
                        low,
                        high,
                        sample_count: entry.sample_count,
                    },
                )
            })
            .collect();

        RangeSelection {
            band: *band,
            thresholds,
        }
    }
}

/// `[low, high]` for one key. NaN bounds mean "no usable reference".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(with = "crate::serde_nan")]
    pub low: f64,
    #[serde(with = "crate::serde_nan")]
    pub high: f64,
    pub sample_count: usize,
}

impl Thresholds {
    pub const MISSING: Thresholds = Thresholds {
        low: f64::NAN,
        high: f64::NAN,
        sample_count: 0,
    };

    pub fn new(low: f64, high: f64) -> Self {
        Self {
            low,
            high,
            sample_count: 0,
        }
    }

    pub fn is_missing(&self) -> bool {
        self.low.is_nan() || self.high.is_nan()
    }
}

/// A table narrowed to one band, keyed for constant-time lookup.
///
/// Read-only once built; share it across analyses behind an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeSelection {
    band: BandKind,
    thresholds: HashMap<(Option<usize>, Metric), Thresholds>,
}

impl RangeSelection {
    /// Build a selection directly from thresholds (tests, hand-tuned ranges).
    pub fn from_thresholds(
        band: BandKind,
        thresholds: impl IntoIterator<Item = ((Option<usize>, Metric), Thresholds)>,
    ) -> Self {
        Self {
            band,
            thresholds: thresholds.into_iter().collect(),
        }
    }

    pub fn band(&self) -> BandKind {
        self.band
    }

    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    /// Thresholds for a key, [`Thresholds::MISSING`] when the key is absent.
    pub fn get(&self, event_index: Option<usize>, metric: Metric) -> Thresholds {
        self.thresholds
            .get(&(event_index, metric))
            .copied()
            .unwrap_or(Thresholds::MISSING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> StandardRangeTable {
        StandardRangeTable {
            min_samples: 50,
            entries: vec![
                RangeEntry {
                    event_index: Some(3),
                    metric: Metric::ShoulderRotation,
                    sample_count: 120,
                    median: 85.0,
                    bands: vec![
                        BandThresholds {
                            band: BandKind::Loose,
                            low: 60.0,
                            high: 110.0,
                        },
                        BandThresholds {
                            band: BandKind::Standard,
                            low: 70.0,
                            high: 100.0,
                        },
                    ],
                },
                RangeEntry {
                    event_index: None,
                    metric: Metric::HipHeading,
                    sample_count: 12,
                    median: f64::NAN,
                    bands: vec![BandThresholds {
                        band: BandKind::Standard,
                        low: f64::NAN,
                        high: f64::NAN,
                    }],
                },
            ],
        }
    }

    #[test]
    fn band_parsing() {
        assert_eq!("Strict".parse::<BandKind>().unwrap(), BandKind::Strict);
        assert_eq!(
            "p20-p80".parse::<BandKind>().unwrap(),
            BandKind::Custom {
                low_pct: 20.0,
                high_pct: 80.0
            }
        );
        assert_eq!(
            "2.5-97.5".parse::<BandKind>().unwrap().percentiles(),
            (2.5, 97.5)
        );
        assert!("p80-p20".parse::<BandKind>().is_err());
        assert!("wide".parse::<BandKind>().is_err());
    }

    #[test]
    fn select_picks_band_and_defaults_to_missing() {
        let sel = table().select(&BandKind::Standard);
        let t = sel.get(Some(3), Metric::ShoulderRotation);
        assert_eq!((t.low, t.high, t.sample_count), (70.0, 100.0, 120));

        assert!(sel.get(None, Metric::HipHeading).is_missing());
        assert!(sel.get(Some(4), Metric::ShoulderRotation).is_missing());

        let strict = table().select(&BandKind::Strict);
        assert!(strict.get(Some(3), Metric::ShoulderRotation).is_missing());
        assert_eq!(strict.get(Some(3), Metric::ShoulderRotation).sample_count, 120);
    }

    #[test]
    fn table_json_writes_nan_as_null() {
        let json = serde_json::to_string(&table()).unwrap();
        assert!(json.contains("\"median\":null"));
        assert!(json.contains("\"band\":\"loose\""));

        let back: StandardRangeTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back.entries.len(), 2);
        assert!(back.entries[1].median.is_nan());
        assert_eq!(back.entries[0].event_index, Some(3));
        assert_eq!(back.entries[1].event_index, None);
    }

    #[test]
    fn custom_band_serializes_with_percentiles() {
        let band = BandKind::Custom {
            low_pct: 20.0,
            high_pct: 80.0,
        };
        let json = serde_json::to_string(&band).unwrap();
        assert_eq!(json, r#"{"custom":{"low_pct":20.0,"high_pct":80.0}}"#);
        assert_eq!(band.to_string(), "p20-p80");
    }
}
