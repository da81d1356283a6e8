//! Standard-range builder: percentile bands from a reference population.

use std::collections::BTreeMap;

use swingcheck_model::metric::{Metric, MetricRow};
use swingcheck_model::standards::{BandKind, BandThresholds, RangeEntry, StandardRangeTable};

/// Default minimum number of finite samples per key.
pub const DEFAULT_MIN_SAMPLES: usize = 50;

/// Reference-population samples keyed by `(event index, metric)`.
///
/// Continuous samples use `None` as the event index.
#[derive(Debug, Clone, Default)]
pub struct PopulationSamples {
    samples: BTreeMap<(Option<usize>, Metric), Vec<f64>>,
}

impl PopulationSamples {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every computed metric of every row.
    pub fn from_rows(rows: &[MetricRow]) -> Self {
        let mut samples = Self::new();
        samples.extend_rows(rows);
        samples
    }

    pub fn push(&mut self, event_index: Option<usize>, metric: Metric, value: f64) {
        self.samples
            .entry((event_index, metric))
            .or_default()
            .push(value);
    }

    pub fn extend_rows(&mut self, rows: &[MetricRow]) {
        for row in rows {
            for (metric, value) in row.metrics.iter() {
                self.push(row.event_index, metric, value);
            }
        }
    }

    pub fn get(&self, event_index: Option<usize>, metric: Metric) -> &[f64] {
        self.samples
            .get(&(event_index, metric))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Percentile of sorted data with linear interpolation between closest
/// ranks. `pct` is in percent. Empty input gives NaN.
pub fn quantile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = (pct / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Builds a [`StandardRangeTable`] from population samples.
#[derive(Debug, Clone)]
pub struct StandardRangeBuilder {
    /// Bands computed for every key.
    pub bands: Vec<BandKind>,

    /// Keys with fewer finite samples get NaN thresholds.
    pub min_samples: usize,
}

impl Default for StandardRangeBuilder {
    fn default() -> Self {
        Self {
            bands: BandKind::DEFAULTS.to_vec(),
            min_samples: DEFAULT_MIN_SAMPLES,
        }
    }
}

impl StandardRangeBuilder {
    pub fn new(bands: Vec<BandKind>, min_samples: usize) -> Self {
        Self { bands, min_samples }
    }

    /// Add an extra band (e.g. a primary compliance pair) if not present.
    pub fn with_band(mut self, band: BandKind) -> Self {
        if !self.bands.contains(&band) {
            self.bands.push(band);
        }
        self
    }

    pub fn build(&self, population: &PopulationSamples) -> StandardRangeTable {
        let entries: Vec<RangeEntry> = population
            .samples
            .iter()
            .map(|(&(event_index, metric), values)| self.entry(event_index, metric, values))
            .collect();

        let sparse = entries
            .iter()
            .filter(|e| e.sample_count < self.min_samples)
            .count();
        tracing::info!(
            entries = entries.len(),
            sparse,
            min_samples = self.min_samples,
            "Built standard-range table"
        );

        StandardRangeTable {
            min_samples: self.min_samples,
            entries,
        }
    }

    fn entry(&self, event_index: Option<usize>, metric: Metric, values: &[f64]) -> RangeEntry {
        let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        finite.sort_by(f64::total_cmp);

        let enough = finite.len() >= self.min_samples && !finite.is_empty();
        let pick = |pct: f64| if enough { quantile(&finite, pct) } else { f64::NAN };

        let bands = self
            .bands
            .iter()
            .map(|band| {
                let (low_pct, high_pct) = band.percentiles();
                BandThresholds {
                    band: *band,
                    low: pick(low_pct),
                    high: pick(high_pct),
                }
            })
            .collect();

        RangeEntry {
            event_index,
            metric,
            sample_count: finite.len(),
            median: pick(50.0),
            bands,
        }
    }
}
