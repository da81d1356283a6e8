//! Build percentile standard ranges from population metric rows.

use std::path::PathBuf;

use anyhow::Context;

use swingcheck_common::config::AppConfig;
use swingcheck_model::files;
use swingcheck_model::metric::MetricRow;
use swingcheck_model::standards::BandKind;
use swingcheck_processing_core::standards::{PopulationSamples, StandardRangeBuilder};

use super::Output;

pub fn run(
    config: &AppConfig,
    rows: Vec<PathBuf>,
    min_samples: Option<usize>,
    bands: Vec<String>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut builder = StandardRangeBuilder::new(
        BandKind::DEFAULTS.to_vec(),
        min_samples.unwrap_or(config.analysis.min_samples),
    );
    for raw in &bands {
        let band: BandKind = raw
            .parse()
            .with_context(|| format!("Invalid band '{raw}'"))?;
        builder = builder.with_band(band);
    }

    let mut population = PopulationSamples::new();
    for path in &rows {
        let records: Vec<MetricRow> = files::load_jsonl(path)
            .with_context(|| format!("Failed to load metric rows: {}", path.display()))?;
        tracing::info!(path = %path.display(), rows = records.len(), "Loaded population rows");
        population.extend_rows(&records);
    }

    let table = builder.build(&population);
    Output::resolve(output, config, "standard_ranges.json").write_json(&table)
}
