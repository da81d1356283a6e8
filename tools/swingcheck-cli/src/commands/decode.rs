//! Decode swing event frames from a probability matrix.

use std::path::PathBuf;

use anyhow::Context;

use swingcheck_common::config::AppConfig;
use swingcheck_model::files;
use swingcheck_model::probability::ProbabilityMatrix;
use swingcheck_processing_core::decoder::EventDecoder;

use super::{resolve_strategy, Output};

pub fn run(
    config: &AppConfig,
    probabilities: PathBuf,
    strategy: Option<String>,
    events: Option<usize>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let strategy = resolve_strategy(strategy, config)?;
    let matrix: ProbabilityMatrix = files::load_json(&probabilities)
        .with_context(|| format!("Failed to load probabilities: {}", probabilities.display()))?;

    let num_events = events.unwrap_or_else(|| default_event_count(config, &matrix));
    tracing::info!(
        frames = matrix.num_frames(),
        columns = matrix.num_columns(),
        events = num_events,
        strategy = strategy.as_str(),
        "Decoding events"
    );

    let sequence = EventDecoder::new(strategy)
        .decode(&matrix, num_events)
        .context("Decoding failed")?;

    let drift = matrix.max_row_sum_error();
    if drift > 1e-3 {
        tracing::warn!(max_row_sum_error = drift, "Probability rows do not sum to one");
    }

    for (event, frame, confidence) in sequence.iter() {
        tracing::debug!(event, frame, confidence, "Decoded event");
    }

    Output::resolve(output, config, "events.json").write_json(&sequence)
}

/// The configured event count, capped at what the matrix can hold.
pub fn default_event_count(config: &AppConfig, matrix: &ProbabilityMatrix) -> usize {
    let configured = config.decode.num_events;
    if configured > matrix.num_events() {
        tracing::warn!(
            configured,
            available = matrix.num_events(),
            "Matrix has fewer event columns than configured; decoding all of them"
        );
        matrix.num_events()
    } else {
        configured
    }
}
