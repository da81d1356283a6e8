//! Compute keyframe or continuous metric rows from landmark tracks.

use std::path::PathBuf;

use anyhow::Context;

use swingcheck_common::config::AppConfig;
use swingcheck_model::event::EventSequence;
use swingcheck_model::files;
use swingcheck_model::metric::MetricRow;
use swingcheck_processing_core::metrics::MetricComputer;

use super::{load_tracks, resolve_view, select_track, Output};

pub fn run(
    config: &AppConfig,
    landmarks: PathBuf,
    events: Option<PathBuf>,
    video: Option<String>,
    view: Option<String>,
    base: Option<usize>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let view = resolve_view(view, config)?;
    let computer = MetricComputer::new(view);
    let tracks = load_tracks(&landmarks, config)?;

    let rows: Vec<MetricRow> = match events {
        Some(events_path) => {
            let events: EventSequence = files::load_json(&events_path)
                .with_context(|| format!("Failed to load events: {}", events_path.display()))?;
            let track = select_track(tracks, video.as_deref())?;
            let base_frame = base
                .or_else(|| events.frames.first().copied())
                .or_else(|| track.first_frame())
                .ok_or_else(|| anyhow::anyhow!("No base frame for video '{}'", track.video_id()))?;
            tracing::info!(
                video = track.video_id(),
                events = events.len(),
                base_frame,
                "Computing keyframe metrics"
            );
            computer.keyframe_rows(&track, &events, base_frame)
        }
        None => {
            let mut rows = Vec::new();
            for track in tracks
                .iter()
                .filter(|t| video.as_deref().map_or(true, |id| t.video_id() == id))
            {
                let Some(base_frame) = base.or_else(|| track.first_frame()) else {
                    continue;
                };
                tracing::info!(
                    video = track.video_id(),
                    frames = track.len(),
                    base_frame,
                    "Computing continuous metrics"
                );
                rows.extend(computer.continuous_rows(track, base_frame));
            }
            rows
        }
    };

    Output::resolve(output, config, "metrics.jsonl").write_jsonl(&rows)
}
