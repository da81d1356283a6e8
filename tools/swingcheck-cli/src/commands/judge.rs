//! Continuous judgement over one or many videos.
//!
//! Each video is scored on its own blocking task; the range selection is
//! shared read-only. Results come back ordered by video id.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::task::JoinHandle;

use swingcheck_common::config::AppConfig;
use swingcheck_model::files;
use swingcheck_model::judgement::{Report, ReportHeader, VideoJudgement};
use swingcheck_model::metric::MetricRow;
use swingcheck_model::standards::StandardRangeTable;
use swingcheck_processing_core::aggregate::judge_video;
use swingcheck_processing_core::metrics::MetricComputer;

use super::{aggregation_config, load_tracks, resolve_band, resolve_view, Output};

#[allow(clippy::too_many_arguments)]
pub async fn run(
    config: &AppConfig,
    input: PathBuf,
    ranges: PathBuf,
    rows: bool,
    view: Option<String>,
    band: Option<String>,
    min_streak: Option<usize>,
    base: Option<usize>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let view = resolve_view(view, config)?;
    let band = resolve_band(band, config)?;
    let table = StandardRangeTable::load(&ranges)
        .with_context(|| format!("Failed to load standard ranges: {}", ranges.display()))?;

    let selection = Arc::new(table.select(&band));
    let mut aggregation = aggregation_config(view, config)?;
    if let Some(min_streak) = min_streak {
        aggregation = aggregation.with_min_streak(min_streak);
    }
    let aggregation = Arc::new(aggregation);

    let mut tasks: Vec<(String, JoinHandle<VideoJudgement>)> = Vec::new();

    if rows {
        let records: Vec<MetricRow> = files::load_jsonl(&input)
            .with_context(|| format!("Failed to load metric rows: {}", input.display()))?;
        let mut by_video: BTreeMap<String, Vec<MetricRow>> = BTreeMap::new();
        for row in records {
            by_video.entry(row.video_id.clone()).or_default().push(row);
        }
        for (video_id, video_rows) in by_video {
            let selection = Arc::clone(&selection);
            let aggregation = Arc::clone(&aggregation);
            let id = video_id.clone();
            let handle = tokio::task::spawn_blocking(move || {
                judge_video(&id, &video_rows, &selection, &aggregation)
            });
            tasks.push((video_id, handle));
        }
    } else {
        for track in load_tracks(&input, config)? {
            let Some(base_frame) = base.or_else(|| track.first_frame()) else {
                tracing::warn!(video = track.video_id(), "Skipping video without frames");
                continue;
            };
            let selection = Arc::clone(&selection);
            let aggregation = Arc::clone(&aggregation);
            let video_id = track.video_id().to_string();
            let handle = tokio::task::spawn_blocking(move || {
                let rows =
                    MetricComputer::new(aggregation.view).continuous_rows(&track, base_frame);
                judge_video(track.video_id(), &rows, &selection, &aggregation)
            });
            tasks.push((video_id, handle));
        }
    }

    let mut results = Vec::with_capacity(tasks.len());
    for (video_id, handle) in tasks {
        let judged = handle
            .await
            .with_context(|| format!("Judgement task for video '{video_id}' failed"))?;
        eprintln!(
            "  {}: {} frames, verdict {}",
            judged.video_id,
            judged.summary.total_frames,
            judged
                .summary
                .verdict
                .map_or("none".to_string(), |v| v.to_string())
        );
        results.push(judged);
    }

    let report = Report {
        header: ReportHeader::new(env!("CARGO_PKG_VERSION"), view, band),
        results,
    };
    Output::resolve(output, config, "judgement.json").write_json(&report)
}
