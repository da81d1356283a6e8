//! Keyframe judgement of per-event metric rows.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;

use swingcheck_common::config::AppConfig;
use swingcheck_model::event::EventSequence;
use swingcheck_model::files;
use swingcheck_model::judgement::{KeyframeReport, Report, ReportHeader};
use swingcheck_model::metric::MetricRow;
use swingcheck_model::standards::StandardRangeTable;
use swingcheck_processing_core::keyframe::KeyframeJudge;

use super::{aggregation_config, resolve_band, resolve_view, Output};

pub fn run(
    config: &AppConfig,
    rows: PathBuf,
    ranges: PathBuf,
    events: Option<PathBuf>,
    view: Option<String>,
    band: Option<String>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let view = resolve_view(view, config)?;
    let band = resolve_band(band, config)?;
    let table = StandardRangeTable::load(&ranges)
        .with_context(|| format!("Failed to load standard ranges: {}", ranges.display()))?;
    let selection = table.select(&band);

    let events: Option<EventSequence> = events
        .map(|path| {
            files::load_json::<EventSequence>(&path)
                .with_context(|| format!("Failed to load events: {}", path.display()))
        })
        .transpose()?;

    let records: Vec<MetricRow> = files::load_jsonl(&rows)
        .with_context(|| format!("Failed to load metric rows: {}", rows.display()))?;
    let mut by_video: BTreeMap<String, Vec<MetricRow>> = BTreeMap::new();
    for row in records.into_iter().filter(|r| r.event_index.is_some()) {
        by_video.entry(row.video_id.clone()).or_default().push(row);
    }
    if events.is_some() && by_video.len() > 1 {
        anyhow::bail!("--events applies to a single video, but rows cover {}", by_video.len());
    }

    let judge = KeyframeJudge::from_config(&aggregation_config(view, config)?);
    let results: Vec<KeyframeReport> = by_video
        .iter()
        .map(|(video_id, video_rows)| {
            let base_frame = video_rows.first().map_or(0, |r| r.base_frame);
            let report = judge.judge(video_id, base_frame, events.as_ref(), video_rows, &selection);
            eprintln!(
                "  {video_id}: {} events, {} defects, {} missing",
                report.judgements.len(),
                report.defect_count,
                report.missing_count
            );
            report
        })
        .collect();

    let report = Report {
        header: ReportHeader::new(env!("CARGO_PKG_VERSION"), view, band),
        results,
    };
    Output::resolve(output, config, "keyframes.json").write_json(&report)
}
