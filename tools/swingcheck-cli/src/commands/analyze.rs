//! Decode, measure and judge one video end to end.

use std::path::PathBuf;

use anyhow::Context;
use serde::Serialize;

use swingcheck_common::config::AppConfig;
use swingcheck_model::event::EventSequence;
use swingcheck_model::files;
use swingcheck_model::judgement::{KeyframeReport, Report, ReportHeader, VideoJudgement};
use swingcheck_model::probability::ProbabilityMatrix;
use swingcheck_model::standards::StandardRangeTable;
use swingcheck_processing_core::pipeline::{AnalyzerConfig, SwingAnalyzer};

use super::decode::default_event_count;
use super::{
    aggregation_config, load_tracks, resolve_band, resolve_strategy, resolve_view, select_track,
    Output,
};

pub struct AnalyzeArgs {
    pub probabilities: PathBuf,
    pub landmarks: PathBuf,
    pub ranges: PathBuf,
    pub video: Option<String>,
    pub view: Option<String>,
    pub band: Option<String>,
    pub strategy: Option<String>,
    pub base: Option<usize>,
    pub continuous: bool,
    pub output: Option<PathBuf>,
}

/// Everything produced for one video.
#[derive(Debug, Serialize)]
pub struct SwingAnalysis {
    pub events: EventSequence,
    pub keyframes: KeyframeReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuous: Option<VideoJudgement>,
}

pub fn run(config: &AppConfig, args: AnalyzeArgs) -> anyhow::Result<()> {
    let view = resolve_view(args.view, config)?;
    let band = resolve_band(args.band, config)?;
    let strategy = resolve_strategy(args.strategy, config)?;

    let matrix: ProbabilityMatrix = files::load_json(&args.probabilities).with_context(|| {
        format!("Failed to load probabilities: {}", args.probabilities.display())
    })?;
    let track = select_track(load_tracks(&args.landmarks, config)?, args.video.as_deref())?;
    let table = StandardRangeTable::load(&args.ranges)
        .with_context(|| format!("Failed to load standard ranges: {}", args.ranges.display()))?;

    let analyzer = SwingAnalyzer::new(AnalyzerConfig {
        view,
        strategy,
        num_events: Some(default_event_count(config, &matrix)),
        aggregation: aggregation_config(view, config)?,
    });

    let video_id = track.video_id().to_string();
    tracing::info!(video = %video_id, frames = track.len(), "Analyzing swing");

    let keyframe = analyzer
        .analyze_keyframes(&video_id, &matrix, &track, args.base, &table, &band)
        .with_context(|| format!("Keyframe analysis of '{video_id}' failed"))?;
    eprintln!(
        "  {video_id}: events at {:?}, {} defects, {} missing",
        keyframe.events.frames, keyframe.report.defect_count, keyframe.report.missing_count
    );

    let continuous = if args.continuous {
        let judged = analyzer
            .analyze_continuous(&video_id, &track, args.base, &table, &band)
            .with_context(|| format!("Continuous analysis of '{video_id}' failed"))?;
        eprintln!(
            "  {video_id}: continuous verdict {}",
            judged
                .summary
                .verdict
                .map_or("none".to_string(), |v| v.to_string())
        );
        Some(judged)
    } else {
        None
    };

    let report = Report {
        header: ReportHeader::new(env!("CARGO_PKG_VERSION"), view, band),
        results: SwingAnalysis {
            events: keyframe.events,
            keyframes: keyframe.report,
            continuous,
        },
    };
    Output::resolve(args.output, config, &format!("{video_id}.analysis.json")).write_json(&report)
}
