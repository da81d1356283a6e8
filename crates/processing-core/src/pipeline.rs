//! End-to-end analysis of one swing video.
//!
//! Wires the decoder, metric computer, classifier and aggregator together
//! for the two judgement modes:
//! - **Keyframe:** decode events, measure at each event, label per event.
//! - **Continuous:** measure every tracked frame, score, filter, summarize.

use swingcheck_common::error::{SwingError, SwingResult};
use swingcheck_model::event::{DecodeStrategy, EventSequence};
use swingcheck_model::judgement::{KeyframeReport, VideoJudgement};
use swingcheck_model::landmarks::LandmarkTrack;
use swingcheck_model::metric::View;
use swingcheck_model::probability::ProbabilityMatrix;
use swingcheck_model::standards::{BandKind, StandardRangeTable};

use crate::aggregate::{judge_video, AggregationConfig};
use crate::decoder::{DecodeError, EventDecoder};
use crate::keyframe::KeyframeJudge;
use crate::metrics::MetricComputer;

impl From<DecodeError> for SwingError {
    fn from(err: DecodeError) -> Self {
        SwingError::decode(err.to_string())
    }
}

/// Configuration for [`SwingAnalyzer`].
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub view: View,
    pub strategy: DecodeStrategy,
    /// Events to decode. `None` uses every event column of the matrix.
    pub num_events: Option<usize>,
    pub aggregation: AggregationConfig,
}

impl AnalyzerConfig {
    pub fn for_view(view: View) -> Self {
        Self {
            view,
            strategy: DecodeStrategy::Ordered,
            num_events: None,
            aggregation: AggregationConfig::for_view(view),
        }
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self::for_view(View::Side)
    }
}

/// Result of keyframe analysis: the decoded events plus their judgement.
#[derive(Debug, Clone)]
pub struct KeyframeAnalysis {
    pub events: EventSequence,
    pub report: KeyframeReport,
}

/// The swing analyzer.
pub struct SwingAnalyzer {
    config: AnalyzerConfig,
    decoder: EventDecoder,
    metrics: MetricComputer,
    judge: KeyframeJudge,
}

impl SwingAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        let mut aggregation = config.aggregation.clone();
        aggregation.view = config.view;
        Self {
            decoder: EventDecoder::new(config.strategy),
            metrics: MetricComputer::new(config.view),
            judge: KeyframeJudge::from_config(&aggregation),
            config: AnalyzerConfig {
                aggregation,
                ..config
            },
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(AnalyzerConfig::default())
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Decode events, compute keyframe metrics and judge them against the
    /// per-event ranges of `band`.
    ///
    /// Without an explicit `base_frame`, the first decoded event frame is
    /// the reference.
    pub fn analyze_keyframes(
        &self,
        video_id: &str,
        matrix: &ProbabilityMatrix,
        track: &LandmarkTrack,
        base_frame: Option<usize>,
        table: &StandardRangeTable,
        band: &BandKind,
    ) -> SwingResult<KeyframeAnalysis> {
        let num_events = self.config.num_events.unwrap_or(matrix.num_events());
        let events = self.decoder.decode(matrix, num_events)?;

        let base_frame = match base_frame {
            Some(frame) => frame,
            None => {
                let frame = events
                    .frames
                    .first()
                    .copied()
                    .or_else(|| track.first_frame())
                    .ok_or_else(|| {
                        SwingError::input(format!(
                            "video {video_id}: no events and no tracked frames to use as base"
                        ))
                    })?;
                tracing::info!(
                    video = video_id,
                    base_frame = frame,
                    "Using first event frame as base"
                );
                frame
            }
        };

        let rows = self.metrics.keyframe_rows(track, &events, base_frame);
        let selection = table.select(band);
        let report = self
            .judge
            .judge(video_id, base_frame, Some(&events), &rows, &selection);

        Ok(KeyframeAnalysis { events, report })
    }

    /// Compute continuous metrics for every tracked frame and aggregate them
    /// against the event-independent ranges of `band`.
    ///
    /// Without an explicit `base_frame`, the first tracked frame is the
    /// reference.
    pub fn analyze_continuous(
        &self,
        video_id: &str,
        track: &LandmarkTrack,
        base_frame: Option<usize>,
        table: &StandardRangeTable,
        band: &BandKind,
    ) -> SwingResult<VideoJudgement> {
        let base_frame = match base_frame {
            Some(frame) => frame,
            None => {
                let frame = track.first_frame().ok_or_else(|| {
                    SwingError::input(format!("video {video_id}: no tracked frames"))
                })?;
                tracing::info!(
                    video = video_id,
                    base_frame = frame,
                    "Using first tracked frame as base"
                );
                frame
            }
        };

        let rows = self.metrics.continuous_rows(track, base_frame);
        let selection = table.select(band);
        Ok(judge_video(
            video_id,
            &rows,
            &selection,
            &self.config.aggregation,
        ))
    }
}
