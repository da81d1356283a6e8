//! Labels, verdicts and judgement records.
//!
//! `missing` is a first-class outcome everywhere: it is never folded into
//! `normal` or into an abnormal category.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::event::EventSequence;
use crate::metric::{Metric, View};
use crate::standards::BandKind;

/// Two-sided discrete judgement of one metric value against its band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Normal,
    /// Above the high threshold (excess).
    SlightExceed,
    /// Below the low threshold (deficiency).
    SevereInsufficient,
    /// Value or thresholds unavailable.
    Missing,
}

impl Label {
    /// Ranking used when picking an event's worst label.
    ///
    /// `Missing` ranks with `Normal`: it is not a defect.
    pub fn severity_rank(self) -> u8 {
        match self {
            Self::SevereInsufficient => 2,
            Self::SlightExceed => 1,
            Self::Normal | Self::Missing => 0,
        }
    }

    pub fn is_defect(self) -> bool {
        matches!(self, Self::SlightExceed | Self::SevereInsufficient)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::SlightExceed => "slight_exceed",
            Self::SevereInsufficient => "severe_insufficient",
            Self::Missing => "missing",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordinal severity used by continuous judgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Inside the band (rank 0).
    Standard,
    /// Up to half a band width outside (rank 1).
    Minor,
    /// More than half a band width outside (rank 2).
    Abnormal,
    Missing,
}

impl Severity {
    /// Bucket a normalized deviation. NaN maps to `Missing`.
    pub fn from_deviation(dev: f64) -> Self {
        if dev.is_nan() {
            Self::Missing
        } else if dev <= 0.0 {
            Self::Standard
        } else if dev <= 0.5 {
            Self::Minor
        } else {
            Self::Abnormal
        }
    }

    /// Numeric rank, `None` for missing.
    pub fn rank(self) -> Option<u8> {
        match self {
            Self::Standard => Some(0),
            Self::Minor => Some(1),
            Self::Abnormal => Some(2),
            Self::Missing => None,
        }
    }
}

/// Frame or video verdict, ordered worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    NotStandard,
    BasicStandard,
    Standard,
    Excellent,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStandard => "not_standard",
            Self::BasicStandard => "basic_standard",
            Self::Standard => "standard",
            Self::Excellent => "excellent",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One metric's continuous judgement at one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricJudgement {
    pub metric: Metric,
    #[serde(with = "crate::serde_nan")]
    pub value: f64,
    #[serde(with = "crate::serde_nan")]
    pub low: f64,
    #[serde(with = "crate::serde_nan")]
    pub high: f64,
    /// Normalized deviation outside the band (NaN = missing).
    #[serde(with = "crate::serde_nan")]
    pub deviation: f64,
    pub severity: Severity,
}

/// Judgement of one frame across all metrics of the view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameJudgement {
    pub frame_index: usize,
    pub metrics: Vec<MetricJudgement>,
    /// Weighted mean deviation over non-missing metrics.
    pub weighted_deviation: Option<f64>,
    /// `100 * (1 - clip(weighted_deviation, 0, 1))`.
    pub score: Option<f64>,
    pub abnormal_count: usize,
    pub minor_count: usize,
    pub missing_count: usize,
    /// Verdict before temporal filtering.
    pub verdict: Option<Verdict>,
    /// Member of a NotStandard run long enough to survive the streak filter.
    pub effective_abnormal: bool,
    /// Verdict after temporal filtering.
    pub filtered_verdict: Option<Verdict>,
}

/// Share of frames per filtered verdict category.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VerdictShares {
    pub excellent: f64,
    pub standard: f64,
    pub basic_standard: f64,
    pub not_standard: f64,
    /// Frames whose verdict is undefined (every metric missing).
    pub missing: f64,
}

/// Per-metric severity frequencies across a video.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricFrequency {
    pub metric: Metric,
    pub standard: f64,
    pub minor: f64,
    pub abnormal: f64,
    pub missing: f64,
}

/// A metric ranked among the most frequently abnormal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TopIssue {
    pub metric: Metric,
    pub abnormal_fraction: f64,
}

/// Video-level roll-up of frame judgements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSummary {
    pub video_id: String,
    pub total_frames: usize,
    pub shares: VerdictShares,
    /// Longest run of frames flagged effective-abnormal.
    pub longest_abnormal_run: usize,
    pub metrics: Vec<MetricFrequency>,
    pub top_issues: Vec<TopIssue>,
    /// `None` when the video has no frames.
    pub verdict: Option<Verdict>,
}

/// Frame stream plus summary for one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoJudgement {
    pub video_id: String,
    pub frames: Vec<FrameJudgement>,
    pub summary: VideoSummary,
}

/// One metric's discrete judgement at one event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventMetricJudgement {
    pub metric: Metric,
    #[serde(with = "crate::serde_nan")]
    pub value: f64,
    #[serde(with = "crate::serde_nan")]
    pub low: f64,
    #[serde(with = "crate::serde_nan")]
    pub high: f64,
    pub label: Label,
}

/// Judgement of all metrics at one swing event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventJudgement {
    pub event_index: usize,
    pub event_name: String,
    pub frame_index: usize,
    pub metrics: Vec<EventMetricJudgement>,
    pub worst_label: Label,
    pub defect_count: usize,
    pub missing_count: usize,
    pub has_defect: bool,
}

/// Keyframe-mode judgement of one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyframeReport {
    pub video_id: String,
    pub base_frame: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<EventSequence>,
    pub judgements: Vec<EventJudgement>,
    /// Number of non-normal, non-missing metric/event pairs.
    pub defect_count: usize,
    /// Number of metric/event pairs that could not be judged.
    pub missing_count: usize,
}

/// Provenance attached to reports written by the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportHeader {
    pub tool_version: String,
    /// Generation time (RFC 3339).
    pub generated_at: String,
    pub view: View,
    pub band: BandKind,
}

impl ReportHeader {
    pub fn new(tool_version: impl Into<String>, view: View, band: BandKind) -> Self {
        Self {
            tool_version: tool_version.into(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            view,
            band,
        }
    }
}

/// A report body with its provenance header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report<T> {
    pub header: ReportHeader,
    pub results: T,
}
