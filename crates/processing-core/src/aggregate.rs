//! Frame scoring, temporal streak filtering and video-level summaries.
//!
//! # Pipeline
//!
//! 1. **Judge** every metric of every frame against its band (deviation and
//!    severity), then score the frame from the weighted mean deviation.
//! 2. **Verdict** per frame from the abnormal count and the score.
//! 3. **Filter** short runs of `NotStandard` frames down to `BasicStandard`.
//! 4. **Summarize** verdict shares, per-metric frequencies, the longest
//!    effective abnormal run and the top problem metrics.
//!
//! Missing metrics never count toward a score: they are dropped from both
//! sides of the weighted mean and reported as their own category.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use swingcheck_common::config::MetricRuleOverride;
use swingcheck_common::error::{SwingError, SwingResult};

use swingcheck_model::judgement::{
    FrameJudgement, MetricFrequency, MetricJudgement, Severity, TopIssue, Verdict,
    VerdictShares, VideoJudgement, VideoSummary,
};
use swingcheck_model::metric::{Metric, MetricMode, MetricRow, View};
use swingcheck_model::standards::RangeSelection;

use crate::classify::{deviation, Direction, JudgeRule};

/// How one metric is judged and weighted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricRule {
    pub weight: f64,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub rule: JudgeRule,
}

impl Default for MetricRule {
    fn default() -> Self {
        Self {
            weight: 1.0,
            direction: Direction::BOTH,
            rule: JudgeRule::Between,
        }
    }
}

impl MetricRule {
    pub fn weighted(weight: f64) -> Self {
        Self {
            weight,
            ..Self::default()
        }
    }
}

/// Frame verdict cut-offs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerdictThresholds {
    /// Minimum score for `Excellent` (with no abnormal metric).
    pub excellent_score: f64,
    /// Minimum score for `BasicStandard`.
    pub basic_score: f64,
    /// Maximum abnormal metrics allowed for `BasicStandard`.
    pub max_abnormal: usize,
}

impl Default for VerdictThresholds {
    fn default() -> Self {
        Self {
            excellent_score: 90.0,
            basic_score: 75.0,
            max_abnormal: 2,
        }
    }
}

/// Video verdict cut-offs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoThresholds {
    /// `NotStandard` share above which the video is `NotStandard`.
    pub bad_fraction: f64,
    /// Effective run length at which the video is `NotStandard`.
    pub long_run: usize,
    /// `NotStandard` share above which the video is `BasicStandard`.
    pub basic_fraction: f64,
}

impl Default for VideoThresholds {
    fn default() -> Self {
        Self {
            bad_fraction: 0.20,
            long_run: 10,
            basic_fraction: 0.05,
        }
    }
}

/// Configuration for the aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// View whose continuous metric list is judged.
    pub view: View,

    /// Per-metric overrides. Metrics not listed use [`MetricRule::default`].
    #[serde(default)]
    pub rules: BTreeMap<Metric, MetricRule>,

    /// Minimum length of an effective `NotStandard` run.
    pub min_streak: usize,

    pub verdict: VerdictThresholds,

    pub video: VideoThresholds,

    /// Number of top problem metrics reported per video.
    pub top_n: usize,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            view: View::Side,
            rules: BTreeMap::new(),
            min_streak: 3,
            verdict: VerdictThresholds::default(),
            video: VideoThresholds::default(),
            top_n: 3,
        }
    }
}

impl AggregationConfig {
    /// Defaults for a view, including its tuned metric weights.
    pub fn for_view(view: View) -> Self {
        let weights: &[(Metric, f64)] = match view {
            View::Side => &[
                (Metric::ShoulderHeading, 1.2),
                (Metric::HipHeading, 1.2),
                (Metric::LeftHandDx, 0.8),
                (Metric::HeadingSeparation, 1.3),
            ],
            View::Front => &[
                (Metric::ShoulderCenterDx, 1.1),
                (Metric::ShoulderFaceAngle, 1.2),
                (Metric::HipFaceAngle, 1.2),
            ],
        };

        Self {
            view,
            rules: weights
                .iter()
                .map(|&(metric, weight)| (metric, MetricRule::weighted(weight)))
                .collect(),
            ..Self::default()
        }
    }

    pub fn with_min_streak(mut self, min_streak: usize) -> Self {
        self.min_streak = min_streak;
        self
    }

    pub fn with_rule(mut self, metric: Metric, rule: MetricRule) -> Self {
        self.rules.insert(metric, rule);
        self
    }

    /// Merge named overrides over the current rules. Unset fields keep the
    /// existing value.
    pub fn with_overrides<'a>(
        mut self,
        overrides: impl IntoIterator<Item = (&'a String, &'a MetricRuleOverride)>,
    ) -> SwingResult<Self> {
        for (name, patch) in overrides {
            let metric: Metric = name
                .parse()
                .map_err(|e| SwingError::config(format!("rules.{name}: {e}")))?;
            let mut rule = self.rule(metric);
            if let Some(weight) = patch.weight {
                if !weight.is_finite() || weight < 0.0 {
                    return Err(SwingError::config(format!(
                        "rules.{name}: weight must be a finite non-negative number"
                    )));
                }
                rule.weight = weight;
            }
            if let Some(low_is_bad) = patch.low_is_bad {
                rule.direction.low_is_bad = low_is_bad;
            }
            if let Some(high_is_bad) = patch.high_is_bad {
                rule.direction.high_is_bad = high_is_bad;
            }
            if let Some(raw) = &patch.rule {
                rule.rule = raw
                    .parse()
                    .map_err(|e: String| SwingError::config(format!("rules.{name}: {e}")))?;
            }
            tracing::debug!(metric = metric.as_str(), ?rule, "Applied rule override");
            self.rules.insert(metric, rule);
        }
        Ok(self)
    }

    pub fn rule(&self, metric: Metric) -> MetricRule {
        self.rules.get(&metric).copied().unwrap_or_default()
    }

    /// Metrics judged per frame, in reporting order.
    pub fn metrics(&self) -> &'static [Metric] {
        self.view.metrics(MetricMode::Continuous)
    }
}

/// Judge one frame's metrics. The streak-filter fields start unfiltered.
pub fn judge_frame(
    row: &MetricRow,
    selection: &RangeSelection,
    config: &AggregationConfig,
) -> FrameJudgement {
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;

    let metrics: Vec<MetricJudgement> = config
        .metrics()
        .iter()
        .map(|&metric| {
            let rule = config.rule(metric);
            let thresholds = selection.get(row.event_index, metric);
            let value = row.metrics.get(metric);
            let dev = deviation(
                value,
                thresholds.low,
                thresholds.high,
                rule.rule,
                rule.direction,
            );
            if !dev.is_nan() {
                weighted_sum += rule.weight * dev;
                weight_total += rule.weight;
            }
            MetricJudgement {
                metric,
                value,
                low: thresholds.low,
                high: thresholds.high,
                deviation: dev,
                severity: Severity::from_deviation(dev),
            }
        })
        .collect();

    let count = |s: Severity| metrics.iter().filter(|m| m.severity == s).count();
    let abnormal_count = count(Severity::Abnormal);
    let minor_count = count(Severity::Minor);
    let missing_count = count(Severity::Missing);

    let weighted_deviation = (weight_total > 0.0).then(|| weighted_sum / weight_total);
    let score = weighted_deviation.map(|wdev| 100.0 * (1.0 - wdev.clamp(0.0, 1.0)));
    let verdict = frame_verdict(abnormal_count, score, &config.verdict);

    FrameJudgement {
        frame_index: row.frame_index,
        metrics,
        weighted_deviation,
        score,
        abnormal_count,
        minor_count,
        missing_count,
        verdict,
        effective_abnormal: false,
        filtered_verdict: verdict,
    }
}

/// Frame verdict from the abnormal count and the score. `None` when the
/// score is undefined.
pub fn frame_verdict(
    abnormal_count: usize,
    score: Option<f64>,
    thresholds: &VerdictThresholds,
) -> Option<Verdict> {
    let score = score?;
    let verdict = if abnormal_count == 0 && score >= thresholds.excellent_score {
        Verdict::Excellent
    } else if abnormal_count == 0 {
        Verdict::Standard
    } else if abnormal_count <= thresholds.max_abnormal && score >= thresholds.basic_score {
        Verdict::BasicStandard
    } else {
        Verdict::NotStandard
    };
    Some(verdict)
}

/// Result of [`apply_streak_filter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredVerdicts {
    pub verdicts: Vec<Option<Verdict>>,
    /// Position belongs to a `NotStandard` run of at least `min_streak`.
    pub effective: Vec<bool>,
}

/// Downgrade `NotStandard` runs shorter than `min_streak` to `BasicStandard`.
///
/// Runs are maximal stretches of adjacent positions; any other verdict,
/// including a missing one, ends a run. Applying the filter to its own
/// output changes nothing.
pub fn apply_streak_filter(verdicts: &[Option<Verdict>], min_streak: usize) -> FilteredVerdicts {
    let mut filtered = verdicts.to_vec();
    let mut effective = vec![false; verdicts.len()];

    let mut i = 0;
    while i < verdicts.len() {
        if verdicts[i] != Some(Verdict::NotStandard) {
            i += 1;
            continue;
        }
        let start = i;
        while i < verdicts.len() && verdicts[i] == Some(Verdict::NotStandard) {
            i += 1;
        }
        if i - start >= min_streak {
            effective[start..i].fill(true);
        } else {
            filtered[start..i].fill(Some(Verdict::BasicStandard));
        }
    }

    FilteredVerdicts {
        verdicts: filtered,
        effective,
    }
}

/// Roll judged, filtered frames (in frame order) up into a video summary.
pub fn summarize_video(
    video_id: &str,
    frames: &[FrameJudgement],
    config: &AggregationConfig,
) -> VideoSummary {
    let metrics = config.metrics();
    let total = frames.len();

    if total == 0 {
        return VideoSummary {
            video_id: video_id.to_string(),
            total_frames: 0,
            shares: VerdictShares::default(),
            longest_abnormal_run: 0,
            metrics: metrics
                .iter()
                .map(|&metric| MetricFrequency {
                    metric,
                    standard: 0.0,
                    minor: 0.0,
                    abnormal: 0.0,
                    missing: 0.0,
                })
                .collect(),
            top_issues: vec![],
            verdict: None,
        };
    }

    let n = total as f64;
    let share = |v: Option<Verdict>| {
        frames.iter().filter(|f| f.filtered_verdict == v).count() as f64 / n
    };
    let shares = VerdictShares {
        excellent: share(Some(Verdict::Excellent)),
        standard: share(Some(Verdict::Standard)),
        basic_standard: share(Some(Verdict::BasicStandard)),
        not_standard: share(Some(Verdict::NotStandard)),
        missing: share(None),
    };

    let mut longest_abnormal_run = 0;
    let mut current = 0;
    for frame in frames {
        if frame.effective_abnormal {
            current += 1;
            longest_abnormal_run = longest_abnormal_run.max(current);
        } else {
            current = 0;
        }
    }

    let frequencies: Vec<MetricFrequency> = metrics
        .iter()
        .map(|&metric| {
            let mut counts = [0usize; 4];
            for frame in frames {
                let severity = frame
                    .metrics
                    .iter()
                    .find(|m| m.metric == metric)
                    .map_or(Severity::Missing, |m| m.severity);
                let slot = match severity {
                    Severity::Standard => 0,
                    Severity::Minor => 1,
                    Severity::Abnormal => 2,
                    Severity::Missing => 3,
                };
                counts[slot] += 1;
            }
            MetricFrequency {
                metric,
                standard: counts[0] as f64 / n,
                minor: counts[1] as f64 / n,
                abnormal: counts[2] as f64 / n,
                missing: counts[3] as f64 / n,
            }
        })
        .collect();

    // Stable sort keeps view order among equal fractions.
    let mut ranked: Vec<TopIssue> = frequencies
        .iter()
        .map(|f| TopIssue {
            metric: f.metric,
            abnormal_fraction: f.abnormal,
        })
        .collect();
    ranked.sort_by(|a, b| b.abnormal_fraction.total_cmp(&a.abnormal_fraction));
    ranked.truncate(config.top_n);

    let thresholds = &config.video;
    let verdict = if shares.not_standard > thresholds.bad_fraction
        || longest_abnormal_run >= thresholds.long_run
    {
        Verdict::NotStandard
    } else if shares.not_standard > thresholds.basic_fraction {
        Verdict::BasicStandard
    } else {
        Verdict::Standard
    };

    VideoSummary {
        video_id: video_id.to_string(),
        total_frames: total,
        shares,
        longest_abnormal_run,
        metrics: frequencies,
        top_issues: ranked,
        verdict: Some(verdict),
    }
}

/// Score, filter and summarize one video's metric rows.
pub fn judge_video(
    video_id: &str,
    rows: &[MetricRow],
    selection: &RangeSelection,
    config: &AggregationConfig,
) -> VideoJudgement {
    let mut ordered: Vec<&MetricRow> = rows.iter().collect();
    ordered.sort_by_key(|r| r.frame_index);

    let mut frames: Vec<FrameJudgement> = ordered
        .iter()
        .map(|row| judge_frame(row, selection, config))
        .collect();

    let raw: Vec<Option<Verdict>> = frames.iter().map(|f| f.verdict).collect();
    let filtered = apply_streak_filter(&raw, config.min_streak);
    for ((frame, verdict), effective) in frames
        .iter_mut()
        .zip(filtered.verdicts)
        .zip(filtered.effective)
    {
        frame.filtered_verdict = verdict;
        frame.effective_abnormal = effective;
    }

    let summary = summarize_video(video_id, &frames, config);
    tracing::info!(
        video = video_id,
        frames = summary.total_frames,
        not_standard = summary.shares.not_standard,
        longest_run = summary.longest_abnormal_run,
        verdict = ?summary.verdict,
        "Judged video"
    );

    VideoJudgement {
        video_id: video_id.to_string(),
        frames,
        summary,
    }
}

/// Group rows by video id and judge each video, ordered by id.
pub fn judge_population(
    rows: &[MetricRow],
    selection: &RangeSelection,
    config: &AggregationConfig,
) -> Vec<VideoJudgement> {
    let mut by_video: BTreeMap<&str, Vec<MetricRow>> = BTreeMap::new();
    for row in rows {
        by_video
            .entry(row.video_id.as_str())
            .or_default()
            .push(row.clone());
    }
    by_video
        .into_iter()
        .map(|(video_id, rows)| judge_video(video_id, &rows, selection, config))
        .collect()
}
