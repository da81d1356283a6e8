//! Keyframe judgement: discrete labels at each decoded swing event.

use std::collections::BTreeMap;

use swingcheck_model::event::{event_name, EventSequence, SwingEventSet};
use swingcheck_model::judgement::{EventJudgement, EventMetricJudgement, KeyframeReport, Label};
use swingcheck_model::metric::{Metric, MetricMode, MetricRow, View};
use swingcheck_model::standards::RangeSelection;

use crate::aggregate::{AggregationConfig, MetricRule};
use crate::classify::{classify, Direction};

/// Judges keyframe metric rows against per-event thresholds.
///
/// Only the direction of each [`MetricRule`] matters here; weights and
/// deviation rules belong to continuous scoring.
#[derive(Debug, Clone)]
pub struct KeyframeJudge {
    view: View,
    rules: BTreeMap<Metric, MetricRule>,
}

impl KeyframeJudge {
    pub fn new(view: View) -> Self {
        Self {
            view,
            rules: BTreeMap::new(),
        }
    }

    /// Judge with the view and per-metric rules of an aggregation config.
    pub fn from_config(config: &AggregationConfig) -> Self {
        Self {
            view: config.view,
            rules: config.rules.clone(),
        }
    }

    /// Judge only one side of the band for `metric`.
    pub fn with_direction(mut self, metric: Metric, direction: Direction) -> Self {
        self.rules.entry(metric).or_default().direction = direction;
        self
    }

    fn direction(&self, metric: Metric) -> Direction {
        self.rules
            .get(&metric)
            .map_or(Direction::BOTH, |rule| rule.direction)
    }

    /// Judge one event's row.
    pub fn judge_event(
        &self,
        row: &MetricRow,
        event_index: usize,
        event_set: Option<SwingEventSet>,
        selection: &RangeSelection,
    ) -> EventJudgement {
        let metrics: Vec<EventMetricJudgement> = self
            .view
            .metrics(MetricMode::Keyframe)
            .iter()
            .map(|&metric| {
                let thresholds = selection.get(Some(event_index), metric);
                let value = row.metrics.get(metric);
                EventMetricJudgement {
                    metric,
                    value,
                    low: thresholds.low,
                    high: thresholds.high,
                    label: classify(value, thresholds.low, thresholds.high, self.direction(metric)),
                }
            })
            .collect();

        let worst_label = worst_label(metrics.iter().map(|m| m.label));
        let defect_count = metrics.iter().filter(|m| m.label.is_defect()).count();
        let missing_count = metrics
            .iter()
            .filter(|m| m.label == Label::Missing)
            .count();

        EventJudgement {
            event_index,
            event_name: event_name(event_set, event_index),
            frame_index: row.frame_index,
            metrics,
            worst_label,
            defect_count,
            missing_count,
            has_defect: defect_count > 0,
        }
    }

    /// Judge every keyframe row of one video.
    ///
    /// Rows without an event index are skipped.
    pub fn judge(
        &self,
        video_id: &str,
        base_frame: usize,
        events: Option<&EventSequence>,
        rows: &[MetricRow],
        selection: &RangeSelection,
    ) -> KeyframeReport {
        let event_count = events.map_or_else(
            || rows.iter().filter_map(|r| r.event_index).max().map_or(0, |m| m + 1),
            EventSequence::len,
        );
        let event_set = SwingEventSet::for_count(event_count);

        let mut keyed: Vec<(usize, &MetricRow)> = rows
            .iter()
            .filter_map(|r| r.event_index.map(|e| (e, r)))
            .collect();
        keyed.sort_by_key(|(e, _)| *e);

        let judgements: Vec<EventJudgement> = keyed
            .into_iter()
            .map(|(event_index, row)| self.judge_event(row, event_index, event_set, selection))
            .collect();

        let defect_count: usize = judgements.iter().map(|j| j.defect_count).sum();
        let missing_count: usize = judgements.iter().map(|j| j.missing_count).sum();

        tracing::info!(
            video = video_id,
            events = judgements.len(),
            defects = defect_count,
            missing = missing_count,
            "Judged keyframes"
        );

        KeyframeReport {
            video_id: video_id.to_string(),
            base_frame,
            events: events.cloned(),
            judgements,
            defect_count,
            missing_count,
        }
    }
}

/// Worst label by severity rank. Missing labels are ignored unless every
/// label is missing; an empty input is `Missing`.
pub fn worst_label(labels: impl IntoIterator<Item = Label>) -> Label {
    labels
        .into_iter()
        .filter(|l| *l != Label::Missing)
        .max_by_key(|l| l.severity_rank())
        .unwrap_or(Label::Missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use swingcheck_model::event::DecodeStrategy;
    use swingcheck_model::metric::MetricValues;
    use swingcheck_model::standards::{BandKind, Thresholds};

    fn selection() -> RangeSelection {
        let mut entries = Vec::new();
        for event in 0..2 {
            for &metric in View::Front.metrics(MetricMode::Keyframe) {
                entries.push(((Some(event), metric), Thresholds::new(-1.0, 1.0)));
            }
        }
        RangeSelection::from_thresholds(BandKind::Standard, entries)
    }

    fn row(event: usize, frame: usize, values: MetricValues) -> MetricRow {
        MetricRow {
            video_id: "v".into(),
            event_index: Some(event),
            frame_index: frame,
            base_frame: 10,
            metrics: values,
        }
    }

    #[test]
    fn worst_label_ranking() {
        use Label::*;
        assert_eq!(worst_label([Normal, SlightExceed, Missing]), SlightExceed);
        assert_eq!(
            worst_label([SlightExceed, SevereInsufficient, Normal]),
            SevereInsufficient
        );
        assert_eq!(worst_label([Missing, Normal]), Normal);
        assert_eq!(worst_label([Missing, Missing]), Missing);
        assert_eq!(worst_label(Vec::new()), Missing);
    }

    #[test]
    fn judges_each_event_and_counts_defects() {
        let judge = KeyframeJudge::new(View::Front);
        let address = MetricValues::new()
            .with(Metric::HipCenterDx, 0.0)
            .with(Metric::TrunkMidDy, 0.0)
            .with(Metric::ShoulderCenterDx, 0.0)
            .with(Metric::ShoulderRoll, 0.5)
            .with(Metric::HipRoll, f64::NAN);
        let top = MetricValues::new()
            .with(Metric::HipCenterDx, 2.0)
            .with(Metric::TrunkMidDy, -3.0)
            .with(Metric::ShoulderCenterDx, 0.0)
            .with(Metric::ShoulderRoll, 0.0)
            .with(Metric::HipRoll, 0.0);

        let events = EventSequence {
            strategy: DecodeStrategy::Ordered,
            frames: vec![10, 40],
            confidence: vec![0.9, 0.8],
        };
        let report = judge.judge(
            "v",
            10,
            Some(&events),
            &[row(1, 40, top), row(0, 10, address)],
            &selection(),
        );

        assert_eq!(report.judgements.len(), 2);
        let first = &report.judgements[0];
        assert_eq!(first.event_index, 0);
        assert_eq!(first.event_name, "event_0");
        assert_eq!(first.worst_label, Label::Normal);
        assert_eq!(first.missing_count, 1);
        assert!(!first.has_defect);

        let second = &report.judgements[1];
        assert_eq!(second.worst_label, Label::SevereInsufficient);
        assert_eq!(second.defect_count, 2);
        assert!(second.has_defect);

        assert_eq!(report.defect_count, 2);
        assert_eq!(report.missing_count, 1);
    }

    #[test]
    fn direction_override_mutes_a_side() {
        let judge = KeyframeJudge::new(View::Front)
            .with_direction(Metric::TrunkMidDy, Direction::HIGH_ONLY);
        let values = MetricValues::new().with(Metric::TrunkMidDy, -3.0);
        let judged = judge.judge_event(&row(0, 10, values), 0, None, &selection());
        let trunk = judged
            .metrics
            .iter()
            .find(|m| m.metric == Metric::TrunkMidDy)
            .unwrap();
        assert_eq!(trunk.label, Label::Normal);
        // Metrics absent from the row are missing, not normal.
        assert_eq!(judged.missing_count, 4);
    }

    #[test]
    fn config_rules_carry_directions() {
        let config = AggregationConfig::for_view(View::Front).with_rule(
            Metric::TrunkMidDy,
            MetricRule {
                direction: Direction::HIGH_ONLY,
                ..MetricRule::default()
            },
        );
        let judge = KeyframeJudge::from_config(&config);
        let values = MetricValues::new()
            .with(Metric::TrunkMidDy, -3.0)
            .with(Metric::HipCenterDx, -3.0);
        let judged = judge.judge_event(&row(0, 10, values), 0, None, &selection());
        let label = |metric| {
            judged
                .metrics
                .iter()
                .find(|m| m.metric == metric)
                .map(|m| m.label)
                .unwrap()
        };
        assert_eq!(label(Metric::TrunkMidDy), Label::Normal);
        assert_eq!(label(Metric::HipCenterDx), Label::SevereInsufficient);
    }

    #[test]
    fn direction_override_keeps_rule_weight() {
        let config = AggregationConfig::for_view(View::Front);
        let judge = KeyframeJudge::from_config(&config)
            .with_direction(Metric::ShoulderCenterDx, Direction::LOW_ONLY);
        let rule = judge.rules[&Metric::ShoulderCenterDx];
        assert_eq!(rule.weight, 1.1);
        assert_eq!(rule.direction, Direction::LOW_ONLY);
    }

    #[test]
    fn eight_events_get_names() {
        let judge = KeyframeJudge::new(View::Side);
        let rows: Vec<MetricRow> = (0..8).map(|e| row(e, e * 10, MetricValues::new())).collect();
        let report = judge.judge("v", 0, None, &rows, &selection());
        assert_eq!(report.judgements[0].event_name, "Address");
        assert_eq!(report.judgements[7].event_name, "Finish");
        assert!(report.judgements.iter().all(|j| j.worst_label == Label::Missing));
        assert_eq!(report.defect_count, 0);
        assert_eq!(report.missing_count, 8 * 7);
    }
}
