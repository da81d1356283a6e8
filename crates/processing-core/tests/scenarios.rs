use std::path::PathBuf;

use swingcheck_model::event::DecodeStrategy;
use swingcheck_model::judgement::{Label, Severity, Verdict};
use swingcheck_model::landmarks::{parse_landmarks, LandmarkTrack};
use swingcheck_model::metric::{Metric, MetricMode, MetricRow, MetricValues, View};
use swingcheck_model::probability::ProbabilityMatrix;
use swingcheck_model::standards::{BandKind, RangeSelection, Thresholds};
use swingcheck_processing_core::aggregate::{judge_video, AggregationConfig};
use swingcheck_processing_core::classify::{classify, Direction};
use swingcheck_processing_core::metrics::MetricComputer;
use swingcheck_processing_core::standards::{PopulationSamples, StandardRangeBuilder};
use swingcheck_processing_core::{AnalyzerConfig, EventDecoder, SwingAnalyzer};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join("sample-swing")
        .join(name)
}

fn load_fixture_matrix() -> ProbabilityMatrix {
    let content = std::fs::read_to_string(fixture_path("probabilities.json"))
        .expect("fixture matrix should be readable");
    serde_json::from_str(&content).expect("fixture matrix should parse")
}

fn load_fixture_tracks() -> Vec<LandmarkTrack> {
    let content = std::fs::read_to_string(fixture_path("landmarks.jsonl"))
        .expect("fixture landmarks should be readable");
    let records = parse_landmarks(&content).expect("fixture landmarks should parse");
    LandmarkTrack::group_by_video(records)
}

/// T=10, E=3 with peaks at frames 2, 1 and 5 and some spill into
/// neighbouring frames.
fn scenario_matrix() -> ProbabilityMatrix {
    let peaks = [(2, 0.7), (1, 0.6), (5, 0.6)];
    let rows = (0..10)
        .map(|t: usize| {
            let mut row: Vec<f64> = peaks
                .iter()
                .map(|&(peak, height)| match t.abs_diff(peak) {
                    0 => height,
                    1 => 0.2,
                    _ => 0.01,
                })
                .collect();
            let rest = 1.0 - row.iter().sum::<f64>();
            row.push(rest.max(0.0));
            row
        })
        .collect();
    ProbabilityMatrix::from_rows(rows).unwrap()
}

/// Front-view continuous rows where every metric takes `value` against a
/// `[0, 1]` band.
fn uniform_rows(values: impl IntoIterator<Item = f64>) -> Vec<MetricRow> {
    values
        .into_iter()
        .enumerate()
        .map(|(frame, value)| {
            let mut metrics = MetricValues::new();
            for &metric in View::Front.metrics(MetricMode::Continuous) {
                metrics.set(metric, value);
            }
            MetricRow {
                video_id: "scenario".into(),
                event_index: None,
                frame_index: frame,
                base_frame: 0,
                metrics,
            }
        })
        .collect()
}

fn unit_band_selection() -> RangeSelection {
    RangeSelection::from_thresholds(
        BandKind::Standard,
        View::Front
            .metrics(MetricMode::Continuous)
            .iter()
            .map(|&metric| ((None, metric), Thresholds::new(0.0, 1.0))),
    )
}

fn front_config() -> AggregationConfig {
    AggregationConfig::for_view(View::Front).with_min_streak(3)
}

#[test]
fn ordered_decoding_overrides_an_early_peak() {
    let matrix = scenario_matrix();

    let independent = EventDecoder::new(DecodeStrategy::Independent)
        .decode(&matrix, 3)
        .unwrap();
    assert_eq!(independent.frames, vec![2, 1, 5]);

    let ordered = EventDecoder::new(DecodeStrategy::Ordered)
        .decode(&matrix, 3)
        .unwrap();
    assert!(ordered.is_monotone());
    assert_eq!(ordered.frames, vec![2, 2, 5]);
}

#[test]
fn value_at_low_threshold_is_normal() {
    assert_eq!(classify(12.5, 12.5, 30.0, Direction::default()), Label::Normal);
    assert_eq!(
        classify(12.5 - 0.0001, 12.5, 30.0, Direction::default()),
        Label::SevereInsufficient
    );
}

#[test]
fn sustained_defect_marks_video_not_standard() {
    // 100 frames, frames 40..65 far outside the band.
    let rows = uniform_rows((0..100).map(|t| if (40..65).contains(&t) { 5.0 } else { 0.5 }));
    let judged = judge_video("scenario", &rows, &unit_band_selection(), &front_config());

    assert_eq!(judged.summary.longest_abnormal_run, 25);
    assert!((judged.summary.shares.not_standard - 0.25).abs() < 1e-12);
    assert_eq!(judged.summary.verdict, Some(Verdict::NotStandard));
    assert!(judged.frames[40].effective_abnormal);
    assert!(!judged.frames[39].effective_abnormal);
}

/// 100 frames, far outside the band inside `runs` and well inside elsewhere.
fn runs_of_defects(runs: &[std::ops::Range<usize>]) -> Vec<MetricRow> {
    uniform_rows((0..100).map(|t| {
        if runs.iter().any(|r| r.contains(&t)) {
            5.0
        } else {
            0.5
        }
    }))
}

#[test]
fn moderate_defect_share_is_basic_standard() {
    let rows = runs_of_defects(&[30..39]);
    let judged = judge_video("scenario", &rows, &unit_band_selection(), &front_config());

    assert_eq!(judged.summary.longest_abnormal_run, 9);
    assert!((judged.summary.shares.not_standard - 0.09).abs() < 1e-12);
    assert_eq!(judged.summary.verdict, Some(Verdict::BasicStandard));
}

#[test]
fn long_run_alone_marks_video_not_standard() {
    let rows = runs_of_defects(&[30..42]);
    let judged = judge_video("scenario", &rows, &unit_band_selection(), &front_config());

    assert_eq!(judged.summary.longest_abnormal_run, 12);
    assert!(judged.summary.shares.not_standard <= 0.20);
    assert_eq!(judged.summary.verdict, Some(Verdict::NotStandard));

    // The run-length trigger is inclusive.
    let rows = runs_of_defects(&[30..40]);
    let judged = judge_video("scenario", &rows, &unit_band_selection(), &front_config());
    assert_eq!(judged.summary.longest_abnormal_run, 10);
    assert_eq!(judged.summary.verdict, Some(Verdict::NotStandard));
}

#[test]
fn share_thresholds_are_exclusive() {
    // Exactly 20% bad, in runs too short to trigger on length.
    let rows = runs_of_defects(&[0..5, 10..15, 20..25, 30..35]);
    let judged = judge_video("scenario", &rows, &unit_band_selection(), &front_config());
    assert_eq!(judged.summary.longest_abnormal_run, 5);
    assert_eq!(judged.summary.shares.not_standard, 0.20);
    assert_eq!(judged.summary.verdict, Some(Verdict::BasicStandard));

    // Exactly 5% bad.
    let rows = runs_of_defects(&[50..55]);
    let judged = judge_video("scenario", &rows, &unit_band_selection(), &front_config());
    assert_eq!(judged.summary.shares.not_standard, 0.05);
    assert_eq!(judged.summary.verdict, Some(Verdict::Standard));
}

#[test]
fn isolated_flags_are_filtered_out() {
    let rows = uniform_rows((0..100).map(|t| if t == 10 || t == 50 { 5.0 } else { 0.5 }));
    let judged = judge_video("scenario", &rows, &unit_band_selection(), &front_config());

    assert_eq!(judged.frames[10].verdict, Some(Verdict::NotStandard));
    assert_eq!(
        judged.frames[10].filtered_verdict,
        Some(Verdict::BasicStandard)
    );
    assert_eq!(
        judged.frames[50].filtered_verdict,
        Some(Verdict::BasicStandard)
    );
    assert_eq!(judged.summary.shares.not_standard, 0.0);
    assert_eq!(judged.summary.longest_abnormal_run, 0);
    assert_eq!(judged.summary.verdict, Some(Verdict::Standard));
}

#[test]
fn sparse_population_yields_missing_not_normal() {
    let mut population = PopulationSamples::new();
    for i in 0..10 {
        population.push(None, Metric::LeftHipDx, i as f64 * 0.01);
    }
    let table = StandardRangeBuilder::default().build(&population);
    let selection = table.select(&BandKind::Standard);
    let thresholds = selection.get(None, Metric::LeftHipDx);
    assert!(thresholds.is_missing());
    assert_eq!(thresholds.sample_count, 10);
    assert_eq!(
        classify(0.05, thresholds.low, thresholds.high, Direction::BOTH),
        Label::Missing
    );

    let rows = uniform_rows([0.05, 0.05, 0.05]);
    let judged = judge_video("scenario", &rows, &selection, &front_config());
    assert!(judged.frames.iter().all(|f| f.verdict.is_none()));
    assert_eq!(judged.summary.shares.missing, 1.0);
    let left_hip = judged
        .summary
        .metrics
        .iter()
        .find(|m| m.metric == Metric::LeftHipDx)
        .unwrap();
    assert_eq!(left_hip.missing, 1.0);
    assert_eq!(left_hip.standard, 0.0);
}

#[test]
fn fixture_keyframe_analysis_decodes_ordered_events() {
    let matrix = load_fixture_matrix();
    let tracks = load_fixture_tracks();
    assert_eq!(tracks.len(), 2);
    let track = &tracks[0];
    assert_eq!(track.video_id(), "swing_01");
    assert_eq!(track.len(), 39);

    let independent = EventDecoder::new(DecodeStrategy::Independent)
        .decode(&matrix, matrix.num_events())
        .unwrap();
    assert_eq!(independent.frames, vec![3, 2, 11, 15, 19, 23, 27, 33]);

    // Two videos give at most two samples per key, far below the default minimum.
    let analyzer = SwingAnalyzer::new(AnalyzerConfig::for_view(View::Side));
    let mut population = PopulationSamples::new();
    for track in &tracks {
        let events = EventDecoder::default().decode(&matrix, 8).unwrap();
        let rows = MetricComputer::new(View::Side).keyframe_rows(track, &events, events.frames[0]);
        population.extend_rows(&rows);
    }
    let table = StandardRangeBuilder::default().build(&population);

    let analysis = analyzer
        .analyze_keyframes("swing_01", &matrix, track, None, &table, &BandKind::Standard)
        .unwrap();
    assert_eq!(analysis.events.frames, vec![3, 7, 11, 15, 19, 23, 27, 33]);
    assert_eq!(analysis.report.base_frame, 3);
    assert_eq!(analysis.report.judgements.len(), 8);
    assert_eq!(analysis.report.judgements[0].event_name, "Address");
    assert_eq!(analysis.report.defect_count, 0);
    assert_eq!(analysis.report.missing_count, 8 * 7);

    // With a permissive minimum, every event of the reference video is judged.
    let table = StandardRangeBuilder::new(vec![BandKind::Loose], 1).build(&population);
    let analysis = analyzer
        .analyze_keyframes("swing_01", &matrix, track, None, &table, &BandKind::Loose)
        .unwrap();
    assert!(analysis
        .report
        .judgements
        .iter()
        .all(|j| j.worst_label != Label::Missing));
}

#[test]
fn fixture_continuous_analysis_reports_every_tracked_frame() {
    let tracks = load_fixture_tracks();

    let computer = MetricComputer::new(View::Side);
    let mut population = PopulationSamples::new();
    for track in &tracks {
        let base = track.first_frame().unwrap();
        population.extend_rows(&computer.continuous_rows(track, base));
    }
    let table = StandardRangeBuilder::new(BandKind::DEFAULTS.to_vec(), 20).build(&population);

    let analyzer = SwingAnalyzer::new(AnalyzerConfig::for_view(View::Side));
    let judged = analyzer
        .analyze_continuous("swing_01", &tracks[0], None, &table, &BandKind::Standard)
        .unwrap();

    assert_eq!(judged.summary.total_frames, 39);
    assert!(judged.frames.iter().all(|f| f.frame_index != 21));
    let shares = judged.summary.shares;
    let total = shares.excellent
        + shares.standard
        + shares.basic_standard
        + shares.not_standard
        + shares.missing;
    assert!((total - 1.0).abs() < 1e-9);
    assert_eq!(judged.summary.top_issues.len(), 3);
    assert!(judged.summary.verdict.is_some());

    // Frame 30 lost its wrist; only that metric is missing.
    let frame_30 = judged.frames.iter().find(|f| f.frame_index == 30).unwrap();
    let hand = frame_30
        .metrics
        .iter()
        .find(|m| m.metric == Metric::LeftHandDx)
        .unwrap();
    assert_eq!(hand.severity, Severity::Missing);
    assert_eq!(frame_30.missing_count, 1);
    assert!(frame_30.score.is_some());
}
