//! The fixed biomechanical metric vocabulary.
//!
//! Metrics are addressed through the [`Metric`] enum so that the set of
//! measurements is known at compile time. String names appear only when
//! rows are written to or read from disk.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Every metric the analysis can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Signed XZ-plane rotation of the shoulder line relative to the base frame (deg).
    ShoulderRotation,
    /// Signed XZ-plane rotation of the hip line relative to the base frame (deg).
    HipRotation,
    /// Tilt of the trunk axis out of the YZ plane (deg, 0 = in plane).
    BodyTilt,
    /// X displacement of the hip midpoint from the base frame.
    HipCenterDx,
    /// X displacement of the shoulder midpoint from the base frame.
    ShoulderCenterDx,
    /// X displacement of the left wrist from the base frame.
    LeftHandDx,
    /// Shoulder rotation minus hip rotation (deg).
    EnergyIndex,
    /// Y displacement of the trunk midpoint from the base frame.
    TrunkMidDy,
    /// Face-on roll of the shoulder line against horizontal (deg).
    ShoulderRoll,
    /// Face-on roll of the hip line against horizontal (deg).
    HipRoll,
    /// Heading of the shoulder line against the Z axis in the XZ plane (deg).
    ShoulderHeading,
    /// Heading of the hip line against the Z axis in the XZ plane (deg).
    HipHeading,
    /// Unsigned angle between the spine and the image Y axis (deg).
    BodyPlaneAngle,
    /// X displacement of the left hip from the base frame.
    LeftHipDx,
    /// X displacement of the right hip from the base frame.
    RightHipDx,
    /// Shoulder heading minus hip heading (deg).
    HeadingSeparation,
    /// Heading of the shoulder line against the X axis, face-on (deg).
    ShoulderFaceAngle,
    /// Heading of the hip line against the X axis, face-on (deg).
    HipFaceAngle,
}

impl Metric {
    pub const COUNT: usize = 18;

    pub const ALL: [Metric; Metric::COUNT] = [
        Metric::ShoulderRotation,
        Metric::HipRotation,
        Metric::BodyTilt,
        Metric::HipCenterDx,
        Metric::ShoulderCenterDx,
        Metric::LeftHandDx,
        Metric::EnergyIndex,
        Metric::TrunkMidDy,
        Metric::ShoulderRoll,
        Metric::HipRoll,
        Metric::ShoulderHeading,
        Metric::HipHeading,
        Metric::BodyPlaneAngle,
        Metric::LeftHipDx,
        Metric::RightHipDx,
        Metric::HeadingSeparation,
        Metric::ShoulderFaceAngle,
        Metric::HipFaceAngle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ShoulderRotation => "shoulder_rotation",
            Self::HipRotation => "hip_rotation",
            Self::BodyTilt => "body_tilt",
            Self::HipCenterDx => "hip_center_dx",
            Self::ShoulderCenterDx => "shoulder_center_dx",
            Self::LeftHandDx => "left_hand_dx",
            Self::EnergyIndex => "energy_index",
            Self::TrunkMidDy => "trunk_mid_dy",
            Self::ShoulderRoll => "shoulder_roll",
            Self::HipRoll => "hip_roll",
            Self::ShoulderHeading => "shoulder_heading",
            Self::HipHeading => "hip_heading",
            Self::BodyPlaneAngle => "body_plane_angle",
            Self::LeftHipDx => "left_hip_dx",
            Self::RightHipDx => "right_hip_dx",
            Self::HeadingSeparation => "heading_separation",
            Self::ShoulderFaceAngle => "shoulder_face_angle",
            Self::HipFaceAngle => "hip_face_angle",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| ModelError::invalid(format!("unknown metric '{s}'")))
    }
}

/// Camera viewpoint of the recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum View {
    /// Down-the-line (camera behind the golfer, looking at the target).
    #[default]
    Side,
    /// Face-on (camera facing the golfer).
    Front,
}

/// Whether metrics are evaluated at event frames or at every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricMode {
    Keyframe,
    Continuous,
}

const SIDE_KEYFRAME: [Metric; 7] = [
    Metric::ShoulderRotation,
    Metric::HipRotation,
    Metric::BodyTilt,
    Metric::HipCenterDx,
    Metric::ShoulderCenterDx,
    Metric::LeftHandDx,
    Metric::EnergyIndex,
];

const FRONT_KEYFRAME: [Metric; 5] = [
    Metric::HipCenterDx,
    Metric::TrunkMidDy,
    Metric::ShoulderCenterDx,
    Metric::ShoulderRoll,
    Metric::HipRoll,
];

const SIDE_CONTINUOUS: [Metric; 8] = [
    Metric::ShoulderHeading,
    Metric::HipHeading,
    Metric::BodyPlaneAngle,
    Metric::LeftHipDx,
    Metric::RightHipDx,
    Metric::ShoulderCenterDx,
    Metric::LeftHandDx,
    Metric::HeadingSeparation,
];

const FRONT_CONTINUOUS: [Metric; 6] = [
    Metric::LeftHipDx,
    Metric::RightHipDx,
    Metric::TrunkMidDy,
    Metric::ShoulderCenterDx,
    Metric::ShoulderFaceAngle,
    Metric::HipFaceAngle,
];

impl View {
    /// Metrics judged for this view, in reporting order.
    ///
    /// The order also breaks ties when ranking top problem metrics.
    pub fn metrics(&self, mode: MetricMode) -> &'static [Metric] {
        match (self, mode) {
            (Self::Side, MetricMode::Keyframe) => &SIDE_KEYFRAME,
            (Self::Front, MetricMode::Keyframe) => &FRONT_KEYFRAME,
            (Self::Side, MetricMode::Continuous) => &SIDE_CONTINUOUS,
            (Self::Front, MetricMode::Continuous) => &FRONT_CONTINUOUS,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Side => "side",
            Self::Front => "front",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "side" | "down_the_line" => Ok(Self::Side),
            "front" | "face_on" => Ok(Self::Front),
            other => Err(format!("unknown view '{other}' (expected side|front)")),
        }
    }
}

/// Fixed-shape metric record.
///
/// Each slot is either absent (metric not computed for this row) or holds a
/// value, where NaN means "computed but unobservable". Both read back as NaN
/// through [`MetricValues::get`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MetricValues {
    slots: [Option<f64>; Metric::COUNT],
}

impl MetricValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, metric: Metric, value: f64) {
        self.slots[metric.slot()] = Some(value);
    }

    pub fn with(mut self, metric: Metric, value: f64) -> Self {
        self.set(metric, value);
        self
    }

    /// Value of `metric`, NaN when absent or unobservable.
    pub fn get(&self, metric: Metric) -> f64 {
        self.slots[metric.slot()].unwrap_or(f64::NAN)
    }

    pub fn contains(&self, metric: Metric) -> bool {
        self.slots[metric.slot()].is_some()
    }

    /// Iterate computed metrics in vocabulary order.
    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        Metric::ALL
            .into_iter()
            .filter_map(|m| self.slots[m.slot()].map(|v| (m, v)))
    }
}

impl Serialize for MetricValues {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let map: BTreeMap<&'static str, Option<f64>> = self
            .iter()
            .map(|(m, v)| (m.as_str(), crate::serde_nan::to_option(v)))
            .collect();
        map.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MetricValues {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = BTreeMap::<String, Option<f64>>::deserialize(deserializer)?;
        let mut values = MetricValues::new();
        for (name, value) in map {
            let metric: Metric = name.parse().map_err(serde::de::Error::custom)?;
            values.set(metric, crate::serde_nan::from_option(value));
        }
        Ok(values)
    }
}

/// One row of computed metrics.
///
/// Keyframe rows carry the event index; continuous rows do not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub video_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_index: Option<usize>,

    /// Absolute video frame the metrics were measured at.
    pub frame_index: usize,

    /// Base (reference) frame the relative metrics were measured against.
    pub base_frame: usize,

    pub metrics: MetricValues,
}

/// Parse metric rows from JSONL content.
pub fn parse_metric_rows(jsonl: &str) -> Result<Vec<MetricRow>, serde_json::Error> {
    crate::files::parse_jsonl(jsonl)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocabulary_is_consistent() {
        assert_eq!(Metric::ALL.len(), Metric::COUNT);
        for (i, m) in Metric::ALL.iter().enumerate() {
            assert_eq!(m.slot(), i);
            assert_eq!(m.as_str().parse::<Metric>().unwrap(), *m);
            let json = serde_json::to_string(m).unwrap();
            assert_eq!(json, format!("\"{}\"", m.as_str()));
        }
    }

    #[test]
    fn view_metric_lists() {
        assert_eq!(View::Side.metrics(MetricMode::Keyframe).len(), 7);
        assert_eq!(View::Front.metrics(MetricMode::Keyframe).len(), 5);
        assert_eq!(View::Side.metrics(MetricMode::Continuous).len(), 8);
        assert_eq!(View::Front.metrics(MetricMode::Continuous).len(), 6);
        assert_eq!("face_on".parse::<View>().unwrap(), View::Front);
    }

    #[test]
    fn metric_values_distinguish_absent_from_missing() {
        let values = MetricValues::new()
            .with(Metric::HipCenterDx, 0.25)
            .with(Metric::BodyTilt, f64::NAN);

        assert_eq!(values.get(Metric::HipCenterDx), 0.25);
        assert!(values.get(Metric::BodyTilt).is_nan());
        assert!(values.contains(Metric::BodyTilt));
        assert!(!values.contains(Metric::HipRoll));
        assert!(values.get(Metric::HipRoll).is_nan());
        assert_eq!(values.iter().count(), 2);
    }

    #[test]
    fn metric_row_json_writes_nan_as_null() {
        let row = MetricRow {
            video_id: "v1".to_string(),
            event_index: Some(3),
            frame_index: 42,
            base_frame: 10,
            metrics: MetricValues::new()
                .with(Metric::HipCenterDx, 0.5)
                .with(Metric::EnergyIndex, f64::NAN),
        };
        let json = serde_json::to_string(&row).unwrap();
        assert!(json.contains("\"energy_index\":null"));
        assert!(json.contains("\"hip_center_dx\":0.5"));

        let parsed = parse_metric_rows(&json).unwrap();
        assert_eq!(parsed.len(), 1);
        assert!(parsed[0].metrics.get(Metric::EnergyIndex).is_nan());
        assert!(parsed[0].metrics.contains(Metric::EnergyIndex));
        assert_eq!(parsed[0].event_index, Some(3));
    }

    #[test]
    fn unknown_metric_name_is_rejected() {
        let line = r#"{"video_id":"v","frame_index":0,"base_frame":0,"metrics":{"wrist_flex":1.0}}"#;
        assert!(parse_metric_rows(line).is_err());
    }
}
