//! Pose landmarks produced by the external pose estimator.
//!
//! Records are stored one per line (JSONL), keyed by `(video_id, frame_index)`:
//!
//! ```text
//! {"video_id":"swing_01","frame_index":12,"landmarks":{"11":{"x":0.41,"y":0.32,"z":-0.1,"visibility":0.98}, ...}}
//! ```
//!
//! Landmark keys are pose-model indices. Only the five landmarks used by the
//! metric vocabulary are retained; other indices are ignored. Absent records,
//! absent landmarks and `null` coordinates all read as missing.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ModelError;

/// The landmarks the metric vocabulary depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Landmark {
    LeftShoulder,
    RightShoulder,
    LeftWrist,
    LeftHip,
    RightHip,
}

impl Landmark {
    pub const COUNT: usize = 5;

    pub const ALL: [Landmark; Landmark::COUNT] = [
        Landmark::LeftShoulder,
        Landmark::RightShoulder,
        Landmark::LeftWrist,
        Landmark::LeftHip,
        Landmark::RightHip,
    ];

    /// Index of this landmark in the 33-point pose model.
    pub fn pose_index(self) -> u32 {
        match self {
            Self::LeftShoulder => 11,
            Self::RightShoulder => 12,
            Self::LeftWrist => 15,
            Self::LeftHip => 23,
            Self::RightHip => 24,
        }
    }

    pub fn from_pose_index(index: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|lm| lm.pose_index() == index)
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    X,
    Y,
    Z,
}

/// A 3D position. Any NaN component marks the point as missing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const MISSING: Point3 = Point3 {
        x: f64::NAN,
        y: f64::NAN,
        z: f64::NAN,
    };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn is_missing(&self) -> bool {
        self.x.is_nan() || self.y.is_nan() || self.z.is_nan()
    }

    pub fn coord(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub fn midpoint(a: Point3, b: Point3) -> Point3 {
        Point3::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0, (a.z + b.z) / 2.0)
    }

    pub fn sub(&self, other: &Point3) -> Point3 {
        Point3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn scale(&self, k: f64) -> Point3 {
        Point3::new(self.x * k, self.y * k, self.z * k)
    }

    pub fn dot(&self, other: &Point3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Point3) -> Point3 {
        Point3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }
}

/// A detected landmark with its optional detector visibility score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkPoint {
    pub position: Point3,
    pub visibility: Option<f64>,
}

/// All tracked landmarks for one video frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFrameLandmarks", into = "RawFrameLandmarks")]
pub struct FrameLandmarks {
    pub video_id: String,
    pub frame_index: usize,
    points: [Option<LandmarkPoint>; Landmark::COUNT],
}

impl FrameLandmarks {
    pub fn new(video_id: impl Into<String>, frame_index: usize) -> Self {
        Self {
            video_id: video_id.into(),
            frame_index,
            points: [None; Landmark::COUNT],
        }
    }

    /// Builder-style setter used by fixtures and tests.
    pub fn with_point(mut self, landmark: Landmark, position: Point3) -> Self {
        self.set(landmark, position, None);
        self
    }

    pub fn set(&mut self, landmark: Landmark, position: Point3, visibility: Option<f64>) {
        self.points[landmark.slot()] = Some(LandmarkPoint {
            position,
            visibility,
        });
    }

    pub fn get(&self, landmark: Landmark) -> Option<&LandmarkPoint> {
        self.points[landmark.slot()].as_ref()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawFrameLandmarks {
    #[serde(deserialize_with = "string_or_number")]
    video_id: String,
    frame_index: usize,
    landmarks: BTreeMap<String, RawPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawPoint {
    x: Option<f64>,
    y: Option<f64>,
    z: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    visibility: Option<f64>,
}

impl TryFrom<RawFrameLandmarks> for FrameLandmarks {
    type Error = ModelError;

    fn try_from(raw: RawFrameLandmarks) -> Result<Self, Self::Error> {
        let mut frame = FrameLandmarks::new(raw.video_id, raw.frame_index);
        for (key, point) in raw.landmarks {
            let index: u32 = key.trim().parse().map_err(|_| {
                ModelError::invalid(format!("landmark key '{key}' is not a pose index"))
            })?;
            let Some(landmark) = Landmark::from_pose_index(index) else {
                continue;
            };
            let position = Point3::new(
                crate::serde_nan::from_option(point.x),
                crate::serde_nan::from_option(point.y),
                crate::serde_nan::from_option(point.z),
            );
            frame.set(landmark, position, point.visibility);
        }
        Ok(frame)
    }
}

impl From<FrameLandmarks> for RawFrameLandmarks {
    fn from(frame: FrameLandmarks) -> Self {
        let landmarks = Landmark::ALL
            .into_iter()
            .filter_map(|lm| {
                frame.get(lm).map(|p| {
                    (
                        lm.pose_index().to_string(),
                        RawPoint {
                            x: crate::serde_nan::to_option(p.position.x),
                            y: crate::serde_nan::to_option(p.position.y),
                            z: crate::serde_nan::to_option(p.position.z),
                            visibility: p.visibility,
                        },
                    )
                })
            })
            .collect();
        Self {
            video_id: frame.video_id,
            frame_index: frame.frame_index,
            landmarks,
        }
    }
}

/// Accept `"video_id": "abc"` as well as `"video_id": 17`.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

/// Every tracked frame of one video, indexed by frame number.
#[derive(Debug, Clone)]
pub struct LandmarkTrack {
    video_id: String,
    frames: BTreeMap<usize, FrameLandmarks>,
    min_visibility: f64,
}

impl LandmarkTrack {
    /// Build a track. Later records for the same frame replace earlier ones.
    pub fn new(
        video_id: impl Into<String>,
        frames: impl IntoIterator<Item = FrameLandmarks>,
    ) -> Self {
        Self {
            video_id: video_id.into(),
            frames: frames.into_iter().map(|f| (f.frame_index, f)).collect(),
            min_visibility: 0.0,
        }
    }

    /// Treat landmarks with a visibility score below `threshold` as missing.
    pub fn with_min_visibility(mut self, threshold: f64) -> Self {
        self.min_visibility = threshold;
        self
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Tracked frame indices in ascending order.
    pub fn frame_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.frames.keys().copied()
    }

    pub fn first_frame(&self) -> Option<usize> {
        self.frames.keys().next().copied()
    }

    pub fn contains_frame(&self, frame: usize) -> bool {
        self.frames.contains_key(&frame)
    }

    /// Position of `landmark` at `frame`, or [`Point3::MISSING`].
    pub fn point(&self, frame: usize, landmark: Landmark) -> Point3 {
        self.frames
            .get(&frame)
            .and_then(|f| f.get(landmark))
            .filter(|p| p.visibility.map_or(true, |v| v >= self.min_visibility))
            .map(|p| p.position)
            .unwrap_or(Point3::MISSING)
    }

    /// Split records into one track per video, ordered by video id.
    pub fn group_by_video(records: impl IntoIterator<Item = FrameLandmarks>) -> Vec<LandmarkTrack> {
        let mut by_video: BTreeMap<String, Vec<FrameLandmarks>> = BTreeMap::new();
        for record in records {
            by_video
                .entry(record.video_id.clone())
                .or_default()
                .push(record);
        }
        by_video
            .into_iter()
            .map(|(video_id, frames)| LandmarkTrack::new(video_id, frames))
            .collect()
    }
}

/// Parse landmark records from JSONL content.
pub fn parse_landmarks(jsonl: &str) -> Result<Vec<FrameLandmarks>, serde_json::Error> {
    crate::files::parse_jsonl(jsonl)
}
