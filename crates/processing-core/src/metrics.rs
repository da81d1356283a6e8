//! Biomechanical metric computation.
//!
//! Metrics are measured at a target frame relative to an explicit base
//! (reference) frame. Keyframe mode evaluates the frames of an
//! [`EventSequence`]; continuous mode evaluates every tracked frame.
//!
//! Missing landmarks surface as NaN metrics. A missing base frame turns the
//! relative metrics (rotations, displacements) into NaN but leaves the
//! absolute ones (tilt, roll, heading) intact.

use swingcheck_model::event::EventSequence;
use swingcheck_model::landmarks::{Axis, Landmark, LandmarkTrack, Point3};
use swingcheck_model::metric::{Metric, MetricMode, MetricRow, MetricValues, View};

use crate::geometry::{
    axis_angle, displacement, line_heading, line_roll, signed_line_angle, tilt_to_plane, Plane,
};

/// The five tracked landmarks of one frame.
#[derive(Debug, Clone, Copy)]
pub struct Pose {
    pub left_shoulder: Point3,
    pub right_shoulder: Point3,
    pub left_wrist: Point3,
    pub left_hip: Point3,
    pub right_hip: Point3,
}

impl Pose {
    /// Gather a frame's landmarks; absent ones are [`Point3::MISSING`].
    pub fn at(track: &LandmarkTrack, frame: usize) -> Self {
        Self {
            left_shoulder: track.point(frame, Landmark::LeftShoulder),
            right_shoulder: track.point(frame, Landmark::RightShoulder),
            left_wrist: track.point(frame, Landmark::LeftWrist),
            left_hip: track.point(frame, Landmark::LeftHip),
            right_hip: track.point(frame, Landmark::RightHip),
        }
    }

    pub fn shoulder_center(&self) -> Point3 {
        Point3::midpoint(self.left_shoulder, self.right_shoulder)
    }

    pub fn hip_center(&self) -> Point3 {
        Point3::midpoint(self.left_hip, self.right_hip)
    }

    /// Midpoint of the shoulder and hip centers.
    pub fn trunk_mid(&self) -> Point3 {
        Point3::midpoint(self.shoulder_center(), self.hip_center())
    }
}

/// Computes the metric set of one camera view.
#[derive(Debug, Clone, Copy)]
pub struct MetricComputer {
    view: View,
}

impl MetricComputer {
    pub fn new(view: View) -> Self {
        Self { view }
    }

    pub fn view(&self) -> View {
        self.view
    }

    /// Keyframe metrics of `pose` measured against `base`.
    pub fn keyframe_metrics(&self, base: &Pose, pose: &Pose) -> MetricValues {
        let mut values = MetricValues::new();
        match self.view {
            View::Side => {
                let shoulder_rotation = signed_line_angle(
                    Plane::XZ,
                    base.left_shoulder,
                    base.right_shoulder,
                    pose.left_shoulder,
                    pose.right_shoulder,
                );
                let hip_rotation = signed_line_angle(
                    Plane::XZ,
                    base.left_hip,
                    base.right_hip,
                    pose.left_hip,
                    pose.right_hip,
                );
                values.set(Metric::ShoulderRotation, shoulder_rotation);
                values.set(Metric::HipRotation, hip_rotation);
                values.set(
                    Metric::BodyTilt,
                    tilt_to_plane(pose.trunk_mid().sub(&pose.hip_center()), Plane::YZ),
                );
                values.set(
                    Metric::HipCenterDx,
                    displacement(Axis::X, base.hip_center(), pose.hip_center()),
                );
                values.set(
                    Metric::ShoulderCenterDx,
                    displacement(Axis::X, base.shoulder_center(), pose.shoulder_center()),
                );
                values.set(
                    Metric::LeftHandDx,
                    displacement(Axis::X, base.left_wrist, pose.left_wrist),
                );
                values.set(Metric::EnergyIndex, shoulder_rotation - hip_rotation);
            }
            View::Front => {
                values.set(
                    Metric::HipCenterDx,
                    displacement(Axis::X, base.hip_center(), pose.hip_center()),
                );
                values.set(
                    Metric::TrunkMidDy,
                    displacement(Axis::Y, base.trunk_mid(), pose.trunk_mid()),
                );
                values.set(
                    Metric::ShoulderCenterDx,
                    displacement(Axis::X, base.shoulder_center(), pose.shoulder_center()),
                );
                values.set(
                    Metric::ShoulderRoll,
                    line_roll(pose.left_shoulder, pose.right_shoulder),
                );
                values.set(Metric::HipRoll, line_roll(pose.left_hip, pose.right_hip));
            }
        }
        values
    }

    /// Continuous metrics of `pose` measured against `base`.
    pub fn continuous_metrics(&self, base: &Pose, pose: &Pose) -> MetricValues {
        let mut values = MetricValues::new();

        values.set(
            Metric::LeftHipDx,
            displacement(Axis::X, base.left_hip, pose.left_hip),
        );
        values.set(
            Metric::RightHipDx,
            displacement(Axis::X, base.right_hip, pose.right_hip),
        );
        values.set(
            Metric::ShoulderCenterDx,
            displacement(Axis::X, base.shoulder_center(), pose.shoulder_center()),
        );

        match self.view {
            View::Side => {
                // Lines run right -> left.
                let shoulder_heading =
                    line_heading(pose.right_shoulder, pose.left_shoulder, Axis::Z, Axis::X);
                let hip_heading = line_heading(pose.right_hip, pose.left_hip, Axis::Z, Axis::X);
                values.set(Metric::ShoulderHeading, shoulder_heading);
                values.set(Metric::HipHeading, hip_heading);
                values.set(
                    Metric::BodyPlaneAngle,
                    axis_angle(pose.shoulder_center().sub(&pose.hip_center()), Axis::Y),
                );
                values.set(
                    Metric::LeftHandDx,
                    displacement(Axis::X, base.left_wrist, pose.left_wrist),
                );
                values.set(Metric::HeadingSeparation, shoulder_heading - hip_heading);
            }
            View::Front => {
                values.set(
                    Metric::TrunkMidDy,
                    displacement(Axis::Y, base.trunk_mid(), pose.trunk_mid()),
                );
                values.set(
                    Metric::ShoulderFaceAngle,
                    line_heading(pose.right_shoulder, pose.left_shoulder, Axis::X, Axis::Z),
                );
                values.set(
                    Metric::HipFaceAngle,
                    line_heading(pose.right_hip, pose.left_hip, Axis::X, Axis::Z),
                );
            }
        }
        values
    }

    /// One row per decoded event, measured at the event frame.
    pub fn keyframe_rows(
        &self,
        track: &LandmarkTrack,
        events: &EventSequence,
        base_frame: usize,
    ) -> Vec<MetricRow> {
        self.warn_if_base_missing(track, base_frame, MetricMode::Keyframe);
        let base = Pose::at(track, base_frame);

        let rows: Vec<MetricRow> = events
            .iter()
            .map(|(event_index, frame, _)| MetricRow {
                video_id: track.video_id().to_string(),
                event_index: Some(event_index),
                frame_index: frame,
                base_frame,
                metrics: self.keyframe_metrics(&base, &Pose::at(track, frame)),
            })
            .collect();

        tracing::debug!(
            video = track.video_id(),
            view = %self.view,
            rows = rows.len(),
            "Computed keyframe metrics"
        );
        rows
    }

    /// One row per tracked frame, in frame order.
    pub fn continuous_rows(&self, track: &LandmarkTrack, base_frame: usize) -> Vec<MetricRow> {
        self.warn_if_base_missing(track, base_frame, MetricMode::Continuous);
        let base = Pose::at(track, base_frame);

        let rows: Vec<MetricRow> = track
            .frame_indices()
            .map(|frame| MetricRow {
                video_id: track.video_id().to_string(),
                event_index: None,
                frame_index: frame,
                base_frame,
                metrics: self.continuous_metrics(&base, &Pose::at(track, frame)),
            })
            .collect();

        tracing::debug!(
            video = track.video_id(),
            view = %self.view,
            rows = rows.len(),
            "Computed continuous metrics"
        );
        rows
    }

    fn warn_if_base_missing(&self, track: &LandmarkTrack, base_frame: usize, mode: MetricMode) {
        if !track.contains_frame(base_frame) {
            tracing::warn!(
                video = track.video_id(),
                base_frame,
                ?mode,
                "Base frame not tracked; relative metrics will be missing"
            );
        }
    }
}
