//! Geometry primitives over 3D pose landmarks.
//!
//! Every function returns degrees (angles) or raw coordinate units
//! (displacements). Degenerate input (a zero-length line, coincident points)
//! yields NaN instead of an error, and any NaN coordinate propagates to a
//! NaN result.

use swingcheck_model::landmarks::{Axis, Point3};

/// Lines shorter than this are treated as degenerate.
pub const MIN_LINE_LENGTH: f64 = 1e-8;

/// Cross-product magnitude below which two lines count as collinear.
const COLLINEAR_EPSILON: f64 = 1e-10;

/// A coordinate plane through the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plane {
    XY,
    XZ,
    YZ,
}

impl Plane {
    /// Unit normal of the plane.
    pub fn normal(self) -> Point3 {
        match self {
            Self::XY => Point3::new(0.0, 0.0, 1.0),
            Self::XZ => Point3::new(0.0, 1.0, 0.0),
            Self::YZ => Point3::new(1.0, 0.0, 0.0),
        }
    }

    /// Orthogonal projection of a vector onto the plane.
    pub fn project(self, v: Point3) -> Point3 {
        match self {
            Self::XY => Point3::new(v.x, v.y, 0.0),
            Self::XZ => Point3::new(v.x, 0.0, v.z),
            Self::YZ => Point3::new(0.0, v.y, v.z),
        }
    }
}

fn unit(v: Point3) -> Option<Point3> {
    let n = v.norm();
    // `!(n >= ..)` also rejects NaN.
    if !(n >= MIN_LINE_LENGTH) {
        return None;
    }
    Some(v.scale(1.0 / n))
}

/// Signed angle, in `[-180, 180]`, from line `a0 -> b0` to line `a1 -> b1`
/// after projecting both onto `plane`.
///
/// The magnitude is the unsigned angle between the projected lines; the
/// sign follows the cross product along the plane normal (counter-clockwise
/// positive). Collinear lines report the unsigned magnitude.
pub fn signed_line_angle(plane: Plane, a0: Point3, b0: Point3, a1: Point3, b1: Point3) -> f64 {
    let (Some(u0), Some(u1)) = (
        unit(plane.project(b0.sub(&a0))),
        unit(plane.project(b1.sub(&a1))),
    ) else {
        return f64::NAN;
    };

    let angle = u0.dot(&u1).clamp(-1.0, 1.0).acos().to_degrees();
    let cross = u0.cross(&u1).dot(&plane.normal());

    if cross.abs() < COLLINEAR_EPSILON || cross > 0.0 {
        angle
    } else {
        -angle
    }
}

/// Inclination of `axis` out of `plane`, in `[0, 90]`.
///
/// 0 means the vector lies in the plane; 90 means it is along the normal.
pub fn tilt_to_plane(axis: Point3, plane: Plane) -> f64 {
    match unit(axis) {
        Some(u) => {
            let to_normal = u.dot(&plane.normal()).abs().clamp(0.0, 1.0).acos();
            90.0 - to_normal.to_degrees()
        }
        None => f64::NAN,
    }
}

/// In-image roll of the line `a -> b`: `atan2(dy, dx)` in the XY plane.
pub fn line_roll(a: Point3, b: Point3) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    if !(dx.abs() >= MIN_LINE_LENGTH || dy.abs() >= MIN_LINE_LENGTH) {
        return f64::NAN;
    }
    dy.atan2(dx).to_degrees()
}

/// Heading of the line `from -> to` measured from the `reference` axis
/// toward the `toward` axis, in `[-180, 180]`.
///
/// `line_heading(r, l, Axis::Z, Axis::X)` is `atan2(dx, dz)`.
pub fn line_heading(from: Point3, to: Point3, reference: Axis, toward: Axis) -> f64 {
    let v = to.sub(&from);
    let along = v.coord(reference);
    let across = v.coord(toward);
    if !(along.abs() >= MIN_LINE_LENGTH || across.abs() >= MIN_LINE_LENGTH) {
        return f64::NAN;
    }
    across.atan2(along).to_degrees()
}

/// Unsigned angle between `v` and the positive `reference` axis, in `[0, 180]`.
pub fn axis_angle(v: Point3, reference: Axis) -> f64 {
    match unit(v) {
        Some(u) => u.coord(reference).clamp(-1.0, 1.0).acos().to_degrees(),
        None => f64::NAN,
    }
}

/// Signed displacement of `target` from `base` along `axis`.
pub fn displacement(axis: Axis, base: Point3, target: Point3) -> f64 {
    target.coord(axis) - base.coord(axis)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn signed_angle_in_xz_plane() {
        let a = p(0.0, 0.0, 0.0);
        // x -> z about +y: cross(x, z) = -y, so the turn is negative.
        let angle = signed_line_angle(Plane::XZ, a, p(1.0, 0.0, 0.0), a, p(0.0, 0.0, 1.0));
        assert!((angle + 90.0).abs() < EPS);

        let angle = signed_line_angle(Plane::XZ, a, p(1.0, 0.0, 0.0), a, p(0.0, 0.0, -1.0));
        assert!((angle - 90.0).abs() < EPS);

        // The y component is projected away.
        let angle = signed_line_angle(Plane::XZ, a, p(1.0, 5.0, 0.0), a, p(1.0, -3.0, 0.0));
        assert!(angle.abs() < EPS);
    }

    #[test]
    fn collinear_lines_keep_positive_magnitude() {
        let a = p(0.0, 0.0, 0.0);
        let angle = signed_line_angle(Plane::XZ, a, p(1.0, 0.0, 0.0), a, p(-1.0, 0.0, 0.0));
        assert!((angle - 180.0).abs() < EPS);
    }

    #[test]
    fn degenerate_and_nan_inputs_give_nan() {
        let a = p(0.3, 0.3, 0.3);
        assert!(signed_line_angle(Plane::XZ, a, a, a, p(1.0, 0.0, 0.0)).is_nan());
        // Vertical line vanishes in the XZ projection.
        assert!(signed_line_angle(Plane::XZ, a, p(0.3, 1.0, 0.3), a, p(1.0, 0.0, 0.0)).is_nan());
        assert!(signed_line_angle(Plane::XZ, Point3::MISSING, a, a, p(1.0, 0.0, 0.0)).is_nan());
        assert!(tilt_to_plane(p(0.0, 0.0, 0.0), Plane::YZ).is_nan());
        assert!(line_roll(a, a).is_nan());
        assert!(line_roll(Point3::MISSING, a).is_nan());
        assert!(line_heading(a, a, Axis::Z, Axis::X).is_nan());
        assert!(axis_angle(Point3::MISSING, Axis::Y).is_nan());
        assert!(displacement(Axis::X, Point3::MISSING, a).is_nan());
    }

    #[test]
    fn tilt_measures_angle_out_of_plane() {
        assert!(tilt_to_plane(p(0.0, 1.0, 0.0), Plane::YZ).abs() < EPS);
        assert!((tilt_to_plane(p(1.0, 0.0, 0.0), Plane::YZ) - 90.0).abs() < EPS);
        assert!((tilt_to_plane(p(1.0, 1.0, 0.0), Plane::YZ) - 45.0).abs() < 1e-6);
        assert!((tilt_to_plane(p(-1.0, 1.0, 0.0), Plane::YZ) - 45.0).abs() < 1e-6);
    }

    #[test]
    fn roll_and_heading() {
        let o = p(0.0, 0.0, 0.0);
        assert!((line_roll(o, p(1.0, 1.0, 0.0)) - 45.0).abs() < EPS);
        assert!((line_roll(o, p(-1.0, 0.0, 0.0)) - 180.0).abs() < EPS);
        assert!((line_heading(o, p(1.0, 0.0, 1.0), Axis::Z, Axis::X) - 45.0).abs() < EPS);
        assert!((line_heading(o, p(0.0, 0.0, -1.0), Axis::X, Axis::Z) + 90.0).abs() < EPS);
    }

    #[test]
    fn axis_angle_is_unsigned() {
        assert!(axis_angle(p(0.0, 2.0, 0.0), Axis::Y).abs() < EPS);
        assert!((axis_angle(p(0.0, -2.0, 0.0), Axis::Y) - 180.0).abs() < EPS);
        assert!((axis_angle(p(3.0, 0.0, 0.0), Axis::Y) - 90.0).abs() < EPS);
    }

    #[test]
    fn displacement_is_signed() {
        assert_eq!(displacement(Axis::Y, p(0.0, 0.5, 0.0), p(0.0, 0.25, 0.0)), -0.25);
    }
}
