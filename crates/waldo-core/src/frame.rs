//! Reference frames and rigid-transform helpers.
//!
//! A [`Frame`] is a right-handed rigid transform (rotation + translation)
//! expressed as an [`Isometry3<f64>`]. Every pose the core manipulates —
//! mechanism bases, joint frames, tool centre points, targets — is a
//! `Frame` relative to some parent.

use nalgebra::{Isometry3, Matrix3, Rotation3, Translation3, UnitQuaternion, Vector3};

/// A rigid transform: the pose of one reference frame in another.
pub type Frame = Isometry3<f64>;

/// Build a frame from a translation and roll-pitch-yaw angles
/// (extrinsic ZYX, the URDF convention).
#[must_use]
pub fn frame_from_xyz_rpy(x: f64, y: f64, z: f64, roll: f64, pitch: f64, yaw: f64) -> Frame {
    let rotation = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(
        rotation_from_rpy(roll, pitch, yaw),
    ));
    Isometry3::from_parts(Translation3::new(x, y, z), rotation)
}

/// Rotation matrix from roll-pitch-yaw (extrinsic ZYX = intrinsic XYZ).
fn rotation_from_rpy(roll: f64, pitch: f64, yaw: f64) -> Matrix3<f64> {
    let (sr, cr) = roll.sin_cos();
    let (sp, cp) = pitch.sin_cos();
    let (sy, cy) = yaw.sin_cos();

    Matrix3::new(
        cy * cp,
        cy * sp * sr - sy * cr,
        cy * sp * cr + sy * sr,
        sy * cp,
        sy * sp * sr + cy * cr,
        sy * sp * cr - cy * sr,
        -sp,
        cp * sr,
        cp * cr,
    )
}

/// Interpolate between two frames.
///
/// Translation is interpolated linearly, rotation by quaternion slerp.
/// `t` outside `[0, 1]` extrapolates the translation and clamps the
/// rotation path to the shorter arc.
#[must_use]
pub fn interpolate_frame(a: &Frame, b: &Frame, t: f64) -> Frame {
    let translation = a.translation.vector.lerp(&b.translation.vector, t);
    // try_slerp fails only for antipodal quaternions; fall back to the
    // nearer endpoint instead of panicking mid-playback.
    let rotation = a
        .rotation
        .try_slerp(&b.rotation, t, 1.0e-9)
        .unwrap_or(if t < 0.5 { a.rotation } else { b.rotation });
    Isometry3::from_parts(Translation3::from(translation), rotation)
}

/// Euclidean distance between the origins of two frames.
#[must_use]
pub fn linear_distance(a: &Frame, b: &Frame) -> f64 {
    (b.translation.vector - a.translation.vector).norm()
}

/// Rotation angle (radians, in `[0, pi]`) taking one frame's orientation
/// to the other's.
#[must_use]
pub fn angular_distance(a: &Frame, b: &Frame) -> f64 {
    a.rotation.angle_to(&b.rotation)
}

/// Unit Z axis, the tool approach direction by convention.
#[must_use]
pub fn approach_axis(frame: &Frame) -> Vector3<f64> {
    frame.rotation * Vector3::z()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    // ---- construction ----

    #[test]
    fn frame_identity_from_zero_rpy() {
        let f = frame_from_xyz_rpy(0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        assert_relative_eq!(f.translation.vector.norm(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(f.rotation.angle(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn frame_translation_only() {
        let f = frame_from_xyz_rpy(1.0, 2.0, 3.0, 0.0, 0.0, 0.0);
        assert_relative_eq!(f.translation.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(f.translation.y, 2.0, epsilon = 1e-12);
        assert_relative_eq!(f.translation.z, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn frame_yaw_rotates_x_to_y() {
        let f = frame_from_xyz_rpy(0.0, 0.0, 0.0, 0.0, 0.0, FRAC_PI_2);
        let x = f.rotation * Vector3::x();
        assert_relative_eq!(x.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(x.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn frame_roll_rotates_y_to_z() {
        let f = frame_from_xyz_rpy(0.0, 0.0, 0.0, FRAC_PI_2, 0.0, 0.0);
        let y = f.rotation * Vector3::y();
        assert_relative_eq!(y.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(y.z, 1.0, epsilon = 1e-12);
    }

    // ---- interpolation ----

    #[test]
    fn interpolate_endpoints() {
        let a = frame_from_xyz_rpy(0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let b = frame_from_xyz_rpy(2.0, 0.0, 0.0, 0.0, 0.0, FRAC_PI_2);
        let at_a = interpolate_frame(&a, &b, 0.0);
        let at_b = interpolate_frame(&a, &b, 1.0);
        assert_relative_eq!(linear_distance(&at_a, &a), 0.0, epsilon = 1e-12);
        assert_relative_eq!(linear_distance(&at_b, &b), 0.0, epsilon = 1e-12);
        assert_relative_eq!(angular_distance(&at_b, &b), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn interpolate_midpoint() {
        let a = frame_from_xyz_rpy(0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let b = frame_from_xyz_rpy(2.0, 0.0, 0.0, 0.0, 0.0, FRAC_PI_2);
        let mid = interpolate_frame(&a, &b, 0.5);
        assert_relative_eq!(mid.translation.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(mid.rotation.angle(), FRAC_PI_2 / 2.0, epsilon = 1e-9);
    }

    // ---- distances ----

    #[test]
    fn linear_distance_pythagorean() {
        let a = frame_from_xyz_rpy(0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let b = frame_from_xyz_rpy(3.0, 4.0, 0.0, 0.0, 0.0, 0.0);
        assert_relative_eq!(linear_distance(&a, &b), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn angular_distance_symmetric() {
        let a = frame_from_xyz_rpy(0.0, 0.0, 0.0, 0.0, 0.3, 0.0);
        let b = frame_from_xyz_rpy(0.0, 0.0, 0.0, 0.0, -0.4, 0.0);
        assert_relative_eq!(angular_distance(&a, &b), 0.7, epsilon = 1e-9);
        assert_relative_eq!(angular_distance(&b, &a), 0.7, epsilon = 1e-9);
    }

    #[test]
    fn angular_distance_half_turn() {
        let a = frame_from_xyz_rpy(0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let b = frame_from_xyz_rpy(0.0, 0.0, 0.0, 0.0, 0.0, PI);
        assert_relative_eq!(angular_distance(&a, &b), PI, epsilon = 1e-9);
    }

    #[test]
    fn approach_axis_follows_rotation() {
        let f = frame_from_xyz_rpy(0.0, 0.0, 0.0, 0.0, FRAC_PI_2, 0.0);
        let z = approach_axis(&f);
        assert_relative_eq!(z.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(z.z, 0.0, epsilon = 1e-12);
    }
}
