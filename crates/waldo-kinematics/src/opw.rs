//! Closed-form kinematics for a spherical-wrist 6R arm.
//!
//! Uses the ortho-parallel (OPW) parameterization: seven signed lengths
//! `a1, a2, b, c1..c4` describe any industrial arm whose axes 2 and 3 are
//! parallel and whose last three axes intersect in a wrist centre. Forward
//! kinematics composes the joint frames directly; inverse kinematics is
//! analytical and enumerates all eight branches (shoulder front/rear ×
//! elbow up/down × wrist straight/flipped) in one call.
//!
//! All positions are millimetres, all angles radians. Solver-internal
//! angles relate to robot joint values through per-joint offsets and sign
//! corrections, so robots with rotated or mirrored zero conventions fit the
//! same model.

use std::f64::consts::PI;

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use waldo_core::configuration::Configuration;
use waldo_core::frame::{approach_axis, Frame};

/// Angle below which the wrist is treated as singular (axes 4 and 6
/// collinear).
pub const WRIST_SINGULARITY_TOLERANCE: f64 = 1.0e-6;

/// OPW link geometry of a spherical-wrist arm.
///
/// Lengths follow Brandstötter's convention: `c1` shoulder height, `c2`
/// upper-arm length, `c3` forearm length (joint 3 to wrist centre), `c4`
/// wrist centre to flange; `a1` horizontal shoulder offset, `a2` elbow
/// offset (often negative), `b` lateral offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArmGeometry {
    pub a1: f64,
    pub a2: f64,
    pub b: f64,
    pub c1: f64,
    pub c2: f64,
    pub c3: f64,
    pub c4: f64,
    /// Solver-internal zero minus robot zero, per joint.
    pub offsets: [f64; 6],
    /// +1.0 or -1.0 per joint for mirrored axes.
    pub sign_corrections: [f64; 6],
}

impl ArmGeometry {
    /// Geometry with no offsets and positive joint senses.
    #[must_use]
    pub const fn new(a1: f64, a2: f64, b: f64, c1: f64, c2: f64, c3: f64, c4: f64) -> Self {
        Self {
            a1,
            a2,
            b,
            c1,
            c2,
            c3,
            c4,
            offsets: [0.0; 6],
            sign_corrections: [1.0; 6],
        }
    }

    #[must_use]
    pub const fn with_offsets(mut self, offsets: [f64; 6]) -> Self {
        self.offsets = offsets;
        self
    }

    #[must_use]
    pub const fn with_sign_corrections(mut self, signs: [f64; 6]) -> Self {
        self.sign_corrections = signs;
        self
    }

    /// Robot joint values -> solver-internal angles.
    fn to_internal(&self, q: &[f64; 6]) -> [f64; 6] {
        let mut t = [0.0; 6];
        for i in 0..6 {
            t[i] = self.sign_corrections[i] * q[i] + self.offsets[i];
        }
        t
    }

    /// Solver-internal angles -> robot joint values.
    fn to_robot(&self, t: &[f64; 6]) -> [f64; 6] {
        let mut q = [0.0; 6];
        for i in 0..6 {
            q[i] = self.sign_corrections[i] * (t[i] - self.offsets[i]);
        }
        q
    }

    /// Forward kinematics in the mechanism-local frame.
    ///
    /// Returns the six joint frames followed by the flange frame. The wrist
    /// centre is the origin of frames 4-6; the flange sits `c4` along the
    /// final Z axis.
    #[must_use]
    pub fn forward(&self, q: &[f64; 6]) -> [Frame; 7] {
        let t = self.to_internal(q);

        let f1 = trans(0.0, 0.0, self.c1) * rot_z(t[0]);
        let f2 = f1 * trans(self.a1, self.b, 0.0) * rot_y(t[1]);
        let f3 = f2 * trans(0.0, 0.0, self.c2) * rot_y(t[2]);
        let f4 = f3 * trans(self.a2, 0.0, self.c3) * rot_z(t[3]);
        let f5 = f4 * rot_y(t[4]);
        let f6 = f5 * rot_z(t[5]);
        let flange = f6 * trans(0.0, 0.0, self.c4);

        [f1, f2, f3, f4, f5, f6, flange]
    }

    /// Flange pose only.
    #[must_use]
    pub fn flange(&self, q: &[f64; 6]) -> Frame {
        self.forward(q)[6]
    }

    /// All eight inverse-kinematics branches for a flange pose in the
    /// mechanism-local frame.
    ///
    /// The returned array is indexed by [`Configuration::index`]; branches
    /// that are geometrically unreachable are `None`. Joint limits are not
    /// applied here — that is the caller's concern. `previous` disambiguates
    /// joint 4 at the wrist singularity.
    #[must_use]
    pub fn inverse(&self, pose: &Frame, previous: Option<&[f64; 6]>) -> [Option<[f64; 6]>; 8] {
        let mut solutions: [Option<[f64; 6]>; 8] = [None; 8];

        // Wrist centre: back off c4 along the flange approach axis.
        let wrist = pose.translation.vector - self.c4 * approach_axis(pose);
        let (cx, cy, cz) = (wrist.x, wrist.y, wrist.z);

        let r_xy_sq = cx * cx + cy * cy;
        let lateral_sq = r_xy_sq - self.b * self.b;
        if lateral_sq < 0.0 {
            // Wrist centre closer to axis 1 than the lateral offset allows.
            return solutions;
        }
        let nx1 = lateral_sq.sqrt() - self.a1;

        let azimuth = cy.atan2(cx);
        let lateral = self.b.atan2(nx1 + self.a1);
        let theta1_front = azimuth - lateral;
        let theta1_rear = azimuth + lateral - PI;

        let dz = cz - self.c1;
        let kappa_sq = self.a2 * self.a2 + self.c3 * self.c3;
        let kappa = kappa_sq.sqrt();
        let psi = self.a2.atan2(self.c3);

        let prev_internal = previous.map(|p| self.to_internal(p));

        // Planar 2R sub-problem in each shoulder half-plane. The rear
        // half-plane sees the wrist centre mirrored past both shoulder
        // offsets.
        for shoulder in [false, true] {
            let (horiz, theta1) = if shoulder {
                (-(nx1 + 2.0 * self.a1), theta1_rear)
            } else {
                (nx1, theta1_front)
            };
            let s_sq = horiz * horiz + dz * dz;
            let s = s_sq.sqrt();

            let cos_alpha = (s_sq + self.c2 * self.c2 - kappa_sq) / (2.0 * s * self.c2);
            let cos_beta = (s_sq - self.c2 * self.c2 - kappa_sq) / (2.0 * self.c2 * kappa);
            if !(-1.0..=1.0).contains(&cos_alpha) || !(-1.0..=1.0).contains(&cos_beta) {
                continue;
            }
            let alpha = cos_alpha.acos();
            let beta = cos_beta.acos();
            let gamma = horiz.atan2(dz);

            for elbow_down in [false, true] {
                let (theta2, theta3) = if elbow_down {
                    (gamma + alpha, -beta - psi)
                } else {
                    (gamma - alpha, beta - psi)
                };

                // Orientation decoupling: the wrist rotation is what remains
                // after the arm rotation Rz(t1) * Ry(t2 + t3).
                let arm_rot =
                    UnitQuaternion::from_axis_angle(&Vector3::z_axis(), theta1)
                        * UnitQuaternion::from_axis_angle(&Vector3::y_axis(), theta2 + theta3);
                let wrist_rot = arm_rot.inverse() * pose.rotation;
                let m = wrist_rot.to_rotation_matrix();

                let sin5 = (m[(0, 2)] * m[(0, 2)] + m[(1, 2)] * m[(1, 2)]).sqrt();
                let theta5 = sin5.atan2(m[(2, 2)]);

                let (theta4, theta6) = if sin5 < WRIST_SINGULARITY_TOLERANCE {
                    // Axes 4 and 6 collinear: hold joint 4, let joint 6
                    // absorb the remaining rotation.
                    let theta4 = prev_internal.map_or(0.0, |p| p[3]);
                    let residual = rot_y(theta5).rotation.inverse()
                        * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), -theta4)
                        * wrist_rot;
                    let rm = residual.to_rotation_matrix();
                    (theta4, rm[(1, 0)].atan2(rm[(0, 0)]))
                } else {
                    (
                        m[(1, 2)].atan2(m[(0, 2)]),
                        m[(2, 1)].atan2(-m[(2, 0)]),
                    )
                };

                for wrist_flip in [false, true] {
                    let internal = if wrist_flip {
                        [
                            theta1,
                            theta2,
                            theta3,
                            normalize_angle(theta4 + PI),
                            -theta5,
                            normalize_angle(theta6 + PI),
                        ]
                    } else {
                        [theta1, theta2, theta3, theta4, theta5, theta6]
                    };
                    let normalized = internal.map(normalize_angle);
                    let config = Configuration::new(shoulder, elbow_down, wrist_flip);
                    solutions[config.index()] = Some(self.to_robot(&normalized));
                }
            }
        }

        solutions
    }

    /// The configuration branch a joint vector belongs to.
    #[must_use]
    pub fn configuration_of(&self, q: &[f64; 6]) -> Configuration {
        let t = self.to_internal(q);
        let t23 = t[1] + t[2];
        // Horizontal wrist-centre coordinate in the shoulder half-plane.
        let cx1 = self.a1
            + self.c2 * t[1].sin()
            + self.c3 * t23.sin()
            + self.a2 * t23.cos();
        let psi = self.a2.atan2(self.c3);
        Configuration {
            rear_shoulder: cx1 < 0.0,
            elbow_down: t[2] + psi < 0.0,
            wrist_flip: t[4] < 0.0,
        }
    }

    /// Whether the wrist is singular at the given joints.
    #[must_use]
    pub fn is_wrist_singular(&self, q: &[f64; 6]) -> bool {
        self.to_internal(q)[4].sin().abs() < WRIST_SINGULARITY_TOLERANCE
    }
}

/// Wrap an angle into `(-pi, pi]`.
#[must_use]
pub fn normalize_angle(angle: f64) -> f64 {
    let mut a = angle % (2.0 * PI);
    if a <= -PI {
        a += 2.0 * PI;
    } else if a > PI {
        a -= 2.0 * PI;
    }
    a
}

fn trans(x: f64, y: f64, z: f64) -> Frame {
    Isometry3::from_parts(Translation3::new(x, y, z), UnitQuaternion::identity())
}

fn rot_z(angle: f64) -> Frame {
    Isometry3::from_parts(
        Translation3::identity(),
        UnitQuaternion::from_axis_angle(&Vector3::z_axis(), angle),
    )
}

fn rot_y(angle: f64) -> Frame {
    Isometry3::from_parts(
        Translation3::identity(),
        UnitQuaternion::from_axis_angle(&Vector3::y_axis(), angle),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
