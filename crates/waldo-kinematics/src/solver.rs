//! Per-mechanism solving.
//!
//! [`solve_mechanism`] dispatches exhaustively on [`MechanismKind`] and
//! always returns a [`SolverOutput`]: reachability and limit problems are
//! diagnostics on the output, never errors, so a caller can resolve a whole
//! program in one pass and report every problem at once.
//!
//! Branch selection for the arm prefers, in order: the target's declared
//! configuration, the branch matching the previous joint state, and finally
//! the lowest-index branch that satisfies the joint limits.

use nalgebra::Translation3;

use waldo_core::configuration::Configuration;
use waldo_core::error::Diagnostic;
use waldo_core::frame::Frame;
use waldo_core::joint::Joint;

use crate::mechanism::{Mechanism, MechanismKind};
use crate::opw::ArmGeometry;

/// A goal in the mechanism's own base frame.
///
/// Couplings and reference frames are resolved by the group before this is
/// built; the solver only ever sees local coordinates.
#[derive(Debug, Clone, Copy)]
pub enum LocalTarget<'a> {
    /// Explicit joint values, one per degree of freedom.
    Joints(&'a [f64]),
    /// A flange pose in the mechanism base frame.
    Pose {
        pose: &'a Frame,
        configuration: Option<Configuration>,
    },
}

/// Result of solving one mechanism.
///
/// `frames` are mechanism-local: the six joint frames plus the flange for
/// the arm, the single output frame for an external axis.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOutput {
    pub joints: Vec<f64>,
    pub frames: Vec<Frame>,
    pub configuration: Configuration,
    pub diagnostics: Vec<Diagnostic>,
}

/// Solve one mechanism for one local target.
///
/// `previous` is the mechanism's joint state at the preceding target; it
/// steers branch selection and seeds the fallback position for unreachable
/// poses. A hint of the wrong length is discarded with a warning.
#[must_use]
pub fn solve_mechanism(
    mechanism: &Mechanism,
    target: &LocalTarget<'_>,
    previous: Option<&[f64]>,
) -> SolverOutput {
    let mut diagnostics = Vec::new();
    let previous = match previous {
        Some(p) if p.len() != mechanism.dof() => {
            diagnostics.push(Diagnostic::PreviousJointCountMismatch {
                expected: mechanism.dof(),
                got: p.len(),
            });
            None
        }
        other => other,
    };

    let mut out = match (mechanism.kind(), target) {
        (_, LocalTarget::Joints(values)) => solve_joints(mechanism, values),
        (MechanismKind::SphericalWristArm(geometry), LocalTarget::Pose { pose, configuration }) => {
            solve_arm_pose(geometry, mechanism.joints(), pose, *configuration, previous)
        }
        (MechanismKind::LinearAxis { direction }, LocalTarget::Pose { pose, .. }) => {
            let value = direction.dot(&pose.translation.vector);
            single_axis_output(mechanism, value, axis_frame(mechanism.kind(), value))
        }
        (MechanismKind::RotaryAxis { axis }, LocalTarget::Pose { pose, .. }) => {
            let value = pose.rotation.scaled_axis().dot(axis);
            single_axis_output(mechanism, value, axis_frame(mechanism.kind(), value))
        }
    };
    diagnostics.append(&mut out.diagnostics);
    out.diagnostics = diagnostics;
    out
}

// ---- joint-space ----

fn solve_joints(mechanism: &Mechanism, values: &[f64]) -> SolverOutput {
    // Counts are validated at program level; tolerate a mismatch here by
    // filling missing values from home.
    let mut joints = mechanism.home_joints();
    for (slot, value) in joints.iter_mut().zip(values) {
        *slot = *value;
    }
    let diagnostics = limit_diagnostics(mechanism.joints(), &joints);

    match mechanism.kind() {
        MechanismKind::SphericalWristArm(geometry) => {
            let q = arm_array(&joints);
            SolverOutput {
                frames: geometry.forward(&q).to_vec(),
                configuration: geometry.configuration_of(&q),
                joints,
                diagnostics,
            }
        }
        kind @ (MechanismKind::LinearAxis { .. } | MechanismKind::RotaryAxis { .. }) => {
            SolverOutput {
                frames: vec![axis_frame(kind, joints[0])],
                configuration: Configuration::default(),
                joints,
                diagnostics,
            }
        }
    }
}

// ---- arm pose ----

fn solve_arm_pose(
    geometry: &ArmGeometry,
    joints: &[Joint],
    pose: &Frame,
    declared: Option<Configuration>,
    previous: Option<&[f64]>,
) -> SolverOutput {
    let prev = previous.map(arm_array);
    let branches = geometry.inverse(pose, prev.as_ref());

    let within_limits = |q: &[f64; 6]| q.iter().zip(joints).all(|(v, j)| j.contains(*v));
    let first_valid = || {
        branches
            .iter()
            .flatten()
            .find(|q| within_limits(q))
            .copied()
    };

    let mut diagnostics = Vec::new();
    let mut branch_missing = false;
    let chosen = if let Some(cfg) = declared {
        // A pinned branch is honoured even outside its limits; the limit
        // violations become diagnostics on the chosen solution.
        match branches[cfg.index()] {
            Some(q) => Some(q),
            None => {
                branch_missing = true;
                diagnostics.push(Diagnostic::NoValidConfiguration);
                first_valid()
            }
        }
    } else if let Some(p) = prev {
        let continuity = geometry.configuration_of(&p).index();
        match branches[continuity] {
            Some(q) if within_limits(&q) => Some(q),
            _ => first_valid(),
        }
    } else {
        first_valid()
    };

    let q = match chosen {
        Some(q) => {
            diagnostics.extend(limit_diagnostics(joints, &q));
            q
        }
        None => match branches.iter().flatten().next().copied() {
            Some(q) => {
                // Reachable, but no branch fits the limits. Report the
                // lowest branch's violations alongside the verdict.
                if !branch_missing {
                    diagnostics.push(Diagnostic::NoValidConfiguration);
                }
                diagnostics.extend(limit_diagnostics(joints, &q));
                q
            }
            None => {
                diagnostics.push(Diagnostic::Unreachable);
                prev.unwrap_or(home_array(joints))
            }
        },
    };

    if geometry.is_wrist_singular(&q) {
        diagnostics.push(Diagnostic::WristSingularity);
    }

    SolverOutput {
        joints: q.to_vec(),
        frames: geometry.forward(&q).to_vec(),
        configuration: geometry.configuration_of(&q),
        diagnostics,
    }
}

// ---- helpers ----

fn limit_diagnostics(joints: &[Joint], values: &[f64]) -> Vec<Diagnostic> {
    joints
        .iter()
        .zip(values)
        .filter(|(j, v)| !j.contains(**v))
        .map(|(j, v)| Diagnostic::OutOfRange {
            joint: j.index,
            value: *v,
            min: j.min,
            max: j.max,
        })
        .collect()
}

fn single_axis_output(mechanism: &Mechanism, value: f64, frame: Frame) -> SolverOutput {
    SolverOutput {
        diagnostics: limit_diagnostics(mechanism.joints(), &[value]),
        joints: vec![value],
        frames: vec![frame],
        configuration: Configuration::default(),
    }
}

/// Local output frame of a single external axis at `value`.
fn axis_frame(kind: &MechanismKind, value: f64) -> Frame {
    match kind {
        MechanismKind::LinearAxis { direction } => {
            Translation3::from(direction.into_inner() * value).into()
        }
        MechanismKind::RotaryAxis { axis } => {
            Frame::from_parts(
                Translation3::identity(),
                nalgebra::UnitQuaternion::from_axis_angle(axis, value),
            )
        }
        MechanismKind::SphericalWristArm(_) => Frame::identity(),
    }
}

fn arm_array(values: &[f64]) -> [f64; 6] {
    let mut q = [0.0; 6];
    q.copy_from_slice(&values[..6]);
    q
}

fn home_array(joints: &[Joint]) -> [f64; 6] {
    let mut q = [0.0; 6];
    for (slot, joint) in q.iter_mut().zip(joints) {
        *slot = joint.home;
    }
    q
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use waldo_core::frame::linear_distance;

    fn arm() -> Mechanism {
        let geometry = ArmGeometry::new(25.0, -35.0, 0.0, 400.0, 455.0, 420.0, 80.0);
        let joints = (0..6)
            .map(|i| Joint::revolute(i, -3.0, 3.0))
            .collect::<Vec<_>>();
        Mechanism::new(
            "arm",
            MechanismKind::SphericalWristArm(geometry),
            Frame::identity(),
            joints,
        )
        .unwrap()
    }

    fn track() -> Mechanism {
        Mechanism::new(
            "track",
            MechanismKind::LinearAxis {
                direction: Vector3::x_axis(),
            },
            Frame::identity(),
            vec![Joint::prismatic(6, 0.0, 4000.0)],
        )
        .unwrap()
    }

    fn arm_geometry() -> ArmGeometry {
        ArmGeometry::new(25.0, -35.0, 0.0, 400.0, 455.0, 420.0, 80.0)
    }

    #[test]
    fn joint_target_reports_out_of_range() {
        let q = [0.1, -0.2, 0.3, 5.0, 0.5, -0.1];
        let out = solve_mechanism(&arm(), &LocalTarget::Joints(&q), None);
        assert_eq!(out.joints, q.to_vec());
        assert_eq!(out.frames.len(), 7);
        assert_eq!(
            out.diagnostics,
            vec![Diagnostic::OutOfRange {
                joint: 3,
                value: 5.0,
                min: -3.0,
                max: 3.0
            }]
        );
    }

    #[test]
    fn pose_target_round_trips_joints() {
        let q = [0.2, -0.3, 0.4, 0.5, 0.6, -0.7];
        let pose = arm_geometry().flange(&q);
        let out = solve_mechanism(
            &arm(),
            &LocalTarget::Pose {
                pose: &pose,
                configuration: None,
            },
            Some(&q),
        );
        assert!(out.diagnostics.is_empty());
        for (a, b) in out.joints.iter().zip(&q) {
            assert_relative_eq!(a, b, epsilon = 1e-6);
        }
    }

    #[test]
    fn declared_configuration_is_honoured() {
        let q = [0.2, -0.3, 0.4, 0.5, 0.6, -0.7];
        let geometry = arm_geometry();
        let pose = geometry.flange(&q);
        for cfg in Configuration::all() {
            let out = solve_mechanism(
                &arm(),
                &LocalTarget::Pose {
                    pose: &pose,
                    configuration: Some(cfg),
                },
                None,
            );
            if out.diagnostics.is_empty() {
                assert_eq!(out.configuration, cfg);
            }
        }
    }

    #[test]
    fn missing_declared_branch_is_reported_once() {
        // Front-reachable pose whose rear branches do not exist, with
        // limits too tight for any branch.
        let geometry = arm_geometry();
        let pose = geometry.flange(&[0.0, 0.7, 0.5, 0.0, 0.5, 0.0]);
        let joints = (0..6)
            .map(|i| Joint::revolute(i, -0.05, 0.05))
            .collect::<Vec<_>>();
        let cramped = Mechanism::new(
            "arm",
            MechanismKind::SphericalWristArm(geometry),
            Frame::identity(),
            joints,
        )
        .unwrap();
        let out = solve_mechanism(
            &cramped,
            &LocalTarget::Pose {
                pose: &pose,
                configuration: Some(Configuration::new(true, false, false)),
            },
            None,
        );
        let verdicts = out
            .diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::NoValidConfiguration))
            .count();
        assert_eq!(verdicts, 1);
        assert!(out
            .diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::OutOfRange { .. })));
    }

    #[test]
    fn previous_state_steers_branch_selection() {
        let q = [0.2, -0.3, 0.4, 0.5, 0.6, -0.7];
        let geometry = arm_geometry();
        let pose = geometry.flange(&q);
        let out = solve_mechanism(
            &arm(),
            &LocalTarget::Pose {
                pose: &pose,
                configuration: None,
            },
            Some(&q),
        );
        assert_eq!(out.configuration, geometry.configuration_of(&q));
    }

    #[test]
    fn unreachable_pose_falls_back_to_previous() {
        let pose = Frame::translation(1.0e5, 0.0, 0.0);
        let prev = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6];
        let out = solve_mechanism(
            &arm(),
            &LocalTarget::Pose {
                pose: &pose,
                configuration: None,
            },
            Some(&prev),
        );
        assert!(out.diagnostics.contains(&Diagnostic::Unreachable));
        assert_eq!(out.joints, prev.to_vec());
    }

    #[test]
    fn unreachable_pose_without_previous_falls_back_to_home() {
        let pose = Frame::translation(1.0e5, 0.0, 0.0);
        let out = solve_mechanism(
            &arm(),
            &LocalTarget::Pose {
                pose: &pose,
                configuration: None,
            },
            None,
        );
        assert!(out.diagnostics.contains(&Diagnostic::Unreachable));
        assert_eq!(out.joints, vec![0.0; 6]);
    }

    #[test]
    fn wrong_length_previous_is_discarded_with_warning() {
        let q = [0.2, -0.3, 0.4, 0.5, 0.6, -0.7];
        let pose = arm_geometry().flange(&q);
        let out = solve_mechanism(
            &arm(),
            &LocalTarget::Pose {
                pose: &pose,
                configuration: None,
            },
            Some(&[0.0; 9]),
        );
        assert!(out
            .diagnostics
            .contains(&Diagnostic::PreviousJointCountMismatch {
                expected: 6,
                got: 9
            }));
        assert!(out.diagnostics.iter().all(|d| !d.is_error()));
    }

    #[test]
    fn singular_pose_warns() {
        let q = [0.3, -0.2, 0.4, 0.7, 0.0, 0.2];
        let pose = arm_geometry().flange(&q);
        let out = solve_mechanism(
            &arm(),
            &LocalTarget::Pose {
                pose: &pose,
                configuration: None,
            },
            None,
        );
        assert!(out.diagnostics.contains(&Diagnostic::WristSingularity));
    }

    #[test]
    fn linear_axis_joint_target() {
        let out = solve_mechanism(&track(), &LocalTarget::Joints(&[1500.0]), None);
        assert_eq!(out.joints, vec![1500.0]);
        assert_relative_eq!(out.frames[0].translation.x, 1500.0);
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn linear_axis_pose_target_projects_onto_direction() {
        let pose = Frame::translation(1200.0, 50.0, -10.0);
        let out = solve_mechanism(
            &track(),
            &LocalTarget::Pose {
                pose: &pose,
                configuration: None,
            },
            None,
        );
        assert_relative_eq!(out.joints[0], 1200.0);
    }

    #[test]
    fn rotary_axis_pose_target_extracts_angle() {
        let positioner = Mechanism::new(
            "positioner",
            MechanismKind::RotaryAxis {
                axis: Vector3::z_axis(),
            },
            Frame::identity(),
            vec![Joint::revolute(6, -6.3, 6.3)],
        )
        .unwrap();
        let pose = Frame::rotation(Vector3::z() * 0.8);
        let out = solve_mechanism(
            &positioner,
            &LocalTarget::Pose {
                pose: &pose,
                configuration: None,
            },
            None,
        );
        assert_relative_eq!(out.joints[0], 0.8, epsilon = 1e-9);
        assert_relative_eq!(
            linear_distance(&out.frames[0], &Frame::identity()),
            0.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn out_of_travel_axis_value_is_diagnosed() {
        let out = solve_mechanism(&track(), &LocalTarget::Joints(&[5000.0]), None);
        assert_eq!(
            out.diagnostics,
            vec![Diagnostic::OutOfRange {
                joint: 6,
                value: 5000.0,
                min: 0.0,
                max: 4000.0
            }]
        );
    }
}
