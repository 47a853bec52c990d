//! Sampled swept-motion collision checking.

use std::collections::HashSet;

use parry3d_f64::query;

use waldo_core::frame::{angular_distance, linear_distance, Frame};
use waldo_kinematics::KinematicSolution;
use waldo_program::Program;

use crate::geometry::{EnvironmentGeometry, LinkGeometry};

/// Sampling tolerances for a collision scan.
///
/// A keyframe segment is subdivided until no two consecutive samples move
/// any resolved frame further than `linear_step` or rotate it further than
/// `angular_step`.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionCheck {
    /// Largest tolerated per-sample translation (mm).
    pub linear_step: f64,
    /// Largest tolerated per-sample rotation (rad).
    pub angular_step: f64,
}

impl Default for CollisionCheck {
    fn default() -> Self {
        Self {
            linear_step: 10.0,
            angular_step: 0.1,
        }
    }
}

/// One intersecting pair, reported at its first detected contact.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionPair {
    pub first: String,
    pub second: String,
    /// Playback time of the first detected contact (s).
    pub time: f64,
    /// Cell the motion was heading towards when contact was detected.
    pub target_index: usize,
}

impl CollisionCheck {
    /// Scan a checked program for intersections.
    ///
    /// Link shapes in `first` are tested against link shapes in `second`,
    /// and shapes from both sets are tested against `environment`, so the
    /// result is symmetric in `first`/`second`. Each unordered pair is
    /// reported once, at the earliest sample where it intersects. Programs
    /// in a structural-error state have no keyframes and scan clean.
    #[must_use]
    pub fn check(
        &self,
        program: &Program,
        first: &[LinkGeometry],
        second: &[LinkGeometry],
        environment: &[EnvironmentGeometry],
    ) -> Vec<CollisionPair> {
        let keyframes = program.keyframes();
        let mut seen = HashSet::new();
        let mut pairs = Vec::new();

        let Some(start) = keyframes.first() else {
            return pairs;
        };
        scan_state(
            &start.solution,
            start.time,
            start.target_index,
            first,
            second,
            environment,
            &mut seen,
            &mut pairs,
        );

        for window in keyframes.windows(2) {
            let (a, b) = (&window[0], &window[1]);
            let steps = self.subdivisions(&a.solution, &b.solution);
            for step in 1..=steps {
                #[allow(clippy::cast_precision_loss)]
                let s = step as f64 / steps as f64;
                let solution = a.solution.interpolate(&b.solution, s);
                let time = a.time + (b.time - a.time) * s;
                scan_state(
                    &solution,
                    time,
                    b.target_index,
                    first,
                    second,
                    environment,
                    &mut seen,
                    &mut pairs,
                );
            }
        }
        pairs
    }

    /// Number of samples so that no frame moves more than a step between
    /// two consecutive ones.
    fn subdivisions(&self, a: &KinematicSolution, b: &KinematicSolution) -> usize {
        let mut ratio = 0.0_f64;
        for (fa, fb) in a.frames.iter().zip(&b.frames) {
            if self.linear_step > 0.0 {
                ratio = ratio.max(linear_distance(fa, fb) / self.linear_step);
            }
            if self.angular_step > 0.0 {
                ratio = ratio.max(angular_distance(fa, fb) / self.angular_step);
            }
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let steps = ratio.ceil() as usize;
        steps.max(1)
    }
}

#[allow(clippy::too_many_arguments)]
fn scan_state(
    solution: &KinematicSolution,
    time: f64,
    target_index: usize,
    first: &[LinkGeometry],
    second: &[LinkGeometry],
    environment: &[EnvironmentGeometry],
    seen: &mut HashSet<(String, String)>,
    pairs: &mut Vec<CollisionPair>,
) {
    for a in first {
        let Some(pose_a) = a.posed(solution) else {
            continue;
        };
        for b in second {
            if a.name == b.name {
                continue;
            }
            let key = pair_key(&a.name, &b.name);
            if seen.contains(&key) {
                continue;
            }
            let Some(pose_b) = b.posed(solution) else {
                continue;
            };
            if intersects(&pose_a, &a.shape, &pose_b, &b.shape) {
                seen.insert(key.clone());
                pairs.push(CollisionPair {
                    first: key.0,
                    second: key.1,
                    time,
                    target_index,
                });
            }
        }
    }
    for link in first.iter().chain(second) {
        let Some(pose) = link.posed(solution) else {
            continue;
        };
        for env in environment {
            let key = pair_key(&link.name, &env.name);
            if seen.contains(&key) {
                continue;
            }
            if intersects(&pose, &link.shape, &env.pose, &env.shape) {
                seen.insert(key.clone());
                pairs.push(CollisionPair {
                    first: key.0,
                    second: key.1,
                    time,
                    target_index,
                });
            }
        }
    }
}

fn intersects(
    pose_a: &Frame,
    shape_a: &parry3d_f64::shape::SharedShape,
    pose_b: &Frame,
    shape_b: &parry3d_f64::shape::SharedShape,
) -> bool {
    // Unsupported shape combinations count as non-colliding.
    query::intersection_test(pose_a, &**shape_a, pose_b, &**shape_b).unwrap_or(false)
}

fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_owned(), b.to_owned())
    } else {
        (b.to_owned(), a.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use parry3d_f64::shape::SharedShape;
    use waldo_core::joint::Joint;
    use waldo_core::target::{ProgramTarget, Target};
    use waldo_kinematics::{
        ArmGeometry, FrameSlot, MechanicalGroup, Mechanism, MechanismKind,
    };
    use waldo_program::{CellTarget, CheckConfig};

    fn group() -> MechanicalGroup {
        let joints = (0..6)
            .map(|i| Joint::revolute(i, -3.0, 3.0))
            .collect::<Vec<_>>();
        let arm = Mechanism::new(
            "arm",
            MechanismKind::SphericalWristArm(ArmGeometry::new(
                25.0, -35.0, 0.0, 400.0, 455.0, 420.0, 80.0,
            )),
            Frame::translation(0.0, 2000.0, 0.0),
            joints,
        )
        .unwrap();
        let track = Mechanism::new(
            "track",
            MechanismKind::LinearAxis {
                direction: Vector3::x_axis(),
            },
            Frame::identity(),
            vec![Joint::prismatic(6, 0.0, 4000.0)],
        )
        .unwrap();
        MechanicalGroup::new("station", arm, vec![track]).unwrap()
    }

    fn cell(index: usize, track: f64) -> CellTarget {
        CellTarget::new(
            index,
            vec![
                ProgramTarget::new(0, Target::joints(vec![0.0; 6])),
                ProgramTarget::new(1, Target::joints(vec![track])),
            ],
        )
    }

    /// Track runs 0 -> 1000 mm in one 2 s segment.
    fn program() -> Program {
        let cells = vec![cell(0, 0.0), cell(1, 1000.0)];
        Program::check(&group(), &cells, &CheckConfig::default())
    }

    fn carriage() -> LinkGeometry {
        LinkGeometry::new("carriage", FrameSlot::External(0), SharedShape::ball(50.0))
    }

    fn wall_at(x: f64) -> EnvironmentGeometry {
        EnvironmentGeometry::new("wall", SharedShape::ball(50.0), Frame::translation(x, 0.0, 0.0))
    }

    #[test]
    fn swept_contact_is_found_between_keyframes() {
        // Contact band is x in (705, 905); both keyframes are outside it,
        // so only the inserted intermediate samples can find it.
        let check = CollisionCheck::default();
        let pairs = check.check(&program(), &[carriage()], &[], &[wall_at(805.0)]);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].first, "carriage");
        assert_eq!(pairs[0].second, "wall");
        assert_eq!(pairs[0].target_index, 1);
        // First contact at the first 10 mm sample past x = 700.
        assert_relative_eq!(pairs[0].time, 1.42, epsilon = 1e-9);
    }

    #[test]
    fn coarse_steps_use_fewer_samples() {
        let fine = CollisionCheck::default();
        let coarse = CollisionCheck {
            linear_step: 600.0,
            angular_step: 0.1,
        };
        assert!(fine.check(&program(), &[carriage()], &[], &[wall_at(805.0)]).len() == 1);
        // At 600 mm per sample the band between the keyframes is skipped.
        assert!(coarse.check(&program(), &[carriage()], &[], &[wall_at(805.0)]).is_empty());
    }

    #[test]
    fn result_is_symmetric_in_first_and_second() {
        let base = LinkGeometry::new(
            "robot-base",
            FrameSlot::RobotJoint(0),
            SharedShape::ball(300.0),
        );
        let probe = LinkGeometry::new(
            "probe",
            FrameSlot::External(0),
            SharedShape::ball(50.0),
        )
        .with_local(Frame::translation(0.0, 1800.0, 400.0));

        let check = CollisionCheck::default();
        let ab = check.check(&program(), &[probe.clone()], &[base.clone()], &[]);
        let ba = check.check(&program(), &[base], &[probe], &[]);
        assert_eq!(ab, ba);
        assert_eq!(ab.len(), 1);
    }

    #[test]
    fn environment_is_tested_against_both_sets() {
        let check = CollisionCheck::default();
        let in_second = check.check(&program(), &[], &[carriage()], &[wall_at(805.0)]);
        assert_eq!(in_second.len(), 1);
    }

    #[test]
    fn contact_at_start_reports_first_keyframe() {
        let check = CollisionCheck::default();
        let pairs = check.check(&program(), &[carriage()], &[], &[wall_at(60.0)]);
        assert_eq!(pairs.len(), 1);
        assert_relative_eq!(pairs[0].time, 0.0);
        assert_eq!(pairs[0].target_index, 0);
    }

    #[test]
    fn pair_is_reported_once() {
        // The carriage stays inside the wall for many samples.
        let check = CollisionCheck::default();
        let pairs = check.check(&program(), &[carriage()], &[], &[wall_at(500.0)]);
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn error_state_program_scans_clean() {
        let empty = Program::check(&group(), &[], &CheckConfig::default());
        let check = CollisionCheck::default();
        assert!(check
            .check(&empty, &[carriage()], &[], &[wall_at(0.0)])
            .is_empty());
    }

    #[test]
    fn same_shape_in_both_sets_is_not_self_tested() {
        let check = CollisionCheck::default();
        let pairs = check.check(&program(), &[carriage()], &[carriage()], &[]);
        assert!(pairs.is_empty());
    }
}
