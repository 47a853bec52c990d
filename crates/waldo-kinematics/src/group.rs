//! Mechanical groups: one robot plus coordinated external axes.
//!
//! The group owns coupling: a track can carry the robot's base, a
//! positioner can carry the default workobject, and any Cartesian target
//! can reference an external's moving output frame. Resolution order is
//! fixed: externals first, then coupling substitution, then the robot.

use serde::{Deserialize, Serialize};

use waldo_core::error::{Diagnostic, StructuralError};
use waldo_core::frame::Frame;
use waldo_core::target::{ReferenceFrame, Target, TargetKind};

use crate::mechanism::Mechanism;
use crate::solution::{FrameSlot, KinematicSolution};
use crate::solver::{solve_mechanism, LocalTarget, SolverOutput};

/// A robot and its coordinated external axes, resolved as one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MechanicalGroup {
    name: String,
    robot: Mechanism,
    externals: Vec<Mechanism>,
    /// External whose output frame carries the robot's base.
    base_coupling: Option<usize>,
    /// External whose output frame carries world-referenced Cartesian
    /// targets (a positioner holding the workpiece).
    frame_coupling: Option<usize>,
}

impl MechanicalGroup {
    /// Build a group, validating member classes and joint-index layout.
    ///
    /// The robot's joints must be indexed `0..6` and each external's joints
    /// must continue the sequence in declaration order, so one flat joint
    /// vector addresses the whole group.
    ///
    /// # Errors
    ///
    /// [`StructuralError::RobotClassRequired`], `ExternalClassRequired`, or
    /// `NonContiguousJointIndices`.
    pub fn new(
        name: impl Into<String>,
        robot: Mechanism,
        externals: Vec<Mechanism>,
    ) -> Result<Self, StructuralError> {
        if !robot.kind().is_robot_class() {
            return Err(StructuralError::RobotClassRequired);
        }
        for (slot, external) in externals.iter().enumerate() {
            if external.kind().is_robot_class() {
                return Err(StructuralError::ExternalClassRequired { slot });
            }
        }
        let mut expected = 0;
        for joint in robot
            .joints()
            .iter()
            .chain(externals.iter().flat_map(|m| m.joints()))
        {
            if joint.index != expected {
                return Err(StructuralError::NonContiguousJointIndices {
                    expected,
                    found: joint.index,
                });
            }
            expected += 1;
        }
        Ok(Self {
            name: name.into(),
            robot,
            externals,
            base_coupling: None,
            frame_coupling: None,
        })
    }

    /// Let external `external` carry the robot's base (a track or gantry).
    ///
    /// # Errors
    ///
    /// [`StructuralError::CouplingOutOfRange`] if the index is not an
    /// external of this group, `BaseCouplingNotMovable` if the external was
    /// not declared able to carry the base.
    pub fn with_base_coupling(mut self, external: usize) -> Result<Self, StructuralError> {
        self.check_external(external)?;
        if !self.externals[external].can_move_base() {
            return Err(StructuralError::BaseCouplingNotMovable { external });
        }
        self.base_coupling = Some(external);
        Ok(self)
    }

    /// Let external `external` carry world-referenced Cartesian targets
    /// (a positioner holding the workpiece).
    ///
    /// # Errors
    ///
    /// [`StructuralError::CouplingOutOfRange`] if the index is not an
    /// external of this group.
    pub fn with_frame_coupling(mut self, external: usize) -> Result<Self, StructuralError> {
        self.check_external(external)?;
        self.frame_coupling = Some(external);
        Ok(self)
    }

    fn check_external(&self, external: usize) -> Result<(), StructuralError> {
        if external >= self.externals.len() {
            return Err(StructuralError::CouplingOutOfRange {
                external,
                externals: self.externals.len(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn robot(&self) -> &Mechanism {
        &self.robot
    }

    #[must_use]
    pub fn externals(&self) -> &[Mechanism] {
        &self.externals
    }

    /// Member count: the robot plus every external.
    #[must_use]
    pub fn members(&self) -> usize {
        1 + self.externals.len()
    }

    /// Total degrees of freedom across all members.
    #[must_use]
    pub fn dof(&self) -> usize {
        self.robot.dof() + self.externals.iter().map(Mechanism::dof).sum::<usize>()
    }

    /// Mechanism for a member index (`0` is the robot, `1 + i` external `i`).
    #[must_use]
    pub fn member(&self, index: usize) -> Option<&Mechanism> {
        if index == 0 {
            Some(&self.robot)
        } else {
            self.externals.get(index - 1)
        }
    }

    /// Home joint vector for the whole group.
    #[must_use]
    pub fn home_joints(&self) -> Vec<f64> {
        let mut joints = self.robot.home_joints();
        for external in &self.externals {
            joints.extend(external.home_joints());
        }
        joints
    }

    /// Resolve one target per member into a single group state.
    ///
    /// `targets` is ordered by member index, `previous` is a full group
    /// joint vector from the preceding state. Externals resolve first so
    /// that base and frame coupling see their final output frames, then
    /// the robot target is rewritten into its (possibly moved) base frame
    /// and solved. Failures surface as diagnostics on the returned
    /// solution, never as errors.
    #[must_use]
    pub fn resolve(&self, targets: &[Target], previous: Option<&[f64]>) -> KinematicSolution {
        let mut diagnostics = Vec::new();
        let previous = match previous {
            Some(p) if p.len() != self.dof() => {
                diagnostics.push(Diagnostic::PreviousJointCountMismatch {
                    expected: self.dof(),
                    got: p.len(),
                });
                None
            }
            other => other,
        };

        // Externals first: their world frames feed coupling substitution.
        let mut external_joints = Vec::new();
        let mut external_frames = Vec::new();
        let mut offset = self.robot.dof();
        for (index, external) in self.externals.iter().enumerate() {
            let prev = previous.map(|p| &p[offset..offset + external.dof()]);
            let out = match targets.get(1 + index).map(|t| &t.kind) {
                Some(TargetKind::Joint(values)) => {
                    solve_mechanism(external, &LocalTarget::Joints(values), prev)
                }
                Some(TargetKind::Cartesian { pose, .. }) => {
                    let local = external.base().inverse() * pose;
                    solve_mechanism(
                        external,
                        &LocalTarget::Pose {
                            pose: &local,
                            configuration: None,
                        },
                        prev,
                    )
                }
                None => {
                    let home = external.home_joints();
                    solve_mechanism(external, &LocalTarget::Joints(&home), prev)
                }
            };
            external_frames.push(external.base() * out.frames[0]);
            external_joints.extend(out.joints);
            diagnostics.extend(out.diagnostics);
            offset += external.dof();
        }

        // Coupling substitution, then the robot.
        let robot_base = match self.base_coupling {
            Some(i) => external_frames[i] * self.robot.base(),
            None => *self.robot.base(),
        };
        let robot_target = targets.first();
        let tcp = robot_target.map_or_else(Frame::identity, |t| t.tool.tcp);
        let robot_prev = previous.map(|p| &p[..self.robot.dof()]);
        let out = match robot_target.map(|t| &t.kind) {
            Some(TargetKind::Joint(values)) => {
                solve_mechanism(&self.robot, &LocalTarget::Joints(values), robot_prev)
            }
            Some(TargetKind::Cartesian {
                pose,
                configuration,
            }) => {
                let reference = self.reference_frame(robot_target, &external_frames);
                let flange_world = reference * pose * tcp.inverse();
                let local = robot_base.inverse() * flange_world;
                solve_mechanism(
                    &self.robot,
                    &LocalTarget::Pose {
                        pose: &local,
                        configuration: *configuration,
                    },
                    robot_prev,
                )
            }
            None => {
                let home = self.robot.home_joints();
                solve_mechanism(&self.robot, &LocalTarget::Joints(&home), robot_prev)
            }
        };

        self.assemble(out, external_joints, external_frames, robot_base, tcp, diagnostics)
    }

    /// World frame the robot target's Cartesian pose is expressed in.
    fn reference_frame(&self, target: Option<&Target>, external_frames: &[Frame]) -> Frame {
        let reference = target.map_or(&ReferenceFrame::World, |t| &t.reference);
        match reference {
            ReferenceFrame::World => match self.frame_coupling {
                Some(i) => external_frames[i],
                None => Frame::identity(),
            },
            ReferenceFrame::Fixed(frame) => *frame,
            ReferenceFrame::Coupled { external } => external_frames
                .get(*external)
                .copied()
                .unwrap_or_else(Frame::identity),
        }
    }

    fn assemble(
        &self,
        robot: SolverOutput,
        external_joints: Vec<f64>,
        external_frames: Vec<Frame>,
        robot_base: Frame,
        tcp: Frame,
        mut diagnostics: Vec<Diagnostic>,
    ) -> KinematicSolution {
        let mut joints = robot.joints;
        joints.extend(external_joints);

        let mut frames = Vec::with_capacity(external_frames.len() + 7);
        let mut slots = Vec::with_capacity(frames.capacity());
        for (i, frame) in external_frames.into_iter().enumerate() {
            frames.push(frame);
            slots.push(FrameSlot::External(i));
        }
        // robot.frames holds the six joint frames plus the flange.
        for (i, frame) in robot.frames.iter().take(6).enumerate() {
            frames.push(robot_base * frame);
            slots.push(FrameSlot::RobotJoint(i));
        }
        frames.push(robot_base * robot.frames[6] * tcp);
        slots.push(FrameSlot::Tool);

        diagnostics.extend(robot.diagnostics);
        KinematicSolution {
            joints,
            frames,
            slots,
            configuration: robot.configuration,
            diagnostics,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
