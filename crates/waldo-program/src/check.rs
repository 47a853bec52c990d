//! Program checking: structural validation, resolution, keyframing.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use waldo_core::configuration::Configuration;
use waldo_core::error::{Diagnostic, StructuralError};
use waldo_core::frame::{angular_distance, linear_distance, Frame};
use waldo_core::joint::{Joint, JointKind};
use waldo_core::target::{Target, TargetKind};
use waldo_kinematics::{KinematicSolution, MechanicalGroup};

use crate::cell::CellTarget;

/// Tolerances for program checking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Largest tolerated revolute travel between consecutive targets (rad).
    pub max_revolute_jump: f64,
    /// Largest tolerated prismatic travel between consecutive targets (mm).
    pub max_prismatic_jump: f64,
    /// Largest tolerated tool position jump between consecutive targets (mm).
    pub max_linear_jump: f64,
    /// Largest tolerated tool reorientation between consecutive targets (rad).
    pub max_angular_jump: f64,
    /// Floor for a keyframe segment's duration (s).
    pub min_segment_time: f64,
    /// Longest tool name some controllers accept without truncating.
    pub max_name_length: usize,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            max_revolute_jump: std::f64::consts::PI,
            max_prismatic_jump: 1000.0,
            max_linear_jump: 500.0,
            max_angular_jump: 2.0,
            min_segment_time: 1.0e-3,
            max_name_length: 32,
        }
    }
}

/// One time-stamped resolved program state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Elapsed time at which this state is reached (s). Non-decreasing
    /// across the program.
    pub time: f64,
    /// Index of the cell target this state resolves.
    pub target_index: usize,
    pub solution: KinematicSolution,
}

/// A checked program: corrected targets, keyframes, structural errors.
///
/// Built by [`Program::check`] in one pass. If any structural error is
/// found, no keyframes are produced and the program is usable only to
/// inspect `errors()`; kinematic diagnostics by contrast live on the
/// keyframes and never empty the program.
#[derive(Debug, Clone)]
pub struct Program {
    errors: Vec<StructuralError>,
    corrected: Vec<CellTarget>,
    keyframes: Arc<[Keyframe]>,
}

impl Program {
    /// Validate and resolve a program against a group.
    ///
    /// Structural validation walks every cell and collects every error
    /// before giving up; resolution then walks every cell feeding each
    /// solution's joints forward as the next cell's continuity hint, so
    /// Cartesian targets without a pinned configuration follow the branch
    /// of the preceding state. Configurations forced this way are recorded
    /// back onto the corrected target list.
    #[must_use]
    pub fn check(group: &MechanicalGroup, cells: &[CellTarget], config: &CheckConfig) -> Self {
        let errors = validate_structure(group, cells);
        if !errors.is_empty() {
            return Self {
                errors,
                corrected: Vec::new(),
                keyframes: Vec::new().into(),
            };
        }

        let joints: Vec<&Joint> = group
            .robot()
            .joints()
            .iter()
            .chain(group.externals().iter().flat_map(|m| m.joints()))
            .collect();

        let mut corrected = Vec::with_capacity(cells.len());
        let mut keyframes = Vec::with_capacity(cells.len());
        let mut previous: Option<PreviousState> = None;
        let mut time = 0.0;

        for cell in cells {
            let ordered = ordered_targets(group, cell);
            let mut solution =
                group.resolve(&ordered, previous.as_ref().map(|p| p.joints.as_slice()));

            for target in &ordered {
                if target.tool.name.len() > config.max_name_length {
                    solution.diagnostics.push(Diagnostic::NameTooLong {
                        name: target.tool.name.clone(),
                        limit: config.max_name_length,
                    });
                }
            }

            if let Some(prev) = &previous {
                let mut dt = 0.0_f64;
                for ((joint, a), b) in joints.iter().zip(&prev.joints).zip(&solution.joints) {
                    let travel = (b - a).abs();
                    let limit = match joint.kind {
                        JointKind::Revolute => config.max_revolute_jump,
                        JointKind::Prismatic => config.max_prismatic_jump,
                    };
                    if travel > limit {
                        solution.diagnostics.push(Diagnostic::JointDiscontinuity {
                            from: prev.index,
                            to: cell.index,
                            joint: joint.index,
                            travel,
                            limit,
                        });
                    }
                    dt = dt.max(joint.travel_time(*a, *b));
                }
                let jump = prev
                    .tool
                    .as_ref()
                    .zip(solution.tool_frame())
                    .map(|(a, b)| (linear_distance(a, b), angular_distance(a, b)));
                if let Some((linear, angular)) = jump {
                    if linear > config.max_linear_jump || angular > config.max_angular_jump {
                        solution.diagnostics.push(Diagnostic::CartesianJump {
                            from: prev.index,
                            to: cell.index,
                            linear,
                            angular,
                        });
                    }
                }
                if prev.configuration != solution.configuration {
                    solution.diagnostics.push(Diagnostic::ConfigurationChange {
                        from: prev.configuration.to_string(),
                        to: solution.configuration.to_string(),
                    });
                }
                time += dt.max(config.min_segment_time);
            }

            corrected.push(corrected_cell(cell, &solution));
            previous = Some(PreviousState {
                index: cell.index,
                joints: solution.joints.clone(),
                configuration: solution.configuration,
                tool: solution.tool_frame().copied(),
            });
            keyframes.push(Keyframe {
                time,
                target_index: cell.index,
                solution,
            });
        }

        Self {
            errors: Vec::new(),
            corrected,
            keyframes: keyframes.into(),
        }
    }

    #[must_use]
    pub fn errors(&self) -> &[StructuralError] {
        &self.errors
    }

    /// Whether the program survived structural validation.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Shared handle to the keyframes, for independent playbacks.
    #[must_use]
    pub fn shared_keyframes(&self) -> Arc<[Keyframe]> {
        Arc::clone(&self.keyframes)
    }

    /// The input cells with continuity-forced configurations pinned.
    #[must_use]
    pub fn corrected_targets(&self) -> &[CellTarget] {
        &self.corrected
    }

    /// Total program time (s); zero for empty or error-state programs.
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.keyframes.last().map_or(0.0, |k| k.time)
    }

    /// Every kinematic diagnostic, paired with the owning cell index.
    pub fn diagnostics(&self) -> impl Iterator<Item = (usize, &Diagnostic)> {
        self.keyframes
            .iter()
            .flat_map(|k| k.solution.diagnostics.iter().map(move |d| (k.target_index, d)))
    }
}

// ---- structural validation ----

fn validate_structure(group: &MechanicalGroup, cells: &[CellTarget]) -> Vec<StructuralError> {
    let mut errors = Vec::new();
    if cells.is_empty() {
        errors.push(StructuralError::EmptyProgram);
    }
    let members = group.members();
    for cell in cells {
        if cell.targets.len() != members {
            errors.push(StructuralError::TargetCountMismatch {
                cell: cell.index,
                expected: members,
                got: cell.targets.len(),
            });
        }
        for program_target in &cell.targets {
            match group.member(program_target.member) {
                None => errors.push(StructuralError::MemberOutOfRange {
                    cell: cell.index,
                    member: program_target.member,
                    members,
                }),
                Some(mechanism) => {
                    if let TargetKind::Joint(values) = &program_target.target.kind {
                        if values.len() != mechanism.dof() {
                            errors.push(StructuralError::JointCountMismatch {
                                member: program_target.member,
                                expected: mechanism.dof(),
                                got: values.len(),
                            });
                        }
                    }
                }
            }
        }
        for member in 0..members {
            if cell.target_for(member).is_none() {
                errors.push(StructuralError::MissingMemberTarget {
                    cell: cell.index,
                    member,
                });
            }
        }
    }
    errors
}

// ---- resolution helpers ----

/// Resolved state of the preceding cell, fed forward for continuity checks.
struct PreviousState {
    index: usize,
    joints: Vec<f64>,
    configuration: Configuration,
    tool: Option<Frame>,
}

/// Targets of a cell in member order, for [`MechanicalGroup::resolve`].
///
/// Member coverage was validated beforehand; a hole would only appear on a
/// malformed cell and is filled with a home joint target.
fn ordered_targets(group: &MechanicalGroup, cell: &CellTarget) -> Vec<Target> {
    (0..group.members())
        .map(|member| {
            cell.target_for(member).cloned().unwrap_or_else(|| {
                let home = group
                    .member(member)
                    .map_or_else(Vec::new, |m| m.home_joints());
                Target::joints(home)
            })
        })
        .collect()
}

/// The cell with the solved configuration pinned onto an unpinned robot
/// Cartesian target.
fn corrected_cell(cell: &CellTarget, solution: &KinematicSolution) -> CellTarget {
    let mut corrected = cell.clone();
    for program_target in &mut corrected.targets {
        if program_target.member == 0
            && program_target.target.is_cartesian()
            && program_target.target.configuration().is_none()
        {
            program_target.target = program_target
                .target
                .clone()
                .with_configuration(solution.configuration);
        }
    }
    corrected
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
