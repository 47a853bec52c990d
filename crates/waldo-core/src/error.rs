use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal program-construction errors.
///
/// These abort keyframe and simulation construction entirely, leaving the
/// program usable only to inspect its errors. They are disjoint from
/// [`Diagnostic`]s, which never abort anything.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum StructuralError {
    #[error("Program has no cell targets")]
    EmptyProgram,

    #[error("Cell {cell} has {got} targets, expected one per group member ({expected})")]
    TargetCountMismatch {
        cell: usize,
        expected: usize,
        got: usize,
    },

    #[error("Cell {cell} addresses member {member}, group has {members} members")]
    MemberOutOfRange {
        cell: usize,
        member: usize,
        members: usize,
    },

    #[error("Cell {cell} is missing a target for member {member}")]
    MissingMemberTarget { cell: usize, member: usize },

    #[error("Joint target for member {member} has {got} values, mechanism has {expected} joints")]
    JointCountMismatch {
        member: usize,
        expected: usize,
        got: usize,
    },

    #[error("Group joint indices are not contiguous: expected {expected}, found {found}")]
    NonContiguousJointIndices { expected: usize, found: usize },

    #[error("Coupling names external {external}, group has {externals} externals")]
    CouplingOutOfRange { external: usize, externals: usize },

    #[error("External {external} is not declared able to carry the robot base")]
    BaseCouplingNotMovable { external: usize },

    #[error("Mechanism kind requires {expected} joints, got {got}")]
    MechanismJointCount { expected: usize, got: usize },

    #[error("Group robot slot requires a robot-class mechanism")]
    RobotClassRequired,

    #[error("Group external slot {slot} requires an external-axis mechanism")]
    ExternalClassRequired { slot: usize },
}

/// Severity of a [`Diagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational; never blocks keyframing, simulation, or downstream
    /// code generation.
    Warning,
    /// A kinematic problem on this target. Still never aborts the pass —
    /// every target is attempted and reported in one sweep.
    Error,
}

/// Per-target kinematic diagnostics.
///
/// Diagnostics are data, not control flow: resolution always returns a
/// solution value and attaches these to it, so a partially invalid program
/// can still be inspected, animated, and reported target by target.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum Diagnostic {
    #[error("Target is out of reach")]
    Unreachable,

    #[error("No valid configuration within joint limits")]
    NoValidConfiguration,

    #[error("Joint {joint} value {value:.4} outside range [{min:.4}, {max:.4}]")]
    OutOfRange {
        joint: usize,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Previous joint count mismatch: expected {expected}, got {got}; hint discarded")]
    PreviousJointCountMismatch { expected: usize, got: usize },

    #[error("Joint {joint} jumps {travel:.4} between targets {from} and {to} (limit {limit:.4})")]
    JointDiscontinuity {
        from: usize,
        to: usize,
        joint: usize,
        travel: f64,
        limit: f64,
    },

    #[error("Tool frame jumps {linear:.1} mm / {angular:.4} rad between targets {from} and {to}")]
    CartesianJump {
        from: usize,
        to: usize,
        linear: f64,
        angular: f64,
    },

    #[error("Configuration changes from {from} to {to} between targets")]
    ConfigurationChange { from: String, to: String },

    #[error("Wrist singularity: joint 5 near zero, joint 4 held")]
    WristSingularity,

    #[error("Name '{name}' exceeds {limit} characters, some controllers truncate it")]
    NameTooLong { name: String, limit: usize },
}

impl Diagnostic {
    /// Severity classification. Warnings are purely informational.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::Unreachable
            | Self::NoValidConfiguration
            | Self::OutOfRange { .. }
            | Self::JointDiscontinuity { .. }
            | Self::CartesianJump { .. } => Severity::Error,
            Self::PreviousJointCountMismatch { .. }
            | Self::ConfigurationChange { .. }
            | Self::WristSingularity
            | Self::NameTooLong { .. } => Severity::Warning,
        }
    }

    /// Whether this diagnostic marks a hard kinematic failure.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.severity(), Severity::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_error_display() {
        assert_eq!(
            StructuralError::EmptyProgram.to_string(),
            "Program has no cell targets"
        );
        assert_eq!(
            StructuralError::TargetCountMismatch {
                cell: 2,
                expected: 3,
                got: 1
            }
            .to_string(),
            "Cell 2 has 1 targets, expected one per group member (3)"
        );
        assert_eq!(
            StructuralError::NonContiguousJointIndices {
                expected: 6,
                found: 8
            }
            .to_string(),
            "Group joint indices are not contiguous: expected 6, found 8"
        );
    }

    #[test]
    fn diagnostic_display() {
        assert_eq!(
            Diagnostic::Unreachable.to_string(),
            "Target is out of reach"
        );
        assert_eq!(
            Diagnostic::OutOfRange {
                joint: 3,
                value: 2.5,
                min: -2.0,
                max: 2.0
            }
            .to_string(),
            "Joint 3 value 2.5000 outside range [-2.0000, 2.0000]"
        );
        assert_eq!(
            Diagnostic::PreviousJointCountMismatch {
                expected: 7,
                got: 6
            }
            .to_string(),
            "Previous joint count mismatch: expected 7, got 6; hint discarded"
        );
    }

    #[test]
    fn cartesian_jump_display() {
        assert_eq!(
            Diagnostic::CartesianJump {
                from: 1,
                to: 2,
                linear: 612.5,
                angular: 0.25
            }
            .to_string(),
            "Tool frame jumps 612.5 mm / 0.2500 rad between targets 1 and 2"
        );
    }

    #[test]
    fn severity_split() {
        assert_eq!(Diagnostic::Unreachable.severity(), Severity::Error);
        assert!(Diagnostic::CartesianJump {
            from: 0,
            to: 1,
            linear: 1200.0,
            angular: 0.1
        }
        .is_error());
        assert!(Diagnostic::Unreachable.is_error());
        assert_eq!(
            Diagnostic::PreviousJointCountMismatch {
                expected: 7,
                got: 6
            }
            .severity(),
            Severity::Warning
        );
        assert_eq!(
            Diagnostic::NameTooLong {
                name: "a".repeat(40),
                limit: 32
            }
            .severity(),
            Severity::Warning
        );
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Warning < Severity::Error);
    }
}
