//! Mechanism definitions.
//!
//! A [`Mechanism`] is one kinematic chain: the robot-class spherical-wrist
//! arm, or a simpler external axis (linear track, rotary positioner). The
//! kind set is closed and exhaustively matched everywhere, so adding a
//! mechanism kind is a compile-time-checked exercise.

use nalgebra::{Unit, Vector3};
use serde::{Deserialize, Serialize};

use waldo_core::error::StructuralError;
use waldo_core::frame::Frame;
use waldo_core::joint::Joint;

use crate::opw::ArmGeometry;

/// Closed set of mechanism kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MechanismKind {
    /// Six-axis spherical-wrist arm (robot class).
    SphericalWristArm(ArmGeometry),
    /// Single prismatic external axis along `direction` (external class).
    LinearAxis { direction: Unit<Vector3<f64>> },
    /// Single revolute external axis about `axis` (external class).
    RotaryAxis { axis: Unit<Vector3<f64>> },
}

impl MechanismKind {
    /// Degrees of freedom the kind requires.
    #[must_use]
    pub const fn dof(&self) -> usize {
        match self {
            Self::SphericalWristArm(_) => 6,
            Self::LinearAxis { .. } | Self::RotaryAxis { .. } => 1,
        }
    }

    /// Whether this kind may occupy a group's robot slot.
    #[must_use]
    pub const fn is_robot_class(&self) -> bool {
        matches!(self, Self::SphericalWristArm(_))
    }
}

/// One kinematic chain: kind, static base frame, joints.
///
/// Constructed once at system-definition time and immutable thereafter; a
/// mechanism outlives any single program resolved against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mechanism {
    name: String,
    kind: MechanismKind,
    base: Frame,
    joints: Vec<Joint>,
    movable_base: bool,
}

impl Mechanism {
    /// Build a mechanism, validating the joint count against the kind.
    ///
    /// # Errors
    ///
    /// [`StructuralError::MechanismJointCount`] if the joint count does not
    /// match the kind's degrees of freedom.
    pub fn new(
        name: impl Into<String>,
        kind: MechanismKind,
        base: Frame,
        joints: Vec<Joint>,
    ) -> Result<Self, StructuralError> {
        if joints.len() != kind.dof() {
            return Err(StructuralError::MechanismJointCount {
                expected: kind.dof(),
                got: joints.len(),
            });
        }
        Ok(Self {
            name: name.into(),
            kind,
            base,
            joints,
            movable_base: false,
        })
    }

    /// Mark an external axis as able to move the robot's effective base
    /// (a track carrying the robot). Meaningful for externals only.
    #[must_use]
    pub const fn with_movable_base(mut self) -> Self {
        self.movable_base = true;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn kind(&self) -> &MechanismKind {
        &self.kind
    }

    #[must_use]
    pub const fn base(&self) -> &Frame {
        &self.base
    }

    #[must_use]
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    #[must_use]
    pub fn dof(&self) -> usize {
        self.joints.len()
    }

    #[must_use]
    pub const fn can_move_base(&self) -> bool {
        self.movable_base
    }

    /// Home position of every joint.
    #[must_use]
    pub fn home_joints(&self) -> Vec<f64> {
        self.joints.iter().map(|j| j.home).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
