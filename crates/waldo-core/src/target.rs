//! Targets: where a mechanism should go.
//!
//! A [`Target`] is either joint-space (one explicit value per joint) or
//! Cartesian (a pose plus tool, optionally pinned to one IK branch). Its
//! [`ReferenceFrame`] says which coordinate system the Cartesian pose is
//! expressed in — the world, a fixed user frame, or the moving output frame
//! of a coupled external mechanism.
//!
//! Targets are immutable to callers. Coupling resolution never rewrites a
//! target in place; the re-oriented frame is computed as a separate value
//! and handed to the solver.

use serde::{Deserialize, Serialize};

use crate::configuration::Configuration;
use crate::frame::Frame;

/// A tool mounted on the robot flange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    /// Tool centre point, relative to the flange.
    pub tcp: Frame,
}

impl Tool {
    #[must_use]
    pub fn new(name: impl Into<String>, tcp: Frame) -> Self {
        Self {
            name: name.into(),
            tcp,
        }
    }

    /// The identity tool: TCP at the flange.
    #[must_use]
    pub fn flange() -> Self {
        Self {
            name: "flange".to_owned(),
            tcp: Frame::identity(),
        }
    }
}

impl Default for Tool {
    fn default() -> Self {
        Self::flange()
    }
}

/// Coordinate system a Cartesian target pose is expressed in.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum ReferenceFrame {
    /// The world (robot-cell) frame.
    #[default]
    World,
    /// A fixed user frame in world coordinates.
    Fixed(Frame),
    /// The resolved output frame of the group's external mechanism with
    /// this index. The external re-orients the coordinate system the target
    /// is expressed in without moving the robot's physical base.
    Coupled { external: usize },
}

/// Joint-space or Cartesian goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TargetKind {
    /// Explicit value per joint of the addressed mechanism.
    Joint(Vec<f64>),
    /// A pose for the TCP, optionally pinned to one IK branch.
    Cartesian {
        pose: Frame,
        configuration: Option<Configuration>,
    },
}

/// One goal for one mechanism.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub kind: TargetKind,
    pub tool: Tool,
    pub reference: ReferenceFrame,
}

impl Target {
    /// A joint-space target with the flange tool.
    #[must_use]
    pub fn joints(values: Vec<f64>) -> Self {
        Self {
            kind: TargetKind::Joint(values),
            tool: Tool::flange(),
            reference: ReferenceFrame::World,
        }
    }

    /// A world-frame Cartesian target with the flange tool and free
    /// configuration.
    #[must_use]
    pub fn cartesian(pose: Frame) -> Self {
        Self {
            kind: TargetKind::Cartesian {
                pose,
                configuration: None,
            },
            tool: Tool::flange(),
            reference: ReferenceFrame::World,
        }
    }

    #[must_use]
    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tool = tool;
        self
    }

    #[must_use]
    pub fn with_reference(mut self, reference: ReferenceFrame) -> Self {
        self.reference = reference;
        self
    }

    /// Pin a Cartesian target to one IK branch. No-op for joint targets.
    #[must_use]
    pub fn with_configuration(mut self, config: Configuration) -> Self {
        if let TargetKind::Cartesian { configuration, .. } = &mut self.kind {
            *configuration = Some(config);
        }
        self
    }

    /// The declared configuration, if any.
    #[must_use]
    pub fn configuration(&self) -> Option<Configuration> {
        match &self.kind {
            TargetKind::Cartesian { configuration, .. } => *configuration,
            TargetKind::Joint(_) => None,
        }
    }

    #[must_use]
    pub const fn is_cartesian(&self) -> bool {
        matches!(self.kind, TargetKind::Cartesian { .. })
    }
}

/// A [`Target`] bound to a mechanism-group member within a cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramTarget {
    /// Group member index: 0 is the robot, `1 + i` is external `i`.
    pub member: usize,
    pub target: Target,
}

impl ProgramTarget {
    #[must_use]
    pub const fn new(member: usize, target: Target) -> Self {
        Self { member, target }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
