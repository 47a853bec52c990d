//! Resolved kinematic state of a whole mechanical group.

use serde::{Deserialize, Serialize};

use waldo_core::configuration::Configuration;
use waldo_core::error::Diagnostic;
use waldo_core::frame::{interpolate_frame, Frame};

/// Identifies what a world-space frame in a [`KinematicSolution`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameSlot {
    /// Output frame of external axis `i` (declaration order).
    External(usize),
    /// Robot link frame after joint `i` (0-based, 0..6).
    RobotJoint(usize),
    /// Tool frame (TCP in world space).
    Tool,
}

/// One resolved group state: joint values, world frames, diagnostics.
///
/// Joint values are ordered robot joints first, then externals in
/// declaration order. Frames are ordered externals first, then the six
/// robot link frames, then the tool frame; `slots` gives the parallel
/// labelling so consumers never hard-code that layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KinematicSolution {
    pub joints: Vec<f64>,
    pub frames: Vec<Frame>,
    pub slots: Vec<FrameSlot>,
    pub configuration: Configuration,
    pub diagnostics: Vec<Diagnostic>,
}

impl KinematicSolution {
    /// Whether any diagnostic carries error severity.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// World frame for a given slot, if present.
    #[must_use]
    pub fn frame(&self, slot: FrameSlot) -> Option<&Frame> {
        self.slots
            .iter()
            .position(|s| *s == slot)
            .map(|i| &self.frames[i])
    }

    /// World tool (TCP) frame.
    #[must_use]
    pub fn tool_frame(&self) -> Option<&Frame> {
        self.frame(FrameSlot::Tool)
    }

    /// Interpolate between two solutions at `t` in `[0, 1]`.
    ///
    /// Joints interpolate linearly, frames interpolate with slerp on the
    /// rotation part. The configuration and diagnostics of the endpoint
    /// nearer to `t` are carried over; interpolation never invents new
    /// diagnostics.
    #[must_use]
    pub fn interpolate(&self, other: &Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let joints = self
            .joints
            .iter()
            .zip(&other.joints)
            .map(|(a, b)| a + (b - a) * t)
            .collect();
        let frames = self
            .frames
            .iter()
            .zip(&other.frames)
            .map(|(a, b)| interpolate_frame(a, b, t))
            .collect();
        let nearer = if t < 0.5 { self } else { other };
        Self {
            joints,
            frames,
            slots: self.slots.clone(),
            configuration: nearer.configuration,
            diagnostics: nearer.diagnostics.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
