//! Posable collision geometry.
//!
//! Shapes are opaque `parry3d` handles; the checker only ever poses them
//! (`world = resolved_frame * local`) and intersection-tests them. Meshes,
//! primitives, and compounds all arrive through the same [`SharedShape`]
//! door.

use parry3d_f64::shape::SharedShape;

use waldo_core::frame::Frame;
use waldo_kinematics::{FrameSlot, KinematicSolution};

/// A shape riding one resolved frame of the group.
#[derive(Clone)]
pub struct LinkGeometry {
    pub name: String,
    /// The solution frame this shape rides.
    pub slot: FrameSlot,
    pub shape: SharedShape,
    /// Shape pose relative to the slot's frame.
    pub local: Frame,
}

impl LinkGeometry {
    #[must_use]
    pub fn new(name: impl Into<String>, slot: FrameSlot, shape: SharedShape) -> Self {
        Self {
            name: name.into(),
            slot,
            shape,
            local: Frame::identity(),
        }
    }

    /// Offset the shape from its slot frame.
    #[must_use]
    pub fn with_local(mut self, local: Frame) -> Self {
        self.local = local;
        self
    }

    /// Group member this shape belongs to (0 is the robot).
    #[must_use]
    pub const fn member(&self) -> usize {
        match self.slot {
            FrameSlot::RobotJoint(_) | FrameSlot::Tool => 0,
            FrameSlot::External(i) => 1 + i,
        }
    }

    /// World pose at a resolved group state, if the state carries the slot.
    #[must_use]
    pub fn posed(&self, solution: &KinematicSolution) -> Option<Frame> {
        solution.frame(self.slot).map(|frame| frame * self.local)
    }
}

impl std::fmt::Debug for LinkGeometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkGeometry")
            .field("name", &self.name)
            .field("slot", &self.slot)
            .field("local", &self.local)
            .finish_non_exhaustive()
    }
}

/// A shape fixed in the world: fixtures, fences, the workpiece table.
#[derive(Clone)]
pub struct EnvironmentGeometry {
    pub name: String,
    pub shape: SharedShape,
    pub pose: Frame,
}

impl EnvironmentGeometry {
    #[must_use]
    pub fn new(name: impl Into<String>, shape: SharedShape, pose: Frame) -> Self {
        Self {
            name: name.into(),
            shape,
            pose,
        }
    }
}

impl std::fmt::Debug for EnvironmentGeometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentGeometry")
            .field("name", &self.name)
            .field("pose", &self.pose)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use waldo_core::configuration::Configuration;

    fn solution() -> KinematicSolution {
        KinematicSolution {
            joints: vec![0.0],
            frames: vec![Frame::translation(100.0, 0.0, 0.0)],
            slots: vec![FrameSlot::External(0)],
            configuration: Configuration::default(),
            diagnostics: vec![],
        }
    }

    #[test]
    fn member_follows_slot() {
        let shape = SharedShape::ball(10.0);
        assert_eq!(
            LinkGeometry::new("wrist", FrameSlot::RobotJoint(4), shape.clone()).member(),
            0
        );
        assert_eq!(LinkGeometry::new("tcp", FrameSlot::Tool, shape.clone()).member(), 0);
        assert_eq!(
            LinkGeometry::new("carriage", FrameSlot::External(1), shape).member(),
            2
        );
    }

    #[test]
    fn posed_composes_slot_frame_and_local() {
        let geometry = LinkGeometry::new(
            "carriage",
            FrameSlot::External(0),
            SharedShape::ball(10.0),
        )
        .with_local(Frame::translation(0.0, 50.0, 0.0));
        let world = geometry.posed(&solution()).unwrap();
        assert_relative_eq!(world.translation.x, 100.0);
        assert_relative_eq!(world.translation.y, 50.0);
    }

    #[test]
    fn posed_is_none_for_missing_slot() {
        let geometry =
            LinkGeometry::new("tool", FrameSlot::Tool, SharedShape::ball(10.0));
        assert!(geometry.posed(&solution()).is_none());
    }
}
