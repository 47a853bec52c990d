//! Shared data model for the waldo offline-programming core.
//!
//! Provides the types every other waldo crate builds on: reference frames
//! and rigid-transform helpers, joint definitions, targets and tools,
//! inverse-kinematics configuration tags, and the two disjoint error
//! classes (fatal structural errors vs. per-target kinematic diagnostics).

pub mod configuration;
pub mod error;
pub mod frame;
pub mod joint;
pub mod target;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use configuration::Configuration;
pub use error::{Diagnostic, Severity, StructuralError};
pub use frame::{
    angular_distance, frame_from_xyz_rpy, interpolate_frame, linear_distance, Frame,
};
pub use joint::{Joint, JointKind};
pub use target::{ProgramTarget, ReferenceFrame, Target, TargetKind, Tool};
