//! Program validation, keyframing, and playback.
//!
//! A program is an ordered list of cell targets, one target per group
//! member and cell. [`Program::check`] validates the list structurally,
//! resolves every cell with continuity-aware branch selection, and emits a
//! time-addressable keyframe list. [`Simulation`] plays that list back:
//! clamp, binary-search, interpolate, with no kinematics re-run at playback
//! time.
//!
//! Structural errors abort keyframing and leave the program in an
//! error-only state; kinematic diagnostics never abort anything and are
//! attached to the owning keyframe.

pub mod cell;
pub mod check;
pub mod simulation;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use cell::CellTarget;
pub use check::{CheckConfig, Keyframe, Program};
pub use simulation::{Simulation, SimulationPose};
