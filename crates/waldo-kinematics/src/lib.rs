//! Kinematic resolution for the waldo offline-programming core.
//!
//! Provides mechanisms (a spherical-wrist 6R arm plus linear/rotary
//! external axes), closed-form forward/inverse solvers with explicit
//! configuration branches, and mechanical groups that resolve coupled
//! mechanisms together.
//!
//! # Architecture
//!
//! ```text
//! Target ──► MechanicalGroup::resolve ──► KinematicSolution
//!                  │
//!                  ├── external axes (own bases, possibly coupled)
//!                  ├── base / frame coupling substitution
//!                  └── solve_mechanism (exhaustive per-kind dispatch)
//! ```
//!
//! Reachability failures are diagnostics carried in the returned
//! [`KinematicSolution`], never errors: a whole program can be resolved in
//! one pass and every problem reported at once.

pub mod group;
pub mod mechanism;
pub mod opw;
pub mod solution;
pub mod solver;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use group::MechanicalGroup;
pub use mechanism::{Mechanism, MechanismKind};
pub use opw::ArmGeometry;
pub use solution::{FrameSlot, KinematicSolution};
pub use solver::{solve_mechanism, LocalTarget, SolverOutput};
