//! Sampled collision detection for checked programs.
//!
//! Link shapes ride resolved solution frames, environment shapes sit in
//! the world, and [`CollisionCheck`] walks the keyframe timeline with
//! step-refined subdivision so no swept interval is under-sampled relative
//! to the requested linear/angular tolerance. Detection is sampled, not
//! continuous: a contact thinner than the step can pass between samples,
//! which is the accepted trade for mesh-agnostic shapes and a stateless
//! scan.

pub mod check;
pub mod geometry;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use check::{CollisionCheck, CollisionPair};
pub use geometry::{EnvironmentGeometry, LinkGeometry};
