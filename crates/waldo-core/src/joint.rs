//! Joint definitions.
//!
//! A [`Joint`] is one actuated degree of freedom: revolute (radians) or
//! prismatic (millimetres). Joint indices are unique within a mechanism and
//! stay contiguous across all mechanisms of a group, so a single flat joint
//! vector addresses every member.

use serde::{Deserialize, Serialize};

/// Kind of actuated joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JointKind {
    /// Rotation about an axis; values in radians.
    Revolute,
    /// Translation along an axis; values in millimetres.
    Prismatic,
}

/// One actuated degree of freedom of a mechanism.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Joint {
    /// Group-wide joint index. Stable and contiguous across the group.
    pub index: usize,
    pub kind: JointKind,
    /// Lower position limit (rad or mm).
    pub min: f64,
    /// Upper position limit (rad or mm).
    pub max: f64,
    /// Default (home) position.
    pub home: f64,
    /// Maximum joint speed (rad/s or mm/s), used to derive keyframe times.
    pub max_speed: f64,
}

impl Joint {
    /// Default revolute speed, roughly a mid-size industrial axis.
    pub const DEFAULT_REVOLUTE_SPEED: f64 = 3.0;
    /// Default prismatic speed in mm/s.
    pub const DEFAULT_PRISMATIC_SPEED: f64 = 500.0;

    /// A revolute joint with symmetric limits and zero home position.
    #[must_use]
    pub fn revolute(index: usize, min: f64, max: f64) -> Self {
        Self {
            index,
            kind: JointKind::Revolute,
            min,
            max,
            home: 0.0,
            max_speed: Self::DEFAULT_REVOLUTE_SPEED,
        }
    }

    /// A prismatic joint with the given travel range and zero home position.
    #[must_use]
    pub fn prismatic(index: usize, min: f64, max: f64) -> Self {
        Self {
            index,
            kind: JointKind::Prismatic,
            min,
            max,
            home: 0.0,
            max_speed: Self::DEFAULT_PRISMATIC_SPEED,
        }
    }

    /// Set the home position.
    #[must_use]
    pub const fn with_home(mut self, home: f64) -> Self {
        self.home = home;
        self
    }

    /// Set the maximum speed.
    #[must_use]
    pub const fn with_max_speed(mut self, max_speed: f64) -> Self {
        self.max_speed = max_speed;
        self
    }

    /// Whether `value` lies within the joint's limits (inclusive, with a
    /// small tolerance for values produced by the solvers).
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        const TOL: f64 = 1.0e-9;
        value >= self.min - TOL && value <= self.max + TOL
    }

    /// Clamp `value` to the joint's limits.
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Range span (`max - min`).
    #[must_use]
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Time to travel between two positions at maximum speed.
    #[must_use]
    pub fn travel_time(&self, from: f64, to: f64) -> f64 {
        if self.max_speed <= 0.0 {
            return 0.0;
        }
        (to - from).abs() / self.max_speed
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
