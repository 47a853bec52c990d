//! Inverse-kinematics configuration tags.
//!
//! A spherical-wrist 6R arm reaches most poses in eight distinct joint
//! configurations: shoulder front/rear, elbow up/down, wrist straight/
//! flipped. A [`Configuration`] names one branch so consecutive targets can
//! be resolved on the same branch and so callers can pin a branch
//! explicitly.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Discrete inverse-kinematics branch of a spherical-wrist arm.
///
/// The default (all `false`) is shoulder-front, elbow-up, wrist-straight.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Configuration {
    /// Wrist centre behind the shoulder axis.
    pub rear_shoulder: bool,
    /// Elbow below the shoulder-to-wrist line.
    pub elbow_down: bool,
    /// Wrist pitch negative (flipped solution).
    pub wrist_flip: bool,
}

impl Configuration {
    /// Total number of branches.
    pub const COUNT: usize = 8;

    #[must_use]
    pub const fn new(rear_shoulder: bool, elbow_down: bool, wrist_flip: bool) -> Self {
        Self {
            rear_shoulder,
            elbow_down,
            wrist_flip,
        }
    }

    /// Branch index in `0..8`. Bit order (most significant first):
    /// rear-shoulder, elbow-down, wrist-flip. This is also the deterministic
    /// tie-break order when no continuity hint selects a branch.
    #[must_use]
    pub const fn index(self) -> usize {
        ((self.rear_shoulder as usize) << 2)
            | ((self.elbow_down as usize) << 1)
            | (self.wrist_flip as usize)
    }

    /// Inverse of [`index`](Self::index).
    ///
    /// # Panics
    ///
    /// Panics if `index >= 8`.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        assert!(index < Self::COUNT, "configuration index out of range");
        Self {
            rear_shoulder: index & 0b100 != 0,
            elbow_down: index & 0b010 != 0,
            wrist_flip: index & 0b001 != 0,
        }
    }

    /// All eight branches in tie-break order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..Self::COUNT).map(Self::from_index)
    }
}

impl fmt::Display for Configuration {
    /// Three-letter tag: shoulder `F`/`R`, elbow `U`/`D`, wrist `S`/`X`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            if self.rear_shoulder { 'R' } else { 'F' },
            if self.elbow_down { 'D' } else { 'U' },
            if self.wrist_flip { 'X' } else { 'S' },
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_roundtrip_all_branches() {
        for i in 0..Configuration::COUNT {
            assert_eq!(Configuration::from_index(i).index(), i);
        }
    }

    #[test]
    fn default_is_index_zero() {
        assert_eq!(Configuration::default().index(), 0);
    }

    #[test]
    fn bit_order() {
        let c = Configuration::new(true, false, true);
        assert_eq!(c.index(), 0b101);
    }

    #[test]
    #[should_panic(expected = "configuration index out of range")]
    fn from_index_out_of_range_panics() {
        let _ = Configuration::from_index(8);
    }

    #[test]
    fn all_yields_tie_break_order() {
        let indices: Vec<usize> = Configuration::all().map(Configuration::index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn ord_matches_index_order() {
        // Tie-break "lowest index wins" can rely on derived Ord.
        let mut all: Vec<Configuration> = Configuration::all().collect();
        all.sort();
        let indices: Vec<usize> = all.iter().map(|c| c.index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn display_tags() {
        assert_eq!(Configuration::default().to_string(), "FUS");
        assert_eq!(Configuration::new(true, true, true).to_string(), "RDX");
        assert_eq!(Configuration::new(false, true, false).to_string(), "FDS");
    }

    #[test]
    fn serde_roundtrip() {
        let c = Configuration::new(true, false, true);
        let json = serde_json::to_string(&c).unwrap();
        let c2: Configuration = serde_json::from_str(&json).unwrap();
        assert_eq!(c, c2);
    }
}
