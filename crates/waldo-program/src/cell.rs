//! Cell targets: one program step addressing every group member.

use serde::{Deserialize, Serialize};

use waldo_core::target::{ProgramTarget, Target};

/// One step of a program: exactly one target per group member.
///
/// `index` is the cell's position in the program; keyframes and diagnostics
/// refer back to it. Member coverage is a structural invariant checked by
/// [`Program::check`](crate::Program::check), not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellTarget {
    pub index: usize,
    pub targets: Vec<ProgramTarget>,
}

impl CellTarget {
    #[must_use]
    pub const fn new(index: usize, targets: Vec<ProgramTarget>) -> Self {
        Self { index, targets }
    }

    /// The target addressed to a member, if the cell carries one.
    #[must_use]
    pub fn target_for(&self, member: usize) -> Option<&Target> {
        self.targets
            .iter()
            .find(|t| t.member == member)
            .map(|t| &t.target)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
