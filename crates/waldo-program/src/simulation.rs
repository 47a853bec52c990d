//! Time-domain playback over a checked program's keyframes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use waldo_kinematics::KinematicSolution;

use crate::check::{Keyframe, Program};

/// The interpolated state at one playback instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationPose {
    /// Absolute playback time (s).
    pub time: f64,
    /// Cell index of the target the motion is heading towards.
    pub target_index: usize,
    pub solution: KinematicSolution,
}

/// Stateful playback cursor over immutable keyframes.
///
/// Holds the only mutable state of the whole pipeline: the current pose.
/// Not safe for concurrent stepping; concurrent playbacks each take their
/// own `Simulation` over the same shared keyframes. Stepping never re-runs
/// kinematics, it only interpolates what [`Program::check`] precomputed.
#[derive(Debug, Clone)]
pub struct Simulation {
    keyframes: Arc<[Keyframe]>,
    duration: f64,
    cursor: SimulationPose,
}

impl Simulation {
    /// Playback over a checked program.
    ///
    /// Returns `None` for programs in a structural-error state (which have
    /// no keyframes). Kinematic diagnostics do not prevent playback.
    #[must_use]
    pub fn new(program: &Program) -> Option<Self> {
        let keyframes = program.shared_keyframes();
        let first = keyframes.first()?;
        let cursor = SimulationPose {
            time: first.time,
            target_index: first.target_index,
            solution: first.solution.clone(),
        };
        Some(Self {
            duration: program.duration(),
            keyframes,
            cursor,
        })
    }

    /// Total playback time (s).
    #[must_use]
    pub const fn duration(&self) -> f64 {
        self.duration
    }

    /// Move the cursor to `time` and return the interpolated pose.
    ///
    /// With `normalized` set, `time` is a fraction of the total duration.
    /// Out-of-range inputs clamp to the first or last keyframe. Joint
    /// values interpolate linearly and frames interpolate with slerp
    /// between the two bounding keyframes.
    pub fn step(&mut self, time: f64, normalized: bool) -> &SimulationPose {
        let t = if normalized {
            time.clamp(0.0, 1.0) * self.duration
        } else {
            time.clamp(0.0, self.duration)
        };

        let upper = self.keyframes.partition_point(|k| k.time <= t);
        self.cursor = if upper == 0 {
            pose_at(&self.keyframes[0], t)
        } else if upper == self.keyframes.len() {
            pose_at(&self.keyframes[upper - 1], t)
        } else {
            let a = &self.keyframes[upper - 1];
            let b = &self.keyframes[upper];
            let span = b.time - a.time;
            let s = if span > 0.0 { (t - a.time) / span } else { 1.0 };
            SimulationPose {
                time: t,
                target_index: b.target_index,
                solution: a.solution.interpolate(&b.solution, s),
            }
        };
        &self.cursor
    }

    /// The pose produced by the last [`step`](Self::step) call.
    #[must_use]
    pub const fn current_pose(&self) -> &SimulationPose {
        &self.cursor
    }
}

fn pose_at(keyframe: &Keyframe, time: f64) -> SimulationPose {
    SimulationPose {
        time,
        target_index: keyframe.target_index,
        solution: keyframe.solution.clone(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
