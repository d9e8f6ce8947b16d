//! Core value structs: coordinates, poses, commands, and run snapshots.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{Action, Condition, Facing, RunStatus};
use crate::ids::RunId;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A grid coordinate. Row 0 is the top row, column 0 the leftmost column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Coord {
    /// Row index.
    pub row: u32,
    /// Column index.
    pub col: u32,
}

impl Coord {
    /// Build a coordinate.
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// The neighbouring coordinate one tile towards `facing`.
    ///
    /// Returns `None` when the step would leave the non-negative quadrant
    /// (or overflow). Upper grid bounds are checked by the grid, not here.
    pub const fn step(self, facing: Facing) -> Option<Self> {
        match facing {
            Facing::Up => match self.row.checked_sub(1) {
                Some(row) => Some(Self::new(row, self.col)),
                None => None,
            },
            Facing::Right => match self.col.checked_add(1) {
                Some(col) => Some(Self::new(self.row, col)),
                None => None,
            },
            Facing::Down => match self.row.checked_add(1) {
                Some(row) => Some(Self::new(row, self.col)),
                None => None,
            },
            Facing::Left => match self.col.checked_sub(1) {
                Some(col) => Some(Self::new(self.row, col)),
                None => None,
            },
        }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

/// Cursor position plus facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Pose {
    /// Current tile.
    pub coord: Coord,
    /// Current facing.
    pub facing: Facing,
}

impl Pose {
    /// Build a pose.
    pub const fn new(coord: Coord, facing: Facing) -> Self {
        Self { coord, facing }
    }

    /// The tile directly ahead, if it is not off the top/left edge.
    pub const fn ahead(self) -> Option<Coord> {
        self.coord.step(self.facing)
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// One placed command: an action with an optional guarding condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Command {
    /// What to do.
    pub action: Action,
    /// `None` runs the action once; a color repeats it while the cursor
    /// stands on that color.
    pub condition: Option<Condition>,
}

impl Command {
    /// An unconditional command.
    pub const fn new(action: Action) -> Self {
        Self {
            action,
            condition: None,
        }
    }

    /// A command repeated while the current tile matches `condition`.
    pub const fn when(action: Action, condition: Condition) -> Self {
        Self {
            action,
            condition: Some(condition),
        }
    }

    /// Shorthand for an unconditional forward move.
    pub const fn forward() -> Self {
        Self::new(Action::Forward)
    }

    /// Shorthand for an unconditional left turn.
    pub const fn left() -> Self {
        Self::new(Action::TurnLeft)
    }

    /// Shorthand for an unconditional right turn.
    pub const fn right() -> Self {
        Self::new(Action::TurnRight)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.condition {
            Some(condition) => write!(f, "if {condition} {{ {} }}", self.action),
            None => write!(f, "{}", self.action),
        }
    }
}

// ---------------------------------------------------------------------------
// Run observation
// ---------------------------------------------------------------------------

/// World state after one atomic step (or at a terminal status).
///
/// This is what the renderer animates. `trace` holds every atomic command
/// executed so far, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RunSnapshot {
    /// The run that produced this snapshot.
    pub run_id: RunId,
    /// The level being played.
    pub level_id: u32,
    /// Atomic steps taken so far.
    pub step: u32,
    /// Cursor pose after the step.
    pub pose: Pose,
    /// Markers collected so far.
    pub collected: BTreeSet<Coord>,
    /// Atomic commands executed so far.
    pub trace: Vec<Command>,
    /// Status after the step.
    pub status: RunStatus,
}

impl RunSnapshot {
    /// The display state before a run: cursor at `start`, nothing
    /// collected, status [`RunStatus::Idle`].
    pub const fn idle(run_id: RunId, level_id: u32, start: Pose) -> Self {
        Self {
            run_id,
            level_id,
            step: 0,
            pose: start,
            collected: BTreeSet::new(),
            trace: Vec::new(),
            status: RunStatus::Idle,
        }
    }
}

/// Final outcome of one run, delivered once when it stops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RunReport {
    /// The run.
    pub run_id: RunId,
    /// The level that was played.
    pub level_id: u32,
    /// Terminal status.
    pub status: RunStatus,
    /// Atomic steps taken.
    pub steps: u32,
    /// Function calls made.
    pub calls: u32,
    /// Final cursor pose.
    pub pose: Pose,
    /// Markers collected.
    pub collected: BTreeSet<Coord>,
    /// Highest unlocked level after this run, when it succeeded and the
    /// unlock was recorded.
    pub highest_unlocked: Option<u32>,
    /// Wall-clock time the run stopped.
    pub finished_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::FunctionId;

    #[test]
    fn steps_follow_unit_vectors() {
        let c = Coord::new(2, 3);
        assert_eq!(c.step(Facing::Up), Some(Coord::new(1, 3)));
        assert_eq!(c.step(Facing::Right), Some(Coord::new(2, 4)));
        assert_eq!(c.step(Facing::Down), Some(Coord::new(3, 3)));
        assert_eq!(c.step(Facing::Left), Some(Coord::new(2, 2)));
    }

    #[test]
    fn steps_off_the_top_left_edge_are_none() {
        assert_eq!(Coord::new(0, 4).step(Facing::Up), None);
        assert_eq!(Coord::new(4, 0).step(Facing::Left), None);
    }

    #[test]
    fn commands_display_in_text_notation() {
        assert_eq!(Command::forward().to_string(), "F");
        assert_eq!(Command::new(Action::Call(FunctionId::F4)).to_string(), "F4");
        assert_eq!(
            Command::when(Action::TurnRight, Condition::Blue).to_string(),
            "if blue { R }"
        );
    }
}
