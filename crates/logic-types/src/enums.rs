//! Enumeration types for the Logic Grid puzzle.
//!
//! Cell kinds, facings, conditions, function slots, actions and run
//! statuses. Every enum here is a closed set known at design time.

use core::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

/// The kind of a single grid tile.
///
/// Walls are impassable; every other kind can be walked on. The three
/// colored kinds are the inputs to slot conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum CellKind {
    /// Open floor outside the drawn path (`.`).
    Empty,
    /// Impassable wall (`W`).
    Wall,
    /// Ordinary path tile (`G`).
    Path,
    /// Red trigger tile (`R`).
    Red,
    /// Blue trigger tile (`B`).
    Blue,
    /// Green trigger tile (`K`).
    Green,
    /// Star decoration tile (`S`).
    Star,
    /// Goal decoration tile (`Y`).
    Goal,
}

impl CellKind {
    /// Parse a grid character. Returns `None` for unknown characters.
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '.' => Some(Self::Empty),
            'W' => Some(Self::Wall),
            'G' => Some(Self::Path),
            'R' => Some(Self::Red),
            'B' => Some(Self::Blue),
            'K' => Some(Self::Green),
            'S' => Some(Self::Star),
            'Y' => Some(Self::Goal),
            _ => None,
        }
    }

    /// The authoring character for this kind.
    pub const fn as_char(self) -> char {
        match self {
            Self::Empty => '.',
            Self::Wall => 'W',
            Self::Path => 'G',
            Self::Red => 'R',
            Self::Blue => 'B',
            Self::Green => 'K',
            Self::Star => 'S',
            Self::Goal => 'Y',
        }
    }

    /// Whether the cursor may stand on this tile.
    pub const fn is_passable(self) -> bool {
        !matches!(self, Self::Wall)
    }

    /// Whether this tile satisfies the given condition color.
    pub const fn matches(self, condition: Condition) -> bool {
        matches!(
            (self, condition),
            (Self::Red, Condition::Red)
                | (Self::Blue, Condition::Blue)
                | (Self::Green, Condition::Green)
        )
    }
}

// ---------------------------------------------------------------------------
// Facing
// ---------------------------------------------------------------------------

/// Cursor facing, a 4-cycle in clockwise order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Facing {
    /// Towards row 0.
    Up,
    /// Towards the last column.
    Right,
    /// Towards the last row.
    Down,
    /// Towards column 0.
    Left,
}

impl Facing {
    /// All facings in clockwise order starting from [`Facing::Up`].
    pub const ALL: [Self; 4] = [Self::Up, Self::Right, Self::Down, Self::Left];

    /// Position in the 4-cycle (up = 0, right = 1, down = 2, left = 3).
    pub const fn index(self) -> u8 {
        match self {
            Self::Up => 0,
            Self::Right => 1,
            Self::Down => 2,
            Self::Left => 3,
        }
    }

    /// Inverse of [`Facing::index`], taken modulo 4.
    pub const fn from_index(index: u8) -> Self {
        match index % 4 {
            0 => Self::Up,
            1 => Self::Right,
            2 => Self::Down,
            _ => Self::Left,
        }
    }

    /// Rotate a quarter turn clockwise: `(facing + 1) mod 4`.
    pub const fn turn_right(self) -> Self {
        Self::from_index(self.index().wrapping_add(1))
    }

    /// Rotate a quarter turn counter-clockwise: `(facing + 3) mod 4`.
    pub const fn turn_left(self) -> Self {
        Self::from_index(self.index().wrapping_add(3))
    }
}

// ---------------------------------------------------------------------------
// Conditions
// ---------------------------------------------------------------------------

/// A tile color guarding a command slot.
///
/// A slot with a condition repeats its command while the cursor stands on
/// a tile of that color. A slot without one (`None` in
/// [`Command::condition`](crate::Command::condition)) runs exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Condition {
    /// Repeat while on a red tile.
    Red,
    /// Repeat while on a blue tile.
    Blue,
    /// Repeat while on a green tile.
    Green,
}

impl Condition {
    /// Lowercase name as written in command text.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Green => "green",
        }
    }

    /// Parse a color name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "red" | "rouge" => Some(Self::Red),
            "blue" | "bleu" => Some(Self::Blue),
            "green" | "vert" => Some(Self::Green),
            _ => None,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Function slots
// ---------------------------------------------------------------------------

/// One of the five fixed function slots.
///
/// `F1` is the entry point of every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum FunctionId {
    /// Entry function.
    F1,
    /// Second function.
    F2,
    /// Third function.
    F3,
    /// Fourth function.
    F4,
    /// Fifth function.
    F5,
}

impl FunctionId {
    /// All function ids in slot order.
    pub const ALL: [Self; 5] = [Self::F1, Self::F2, Self::F3, Self::F4, Self::F5];

    /// Zero-based table index.
    pub const fn index(self) -> usize {
        match self {
            Self::F1 => 0,
            Self::F2 => 1,
            Self::F3 => 2,
            Self::F4 => 3,
            Self::F5 => 4,
        }
    }

    /// Look up a function by zero-based table index.
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::F1),
            1 => Some(Self::F2),
            2 => Some(Self::F3),
            3 => Some(Self::F4),
            4 => Some(Self::F5),
            _ => None,
        }
    }

    /// Parse `F1`..`F5`, case-insensitively.
    pub fn parse(token: &str) -> Option<Self> {
        let rest = token.strip_prefix(['F', 'f'])?;
        match rest {
            "1" => Some(Self::F1),
            "2" => Some(Self::F2),
            "3" => Some(Self::F3),
            "4" => Some(Self::F4),
            "5" => Some(Self::F5),
            _ => None,
        }
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = match self {
            Self::F1 => 1,
            Self::F2 => 2,
            Self::F3 => 3,
            Self::F4 => 4,
            Self::F5 => 5,
        };
        write!(f, "F{n}")
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// The action half of a [`Command`](crate::Command).
///
/// Moves and turns are atomic steps. A call is not an atomic step; it runs
/// the target function's slots in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Move one tile in the facing direction.
    Forward,
    /// Rotate counter-clockwise.
    TurnLeft,
    /// Rotate clockwise.
    TurnRight,
    /// Execute another function (or the same one, recursively).
    Call(FunctionId),
}

impl Action {
    /// Whether this action counts against the step budget.
    pub const fn is_atomic(self) -> bool {
        !matches!(self, Self::Call(_))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => f.write_str("F"),
            Self::TurnLeft => f.write_str("L"),
            Self::TurnRight => f.write_str("R"),
            Self::Call(function) => write!(f, "{function}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Run status
// ---------------------------------------------------------------------------

/// Lifecycle status of an interpreter run.
///
/// Everything except [`RunStatus::Running`] is terminal. `Idle` doubles as
/// the "not started" display state and the "program exhausted without
/// success" outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum RunStatus {
    /// No run in progress, or the program finished without collecting
    /// every marker.
    Idle,
    /// The run is still executing.
    Running,
    /// Every marker was collected.
    Succeeded,
    /// A forward move hit a wall or the grid edge.
    Blocked,
    /// The step or call budget ran out.
    StepLimitExceeded,
    /// The run was superseded or explicitly stopped.
    Cancelled,
}

impl RunStatus {
    /// Whether the run has stopped.
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_chars_roundtrip() {
        for c in ['.', 'W', 'G', 'R', 'B', 'K', 'S', 'Y'] {
            let kind = CellKind::from_char(c);
            assert_eq!(kind.map(CellKind::as_char), Some(c));
        }
        assert_eq!(CellKind::from_char('A'), None);
    }

    #[test]
    fn only_walls_block() {
        assert!(!CellKind::Wall.is_passable());
        assert!(CellKind::Blue.is_passable());
        assert!(CellKind::Empty.is_passable());
    }

    #[test]
    fn colors_match_their_condition_only() {
        assert!(CellKind::Blue.matches(Condition::Blue));
        assert!(!CellKind::Blue.matches(Condition::Red));
        assert!(!CellKind::Path.matches(Condition::Green));
        assert!(CellKind::Green.matches(Condition::Green));
    }

    #[test]
    fn four_right_turns_are_identity() {
        for facing in Facing::ALL {
            let turned = facing.turn_right().turn_right().turn_right().turn_right();
            assert_eq!(turned, facing);
            assert_eq!(facing.turn_left().turn_right(), facing);
        }
        assert_eq!(Facing::Up.turn_left(), Facing::Left);
        assert_eq!(Facing::Left.turn_right(), Facing::Up);
        assert_eq!(Facing::Down.turn_left(), Facing::Right);
    }

    #[test]
    fn function_ids_parse() {
        assert_eq!(FunctionId::parse("F3"), Some(FunctionId::F3));
        assert_eq!(FunctionId::parse("f5"), Some(FunctionId::F5));
        assert_eq!(FunctionId::parse("F6"), None);
        assert_eq!(FunctionId::parse("F"), None);
        assert_eq!(FunctionId::F2.to_string(), "F2");
        for (i, f) in FunctionId::ALL.iter().enumerate() {
            assert_eq!(f.index(), i);
            assert_eq!(FunctionId::from_index(i), Some(*f));
        }
    }

    #[test]
    fn only_running_is_live() {
        assert!(!RunStatus::Running.is_terminal());
        assert!(RunStatus::Blocked.is_terminal());
        assert!(RunStatus::Idle.is_terminal());
    }

    #[test]
    fn action_serializes_snake_case() {
        let json = serde_json::to_string(&Action::TurnLeft).unwrap_or_default();
        assert_eq!(json, "\"turn_left\"");
        let call = serde_json::to_string(&Action::Call(FunctionId::F2)).unwrap_or_default();
        assert_eq!(call, "{\"call\":\"F2\"}");
    }
}
