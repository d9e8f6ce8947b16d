//! Levels: the authored record format and the validated, immutable model.
//!
//! A [`LevelRecord`] is what lives in YAML packs and in the built-in
//! campaign. [`Level::from_record`] checks every load-time invariant and is
//! the only way to build a [`Level`], so the interpreter can rely on a
//! well-formed grid, an in-bounds start on a passable tile, and at least one
//! reachable-in-principle marker.

use std::collections::{BTreeMap, BTreeSet};

use logic_types::{
    Capacities, CellKind, Command, Coord, Facing, FunctionId, Pose, Program, parse_commands,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::WorldError;
use crate::grid::Grid;

// ---------------------------------------------------------------------------
// Record format
// ---------------------------------------------------------------------------

/// Start pose as authored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartRecord {
    /// Start row.
    pub row: u32,
    /// Start column.
    pub col: u32,
    /// Initial facing.
    pub facing: Facing,
}

/// Player-facing level text in both supported languages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instructions {
    /// English text.
    #[serde(default)]
    pub en: String,
    /// French text.
    #[serde(default)]
    pub fr: String,
}

/// A level as authored, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRecord {
    /// Level number; campaigns are ordered by it.
    pub id: u32,
    /// Grid height.
    pub rows: u32,
    /// Grid width.
    pub cols: u32,
    /// Cell characters, row-major. Whitespace is ignored.
    pub grid: String,
    /// Start pose.
    pub start: StartRecord,
    /// Marker positions as `[row, col]` pairs.
    pub markers: Vec<[u32; 2]>,
    /// Slot capacities for `F1..F5`; 0 disables a function.
    pub slot_capacities: Capacities,
    /// Level text.
    #[serde(default)]
    pub instructions: Instructions,
    /// Known solution per function, in command text notation.
    #[serde(default)]
    pub reference_solution: BTreeMap<FunctionId, String>,
}

// ---------------------------------------------------------------------------
// Validated level
// ---------------------------------------------------------------------------

/// An immutable, validated puzzle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    id: u32,
    grid: Grid,
    start: Pose,
    markers: BTreeSet<Coord>,
    capacities: Capacities,
    instructions: Instructions,
    reference: BTreeMap<FunctionId, Vec<Command>>,
}

impl Level {
    /// Validate a record.
    ///
    /// Any failure is logged at `warn` and returned.
    pub fn from_record(record: LevelRecord) -> Result<Self, WorldError> {
        let id = record.id;
        Self::validate(record).inspect_err(|e| {
            warn!(level = id, error = %e, "Rejected level data");
        })
    }

    fn validate(record: LevelRecord) -> Result<Self, WorldError> {
        let level = record.id;
        let grid = Grid::parse(level, record.rows, record.cols, &record.grid)?;

        let start_coord = Coord::new(record.start.row, record.start.col);
        match grid.cell(start_coord) {
            None => {
                return Err(WorldError::StartOutOfBounds {
                    level,
                    coord: start_coord,
                });
            }
            Some(CellKind::Wall) => {
                return Err(WorldError::StartOnWall {
                    level,
                    coord: start_coord,
                });
            }
            Some(_) => {}
        }

        let mut markers = BTreeSet::new();
        for [row, col] in record.markers {
            let coord = Coord::new(row, col);
            match grid.cell(coord) {
                None => return Err(WorldError::MarkerOutOfBounds { level, coord }),
                Some(CellKind::Wall) => return Err(WorldError::MarkerOnWall { level, coord }),
                Some(_) => {
                    markers.insert(coord);
                }
            }
        }
        if markers.is_empty() {
            return Err(WorldError::NoMarkers(level));
        }

        let mut reference = BTreeMap::new();
        for (function, text) in record.reference_solution {
            let commands = parse_commands(&text)
                .map_err(|source| WorldError::Solution {
                    level,
                    function,
                    source,
                })?;
            let capacity = record
                .slot_capacities
                .get(function.index())
                .copied()
                .unwrap_or(0);
            if commands.len() > usize::from(capacity) {
                return Err(WorldError::SolutionTooLong {
                    level,
                    function,
                    capacity,
                    given: commands.len(),
                });
            }
            reference.insert(function, commands);
        }

        Ok(Self {
            id: level,
            grid,
            start: Pose::new(start_coord, record.start.facing),
            markers,
            capacities: record.slot_capacities,
            instructions: record.instructions,
            reference,
        })
    }

    /// Level number.
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// The tile grid.
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Where the cursor begins every run.
    pub const fn start(&self) -> Pose {
        self.start
    }

    /// Every marker that must be collected.
    pub const fn markers(&self) -> &BTreeSet<Coord> {
        &self.markers
    }

    /// Whether a marker sits on `coord`.
    pub fn is_marker(&self, coord: Coord) -> bool {
        self.markers.contains(&coord)
    }

    /// Slot capacities for `F1..F5`.
    pub const fn capacities(&self) -> Capacities {
        self.capacities
    }

    /// Slot capacity of one function; 0 means unavailable.
    pub fn capacity(&self, function: FunctionId) -> u8 {
        self.capacities.get(function.index()).copied().unwrap_or(0)
    }

    /// Level text.
    pub const fn instructions(&self) -> &Instructions {
        &self.instructions
    }

    /// Bounds-checked tile lookup.
    pub fn cell(&self, coord: Coord) -> Option<CellKind> {
        self.grid.cell(coord)
    }

    /// Whether the cursor may stand on `coord`.
    pub fn is_passable(&self, coord: Coord) -> bool {
        self.grid.is_passable(coord)
    }

    /// The in-bounds neighbour of `coord` towards `facing`.
    pub fn next_coord(&self, coord: Coord, facing: Facing) -> Option<Coord> {
        self.grid.neighbor(coord, facing)
    }

    /// Whether the level ships with a known solution.
    pub fn has_reference(&self) -> bool {
        !self.reference.is_empty()
    }

    /// The known solution for one function, if any.
    pub fn reference(&self, function: FunctionId) -> Option<&[Command]> {
        self.reference.get(&function).map(Vec::as_slice)
    }

    /// An empty program shaped for this level.
    pub fn empty_program(&self) -> Program {
        Program::with_capacities(self.capacities)
    }

    /// A program pre-filled with the known solution, each function
    /// truncated to its capacity.
    pub fn reference_program(&self) -> Program {
        let mut program = self.empty_program();
        for (function, commands) in &self.reference {
            program.load_truncated(*function, commands);
        }
        program
    }
}
