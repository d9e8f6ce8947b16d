//! Error types for the `logic-world` crate.
//!
//! Every level-data problem is caught at load time and surfaces as a
//! [`WorldError`]; nothing malformed reaches the interpreter.

use logic_types::{Coord, FunctionId, ScriptError};

/// Errors that can occur while loading or looking up levels.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The grid text does not hold `rows * cols` cells.
    #[error("level {level}: grid has {actual} cells, expected {expected}")]
    GridSizeMismatch {
        /// The offending level.
        level: u32,
        /// `rows * cols`.
        expected: usize,
        /// Cells actually present.
        actual: usize,
    },

    /// A grid character outside the known cell alphabet.
    #[error("level {level}: unknown cell character {found:?} at index {index}")]
    UnknownCell {
        /// The offending level.
        level: u32,
        /// The character found.
        found: char,
        /// Position among the non-whitespace grid characters.
        index: usize,
    },

    /// The start pose lies outside the grid.
    #[error("level {level}: start {coord} is out of bounds")]
    StartOutOfBounds {
        /// The offending level.
        level: u32,
        /// The start coordinate.
        coord: Coord,
    },

    /// The start pose lies on a wall.
    #[error("level {level}: start {coord} is on a wall")]
    StartOnWall {
        /// The offending level.
        level: u32,
        /// The start coordinate.
        coord: Coord,
    },

    /// A marker lies outside the grid.
    #[error("level {level}: marker {coord} is out of bounds")]
    MarkerOutOfBounds {
        /// The offending level.
        level: u32,
        /// The marker coordinate.
        coord: Coord,
    },

    /// A marker lies on a wall and could never be collected.
    #[error("level {level}: marker {coord} is on a wall")]
    MarkerOnWall {
        /// The offending level.
        level: u32,
        /// The marker coordinate.
        coord: Coord,
    },

    /// The level has nothing to collect.
    #[error("level {0}: no markers")]
    NoMarkers(u32),

    /// Two levels share an id.
    #[error("duplicate level id: {0}")]
    DuplicateLevel(u32),

    /// A reference solution does not fit the slot capacity.
    #[error("level {level}: reference {function} has {given} commands, capacity {capacity}")]
    SolutionTooLong {
        /// The offending level.
        level: u32,
        /// The function whose solution overflows.
        function: FunctionId,
        /// The function's capacity.
        capacity: u8,
        /// Commands in the reference solution.
        given: usize,
    },

    /// A reference solution is not valid command text.
    #[error("level {level}: reference {function} does not parse: {source}")]
    Solution {
        /// The offending level.
        level: u32,
        /// The function whose solution is malformed.
        function: FunctionId,
        /// The parse failure.
        source: ScriptError,
    },

    /// No level with this id exists.
    #[error("level not found: {0}")]
    LevelNotFound(u32),

    /// Failed to read a level pack from disk.
    #[error("failed to read level pack: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse a level pack.
    #[error("failed to parse level pack YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for WorldError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}
