//! Shared type definitions for the Logic Grid puzzle.
//!
//! This crate is the single source of truth for the vocabulary used across
//! the workspace: tiles, facings, commands, programs and run snapshots.
//! Types flow downstream to `TypeScript` via `ts-rs` for the UI.
//!
//! # Modules
//!
//! - [`ids`] -- UUID wrappers for runs and sessions
//! - [`enums`] -- Cell kinds, facing, conditions, functions, actions, status
//! - [`structs`] -- Coordinates, poses, commands, snapshots and reports
//! - [`program`] -- The editable five-function program table
//! - [`script`] -- Text notation for command lists

pub mod enums;
pub mod ids;
pub mod program;
pub mod script;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{Action, CellKind, Condition, Facing, FunctionId, RunStatus};
pub use ids::{RunId, SessionId};
pub use program::{Capacities, FUNCTION_COUNT, Program, ProgramError, SlotRef};
pub use script::{ScriptError, format_commands, parse_commands, parse_program_text};
pub use structs::{Command, Coord, Pose, RunReport, RunSnapshot};
