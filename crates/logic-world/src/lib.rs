//! Grid, levels and campaigns for the Logic Grid puzzle.
//!
//! Everything here is read-only once built: the interpreter queries levels
//! but never mutates them.
//!
//! # Modules
//!
//! - [`error`] -- Load-time validation and lookup errors.
//! - [`grid`] -- Bounds-checked tile grid.
//! - [`level`] -- Authored [`LevelRecord`] and validated [`Level`].
//! - [`catalogue`] -- Levels ordered by id; YAML level packs.
//! - [`campaign`] -- The built-in 18-level campaign.

pub mod campaign;
pub mod catalogue;
pub mod error;
pub mod grid;
pub mod level;

// Re-export primary types at crate root.
pub use campaign::{CAMPAIGN_LEN, builtin_campaign, builtin_records};
pub use catalogue::LevelCatalogue;
pub use error::WorldError;
pub use grid::Grid;
pub use level::{Instructions, Level, LevelRecord, StartRecord};
