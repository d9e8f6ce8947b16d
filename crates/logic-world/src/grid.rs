//! Rectangular tile grid.
//!
//! Cells are stored row-major. All lookups are bounds-checked and return
//! `None` outside the grid, so callers never index directly.

use logic_types::{CellKind, Coord, Facing};
use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// An immutable `rows x cols` matrix of [`CellKind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    rows: u32,
    cols: u32,
    cells: Vec<CellKind>,
}

impl Grid {
    /// Parse authored grid text. Whitespace is ignored, so rows may be laid
    /// out on separate lines or run together.
    ///
    /// `level` is only used to label errors.
    pub fn parse(level: u32, rows: u32, cols: u32, text: &str) -> Result<Self, WorldError> {
        let chars: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
        let expected = usize::try_from(u64::from(rows).saturating_mul(u64::from(cols)))
            .unwrap_or(usize::MAX);
        if chars.len() != expected {
            return Err(WorldError::GridSizeMismatch {
                level,
                expected,
                actual: chars.len(),
            });
        }

        let cells = chars
            .into_iter()
            .enumerate()
            .map(|(index, found)| {
                CellKind::from_char(found).ok_or(WorldError::UnknownCell {
                    level,
                    found,
                    index,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { rows, cols, cells })
    }

    /// Number of rows.
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns.
    pub const fn cols(&self) -> u32 {
        self.cols
    }

    /// Whether `coord` lies inside the grid.
    pub const fn contains(&self, coord: Coord) -> bool {
        coord.row < self.rows && coord.col < self.cols
    }

    /// The tile at `coord`, or `None` outside the grid.
    pub fn cell(&self, coord: Coord) -> Option<CellKind> {
        self.offset(coord).and_then(|i| self.cells.get(i)).copied()
    }

    /// Whether the cursor may stand on `coord`. Off-grid is never passable.
    pub fn is_passable(&self, coord: Coord) -> bool {
        self.cell(coord).is_some_and(CellKind::is_passable)
    }

    /// The in-bounds neighbour of `coord` towards `facing`.
    pub fn neighbor(&self, coord: Coord, facing: Facing) -> Option<Coord> {
        coord.step(facing).filter(|next| self.contains(*next))
    }

    /// Render back to authoring text, one line per row.
    pub fn render(&self) -> String {
        let width = usize::try_from(self.cols).unwrap_or(usize::MAX).max(1);
        self.cells
            .chunks(width)
            .map(|row| row.iter().map(|c| c.as_char()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn offset(&self, coord: Coord) -> Option<usize> {
        if !self.contains(coord) {
            return None;
        }
        let row = usize::try_from(coord.row).ok()?;
        let col = usize::try_from(coord.col).ok()?;
        let cols = usize::try_from(self.cols).ok()?;
        row.checked_mul(cols)?.checked_add(col)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn corridor() -> Grid {
        Grid::parse(1, 3, 4, "WWWW\nWGBW\nWWWW").unwrap()
    }

    #[test]
    fn parse_ignores_whitespace() {
        let a = corridor();
        let b = Grid::parse(1, 3, 4, "WWWW WGBW WWWW").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.render(), "WWWW\nWGBW\nWWWW");
    }

    #[test]
    fn lookups_are_bounds_checked() {
        let grid = corridor();
        assert_eq!(grid.cell(Coord::new(1, 2)), Some(CellKind::Blue));
        assert_eq!(grid.cell(Coord::new(3, 0)), None);
        assert_eq!(grid.cell(Coord::new(0, 4)), None);
        assert!(grid.is_passable(Coord::new(1, 1)));
        assert!(!grid.is_passable(Coord::new(0, 0)));
        assert!(!grid.is_passable(Coord::new(9, 9)));
    }

    #[test]
    fn neighbor_stays_inside() {
        let grid = corridor();
        assert_eq!(
            grid.neighbor(Coord::new(1, 1), Facing::Right),
            Some(Coord::new(1, 2))
        );
        assert_eq!(grid.neighbor(Coord::new(0, 0), Facing::Up), None);
        assert_eq!(grid.neighbor(Coord::new(2, 3), Facing::Right), None);
    }

    #[test]
    fn wrong_cell_count_is_rejected() {
        let err = Grid::parse(7, 2, 2, "WWW");
        assert!(matches!(
            err,
            Err(WorldError::GridSizeMismatch {
                level: 7,
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn unknown_characters_are_rejected() {
        let err = Grid::parse(3, 1, 3, "GXG");
        assert!(matches!(
            err,
            Err(WorldError::UnknownCell {
                level: 3,
                found: 'X',
                index: 1
            })
        ));
    }
}
