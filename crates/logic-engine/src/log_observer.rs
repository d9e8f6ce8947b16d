//! Run observer that writes progress to the log.
//!
//! Each snapshot is logged at `debug` with the board drawn underneath at
//! `trace`, so `RUST_LOG=logic_engine=trace` shows the whole animation in
//! the terminal.

use std::sync::Arc;

use logic_core::RunObserver;
use logic_types::{Coord, Facing, RunReport, RunSnapshot};
use logic_world::Level;
use tracing::{debug, info, trace};

/// Observer that logs every run event for one level.
pub struct LogObserver {
    level: Arc<Level>,
}

impl LogObserver {
    /// Create an observer for runs on `level`.
    pub const fn new(level: Arc<Level>) -> Self {
        Self { level }
    }
}

impl RunObserver for LogObserver {
    fn on_snapshot(&self, snapshot: &RunSnapshot) {
        debug!(
            run_id = %snapshot.run_id,
            step = snapshot.step,
            pose = %snapshot.pose.coord,
            facing = ?snapshot.pose.facing,
            collected = snapshot.collected.len(),
            status = ?snapshot.status,
            "Step"
        );
        trace!("\n{}", render_board(&self.level, snapshot));
    }

    fn on_finished(&self, report: &RunReport) {
        info!(
            run_id = %report.run_id,
            level = report.level_id,
            status = ?report.status,
            steps = report.steps,
            calls = report.calls,
            collected = report.collected.len(),
            markers = self.level.markers().len(),
            "Run finished"
        );
    }

    fn on_unlock(&self, level_id: u32, highest_unlocked: u32) {
        info!(level = level_id, highest_unlocked, "Level unlocked");
    }
}

/// Draw the grid with the cursor and the markers still to collect.
///
/// The cursor is drawn as an arrow (`^ > v <`), pending markers as `o`.
pub fn render_board(level: &Level, snapshot: &RunSnapshot) -> String {
    let grid = level.grid();
    let mut out = String::new();
    for row in 0..grid.rows() {
        if row > 0 {
            out.push('\n');
        }
        for col in 0..grid.cols() {
            let coord = Coord::new(row, col);
            let c = if coord == snapshot.pose.coord {
                cursor_char(snapshot.pose.facing)
            } else if level.is_marker(coord) && !snapshot.collected.contains(&coord) {
                'o'
            } else {
                grid.cell(coord).map_or(' ', |cell| cell.as_char())
            };
            out.push(c);
        }
    }
    out
}

const fn cursor_char(facing: Facing) -> char {
    match facing {
        Facing::Up => '^',
        Facing::Right => '>',
        Facing::Down => 'v',
        Facing::Left => '<',
    }
}
