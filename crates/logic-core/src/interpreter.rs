//! The command interpreter.
//!
//! Executes `F1` of a [`Program`] against a [`Level`], one atomic action at
//! a time. Function calls are tracked on an explicit frame stack owned by
//! the [`Interpreter`], so there is no host recursion and a run can be
//! suspended between any two atomic actions. Pacing and cancellation live
//! in the session driver; this module is synchronous and deterministic.
//!
//! # Semantics
//!
//! - A function runs its slots in order, skipping empty ones.
//! - An unconditional slot runs its action once.
//! - A conditional slot tests the current tile before every repetition,
//!   including the first, and again after a nested call returns. A slot
//!   that reaches [`InterpreterLimits::max_slot_iterations`] is left.
//! - Moves and turns are atomic steps and count against
//!   [`InterpreterLimits::max_steps`]. A blocked move counts too, but is
//!   not recorded in the trace.
//! - Calls count against [`InterpreterLimits::max_calls`]. A call to a
//!   function with no slots does nothing.
//! - The run succeeds as soon as every marker has been collected, no
//!   matter how deep in the call stack that happens.

use std::collections::BTreeSet;
use std::sync::Arc;

use logic_types::{
    Action, Command, Coord, FunctionId, Pose, Program, RunId, RunSnapshot, RunStatus,
};
use logic_world::Level;
use tracing::debug;

use crate::config::InterpreterLimits;

/// Mutable state of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunState {
    /// Cursor pose.
    pub pose: Pose,
    /// Markers collected so far.
    pub collected: BTreeSet<Coord>,
    /// Atomic actions taken, including blocked attempts.
    pub steps: u32,
    /// Function calls made.
    pub calls: u32,
    /// Atomic commands executed, in order.
    pub trace: Vec<Command>,
    /// Current status.
    pub status: RunStatus,
}

/// One active function invocation.
#[derive(Debug, Clone, Copy)]
struct Frame {
    function: FunctionId,
    slot: usize,
    /// Repetitions of the current conditional slot.
    iterations: u32,
}

impl Frame {
    const fn enter(function: FunctionId) -> Self {
        Self {
            function,
            slot: 0,
            iterations: 0,
        }
    }

    const fn advance(&mut self) {
        self.slot = self.slot.saturating_add(1);
        self.iterations = 0;
    }
}

/// What the next slot asks the machine to do.
enum Next {
    Act(Action),
    Skip,
    Return,
}

/// A single run of a program on a level.
#[derive(Debug, Clone)]
pub struct Interpreter {
    run_id: RunId,
    level: Arc<Level>,
    program: Program,
    limits: InterpreterLimits,
    stack: Vec<Frame>,
    state: RunState,
}

impl Interpreter {
    /// Prepare a run. The cursor starts at the level's start pose with
    /// `F1` as the only frame.
    pub fn new(
        run_id: RunId,
        level: Arc<Level>,
        program: Program,
        limits: InterpreterLimits,
    ) -> Self {
        let state = RunState {
            pose: level.start(),
            collected: BTreeSet::new(),
            steps: 0,
            calls: 0,
            trace: Vec::new(),
            status: RunStatus::Running,
        };
        Self {
            run_id,
            level,
            program,
            limits,
            stack: vec![Frame::enter(FunctionId::F1)],
            state,
        }
    }

    /// The run identifier.
    pub const fn run_id(&self) -> RunId {
        self.run_id
    }

    /// The level being played.
    pub fn level(&self) -> &Level {
        &self.level
    }

    /// Current run state.
    pub const fn state(&self) -> &RunState {
        &self.state
    }

    /// Current call depth.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Whether the run has reached a terminal status.
    pub const fn is_finished(&self) -> bool {
        self.state.status.is_terminal()
    }

    /// Stop the run. Has no effect once the run has finished.
    pub fn cancel(&mut self) {
        if !self.is_finished() {
            self.state.status = RunStatus::Cancelled;
            self.stack.clear();
            debug!(run_id = %self.run_id, steps = self.state.steps, "Run cancelled");
        }
    }

    /// A snapshot of the current state.
    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            run_id: self.run_id,
            level_id: self.level.id(),
            step: self.state.steps,
            pose: self.state.pose,
            collected: self.state.collected.clone(),
            trace: self.state.trace.clone(),
            status: self.state.status,
        }
    }

    /// Advance to the next atomic action, or to a terminal status.
    ///
    /// Every call returns exactly one snapshot. Once the returned status is
    /// terminal, further calls return the same terminal snapshot.
    pub fn step(&mut self) -> RunSnapshot {
        while !self.is_finished() {
            let action = match self.next_action() {
                Next::Act(action) => action,
                Next::Skip => continue,
                Next::Return => {
                    self.stack.pop();
                    if self.stack.is_empty() {
                        self.finish(RunStatus::Idle);
                    }
                    continue;
                }
            };

            match action {
                Action::Call(function) => self.call(function),
                atomic => {
                    self.atomic(atomic);
                    return self.snapshot();
                }
            }
        }
        self.snapshot()
    }

    /// Drive the run to completion, collecting every snapshot. The last
    /// element carries the terminal status.
    pub fn run_to_end(&mut self) -> Vec<RunSnapshot> {
        let mut snapshots = Vec::new();
        loop {
            let snapshot = self.step();
            let done = snapshot.status.is_terminal();
            snapshots.push(snapshot);
            if done {
                return snapshots;
            }
        }
    }

    /// Decide what the top frame does next, updating its cursor.
    fn next_action(&mut self) -> Next {
        let tile = self.level.cell(self.state.pose.coord);
        let max_iterations = self.limits.max_slot_iterations;
        let run_id = self.run_id;

        let Some(frame) = self.stack.last_mut() else {
            return Next::Return;
        };
        let Some(slot) = self.program.slots(frame.function).get(frame.slot).copied() else {
            return Next::Return;
        };
        let Some(command) = slot else {
            frame.advance();
            return Next::Skip;
        };

        match command.condition {
            None => {
                frame.advance();
                Next::Act(command.action)
            }
            Some(condition) => {
                if frame.iterations >= max_iterations {
                    debug!(
                        run_id = %run_id,
                        function = %frame.function,
                        slot = frame.slot,
                        iterations = frame.iterations,
                        "Conditional slot hit its iteration cap"
                    );
                    frame.advance();
                    return Next::Skip;
                }
                if tile.is_some_and(|t| t.matches(condition)) {
                    frame.iterations = frame.iterations.saturating_add(1);
                    Next::Act(command.action)
                } else {
                    frame.advance();
                    Next::Skip
                }
            }
        }
    }

    fn call(&mut self, function: FunctionId) {
        self.state.calls = self.state.calls.saturating_add(1);
        if self.state.calls > self.limits.max_calls {
            self.finish(RunStatus::StepLimitExceeded);
            return;
        }
        if self.program.capacity(function) == 0 {
            return;
        }

        // A caller with no filled slots left has nothing to resume; drop it
        // so tail recursion runs in constant stack space.
        if self.stack.last().is_some_and(|top| self.is_spent(*top)) {
            self.stack.pop();
        }
        self.stack.push(Frame::enter(function));
    }

    fn is_spent(&self, frame: Frame) -> bool {
        self.program
            .slots(frame.function)
            .get(frame.slot..)
            .is_none_or(|rest| rest.iter().all(Option::is_none))
    }

    fn atomic(&mut self, action: Action) {
        if self.state.steps >= self.limits.max_steps {
            self.finish(RunStatus::StepLimitExceeded);
            return;
        }
        self.state.steps = self.state.steps.saturating_add(1);

        let pose = self.state.pose;
        match action {
            Action::Forward => {
                let Some(next) = self
                    .level
                    .next_coord(pose.coord, pose.facing)
                    .filter(|c| self.level.is_passable(*c))
                else {
                    self.finish(RunStatus::Blocked);
                    return;
                };
                self.state.pose.coord = next;
                if self.level.is_marker(next) {
                    self.state.collected.insert(next);
                }
            }
            Action::TurnLeft => self.state.pose.facing = pose.facing.turn_left(),
            Action::TurnRight => self.state.pose.facing = pose.facing.turn_right(),
            Action::Call(_) => return,
        }

        self.state.trace.push(Command::new(action));
        if self.state.collected.len() == self.level.markers().len() {
            self.finish(RunStatus::Succeeded);
        }
    }

    fn finish(&mut self, status: RunStatus) {
        self.state.status = status;
        self.stack.clear();
        debug!(
            run_id = %self.run_id,
            level = self.level.id(),
            status = ?status,
            steps = self.state.steps,
            calls = self.state.calls,
            collected = self.state.collected.len(),
            "Run finished"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use logic_types::{Facing, parse_commands};
    use logic_world::{Instructions, LevelRecord, StartRecord};

    use super::*;

    fn level(rows: &[&str], start: (u32, u32, Facing), markers: &[[u32; 2]]) -> Arc<Level> {
        let record = LevelRecord {
            id: 1,
            rows: u32::try_from(rows.len()).unwrap(),
            cols: u32::try_from(rows[0].len()).unwrap(),
            grid: rows.join("\n"),
            start: StartRecord {
                row: start.0,
                col: start.1,
                facing: start.2,
            },
            markers: markers.to_vec(),
            slot_capacities: [10, 10, 10, 10, 10],
            instructions: Instructions::default(),
            reference_solution: std::collections::BTreeMap::new(),
        };
        Arc::new(Level::from_record(record).unwrap())
    }

    fn program(f1: &str, f2: &str) -> Program {
        let mut program = Program::with_capacities([10, 10, 10, 10, 10]);
        program
            .load_function(FunctionId::F1, &parse_commands(f1).unwrap())
            .unwrap();
        program
            .load_function(FunctionId::F2, &parse_commands(f2).unwrap())
            .unwrap();
        program
    }

    fn run(level: &Arc<Level>, program: Program) -> Vec<RunSnapshot> {
        Interpreter::new(
            RunId::new(),
            Arc::clone(level),
            program,
            InterpreterLimits::default(),
        )
        .run_to_end()
    }

    fn last(snapshots: &[RunSnapshot]) -> &RunSnapshot {
        snapshots.last().unwrap()
    }

    #[test]
    fn corridor_succeeds_in_three_steps() {
        let lvl = level(
            &["WWWWWW", "WGGGGW", "WWWWWW"],
            (1, 1, Facing::Right),
            &[[1, 4]],
        );
        let snaps = run(&lvl, program("F F F", ""));
        let end = last(&snaps);
        assert_eq!(end.status, RunStatus::Succeeded);
        assert_eq!(end.step, 3);
        assert_eq!(snaps.len(), 3);
        assert_eq!(end.trace.len(), 3);
    }

    #[test]
    fn success_ends_the_run_mid_function() {
        let lvl = level(&["WWWWW", "WGGGW", "WWWWW"], (1, 1, Facing::Right), &[[1, 3]]);
        let snaps = run(&lvl, program("F F F", ""));
        let end = last(&snaps);
        assert_eq!(end.status, RunStatus::Succeeded);
        // The third move never runs, so it cannot hit the wall.
        assert_eq!(end.step, 2);
    }

    #[test]
    fn facing_a_wall_blocks_immediately() {
        let lvl = level(&["WWW", "WGW", "WGW", "WWW"], (1, 1, Facing::Up), &[[2, 1]]);
        let snaps = run(&lvl, program("F", ""));
        let end = last(&snaps);
        assert_eq!(end.status, RunStatus::Blocked);
        assert!(end.collected.is_empty());
        assert!(end.trace.is_empty());
        assert_eq!(end.step, 1);
        assert_eq!(end.pose, lvl.start());
    }

    #[test]
    fn conditional_slot_skipped_when_tile_does_not_match() {
        let lvl = level(&["WWWW", "WGGW", "WWWW"], (1, 1, Facing::Right), &[[1, 2]]);
        let snaps = run(&lvl, program("if blue { R } F", ""));
        let end = last(&snaps);
        assert_eq!(end.status, RunStatus::Succeeded);
        assert_eq!(end.trace, vec![Command::forward()]);
    }

    #[test]
    fn conditional_slot_repeats_while_tile_matches() {
        let lvl = level(
            &["WWWWWW", "WBBBGW", "WWWWWW"],
            (1, 1, Facing::Right),
            &[[1, 4]],
        );
        let snaps = run(&lvl, program("if blue { F }", ""));
        let end = last(&snaps);
        assert_eq!(end.status, RunStatus::Succeeded);
        assert_eq!(end.step, 3);
        assert!(
            end.trace
                .iter()
                .all(|c| c.action == Action::Forward && c.condition.is_none())
        );
    }

    #[test]
    fn exhausted_program_ends_idle() {
        let lvl = level(&["WWWWW", "WGGGW", "WWWWW"], (1, 1, Facing::Right), &[[1, 3]]);
        let snaps = run(&lvl, program("F R", ""));
        let end = last(&snaps);
        assert_eq!(end.status, RunStatus::Idle);
        assert_eq!(end.pose.coord, Coord::new(1, 2));
        assert_eq!(end.pose.facing, Facing::Down);
        // Two step snapshots plus the terminal one.
        assert_eq!(snaps.len(), 3);
    }

    #[test]
    fn self_call_without_moves_hits_the_call_budget() {
        let lvl = level(&["WWW", "WGW", "WGW", "WWW"], (1, 1, Facing::Down), &[[2, 1]]);
        let snaps = run(&lvl, program("F1", ""));
        let end = last(&snaps);
        assert_eq!(end.status, RunStatus::StepLimitExceeded);
        assert_eq!(end.step, 0);
        assert_eq!(snaps.len(), 1);
    }

    #[test]
    fn turning_forever_hits_the_step_budget() {
        let lvl = level(&["WWW", "WGW", "WGW", "WWW"], (1, 1, Facing::Up), &[[2, 1]]);
        let limits = InterpreterLimits {
            max_steps: 10,
            ..InterpreterLimits::default()
        };
        let mut interp = Interpreter::new(RunId::new(), lvl, program("R F1", ""), limits);
        let snaps = interp.run_to_end();
        let end = last(&snaps);
        assert_eq!(end.status, RunStatus::StepLimitExceeded);
        assert_eq!(end.step, 10);
        assert_eq!(snaps.len(), 11);
    }

    #[test]
    fn tail_recursion_does_not_grow_the_stack() {
        let lvl = level(&["WWW", "WGW", "WGW", "WWW"], (1, 1, Facing::Up), &[[2, 1]]);
        let limits = InterpreterLimits {
            max_steps: 1000,
            ..InterpreterLimits::default()
        };
        let mut interp = Interpreter::new(RunId::new(), lvl, program("R F1", ""), limits);
        for _ in 0..500 {
            let _ = interp.step();
        }
        assert!(interp.depth() <= 2, "depth {}", interp.depth());
    }

    #[test]
    fn success_inside_a_call_stops_everything() {
        let lvl = level(
            &["WWWWWW", "WGGGGW", "WWWWWW"],
            (1, 1, Facing::Right),
            &[[1, 2]],
        );
        let snaps = run(&lvl, program("F2 R R R", "F F F"));
        let end = last(&snaps);
        assert_eq!(end.status, RunStatus::Succeeded);
        assert_eq!(end.step, 1);
        assert_eq!(end.pose.facing, Facing::Right);
    }

    #[test]
    fn call_to_empty_function_is_a_noop() {
        let lvl = level(&["WWWW", "WGGW", "WWWW"], (1, 1, Facing::Right), &[[1, 2]]);
        let mut p = Program::with_capacities([3, 0, 0, 0, 0]);
        p.load_function(FunctionId::F1, &parse_commands("F3 F").unwrap())
            .unwrap();
        let snaps = run(&lvl, p);
        assert_eq!(last(&snaps).status, RunStatus::Succeeded);
    }

    #[test]
    fn conditional_call_is_retested_after_return() {
        // Blue corridor: F2 moves one tile, F1 keeps calling it while on blue.
        let lvl = level(
            &["WWWWWW", "WBBBGW", "WWWWWW"],
            (1, 1, Facing::Right),
            &[[1, 4]],
        );
        let snaps = run(&lvl, program("if blue { F2 }", "F"));
        let end = last(&snaps);
        assert_eq!(end.status, RunStatus::Succeeded);
        assert_eq!(end.step, 3);
    }

    #[test]
    fn slot_iteration_cap_leaves_the_slot() {
        let lvl = level(&["WWW", "WBW", "WGW", "WWW"], (1, 1, Facing::Up), &[[2, 1]]);
        let limits = InterpreterLimits {
            max_slot_iterations: 6,
            ..InterpreterLimits::default()
        };
        let mut interp =
            Interpreter::new(RunId::new(), lvl, program("if blue { R } F", ""), limits);
        let snaps = interp.run_to_end();
        let end = last(&snaps);
        // Six right turns leave the cursor facing down, then F collects.
        assert_eq!(end.status, RunStatus::Succeeded);
        assert_eq!(end.step, 7);
    }

    #[test]
    fn cancel_is_terminal_and_sticky() {
        let lvl = level(&["WWWWW", "WGGGW", "WWWWW"], (1, 1, Facing::Right), &[[1, 3]]);
        let mut interp = Interpreter::new(
            RunId::new(),
            lvl,
            program("F F", ""),
            InterpreterLimits::default(),
        );
        let first = interp.step();
        assert_eq!(first.status, RunStatus::Running);
        interp.cancel();
        let after = interp.step();
        assert_eq!(after.status, RunStatus::Cancelled);
        assert_eq!(after.step, 1);
        interp.cancel();
        assert_eq!(interp.state().status, RunStatus::Cancelled);
    }
}
