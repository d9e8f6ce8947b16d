//! Execution session: runs a program on a level as a paced, cancellable
//! stream of snapshots.
//!
//! A [`SessionController`] owns at most one active run. [`start`] spawns
//! a driver task that pulls snapshots out of an [`Interpreter`] one step
//! at a time, hands each to the registered [`RunObserver`]s and to the
//! run's [`RunHandle`], then sleeps for the configured step delay.
//!
//! Liveness is checked against a [`RunToken`] before every step and again
//! before every emit. A run that loses its token (because of a cancel, a
//! reset, or a newer start) stops without emitting anything further
//! except its [`RunReport`] with status [`RunStatus::Cancelled`].
//!
//! [`start`]: SessionController::start

use std::sync::Arc;

use chrono::Utc;
use logic_types::{Capacities, Program, RunId, RunReport, RunSnapshot, RunStatus, SessionId};
use logic_world::Level;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{InterpreterLimits, SessionConfig};
use crate::control::{Canceller, RunControl, RunToken};
use crate::interpreter::Interpreter;
use crate::progress::ProgressStore;

/// Errors raised by the session controller.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The program was built for different slot capacities.
    #[error("program shape {actual:?} does not match level {level} capacities {expected:?}")]
    ProgramShape {
        /// The level the program was started on.
        level: u32,
        /// The level's capacities.
        expected: Capacities,
        /// The program's capacities.
        actual: Capacities,
    },

    /// The driver task stopped without delivering a report.
    #[error("run {0} ended without a report")]
    Interrupted(RunId),
}

/// One item of a run's event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// A step was taken (or the run reached a terminal status).
    Step(RunSnapshot),
    /// The run stopped. Always the last event.
    Finished(RunReport),
}

/// Receives run progress. Called on the driver task, in step order.
///
/// Implementations must not block; a slow observer slows the animation.
pub trait RunObserver: Send + Sync {
    /// Called for every emitted snapshot.
    fn on_snapshot(&self, snapshot: &RunSnapshot);

    /// Called once when a run stops.
    fn on_finished(&self, report: &RunReport);

    /// Called when a success raised the unlock value.
    fn on_unlock(&self, _level_id: u32, _highest_unlocked: u32) {}
}

/// An observer that ignores everything.
pub struct NoOpObserver;

impl RunObserver for NoOpObserver {
    fn on_snapshot(&self, _snapshot: &RunSnapshot) {}

    fn on_finished(&self, _report: &RunReport) {}
}

/// Client side of one run: its id and its ordered event stream.
#[derive(Debug)]
pub struct RunHandle {
    run_id: RunId,
    events: mpsc::UnboundedReceiver<RunEvent>,
}

impl RunHandle {
    /// The run this handle follows.
    pub const fn run_id(&self) -> RunId {
        self.run_id
    }

    /// The next event, or `None` once the run's stream is closed.
    pub async fn next_event(&mut self) -> Option<RunEvent> {
        self.events.recv().await
    }

    /// Drain the stream and return the final report.
    pub async fn wait(mut self) -> Result<RunReport, SessionError> {
        while let Some(event) = self.events.recv().await {
            if let RunEvent::Finished(report) = event {
                return Ok(report);
            }
        }
        Err(SessionError::Interrupted(self.run_id))
    }
}

/// Controls the runs of one player session.
pub struct SessionController {
    id: SessionId,
    control: Arc<RunControl>,
    limits: InterpreterLimits,
    progress: Arc<dyn ProgressStore>,
    observers: Vec<Arc<dyn RunObserver>>,
    active: Mutex<Option<JoinHandle<()>>>,
}

impl SessionController {
    /// Create a session with no active run.
    pub fn new(
        limits: InterpreterLimits,
        config: SessionConfig,
        progress: Arc<dyn ProgressStore>,
    ) -> Self {
        let id = SessionId::new();
        debug!(session_id = %id, step_delay_ms = config.step_delay_ms, "Session created");
        Self {
            id,
            control: Arc::new(RunControl::new(config.step_delay_ms)),
            limits,
            progress,
            observers: Vec::new(),
            active: Mutex::new(None),
        }
    }

    /// The session identifier.
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Register an observer for every later run.
    pub fn add_observer(&mut self, observer: Arc<dyn RunObserver>) {
        self.observers.push(observer);
    }

    /// A handle that cancels the active run from anywhere, including an
    /// observer callback.
    pub fn canceller(&self) -> Canceller {
        Canceller::new(Arc::clone(&self.control))
    }

    /// Shared control state (pacing and generations).
    pub fn control(&self) -> &RunControl {
        &self.control
    }

    /// The unlock store.
    pub fn progress(&self) -> &dyn ProgressStore {
        self.progress.as_ref()
    }

    /// Start running `program` on `level`, superseding any active run.
    ///
    /// The previous run is cancelled and its task awaited before the new
    /// one is spawned, so two runs never emit concurrently.
    pub async fn start(
        &self,
        level: Arc<Level>,
        program: Program,
    ) -> Result<RunHandle, SessionError> {
        if !program.fits(level.capacities()) {
            let err = SessionError::ProgramShape {
                level: level.id(),
                expected: level.capacities(),
                actual: program.capacities(),
            };
            warn!(session_id = %self.id, error = %err, "Rejected program");
            return Err(err);
        }

        let token = self.control.begin_run();
        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            join_quietly(previous).await;
        }

        let run_id = RunId::new();
        let (tx, rx) = mpsc::unbounded_channel();
        info!(
            session_id = %self.id,
            run_id = %run_id,
            level = level.id(),
            step_delay_ms = self.control.step_delay_ms(),
            "Run starting"
        );

        let driver = Driver {
            interpreter: Interpreter::new(run_id, level, program, self.limits),
            token,
            control: Arc::clone(&self.control),
            progress: Arc::clone(&self.progress),
            observers: self.observers.clone(),
            events: tx,
        };
        *active = Some(tokio::spawn(driver.run()));

        Ok(RunHandle { run_id, events: rx })
    }

    /// Cancel the active run, if any. Does not wait for it to stop.
    ///
    /// A snapshot whose delivery began before the cancel landed still
    /// reaches every observer and the handle. No later step is emitted and
    /// the run finishes `Cancelled`. Use [`Self::wait_idle`] to know the
    /// run has stopped.
    pub fn cancel(&self) {
        self.control.cancel();
    }

    /// Cancel the active run, wait for it to stop, and show `level` in its
    /// start state. The idle snapshot goes to every observer and is
    /// returned.
    pub async fn reset(&self, level: &Level) -> RunSnapshot {
        self.control.cancel();
        self.wait_idle().await;

        let snapshot = RunSnapshot::idle(RunId::new(), level.id(), level.start());
        for observer in &self.observers {
            observer.on_snapshot(&snapshot);
        }
        debug!(session_id = %self.id, level = level.id(), "Session reset");
        snapshot
    }

    /// Wait until the active run (if any) has stopped.
    pub async fn wait_idle(&self) {
        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            join_quietly(previous).await;
        }
    }
}

async fn join_quietly(task: JoinHandle<()>) {
    if let Err(e) = task.await {
        warn!(error = %e, "Run task did not finish cleanly");
    }
}

/// Everything the spawned task needs for one run.
struct Driver {
    interpreter: Interpreter,
    token: RunToken,
    control: Arc<RunControl>,
    progress: Arc<dyn ProgressStore>,
    observers: Vec<Arc<dyn RunObserver>>,
    events: mpsc::UnboundedSender<RunEvent>,
}

impl Driver {
    async fn run(mut self) {
        let mut superseded = false;

        loop {
            if !self.control.is_live(self.token) {
                superseded = true;
                break;
            }

            let snapshot = self.interpreter.step();

            // An observer or another task may have cancelled while the
            // step was computed.
            if !self.control.is_live(self.token) {
                superseded = true;
                break;
            }

            let terminal = snapshot.status.is_terminal();
            self.emit_snapshot(snapshot);
            if terminal {
                break;
            }

            let delay_ms = self.control.step_delay_ms();
            if delay_ms > 0 {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
            } else {
                tokio::task::yield_now().await;
            }
        }

        if superseded {
            self.interpreter.cancel();
        }
        let report = self.report(superseded);

        info!(
            run_id = %report.run_id,
            level = report.level_id,
            status = ?report.status,
            steps = report.steps,
            calls = report.calls,
            collected = report.collected.len(),
            highest_unlocked = ?report.highest_unlocked,
            "Run ended"
        );

        for observer in &self.observers {
            observer.on_finished(&report);
        }
        let _ = self.events.send(RunEvent::Finished(report));
    }

    fn emit_snapshot(&self, snapshot: RunSnapshot) {
        for observer in &self.observers {
            observer.on_snapshot(&snapshot);
        }
        // The handle may have been dropped; observers still see the run.
        let _ = self.events.send(RunEvent::Step(snapshot));
    }

    fn report(&self, superseded: bool) -> RunReport {
        let state = self.interpreter.state();
        let level_id = self.interpreter.level().id();
        let status = if superseded {
            RunStatus::Cancelled
        } else {
            state.status
        };

        let highest_unlocked = if status == RunStatus::Succeeded {
            self.unlock_next(level_id)
        } else {
            None
        };

        RunReport {
            run_id: self.interpreter.run_id(),
            level_id,
            status,
            steps: state.steps,
            calls: state.calls,
            pose: state.pose,
            collected: state.collected.clone(),
            highest_unlocked,
            finished_at: Utc::now(),
        }
    }

    fn unlock_next(&self, level_id: u32) -> Option<u32> {
        let next = level_id.saturating_add(1);
        match self.progress.record_unlock(next) {
            Ok(highest) => {
                for observer in &self.observers {
                    observer.on_unlock(level_id, highest);
                }
                Some(highest)
            }
            Err(e) => {
                warn!(level = level_id, error = %e, "Failed to record unlock");
                None
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use logic_types::{Command, Facing, FunctionId};
    use logic_world::{Instructions, LevelRecord, StartRecord};

    use super::*;
    use crate::progress::MemoryProgressStore;

    fn corridor() -> Arc<Level> {
        let record = LevelRecord {
            id: 3,
            rows: 3,
            cols: 5,
            grid: String::from("WWWWW\nWGGGS\nWWWWW"),
            start: StartRecord {
                row: 1,
                col: 1,
                facing: Facing::Right,
            },
            markers: vec![[1, 4]],
            slot_capacities: [4, 0, 0, 0, 0],
            instructions: Instructions::default(),
            reference_solution: std::collections::BTreeMap::new(),
        };
        Arc::new(Level::from_record(record).unwrap())
    }

    fn controller(progress: Arc<dyn ProgressStore>) -> SessionController {
        SessionController::new(
            InterpreterLimits::default(),
            SessionConfig { step_delay_ms: 0 },
            progress,
        )
    }

    #[derive(Default)]
    struct Recorder {
        steps: StdMutex<Vec<u32>>,
        unlocks: StdMutex<Vec<(u32, u32)>>,
    }

    impl RunObserver for Recorder {
        fn on_snapshot(&self, snapshot: &RunSnapshot) {
            self.steps.lock().unwrap().push(snapshot.step);
        }

        fn on_finished(&self, _report: &RunReport) {}

        fn on_unlock(&self, level_id: u32, highest_unlocked: u32) {
            self.unlocks.lock().unwrap().push((level_id, highest_unlocked));
        }
    }

    #[tokio::test]
    async fn wrong_shape_is_rejected() {
        let session = controller(Arc::new(MemoryProgressStore::new()));
        let program = Program::with_capacities([2, 2, 0, 0, 0]);
        let err = session.start(corridor(), program).await.unwrap_err();
        assert!(matches!(err, SessionError::ProgramShape { level: 3, .. }));
    }

    #[tokio::test]
    async fn success_unlocks_next_level() {
        let progress = Arc::new(MemoryProgressStore::new());
        let recorder = Arc::new(Recorder::default());
        let mut session = controller(progress.clone());
        session.add_observer(recorder.clone());

        let level = corridor();
        let mut program = level.empty_program();
        program
            .load_function(FunctionId::F1, &[Command::forward(); 3])
            .unwrap();

        let report = session.start(level, program).await.unwrap().wait().await.unwrap();
        assert_eq!(report.status, RunStatus::Succeeded);
        assert_eq!(report.steps, 3);
        assert_eq!(report.highest_unlocked, Some(4));
        assert_eq!(progress.highest_unlocked(), 4);
        assert_eq!(*recorder.steps.lock().unwrap(), vec![1, 2, 3]);
        assert_eq!(*recorder.unlocks.lock().unwrap(), vec![(3, 4)]);
    }

    #[tokio::test]
    async fn failure_does_not_unlock() {
        let progress = Arc::new(MemoryProgressStore::new());
        let session = controller(progress.clone());
        let level = corridor();
        let mut program = level.empty_program();
        program
            .load_function(FunctionId::F1, &[Command::left(), Command::forward()])
            .unwrap();

        let report = session.start(level, program).await.unwrap().wait().await.unwrap();
        assert_eq!(report.status, RunStatus::Blocked);
        assert_eq!(report.highest_unlocked, None);
        assert_eq!(progress.highest_unlocked(), 1);
    }

    #[tokio::test]
    async fn reset_emits_idle_start_snapshot() {
        let recorder = Arc::new(Recorder::default());
        let mut session = controller(Arc::new(MemoryProgressStore::new()));
        session.add_observer(recorder.clone());

        let level = corridor();
        let snapshot = session.reset(&level).await;
        assert_eq!(snapshot.status, RunStatus::Idle);
        assert_eq!(snapshot.pose, level.start());
        assert_eq!(snapshot.step, 0);
        assert!(snapshot.collected.is_empty());
        assert_eq!(*recorder.steps.lock().unwrap(), vec![0]);
    }
}
