//! Interpreter, session control and unlock progress for the Logic Grid
//! puzzle.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `logic-config.yaml` into
//!   strongly-typed structs.
//! - [`interpreter`] -- Step-at-a-time execution of a [`Program`] on a
//!   [`Level`].
//! - [`control`] -- Generation-based cancellation and runtime pacing.
//! - [`session`] -- [`SessionController`], [`RunObserver`] and the per-run
//!   event stream.
//! - [`progress`] -- [`ProgressStore`] with in-memory and file backends.
//!
//! [`Program`]: logic_types::Program
//! [`Level`]: logic_world::Level
//! [`SessionController`]: session::SessionController
//! [`RunObserver`]: session::RunObserver
//! [`ProgressStore`]: progress::ProgressStore

pub mod config;
pub mod control;
pub mod interpreter;
pub mod progress;
pub mod session;

pub use config::{EngineConfig, InterpreterLimits, SessionConfig};
pub use control::{Canceller, RunControl, RunToken};
pub use interpreter::{Interpreter, RunState};
pub use progress::{FileProgressStore, MemoryProgressStore, ProgressError, ProgressStore};
pub use session::{NoOpObserver, RunEvent, RunHandle, RunObserver, SessionController, SessionError};
