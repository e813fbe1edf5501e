mod clock;
mod controller;
mod results;
mod runtime;
mod service;
mod snapshot;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use controller::{SessionController, SessionState, Transition};
pub use results::{DiscardResults, ResultsSink};
pub use runtime::{SessionCommand, SessionHandle, SessionRuntime};
pub use service::{ActivePhase, ExamSession, SessionStep};
pub use snapshot::{Phase, QuestionView, SessionSnapshot};
