use tracing::{debug, error, info};

use exam_core::model::{Catalog, Category, EndReason, QuestionId, SessionReport};

use super::service::{ExamSession, SessionStep};
use crate::Clock;
use crate::error::LoadError;

/// Where the controller currently is.
#[derive(Debug, Clone)]
pub enum SessionState {
    /// Nothing started yet.
    Idle,
    /// Waiting on the catalog fetch for `category`.
    Loading { category: Category },
    /// In progress or awaiting confirmation.
    Active(Box<ExamSession>),
    Ended(Box<SessionReport>),
    /// Load failed; only `retry_load` or a fresh `start` leave this state.
    Failed { category: Category, error: String },
}

/// What an event did to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Not legal in the current state, or stale. Nothing changed.
    Ignored,
    Applied,
    /// The session ended with this report. Produced once per session.
    Ended(Box<SessionReport>),
}

impl Transition {
    #[must_use]
    pub fn is_applied(&self) -> bool {
        !matches!(self, Transition::Ignored)
    }
}

/// Total state machine over the session event alphabet.
///
/// Every event is accepted in every state; the ones that are illegal for the
/// current state return [`Transition::Ignored`]. Asynchronous inputs (ticks,
/// fetch results) carry the generation they were issued under and are dropped
/// if it no longer matches.
#[derive(Debug, Clone)]
pub struct SessionController {
    clock: Clock,
    duration_secs: u32,
    generation: u64,
    state: SessionState,
}

impl SessionController {
    #[must_use]
    pub fn new(clock: Clock, duration_secs: u32) -> Self {
        Self {
            clock,
            duration_secs,
            generation: 0,
            state: SessionState::Idle,
        }
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Current generation. Bumped by every `start` and `retry_load`.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the countdown should be ticking.
    #[must_use]
    pub fn clock_running(&self) -> bool {
        matches!(self.state, SessionState::Active(_))
    }

    /// Abandon whatever is current and begin loading `category`.
    ///
    /// Returns the generation the fetch must report back with.
    pub fn start(&mut self, category: Category) -> u64 {
        self.generation += 1;
        info!(%category, generation = self.generation, "loading exam");
        self.state = SessionState::Loading { category };
        self.generation
    }

    /// Re-enter loading after a failure. Returns `None` outside `Failed`.
    pub fn retry_load(&mut self) -> Option<(u64, Category)> {
        let SessionState::Failed { category, .. } = &self.state else {
            return None;
        };
        let category = category.clone();
        Some((self.start(category.clone()), category))
    }

    /// Apply the result of a catalog fetch issued under `generation`.
    pub fn catalog_loaded(
        &mut self,
        generation: u64,
        result: Result<Catalog, LoadError>,
    ) -> Transition {
        if generation != self.generation {
            debug!(generation, current = self.generation, "stale catalog result dropped");
            return Transition::Ignored;
        }
        let SessionState::Loading { category } = &self.state else {
            return Transition::Ignored;
        };
        let category = category.clone();

        match result {
            Ok(catalog) => {
                info!(
                    %category,
                    questions = catalog.len(),
                    defective = catalog.defective_count(),
                    duration_secs = self.duration_secs,
                    "exam started"
                );
                let session = ExamSession::new(catalog, self.duration_secs, self.clock.now());
                self.state = SessionState::Active(Box::new(session));
                // A zero-length exam has no tick to expire on.
                if self.duration_secs == 0 {
                    return self.apply(|_| SessionStep::Finished(EndReason::TimedOut));
                }
            }
            Err(err) => {
                error!(%category, error = %err, "exam failed to load");
                self.state = SessionState::Failed {
                    category,
                    error: err.to_string(),
                };
            }
        }
        Transition::Applied
    }

    pub fn select_answer(&mut self, question: &QuestionId, choice: &str) -> Transition {
        self.apply(|session| session.select_answer(question, choice))
    }

    /// One countdown second, issued under `generation`.
    pub fn tick(&mut self, generation: u64) -> Transition {
        if generation != self.generation {
            return Transition::Ignored;
        }
        debug!(generation, "tick");
        self.apply(ExamSession::tick)
    }

    pub fn request_submit(&mut self) -> Transition {
        self.apply(ExamSession::request_submit)
    }

    pub fn confirm_submit(&mut self) -> Transition {
        self.apply(ExamSession::confirm_submit)
    }

    pub fn cancel_submit(&mut self) -> Transition {
        self.apply(ExamSession::cancel_submit)
    }

    fn apply(&mut self, event: impl FnOnce(&mut ExamSession) -> SessionStep) -> Transition {
        let SessionState::Active(session) = &mut self.state else {
            return Transition::Ignored;
        };

        match event(&mut **session) {
            SessionStep::Ignored => Transition::Ignored,
            SessionStep::Updated => Transition::Applied,
            SessionStep::Finished(reason) => {
                let SessionState::Active(session) =
                    std::mem::replace(&mut self.state, SessionState::Idle)
                else {
                    return Transition::Ignored;
                };
                let report = Box::new(session.finish(reason, self.clock.now()));
                info!(
                    category = %report.category,
                    ?reason,
                    score = report.outcome.score,
                    total = report.outcome.total,
                    percentage = report.outcome.percentage,
                    "exam ended"
                );
                self.state = SessionState::Ended(report.clone());
                Transition::Ended(report)
            }
        }
    }
}
