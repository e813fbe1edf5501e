use chrono::{DateTime, Utc};
use tracing::debug;

use exam_core::model::{
    AnswerLedger, Catalog, Countdown, EndReason, QuestionId, RecordOutcome, SessionId,
    SessionReport, TickOutcome,
};
use exam_core::scoring::{self, Progress};

//
// ─── STEP RESULT ───────────────────────────────────────────────────────────────
//

/// Effect of one event on a running exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStep {
    /// The event was not legal here and changed nothing.
    Ignored,
    Updated,
    /// The exam must end now, for the given reason.
    Finished(EndReason),
}

/// Sub-state of a running exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivePhase {
    InProgress,
    AwaitingConfirmation { unanswered: usize },
}

//
// ─── EXAM SESSION ──────────────────────────────────────────────────────────────
//

/// One running pass through a catalog: catalog, ledger and countdown together.
///
/// Created when the catalog arrives and consumed by [`ExamSession::finish`],
/// which retires all three and produces the report.
#[derive(Debug, Clone)]
pub struct ExamSession {
    id: SessionId,
    catalog: Catalog,
    ledger: AnswerLedger,
    countdown: Countdown,
    phase: ActivePhase,
    started_at: DateTime<Utc>,
}

impl ExamSession {
    #[must_use]
    pub fn new(catalog: Catalog, duration_secs: u32, started_at: DateTime<Utc>) -> Self {
        Self {
            id: SessionId::generate(),
            catalog,
            ledger: AnswerLedger::new(),
            countdown: Countdown::new(duration_secs),
            phase: ActivePhase::InProgress,
            started_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn ledger(&self) -> &AnswerLedger {
        &self.ledger
    }

    #[must_use]
    pub fn phase(&self) -> ActivePhase {
        self.phase
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.countdown.remaining()
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn progress(&self) -> Progress {
        scoring::progress(&self.catalog, &self.ledger)
    }

    /// Record a choice. The only write path into the ledger.
    ///
    /// Ignored unless in progress, and ignored for unknown or defective
    /// questions, choices the question does not offer, and questions that
    /// already have an answer.
    pub fn select_answer(&mut self, question: &QuestionId, choice: &str) -> SessionStep {
        if self.phase != ActivePhase::InProgress {
            return SessionStep::Ignored;
        }
        let Some(q) = self.catalog.get(question) else {
            debug!(session = %self.id, %question, "selection for unknown question ignored");
            return SessionStep::Ignored;
        };
        if !q.is_answerable() || !q.offers(choice) {
            debug!(session = %self.id, %question, "selection not offered by question ignored");
            return SessionStep::Ignored;
        }

        match self.ledger.record(question.clone(), choice) {
            RecordOutcome::Recorded => SessionStep::Updated,
            RecordOutcome::AlreadyAnswered => SessionStep::Ignored,
        }
    }

    /// Advance the countdown by one second.
    ///
    /// Reaching zero ends the exam from either sub-state; a pending
    /// confirmation does not survive a timeout.
    pub fn tick(&mut self) -> SessionStep {
        match self.countdown.tick() {
            TickOutcome::Running(_) => SessionStep::Updated,
            TickOutcome::Expired => SessionStep::Finished(EndReason::TimedOut),
            TickOutcome::Stopped => SessionStep::Ignored,
        }
    }

    pub fn request_submit(&mut self) -> SessionStep {
        if self.phase != ActivePhase::InProgress {
            return SessionStep::Ignored;
        }
        let unanswered = self.progress().unanswered;
        if unanswered == 0 {
            return SessionStep::Finished(EndReason::Completed);
        }
        self.phase = ActivePhase::AwaitingConfirmation { unanswered };
        SessionStep::Updated
    }

    pub fn confirm_submit(&mut self) -> SessionStep {
        match self.phase {
            ActivePhase::AwaitingConfirmation { .. } => SessionStep::Finished(EndReason::Confirmed),
            ActivePhase::InProgress => SessionStep::Ignored,
        }
    }

    pub fn cancel_submit(&mut self) -> SessionStep {
        match self.phase {
            ActivePhase::AwaitingConfirmation { .. } => {
                self.phase = ActivePhase::InProgress;
                SessionStep::Updated
            }
            ActivePhase::InProgress => SessionStep::Ignored,
        }
    }

    /// Freeze the countdown, score the ledger, and retire the session.
    #[must_use]
    pub fn finish(mut self, reason: EndReason, ended_at: DateTime<Utc>) -> SessionReport {
        self.countdown.freeze();
        SessionReport {
            outcome: scoring::score(&self.catalog, &self.ledger),
            reviews: scoring::review(&self.catalog, &self.ledger),
            reason,
            category: self.catalog.category().clone(),
            started_at: self.started_at,
            ended_at,
            remaining_secs: self.countdown.remaining(),
        }
    }
}
