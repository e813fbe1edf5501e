use exam_core::model::{Category, QuestionId, SessionReport, format_secs};
use exam_core::scoring::Progress;

use super::controller::{SessionController, SessionState};
use super::service::ActivePhase;

/// Coarse phase of the session, as shown to a presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    InProgress,
    AwaitingConfirmation,
    Ended,
    Failed,
}

/// One question as the presentation layer needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub id: QuestionId,
    pub prompt: String,
    pub choices: Vec<String>,
    /// `false` for questions loaded without usable choices.
    pub answerable: bool,
    pub chosen: Option<String>,
}

/// Read-only copy of the controller state, published after every event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub generation: u64,
    pub phase: Phase,
    pub category: Option<Category>,
    pub questions: Vec<QuestionView>,
    pub progress: Option<Progress>,
    pub remaining_secs: Option<u32>,
    /// Set while awaiting confirmation.
    pub unanswered: Option<usize>,
    pub error: Option<String>,
    pub report: Option<SessionReport>,
}

impl SessionSnapshot {
    #[must_use]
    pub fn idle() -> Self {
        Self {
            generation: 0,
            phase: Phase::Idle,
            category: None,
            questions: Vec::new(),
            progress: None,
            remaining_secs: None,
            unanswered: None,
            error: None,
            report: None,
        }
    }

    /// Remaining time as `M:SS`, when a countdown exists.
    #[must_use]
    pub fn remaining_label(&self) -> Option<String> {
        self.remaining_secs.map(format_secs)
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self::idle()
    }
}

impl SessionController {
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let base = SessionSnapshot {
            generation: self.generation(),
            ..SessionSnapshot::idle()
        };

        match self.state() {
            SessionState::Idle => base,
            SessionState::Loading { category } => SessionSnapshot {
                phase: Phase::Loading,
                category: Some(category.clone()),
                ..base
            },
            SessionState::Failed { category, error } => SessionSnapshot {
                phase: Phase::Failed,
                category: Some(category.clone()),
                error: Some(error.clone()),
                ..base
            },
            SessionState::Ended(report) => SessionSnapshot {
                phase: Phase::Ended,
                category: Some(report.category.clone()),
                remaining_secs: Some(report.remaining_secs),
                report: Some((**report).clone()),
                ..base
            },
            SessionState::Active(session) => {
                let (phase, unanswered) = match session.phase() {
                    ActivePhase::InProgress => (Phase::InProgress, None),
                    ActivePhase::AwaitingConfirmation { unanswered } => {
                        (Phase::AwaitingConfirmation, Some(unanswered))
                    }
                };
                let questions = session
                    .catalog()
                    .questions()
                    .iter()
                    .map(|q| QuestionView {
                        id: q.id().clone(),
                        prompt: q.prompt().to_owned(),
                        choices: q.choices().to_vec(),
                        answerable: q.is_answerable(),
                        chosen: session.ledger().choice(q.id()).map(str::to_owned),
                    })
                    .collect();
                SessionSnapshot {
                    phase,
                    category: Some(session.catalog().category().clone()),
                    questions,
                    progress: Some(session.progress()),
                    remaining_secs: Some(session.remaining_secs()),
                    unanswered,
                    ..base
                }
            }
        }
    }
}
