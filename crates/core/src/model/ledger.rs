use std::collections::HashMap;

use crate::model::ids::QuestionId;

/// Result of offering a choice to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded,
    AlreadyAnswered,
}

/// Write-once record of the participant's choices.
///
/// Once a question id is present its choice never changes. Only membership
/// and value matter; insertion order is not tracked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerLedger {
    answers: HashMap<QuestionId, String>,
}

impl AnswerLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, id: QuestionId, choice: impl Into<String>) -> RecordOutcome {
        match self.answers.entry(id) {
            std::collections::hash_map::Entry::Occupied(_) => RecordOutcome::AlreadyAnswered,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(choice.into());
                RecordOutcome::Recorded
            }
        }
    }

    #[must_use]
    pub fn choice(&self, id: &QuestionId) -> Option<&str> {
        self.answers.get(id).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, id: &QuestionId) -> bool {
        self.answers.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QuestionId, &str)> {
        self.answers.iter().map(|(id, choice)| (id, choice.as_str()))
    }
}
