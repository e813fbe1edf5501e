use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::ids::QuestionId;

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// Display-only difficulty tag carried by some catalogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Parses a tag case-insensitively. Unknown tags yield `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A loaded multiple-choice question. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    choices: Vec<String>,
    correct: String,
    category: Option<String>,
    explanation: Option<String>,
    difficulty: Option<Difficulty>,
}

impl Question {
    #[must_use]
    pub fn new(
        id: impl Into<QuestionId>,
        prompt: impl Into<String>,
        choices: Vec<String>,
        correct: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            choices,
            correct: correct.into(),
            category: None,
            explanation: None,
            difficulty: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    #[must_use]
    pub fn correct(&self) -> &str {
        &self.correct
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    #[must_use]
    pub fn difficulty(&self) -> Option<Difficulty> {
        self.difficulty
    }

    /// True when the question offers at least one choice and its correct
    /// choice is among them. Defective questions can never be scored.
    #[must_use]
    pub fn is_answerable(&self) -> bool {
        self.offers(&self.correct)
    }

    #[must_use]
    pub fn offers(&self, choice: &str) -> bool {
        self.choices.iter().any(|c| c == choice)
    }
}

//
// ─── WIRE RECORD ───────────────────────────────────────────────────────────────
//

/// Question as delivered by a catalog provider, before normalization.
///
/// `options` is kept as raw JSON because providers disagree on its shape; see
/// [`normalize_options`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    #[serde(default)]
    pub id: Option<QuestionId>,
    #[serde(alias = "question")]
    pub prompt: String,
    #[serde(default)]
    pub options: Value,
    #[serde(default, alias = "answer")]
    pub correct: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

impl QuestionRecord {
    /// Normalize into a [`Question`]. Records without an id are numbered from
    /// their 1-based position in the catalog.
    ///
    /// A blank prompt leaves nothing to show, so the question keeps its place
    /// but offers no choices and can never be answered.
    #[must_use]
    pub fn into_question(self, position: usize) -> Question {
        let id = self
            .id
            .unwrap_or_else(|| QuestionId::Number(u64::try_from(position + 1).unwrap_or(u64::MAX)));

        let choices = if self.prompt.trim().is_empty() {
            Vec::new()
        } else {
            normalize_options(&self.options)
        };

        Question {
            choices,
            id,
            prompt: self.prompt,
            correct: self.correct,
            category: self.category,
            explanation: self.explanation,
            difficulty: self.difficulty.as_deref().and_then(Difficulty::parse),
        }
    }
}

/// Flatten a provider's option encoding into an ordered list of choices.
///
/// - array of strings: used as-is
/// - object of strings: values in the object's own order
/// - anything else: no choices (the question becomes unanswerable)
#[must_use]
pub fn normalize_options(raw: &Value) -> Vec<String> {
    let values: Vec<&Value> = match raw {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => map.values().collect(),
        _ => return Vec::new(),
    };

    values
        .into_iter()
        .map(|v| v.as_str().map(str::to_owned))
        .collect::<Option<Vec<_>>>()
        .unwrap_or_default()
}
