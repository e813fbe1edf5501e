use std::collections::HashSet;
use thiserror::Error;

use crate::model::{
    ids::{Category, QuestionId},
    question::{Question, QuestionRecord},
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("duplicate question id {0}")]
    DuplicateId(QuestionId),
}

/// Ordered, fixed set of questions for one session.
///
/// Order is presentation order. Ids are unique; an empty catalog is valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    category: Category,
    questions: Vec<Question>,
}

impl Catalog {
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateId` if two questions share an id.
    pub fn new(category: Category, questions: Vec<Question>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(questions.len());
        for q in &questions {
            if !seen.insert(q.id()) {
                return Err(CatalogError::DuplicateId(q.id().clone()));
            }
        }
        Ok(Self {
            category,
            questions,
        })
    }

    /// Normalize provider records in order and build a catalog from them.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateId` if two records share an id.
    pub fn from_records(
        category: Category,
        records: Vec<QuestionRecord>,
    ) -> Result<Self, CatalogError> {
        let questions = records
            .into_iter()
            .enumerate()
            .map(|(position, record)| record.into_question(position))
            .collect();
        Self::new(category, questions)
    }

    #[must_use]
    pub fn category(&self) -> &Category {
        &self.category
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    #[must_use]
    pub fn into_parts(self) -> (Category, Vec<Question>) {
        (self.category, self.questions)
    }

    /// Number of questions flagged as unanswerable.
    #[must_use]
    pub fn defective_count(&self) -> usize {
        self.questions.iter().filter(|q| !q.is_answerable()).count()
    }
}
