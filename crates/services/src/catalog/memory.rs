use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::json;

use exam_core::model::{Category, QuestionId, QuestionRecord};

use super::CatalogProvider;
use crate::error::FetchError;

/// Category name served by [`InMemoryCatalogProvider::sample`].
pub const SAMPLE_CATEGORY: &str = "sample";

/// Fixed catalogs held in memory, for tests and offline runs.
#[derive(Clone, Debug, Default)]
pub struct InMemoryCatalogProvider {
    catalogs: HashMap<Category, Vec<QuestionRecord>>,
}

impl InMemoryCatalogProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_category(mut self, category: Category, records: Vec<QuestionRecord>) -> Self {
        self.catalogs.insert(category, records);
        self
    }

    /// Twenty placeholder questions whose correct choice is always `Option A`.
    #[must_use]
    pub fn sample() -> Self {
        let records = (1..=20_u64)
            .map(|n| QuestionRecord {
                id: Some(QuestionId::number(n)),
                prompt: format!("Question {n}: What is the answer?"),
                options: json!(["Option A", "Option B", "Option C", "Option D"]),
                correct: "Option A".into(),
                category: Some(SAMPLE_CATEGORY.into()),
                explanation: None,
                difficulty: None,
            })
            .collect();
        Self::new().with_category(Category::new(SAMPLE_CATEGORY), records)
    }
}

#[async_trait]
impl CatalogProvider for InMemoryCatalogProvider {
    async fn fetch(&self, category: &Category) -> Result<Vec<QuestionRecord>, FetchError> {
        self.catalogs
            .get(category)
            .cloned()
            .ok_or_else(|| FetchError::UnknownCategory(category.clone()))
    }
}
