use std::sync::Arc;
use std::time::Duration;

use rand::rng;
use rand::seq::SliceRandom;
use tracing::{debug, warn};

use exam_core::model::{Catalog, Category};

use super::CatalogProvider;
use crate::config::ExamConfig;
use crate::error::{FetchError, LoadError};

/// Fetches and normalizes a catalog, retrying transient provider failures.
#[derive(Clone)]
pub struct CatalogLoader {
    provider: Arc<dyn CatalogProvider>,
    max_attempts: u32,
    retry_delay: Duration,
    shuffle: bool,
}

impl CatalogLoader {
    #[must_use]
    pub fn new(provider: Arc<dyn CatalogProvider>) -> Self {
        let defaults = ExamConfig::default();
        Self {
            provider,
            max_attempts: defaults.max_attempts,
            retry_delay: defaults.retry_delay,
            shuffle: defaults.shuffle_questions,
        }
    }

    #[must_use]
    pub fn from_config(provider: Arc<dyn CatalogProvider>, config: &ExamConfig) -> Self {
        Self::new(provider)
            .with_retries(config.max_attempts, config.retry_delay)
            .with_shuffle(config.shuffle_questions)
    }

    #[must_use]
    pub fn with_retries(mut self, max_attempts: u32, retry_delay: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.retry_delay = retry_delay;
        self
    }

    /// Shuffle presentation order once at load time.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Load the catalog for `category`.
    ///
    /// # Errors
    ///
    /// Returns `LoadError` once the retry budget is exhausted, or immediately for
    /// non-transient failures such as malformed data.
    pub async fn load(&self, category: &Category) -> Result<Catalog, LoadError> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let result = self
                .provider
                .fetch(category)
                .await
                .and_then(|records| Ok(Catalog::from_records(category.clone(), records)?));

            match result {
                Ok(catalog) => {
                    debug!(%category, attempts, questions = catalog.len(), "catalog loaded");
                    return self.finish(catalog).map_err(|source| LoadError { attempts, source });
                }
                Err(source) if source.is_transient() && attempts < self.max_attempts => {
                    warn!(%category, attempts, error = %source, "catalog fetch failed, retrying");
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(source) => return Err(LoadError { attempts, source }),
            }
        }
    }

    fn finish(&self, catalog: Catalog) -> Result<Catalog, FetchError> {
        if !self.shuffle {
            return Ok(catalog);
        }
        let (category, mut questions) = catalog.into_parts();
        questions.shuffle(&mut rng());
        Ok(Catalog::new(category, questions)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{InMemoryCatalogProvider, SAMPLE_CATEGORY};
    use async_trait::async_trait;
    use exam_core::model::{QuestionId, QuestionRecord};
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails with a 503 until `fail_first` attempts have been made.
    struct FlakyProvider {
        calls: AtomicU32,
        fail_first: u32,
    }

    #[async_trait]
    impl CatalogProvider for FlakyProvider {
        async fn fetch(&self, _category: &Category) -> Result<Vec<QuestionRecord>, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.fail_first {
                return Err(FetchError::HttpStatus(
                    reqwest::StatusCode::SERVICE_UNAVAILABLE,
                ));
            }
            Ok(vec![QuestionRecord {
                id: None,
                prompt: "Q".into(),
                options: json!({ "x": "Paris", "y": "Lyon" }),
                correct: "Paris".into(),
                category: None,
                explanation: None,
                difficulty: None,
            }])
        }
    }

    fn flaky(fail_first: u32) -> Arc<FlakyProvider> {
        Arc::new(FlakyProvider {
            calls: AtomicU32::new(0),
            fail_first,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_failures() {
        let provider = flaky(2);
        let loader = CatalogLoader::new(provider.clone()).with_retries(3, Duration::from_millis(10));

        let catalog = loader.load(&Category::new("geo")).await.unwrap();
        assert_eq!(catalog.questions()[0].choices(), ["Paris", "Lyon"]);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_budget() {
        let provider = flaky(10);
        let loader = CatalogLoader::new(provider.clone()).with_retries(3, Duration::from_millis(10));

        let err = loader.load(&Category::new("geo")).await.unwrap_err();
        assert_eq!(err.attempts, 3);
        assert!(matches!(err.source, FetchError::HttpStatus(_)));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn malformed_data_is_not_retried() {
        let record = QuestionRecord {
            id: Some(1_u64.into()),
            prompt: "Q".into(),
            options: json!(["A"]),
            correct: "A".into(),
            category: None,
            explanation: None,
            difficulty: None,
        };
        let provider = InMemoryCatalogProvider::new()
            .with_category(Category::new("dup"), vec![record.clone(), record]);
        let loader = CatalogLoader::new(Arc::new(provider)).with_retries(5, Duration::ZERO);

        let err = loader.load(&Category::new("dup")).await.unwrap_err();
        assert_eq!(err.attempts, 1);
        assert!(matches!(err.source, FetchError::Invalid(_)));
    }

    #[tokio::test]
    async fn shuffle_keeps_every_question() {
        let loader = CatalogLoader::new(Arc::new(InMemoryCatalogProvider::sample()))
            .with_shuffle(true);

        let catalog = loader.load(&Category::new(SAMPLE_CATEGORY)).await.unwrap();
        let mut ids: Vec<_> = catalog.questions().iter().map(|q| q.id().clone()).collect();
        ids.sort();
        let expected: Vec<QuestionId> = (1..=20_u64).map(QuestionId::number).collect();
        assert_eq!(ids, expected);
    }
}
