mod file;
mod http;
mod loader;
mod memory;

use async_trait::async_trait;
use exam_core::model::{Category, QuestionRecord};

use crate::error::FetchError;

pub use file::JsonFileCatalogProvider;
pub use http::HttpCatalogProvider;
pub use loader::CatalogLoader;
pub use memory::{InMemoryCatalogProvider, SAMPLE_CATEGORY};

/// Source of raw question records for a category.
///
/// Implementations perform one attempt per call; retries belong to
/// `CatalogLoader`.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Fetch the ordered question records for `category`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` for transport, status, or decoding failures.
    async fn fetch(&self, category: &Category) -> Result<Vec<QuestionRecord>, FetchError>;
}
