use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;

use exam_core::model::{Category, QuestionRecord};

use super::CatalogProvider;
use crate::error::FetchError;

/// Reads question records from a local JSON file.
///
/// The file holds either one array (served for every category) or an object
/// mapping category names to arrays.
#[derive(Clone, Debug)]
pub struct JsonFileCatalogProvider {
    path: PathBuf,
}

impl JsonFileCatalogProvider {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CatalogProvider for JsonFileCatalogProvider {
    async fn fetch(&self, category: &Category) -> Result<Vec<QuestionRecord>, FetchError> {
        let raw = tokio::fs::read(&self.path).await?;
        let document: Value = serde_json::from_slice(&raw)?;

        let records = match document {
            Value::Object(mut by_category) => by_category
                .remove(category.as_str())
                .ok_or_else(|| FetchError::UnknownCategory(category.clone()))?,
            other => other,
        };

        Ok(serde_json::from_value(records)?)
    }
}
