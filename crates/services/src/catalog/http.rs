use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use exam_core::model::{Category, QuestionRecord};

use super::CatalogProvider;
use crate::error::{ConfigError, FetchError};

/// Fetches `GET {base_url}/categories/{category}/questions`.
///
/// The body must be a JSON array of question records.
#[derive(Clone, Debug)]
pub struct HttpCatalogProvider {
    client: Client,
    base_url: Url,
}

impl HttpCatalogProvider {
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if `base_url` is not an absolute
    /// http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidUrl {
            url: base_url.to_owned(),
            reason,
        };
        let parsed = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if parsed.cannot_be_a_base() || !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid("expected an http(s) base url".into()));
        }
        Ok(Self {
            client: Client::new(),
            base_url: parsed,
        })
    }

    /// Endpoint for a category; the category is percent-encoded as one segment.
    #[must_use]
    pub fn questions_url(&self, category: &Category) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["categories", category.as_str(), "questions"]);
        }
        url
    }
}

#[async_trait]
impl CatalogProvider for HttpCatalogProvider {
    async fn fetch(&self, category: &Category) -> Result<Vec<QuestionRecord>, FetchError> {
        let response = self.client.get(self.questions_url(category)).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status()));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_category_endpoint() {
        let provider = HttpCatalogProvider::new("https://quiz.example.com/api/").unwrap();
        let url = provider.questions_url(&Category::new("internal medicine"));
        assert_eq!(
            url.as_str(),
            "https://quiz.example.com/api/categories/internal%20medicine/questions"
        );
    }

    #[test]
    fn rejects_non_http_base() {
        assert!(HttpCatalogProvider::new("not a url").is_err());
        assert!(HttpCatalogProvider::new("mailto:quiz@example.com").is_err());
    }
}
