//! HTTP client for the GNews search API.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::{ArticleSource, SourceError};
use crate::models::Candidate;

const DEFAULT_URL: &str = "https://gnews.io/api/v4";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    articles: Vec<Candidate>,
}

#[derive(Clone)]
pub struct GNewsClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl std::fmt::Debug for GNewsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GNewsClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl GNewsClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_URL, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: Client::new(),
        }
    }

    fn parse_body(body: &str) -> Result<Vec<Candidate>, SourceError> {
        let parsed: SearchResponse = serde_json::from_str(body)?;
        let total = parsed.articles.len();
        let articles: Vec<_> = parsed
            .articles
            .into_iter()
            .filter(|a| !a.url.trim().is_empty())
            .collect();

        if articles.len() < total {
            tracing::debug!("Skipped {} search results without a URL", total - articles.len());
        }
        Ok(articles)
    }
}

#[async_trait]
impl ArticleSource for GNewsClient {
    fn name(&self) -> &str {
        "gnews"
    }

    async fn search(&self, query: &str, max: u32) -> Result<Vec<Candidate>, SourceError> {
        let max = max.to_string();
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("q", query),
                ("token", self.api_key.as_str()),
                ("lang", "en"),
                ("max", max.as_str()),
                ("sortby", "publishedAt"),
            ])
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let body = response.text().await?;
                Self::parse_body(&body)
            }
            StatusCode::UNAUTHORIZED => Err(SourceError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => Err(SourceError::RateLimited),
            status => Err(SourceError::Api {
                status: status.as_u16(),
            }),
        }
    }
}
