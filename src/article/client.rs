// src/article/client.rs
use reqwest::header;

use crate::utils::error::FetchError;

const ARTICLE_USER_AGENT: &str = concat!("hog_price_extractor/", env!("CARGO_PKG_VERSION"));

/// Fetches article HTML through a pass-through proxy that takes the target URL as its path.
#[derive(Clone)]
pub struct ArticleFetcher {
    http_client: reqwest::Client,
    proxy_url: String,
}

impl ArticleFetcher {
    pub fn new(proxy_url: impl Into<String>) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(ARTICLE_USER_AGENT)
            .build()?;
        Ok(Self {
            http_client,
            proxy_url: proxy_url.into(),
        })
    }

    pub fn proxied_url(&self, article_url: &str) -> String {
        format!("{}{}", self.proxy_url, article_url)
    }

    /// Downloads the raw HTML of an article. No retry is attempted.
    pub async fn fetch_article_html(&self, article_url: &str) -> Result<String, FetchError> {
        let url = self.proxied_url(article_url);
        tracing::info!("Fetching article from: {}", article_url);
        tracing::debug!("Proxy request: {}", url);

        let response = self
            .http_client
            .get(&url)
            .header(header::ACCEPT, "text/html,application/xhtml+xml,text/plain,*/*")
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Article fetch error: {}", e);
                FetchError::Network(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("HTTP error status: {} for URL: {}", status, article_url);
            return Err(FetchError::Http(status));
        }

        let body = response.text().await?;
        tracing::debug!("Downloaded {} bytes from {}", body.len(), article_url);

        Ok(body)
    }
}
