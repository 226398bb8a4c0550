use crate::config::SearchSettings;
use crate::error::{Error, Result};
use crate::feed::parser::FeedParser;
use crate::feed::{Article, NewsSource};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "https://news.google.com/rss/search";

#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: Client,
    endpoint: Url,
    timeout_duration: Duration,
    user_agent: String,
}

impl FeedFetcher {
    pub fn new(settings: &SearchSettings) -> Result<Self> {
        FeedParser::new().validate_feed_url(&settings.endpoint)?;
        let endpoint = Url::parse(&settings.endpoint)
            .map_err(|e| Error::InvalidUrl(format!("Invalid URL: {}", e)))?;

        let timeout_duration = Duration::from_secs(settings.timeout);
        let client = Client::builder()
            .timeout(timeout_duration)
            .redirect(reqwest::redirect::Policy::limited(10))
            .gzip(true)
            .build()
            .map_err(|e| Error::HttpError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            timeout_duration,
            user_agent: settings.user_agent.clone(),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_duration = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// The feed URL for a query, with the query form-encoded into `q`.
    pub fn search_url(&self, query: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("q", query);
        url
    }

    pub async fn fetch_articles(&self, query: &str) -> Result<Vec<Article>> {
        let url = self.search_url(query);
        debug!("Fetching news feed from: {}", url);

        let response = timeout(self.timeout_duration, self.fetch_response(&url))
            .await
            .map_err(|_| Error::Timeout(format!("Request to {} timed out", url)))??;

        if !response.status().is_success() {
            return Err(Error::HttpError(format!(
                "HTTP {} for {}: {}",
                response.status().as_u16(),
                url,
                response.status().canonical_reason().unwrap_or("Unknown error")
            )));
        }

        let content = response
            .bytes()
            .await
            .map_err(|e| Error::HttpError(format!("Failed to read response body: {}", e)))?;

        debug!("Downloaded {} bytes from {}", content.len(), url);

        let articles = FeedParser::new()
            .parse_articles(std::io::Cursor::new(content))
            .map_err(|e| {
                warn!("Feed for query {:?} could not be parsed: {}", query, e);
                e
            })?;

        debug!("Parsed {} articles for query {:?}", articles.len(), query);
        Ok(articles)
    }

    async fn fetch_response(&self, url: &Url) -> Result<Response> {
        self.client
            .get(url.clone())
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/rss+xml, application/xml, text/xml, */*")
            .send()
            .await
            .map_err(|e| Error::HttpError(format!("Request failed: {}", e)))
    }
}

#[async_trait]
impl NewsSource for FeedFetcher {
    async fn search(&self, query: &str) -> Result<Vec<Article>> {
        self.fetch_articles(query).await
    }
}
