pub mod sanitize;

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::SearchSettings;
use crate::error::{Error, Result};
use crate::feed::{Article, NewsSource};
use crate::render;
use crate::security::TokenVerifier;
use crate::storage::CacheStore;

pub use sanitize::{cache_key, sanitize_text_field};

pub const SECURITY_ERROR: &str = "Security check failed. Please refresh and try again.";
pub const FETCH_ERROR: &str = "Could not fetch news. Please try again.";

/// One form submission, as seen by the handler.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    /// Whether the submit button's field was present.
    pub submitted: bool,
    pub query: Option<String>,
    pub token: Option<String>,
    /// Identity the anti-forgery token is bound to.
    pub session: String,
}

impl SearchRequest {
    pub fn idle(session: impl Into<String>) -> Self {
        Self {
            session: session.into(),
            ..Self::default()
        }
    }

    pub fn submit(
        session: impl Into<String>,
        query: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            submitted: true,
            query: Some(query.into()),
            token,
            session: session.into(),
        }
    }
}

/// Exactly one of these is shown under the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Idle,
    Failed(String),
    Found(Vec<Article>),
    NoResults,
}

/// What the form and the block beneath it should display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchView {
    /// Text to pre-fill the query input with.
    pub query: String,
    pub outcome: SearchOutcome,
}

impl SearchView {
    pub fn idle() -> Self {
        Self {
            query: String::new(),
            outcome: SearchOutcome::Idle,
        }
    }

    fn failed(query: String, message: &str) -> Self {
        Self {
            query,
            outcome: SearchOutcome::Failed(message.to_string()),
        }
    }

    fn from_results(query: String, articles: Vec<Article>) -> Self {
        let outcome = if articles.is_empty() {
            SearchOutcome::NoResults
        } else {
            SearchOutcome::Found(articles)
        };
        Self { query, outcome }
    }
}

pub struct SearchHandler {
    source: Arc<dyn NewsSource>,
    cache: Arc<dyn CacheStore>,
    verifier: Arc<dyn TokenVerifier>,
    cache_ttl: Duration,
    cache_key_prefix: String,
}

impl SearchHandler {
    pub fn new(
        source: Arc<dyn NewsSource>,
        cache: Arc<dyn CacheStore>,
        verifier: Arc<dyn TokenVerifier>,
        settings: &SearchSettings,
    ) -> Self {
        Self {
            source,
            cache,
            verifier,
            cache_ttl: settings.cache_ttl(),
            cache_key_prefix: settings.cache_key_prefix.clone(),
        }
    }

    pub fn verifier(&self) -> &dyn TokenVerifier {
        self.verifier.as_ref()
    }

    fn check_token(&self, request: &SearchRequest) -> Result<()> {
        match request.token.as_deref() {
            None => Err(Error::SecurityCheck("missing anti-forgery token".to_string())),
            Some(token) if !self.verifier.verify(token, &request.session) => {
                Err(Error::SecurityCheck("invalid or expired anti-forgery token".to_string()))
            }
            Some(_) => Ok(()),
        }
    }

    /// Run a submission and render the form fragment. Never fails.
    pub async fn handle(&self, request: &SearchRequest) -> String {
        let view = self.execute(request).await;
        let token = self.verifier.issue(&request.session);
        render::render_fragment(&view, &token)
    }

    /// Decide what to show for a submission, fetching and caching as needed.
    pub async fn execute(&self, request: &SearchRequest) -> SearchView {
        let raw_query = match request.query.as_deref() {
            Some(query) if request.submitted && !query.trim().is_empty() => query,
            _ => return SearchView::idle(),
        };

        if let Err(e) = self.check_token(request) {
            warn!("Rejected search submission [{}]: {}", e.error_code(), e);
            return SearchView::failed(raw_query.to_string(), SECURITY_ERROR);
        }

        let query = sanitize_text_field(raw_query);
        if query.is_empty() {
            debug!("Query was empty after sanitizing; showing idle form");
            return SearchView::idle();
        }

        let key = cache_key(&self.cache_key_prefix, &query);
        match self.cache.get(&key).await {
            Ok(Some(articles)) => {
                debug!("Cache hit for {:?} ({} articles)", query, articles.len());
                return SearchView::from_results(query, articles);
            }
            Ok(None) => debug!("Cache miss for {:?}", query),
            Err(e) => warn!("Cache lookup failed for {:?}, treating as miss: {}", query, e),
        }

        match self.source.search(&query).await {
            Ok(articles) => {
                info!("Fetched {} articles for {:?}", articles.len(), query);
                if let Err(e) = self.cache.set(&key, articles.clone(), self.cache_ttl).await {
                    warn!("Failed to cache results for {:?}: {}", query, e);
                }
                SearchView::from_results(query, articles)
            }
            Err(e) if e.is_parse_failure() => {
                warn!("Unusable feed for {:?}, showing no results: {}", query, e);
                SearchView::from_results(query, Vec::new())
            }
            Err(e) => {
                warn!("Fetch failed for {:?} [{}]: {}", query, e.error_code(), e);
                SearchView::failed(query, FETCH_ERROR)
            }
        }
    }
}
