//! HTTP front-end: serves the search page and handles form posts.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{rejection::FormRejection, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Form, Router,
};
use serde::Deserialize;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{debug, info, warn};

use crate::config::{Config, ServerConfig};
use crate::error::{Error, Result};
use crate::feed::fetcher::FeedFetcher;
use crate::render;
use crate::search::{SearchHandler, SearchRequest};
use crate::security::NonceManager;
use crate::storage::{CacheConfig, ResultCache};

pub const SESSION_COOKIE: &str = "news_search_session";

/// Fields posted by the search form. Field names match `render::*_FIELD`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchForm {
    #[serde(rename = "news_search")]
    pub submit: Option<String>,
    #[serde(rename = "news_query")]
    pub query: Option<String>,
    #[serde(rename = "news_nonce")]
    pub nonce: Option<String>,
}

impl SearchForm {
    pub fn into_request(self, session: String) -> SearchRequest {
        SearchRequest {
            submitted: self.submit.is_some(),
            query: self.query,
            token: self.nonce,
            session,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<SearchHandler>,
}

impl AppState {
    pub fn new(handler: SearchHandler) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    /// Wire the handler to the live feed, an in-memory cache and the nonce manager.
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = FeedFetcher::new(&config.search)?;
        let cache = ResultCache::new(CacheConfig {
            max_entries: config.cache.max_entries,
        });
        let nonces = NonceManager::from_config(&config.security);

        Ok(Self::new(SearchHandler::new(
            Arc::new(fetcher),
            Arc::new(cache),
            Arc::new(nonces),
            &config.search,
        )))
    }
}

pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(show_form).post(submit_search))
        .route("/health", get(health))
        .layer(RequestBodyLimitLayer::new(server.max_request_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: &Config) -> Result<()> {
    let state = AppState::from_config(config)?;
    let app = create_router(state, &config.server);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let socket_addr: SocketAddr = addr
        .parse()
        .map_err(|e| Error::Config(format!("Invalid address {}: {}", addr, e)))?;

    let listener = tokio::net::TcpListener::bind(socket_addr)
        .await
        .map_err(|e| Error::Server(format!("Failed to bind to {}: {}", addr, e)))?;

    info!("News search listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::Server(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}

async fn show_form(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = Session::from_headers(&headers);
    let fragment = state.handler.handle(&SearchRequest::idle(session.id.clone())).await;
    session.respond(fragment)
}

/// Undecodable posts (repeated fields, wrong content type) get the idle form back.
async fn submit_search(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: std::result::Result<Form<SearchForm>, FormRejection>,
) -> Response {
    let session = Session::from_headers(&headers);
    let request = match form {
        Ok(Form(form)) => form.into_request(session.id.clone()),
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return rejection.into_response();
        }
        Err(rejection) => {
            warn!("Ignoring undecodable search form: {}", rejection.body_text());
            SearchRequest::idle(session.id.clone())
        }
    };

    let fragment = state.handler.handle(&request).await;
    session.respond(fragment)
}

async fn health() -> &'static str {
    "ok"
}

struct Session {
    id: String,
    is_new: bool,
}

impl Session {
    fn from_headers(headers: &HeaderMap) -> Self {
        match session_from_cookies(headers) {
            Some(id) => Self { id, is_new: false },
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                debug!("Issuing new session {}", id);
                Self { id, is_new: true }
            }
        }
    }

    fn respond(self, fragment: String) -> Response {
        let page = Html(render::render_page(&fragment));
        if !self.is_new {
            return page.into_response();
        }

        let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, self.id);
        match HeaderValue::from_str(&cookie) {
            Ok(value) => ([(header::SET_COOKIE, value)], page).into_response(),
            Err(_) => page.into_response(),
        }
    }
}

/// Extract the session id from `Cookie` headers, ignoring values that are not UUIDs.
pub fn session_from_cookies(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| uuid::Uuid::parse_str(value.trim()).ok())
        .map(|id| id.to_string())
}
