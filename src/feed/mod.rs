pub mod fetcher;
pub mod parser;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::error::Result;

/// A single news item as it appeared in the feed.
///
/// Fields are kept verbatim; link and date are only interpreted at render time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub link: String,
    pub pub_date: String,
}

impl Article {
    pub fn new(title: impl Into<String>, link: impl Into<String>, pub_date: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            pub_date: pub_date.into(),
        }
    }

    /// Parse the publication date, accepting RFC 2822, RFC 3339 and bare `YYYY-MM-DD`.
    pub fn published(&self) -> Option<DateTime<FixedOffset>> {
        let raw = self.pub_date.trim();
        if raw.is_empty() {
            return None;
        }

        DateTime::parse_from_rfc2822(raw)
            .or_else(|_| DateTime::parse_from_rfc3339(raw))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
                    .map(|naive| naive.and_utc().fixed_offset())
            })
    }
}

/// Source of articles for a search term.
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Fetch and parse the feed for an already-sanitized query.
    ///
    /// Transport problems surface as fetch-class errors, malformed documents
    /// as [`crate::Error::FeedParse`]. A channel without items is `Ok(vec![])`.
    async fn search(&self, query: &str) -> Result<Vec<Article>>;
}
