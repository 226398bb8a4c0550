use crate::error::{Error, Result};
use crate::feed::Article;
use quick_xml::events::Event;
use quick_xml::Reader;
use rss::Channel;
use std::io::{BufRead, Read};

pub struct FeedParser;

impl Default for FeedParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse an RSS document into articles, preserving item order.
    ///
    /// Fails when the document is not well-formed or has no `<channel>`.
    pub fn parse_articles<R: BufRead>(&self, mut reader: R) -> Result<Vec<Article>> {
        let mut body = Vec::new();
        reader.read_to_end(&mut body)?;
        check_well_formed(&body)?;

        let channel = Channel::read_from(body.as_slice())
            .map_err(|e| Error::FeedParse(format!("Failed to parse feed: {}", e)))?;

        let articles = channel
            .items()
            .iter()
            .map(|item| Article {
                title: item.title().unwrap_or_default().to_string(),
                link: item.link().unwrap_or_default().to_string(),
                pub_date: item.pub_date().unwrap_or_default().to_string(),
            })
            .collect();

        Ok(articles)
    }

    pub fn validate_feed_url(&self, url: &str) -> Result<()> {
        let parsed_url = url::Url::parse(url)
            .map_err(|e| Error::InvalidUrl(format!("Invalid URL: {}", e)))?;

        match parsed_url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(Error::InvalidUrl(format!("Unsupported scheme: {}", scheme))),
        }
    }
}

/// Walk the whole document and require exactly one closed root element.
///
/// `Channel::read_from` returns as soon as the root closes and treats end of
/// input as a close, so truncated bodies and trailing content must be caught here.
fn check_well_formed(body: &[u8]) -> Result<()> {
    let malformed = |reason: String| Error::FeedParse(format!("Failed to parse feed: {}", reason));

    let mut reader = Reader::from_reader(body);
    reader.config_mut().trim_text(true);
    reader.config_mut().check_end_names = true;

    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut root_closed = false;

    loop {
        match reader.read_event_into(&mut buf).map_err(|e| malformed(e.to_string()))? {
            Event::Start(_) | Event::Empty(_) if root_closed => {
                return Err(malformed("content after the root element".to_string()));
            }
            Event::Start(_) => depth += 1,
            Event::Empty(_) => {
                if depth == 0 {
                    root_closed = true;
                }
            }
            Event::End(_) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| malformed("unexpected closing tag".to_string()))?;
                if depth == 0 {
                    root_closed = true;
                }
            }
            Event::Text(_) | Event::CData(_) | Event::GeneralRef(_) if depth == 0 => {
                return Err(malformed("text outside the root element".to_string()));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if depth > 0 {
        return Err(malformed("document ended before the root element closed".to_string()));
    }
    Ok(())
}
