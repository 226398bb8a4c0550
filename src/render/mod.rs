use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::feed::Article;
use crate::search::{SearchOutcome, SearchView};

pub const SUBMIT_FIELD: &str = "news_search";
pub const QUERY_FIELD: &str = "news_query";
pub const NONCE_FIELD: &str = "news_nonce";

const ERROR_ID: &str = "news-search-error";

/// Render the search form and whichever block the outcome calls for.
///
/// Every piece of user- or feed-supplied text goes through maud's escaping.
pub fn render_fragment(view: &SearchView, token: &str) -> String {
    fragment(view, token).into_string()
}

/// Wrap a rendered fragment in a minimal standalone page.
pub fn render_page(fragment: &str) -> String {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { "News Search" }
            }
            body {
                main { (PreEscaped(fragment)) }
            }
        }
    }
    .into_string()
}

fn fragment(view: &SearchView, token: &str) -> Markup {
    let error = match &view.outcome {
        SearchOutcome::Failed(message) => Some(message.as_str()),
        _ => None,
    };

    html! {
        div class="news-search-container" {
            form method="post" class="news-search-form" role="search" aria-label="News Search" {
                input type="hidden" name=(NONCE_FIELD) value=(token);
                label for="news-query-input" class="news-search-label" { "Search News" }
                input
                    type="text"
                    id="news-query-input"
                    name=(QUERY_FIELD)
                    class="news-search-input"
                    placeholder="Enter your search term..."
                    value=(view.query)
                    aria-describedby=[error.map(|_| ERROR_ID)]
                    aria-invalid=(if error.is_some() { "true" } else { "false" })
                    required;
                button type="submit" name=(SUBMIT_FIELD) value="1" class="news-search-button" aria-label="Search news articles" {
                    "Search"
                }
            }

            @match &view.outcome {
                SearchOutcome::Idle => {}
                SearchOutcome::Failed(message) => {
                    div id=(ERROR_ID) class="news-search-error" role="alert" { (message) }
                }
                SearchOutcome::Found(articles) => {
                    div class="news-search-results" role="region" aria-label="Search results" {
                        h2 class="news-search-results-heading" { (results_heading(articles.len())) }
                        @for article in articles {
                            (article_entry(article))
                        }
                    }
                }
                SearchOutcome::NoResults => {
                    p role="status" { "No results found for \"" (view.query) "\"" }
                }
            }
        }
    }
}

fn article_entry(article: &Article) -> Markup {
    html! {
        article class="news-search-result" {
            h3 class="news-search-result-title" {
                @if let Some(href) = safe_href(&article.link) {
                    a href=(href) target="_blank" rel="noopener noreferrer" { (article.title) }
                } @else {
                    (article.title)
                }
            }
            @if let Some(published) = article.published() {
                time class="news-search-date" datetime=(published.to_rfc3339()) {
                    (published.format("%B %-d, %Y").to_string())
                }
            }
        }
    }
}

fn results_heading(count: usize) -> String {
    if count == 1 {
        "Found 1 article".to_string()
    } else {
        format!("Found {} articles", count)
    }
}

/// Only absolute http(s) links are emitted; anything else renders as plain text.
pub fn safe_href(link: &str) -> Option<String> {
    let url = url::Url::parse(link.trim()).ok()?;
    match url.scheme() {
        "http" | "https" => Some(url.into()),
        _ => None,
    }
}
