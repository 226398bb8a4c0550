use news_search::config::SearchSettings;
use news_search::feed::fetcher::FeedFetcher;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let query = std::env::args().nth(1).unwrap_or_else(|| "rust programming".to_string());

    let fetcher = FeedFetcher::new(&SearchSettings::default())?;
    println!("Fetching: {}", fetcher.search_url(&query));

    match fetcher.fetch_articles(&query).await {
        Ok(articles) => {
            println!("✓ Feed fetched and parsed successfully!");
            println!("Number of articles: {}", articles.len());

            for (i, article) in articles.iter().take(5).enumerate() {
                println!("\nArticle {}:", i + 1);
                println!("  Title: {}", article.title);
                println!("  Link: {}", article.link);
                match article.published() {
                    Some(published) => println!("  Published: {}", published.format("%B %-d, %Y")),
                    None => println!("  Published: (unparseable: {:?})", article.pub_date),
                }
            }
        }
        Err(e) => {
            println!("✗ Failed to fetch feed: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
