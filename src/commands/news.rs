use crate::commands::{exit_with, unexpected_payload, App};
use crate::error::Result;
use crate::models::NewsArticle;
use crate::services::{QueryData, QueryKey};

pub async fn run(app: &App, query: &str, limit: u32) {
    if let Err(e) = show_news(app, query, limit).await {
        exit_with(e);
    }
}

async fn show_news(app: &App, query: &str, limit: u32) -> Result<()> {
    let key = QueryKey::news(query.trim(), Some(limit));
    let QueryData::News(news) = app.cache.fetch(key.clone()).await? else {
        return Err(unexpected_payload(&key));
    };

    println!("📰 News for '{}': {} articles\n", news.query, news.count);
    for article in &news.articles {
        print_article(article);
    }

    Ok(())
}

pub fn print_article(article: &NewsArticle) {
    println!("🔹 {}", article.title);
    println!(
        "   {} {}",
        article.source,
        article.published.as_deref().unwrap_or("")
    );
    println!("   {}", article.url);
}
