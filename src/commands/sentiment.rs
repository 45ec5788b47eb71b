use crate::commands::{exit_with, App};

/// One-shot analysis; not cached
pub async fn run(app: &App, text: &str) {
    match app.client.analyze_sentiment(text).await {
        Ok(sentiment) => {
            println!("🧠 Sentiment: {} ({:.2})", sentiment.label, sentiment.score);
        }
        Err(e) => exit_with(e),
    }
}
