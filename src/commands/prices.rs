use crate::commands::{exit_with, format_number, unexpected_payload, App};
use crate::error::Result;
use crate::services::{QueryData, QueryKey};

/// Rows printed; the full window still comes back from the API
const ROWS_SHOWN: usize = 20;

pub async fn run(app: &App, ticker: &str, limit: u32) {
    if let Err(e) = show_prices(app, ticker, limit).await {
        exit_with(e);
    }
}

async fn show_prices(app: &App, ticker: &str, limit: u32) -> Result<()> {
    let key = QueryKey::prices(ticker.trim(), Some(limit));
    let QueryData::Prices(list) = app.cache.fetch(key.clone()).await? else {
        return Err(unexpected_payload(&key));
    };

    if list.prices.is_empty() {
        println!("⚠️  No prices stored for {}. Run 'refresh {}' first.", list.ticker, list.ticker);
        return Ok(());
    }

    println!("🔹 {}: {} daily bars\n", list.ticker, format_number(list.count));
    println!(
        "   {:<12} {:>12} {:>12} {:>12} {:>12} {:>14}",
        "Date", "Open", "High", "Low", "Close", "Volume"
    );

    let skip = list.prices.len().saturating_sub(ROWS_SHOWN);
    for bar in list.prices.iter().skip(skip) {
        println!(
            "   {:<12} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>14}",
            bar.date.to_string(),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            format_number(bar.volume)
        );
    }

    Ok(())
}
