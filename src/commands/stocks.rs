use crate::commands::{exit_with, unexpected_payload, App};
use crate::error::Result;
use crate::services::{QueryData, QueryKey};

pub async fn run(app: &App) {
    if let Err(e) = show_stocks(app).await {
        exit_with(e);
    }
}

async fn show_stocks(app: &App) -> Result<()> {
    let key = QueryKey::stocks();
    let QueryData::Stocks(list) = app.cache.fetch(key.clone()).await? else {
        return Err(unexpected_payload(&key));
    };

    if list.stocks.is_empty() {
        println!("⚠️  No stocks registered. Use 'register <TICKER> <NAME>' first.");
        return Ok(());
    }

    println!("📈 Registered Stocks: {}\n", list.total);
    for stock in &list.stocks {
        let status = if stock.is_active { "" } else { "  (inactive)" };
        println!(
            "   {:<10} {:<32} {:<20} {}{}",
            stock.ticker,
            stock.name,
            stock.sector.as_deref().unwrap_or("-"),
            stock.market.as_deref().unwrap_or("-"),
            status
        );
    }

    Ok(())
}
