use crate::analysis::to_chart_series;
use crate::commands::{exit_with, format_number, App};
use crate::error::Result;
use crate::services::{QueryData, QueryKey};

pub async fn run(app: &App, ticker: &str, period: &str) {
    println!("🔄 Refreshing {} prices ({})", ticker.trim(), period);

    if let Err(e) = refresh(app, ticker, period).await {
        exit_with(e);
    }
}

async fn refresh(app: &App, ticker: &str, period: &str) -> Result<()> {
    // Subscribed before the mutation so its invalidation reloads the indicators
    let mut indicators = app.cache.subscribe(QueryKey::technical(ticker.trim(), None)).await;
    indicators.settled().await;

    let refresh = app.mutations.force_refresh_period(ticker, period).await?;
    println!("✅ Saved {} price rows for {}", format_number(refresh.count), refresh.ticker);
    if let Some(message) = &refresh.message {
        println!("   {}", message);
    }

    match indicators.settled().await.into_result() {
        Ok(QueryData::Technical(records)) => {
            let series = to_chart_series(&records);
            if let Some(point) = series.latest() {
                println!("   Latest close: {:.2} ({})", point.close, point.date);
            }
        }
        Ok(_) => {}
        Err(e) => eprintln!("⚠️  Could not reload indicators: {}", e),
    }

    Ok(())
}
