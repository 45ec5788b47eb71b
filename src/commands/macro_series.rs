use crate::commands::{exit_with, unexpected_payload, App};
use crate::error::Result;
use crate::models::MacroSeries;
use crate::services::{QueryData, QueryKey};

const POINTS_SHOWN: usize = 12;

pub async fn run(app: &App, key: Option<&str>, limit: u32, fetch: bool) {
    let result = match key {
        Some(key) if fetch => refresh_and_show(app, key, limit).await,
        Some(key) => show_series(app, key, limit).await,
        None => list_indicators(app).await,
    };

    if let Err(e) = result {
        exit_with(e);
    }
}

async fn list_indicators(app: &App) -> Result<()> {
    let key = QueryKey::macro_indicators();
    let QueryData::MacroIndicators(list) = app.cache.fetch(key.clone()).await? else {
        return Err(unexpected_payload(&key));
    };

    println!("🌐 Macro indicators: {}\n", list.indicators.len());
    for info in &list.indicators {
        println!("   {:<16} {:<40} {}", info.key, info.name, info.series_id);
    }
    Ok(())
}

async fn show_series(app: &App, key: &str, limit: u32) -> Result<()> {
    let query = QueryKey::macro_series(key.trim(), Some(limit));
    let QueryData::Macro(series) = app.cache.fetch(query.clone()).await? else {
        return Err(unexpected_payload(&query));
    };
    print_series(&series);
    Ok(())
}

async fn refresh_and_show(app: &App, key: &str, limit: u32) -> Result<()> {
    let query = QueryKey::macro_series(key.trim(), Some(limit));
    let mut sub = app.cache.subscribe(query.clone()).await;
    sub.settled().await;

    let refresh = app.mutations.refresh_macro(key, Some(limit)).await?;
    println!("✅ Saved {} points for {}", refresh.saved_count, refresh.indicator);

    match sub.settled().await.into_result()? {
        QueryData::Macro(series) => {
            print_series(&series);
            Ok(())
        }
        _ => Err(unexpected_payload(&query)),
    }
}

fn print_series(series: &MacroSeries) {
    println!("🔹 {} ({}): {} points", series.name, series.series_id, series.total);

    if let Some((date, value)) = series.latest_value() {
        println!("   Latest: {:.2} ({})", value, date);
    }

    let skip = series.data.len().saturating_sub(POINTS_SHOWN);
    for point in series.data.iter().skip(skip) {
        match point.value {
            Some(value) => println!("   {}  {:>12.2}", point.indicator_date, value),
            None => println!("   {}  {:>12}", point.indicator_date, "-"),
        }
    }
}
