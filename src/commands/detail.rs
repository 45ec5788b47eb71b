use crate::analysis::{percent_change, to_chart_series};
use crate::commands::{exit_with, news::print_article, unexpected_payload, App};
use crate::constants::{DETAIL_NEWS_LIMIT, MIN_DAYS_FOR_PREDICTION};
use crate::error::Result;
use crate::models::{ChartSeries, PredictionResult, RsiZone};
use crate::services::{QueryData, QueryKey};

pub async fn run(app: &App, ticker: &str, days: u32, target_days: u32) {
    if let Err(e) = show_detail(app, ticker.trim(), days, target_days).await {
        exit_with(e);
    }
}

async fn show_detail(app: &App, ticker: &str, days: u32, target_days: u32) -> Result<()> {
    let technical_key = QueryKey::technical(ticker, Some(days));
    let prediction_key = QueryKey::prediction(ticker, Some(target_days));
    let news_key = QueryKey::news(ticker, Some(DETAIL_NEWS_LIMIT));

    let (technical, prediction, news) = tokio::join!(
        app.cache.fetch(technical_key.clone()),
        app.cache.fetch(prediction_key.clone()),
        app.cache.fetch(news_key.clone()),
    );

    println!("🔹 {} ({} days)\n", ticker, days);

    // Indicators are the core of the view; the other sections degrade
    let QueryData::Technical(records) = technical? else {
        return Err(unexpected_payload(&technical_key));
    };
    let series = to_chart_series(&records);
    print_chart_summary(&series);

    println!();
    match prediction {
        Ok(QueryData::Prediction(result)) => {
            println!("   {}", describe_prediction(result.as_ref(), target_days))
        }
        Ok(_) => eprintln!("⚠️  {}", unexpected_payload(&prediction_key)),
        Err(e) => eprintln!("⚠️  Prediction unavailable: {}", e),
    }

    println!();
    match news {
        Ok(QueryData::News(list)) if list.articles.is_empty() => println!("   No recent news"),
        Ok(QueryData::News(list)) => list.articles.iter().for_each(print_article),
        Ok(_) => eprintln!("⚠️  {}", unexpected_payload(&news_key)),
        Err(e) => eprintln!("⚠️  News unavailable: {}", e),
    }

    Ok(())
}

fn print_chart_summary(series: &ChartSeries) {
    let Some(latest) = series.latest() else {
        println!("   No indicator data in this window");
        return;
    };

    println!(
        "   Close:  {:.2}  {}  ({})",
        latest.close,
        format_change(percent_change(series)),
        latest.date
    );
    println!("   SMA20:  {}", format_optional(latest.sma20));
    println!("   SMA50:  {}", format_optional(latest.sma50));
    println!("   RSI14:  {}", describe_rsi(latest.rsi));
    println!("   Points: {}", series.len());
}

/// `+1.23%`, or `n/a` when the change is undefined
pub fn format_change(change: Option<f64>) -> String {
    match change {
        Some(pct) => format!("{:+.2}%", pct),
        None => "n/a".to_string(),
    }
}

/// Indicator values still inside their lookback show as `n/a`, never zero
pub fn format_optional(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}", v))
}

pub fn describe_rsi(rsi: Option<f64>) -> String {
    match rsi {
        Some(v) => format!("{:.1} ({})", v, RsiZone::classify(v)),
        None => "n/a".to_string(),
    }
}

pub fn describe_prediction(result: Option<&PredictionResult>, target_days: u32) -> String {
    match result {
        Some(p) => format!(
            "Predicted {}-day return: {:+.2}%",
            p.target_days,
            p.predicted_return_percent()
        ),
        None => format!(
            "Insufficient history for a {}-day prediction (needs {} trading days)",
            target_days, MIN_DAYS_FOR_PREDICTION
        ),
    }
}
