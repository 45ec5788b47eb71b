use crate::commands::{exit_with, unexpected_payload, App};
use crate::error::Result;
use crate::services::{QueryData, QueryKey};

pub async fn run(app: &App) {
    if let Err(e) = show_health(app).await {
        exit_with(e);
    }
}

async fn show_health(app: &App) -> Result<()> {
    let key = QueryKey::health();
    let QueryData::Health(health) = app.cache.fetch(key.clone()).await? else {
        return Err(unexpected_payload(&key));
    };

    let icon = if health.is_healthy() { "✅" } else { "⚠️ " };
    println!("{} API status: {}", icon, health.status);
    println!("   Version:  {}", health.version);
    println!("   Database: {}", health.database);

    Ok(())
}
