use crate::commands::{exit_with, App};

pub async fn run(app: &App, ticker: &str, name: &str) {
    println!("📝 Registering {} ({})", ticker.trim(), name.trim());

    match app.mutations.register(ticker, name).await {
        Ok(stock) => {
            println!("✅ Registered {} as #{}: {}", stock.ticker, stock.id, stock.name);
            println!("💡 Tip: run 'refresh {}' to pull its price history", stock.ticker);
        }
        Err(e) => exit_with(e),
    }
}
