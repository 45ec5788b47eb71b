use stockscope::{cli, utils};

#[tokio::main]
async fn main() {
    // .env is optional
    let _ = dotenvy::dotenv();
    utils::init_logging();

    cli::run().await;
}
