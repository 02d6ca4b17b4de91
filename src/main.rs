//! XENFT Finder - rank listed XENFTs by XEN yield per dollar

use anyhow::Result;

use xenft_finder::adapters::cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (API keys go here, not in config.toml)
    dotenvy::dotenv().ok();

    let app = cli::init();
    cli::execute(app).await
}
