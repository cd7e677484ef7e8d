//! Fractalis - Volatility regime gate with tactical signal memory

use anyhow::Result;
use fractalis::adapters::cli;

fn main() -> Result<()> {
    // Load .env file if it exists (FRACTALIS_* overrides may live there)
    dotenvy::dotenv().ok();

    let app = cli::init();
    cli::execute(app)
}
