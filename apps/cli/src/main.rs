//! gameenrich CLI: enriches a table of video game titles with a genre,
//! a short gameplay description and a player mode from a generative model.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    // Optional .env holding GOOGLE_API_KEY
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
