//! termdeck CLI: turn a list of terms into a flashcard deck.
//!
//! Definitions come from a stub or an external chat-completions provider,
//! are cached across runs, and are written either as a plain-text listing
//! or as an importable `.apkg` package.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
