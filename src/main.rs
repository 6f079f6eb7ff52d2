//! Trilium updater CLI entry point
//!
//! Parses the command line, runs the update and turns any failure into a
//! readable message with a suggestion. Exits with status 1 on failure.

use anyhow::Result;
use clap::Parser;
use trilium_updater::cli;
use trilium_updater::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
