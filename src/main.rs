//! barnsworthburning MCP server - search over the commonplace book.

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod error;
mod mcp;
mod search;

pub use error::Error;

#[derive(Parser)]
#[command(name = "bwb-mcp")]
#[command(about = "MCP search server for the barnsworthburning commonplace book")]
#[command(version)]
struct Cli {}

#[tokio::main]
async fn main() {
    // stdout carries protocol messages; all diagnostics go to stderr.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("bwb_mcp=info".parse().unwrap()))
        .init();

    let _cli = Cli::parse();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting barnsworthburning MCP server"
    );

    let client = match search::SearchClient::new() {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Failed to build search client");
            std::process::exit(1);
        }
    };

    if let Err(e) = mcp::run(&client).await {
        error!(error = %e, "MCP server failed");
        std::process::exit(1);
    }
}
