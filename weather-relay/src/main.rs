//! Binary crate for the `weather-relay` tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Serving the HTTP relay
//! - The interactive lookup client and its terminal output

use clap::Parser;

mod cli;
mod client;
mod server;
mod telemetry;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    cmd.run().await
}
