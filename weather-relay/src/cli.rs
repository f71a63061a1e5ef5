use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::Password;

use weather_core::Config;

use crate::{client, server, telemetry};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-relay", version, about = "Weather relay server and client")]
pub struct Cli {
    /// Emit logs as JSON.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the upstream API key in the config file.
    Configure,

    /// Run the HTTP relay.
    Serve {
        /// Port to listen on; overrides config and $PORT.
        #[arg(long)]
        port: Option<u16>,

        /// Address to bind.
        #[arg(long)]
        bind: Option<String>,

        /// Upstream API key; overrides config and $WEATHER_API_KEY.
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Look up weather interactively through a running relay.
    Ask {
        /// Base URL of the relay server.
        #[arg(long, default_value = "http://localhost:4000")]
        server: String,

        /// Latitude for the current-location panel.
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Longitude for the current-location panel.
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => {
                telemetry::init(self.log_json, "warn");
                configure()
            }
            Command::Serve { port, bind, api_key } => {
                telemetry::init(self.log_json, "info");
                let mut config = Config::load()?.with_env_overrides()?;
                if let Some(port) = port {
                    config.port = Some(port);
                }
                if let Some(bind) = bind {
                    config.bind_address = Some(bind);
                }
                if let Some(api_key) = api_key {
                    config.set_api_key(api_key);
                }
                server::serve(&config).await
            }
            Command::Ask { server, lat, lon } => {
                telemetry::init(self.log_json, "warn");
                client::run(&server, lat.zip(lon)).await
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    config.set_api_key(api_key.trim().to_string());
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}
