use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use pairplay::prelude::*;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "pairplay-server")]
#[command(about = "Authoritative two-player session server")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, overrides the config file
    #[arg(short, long)]
    bind: Option<String>,

    /// Account data file, overrides the config file
    #[arg(long)]
    accounts_file: Option<PathBuf>,

    /// Maximum simultaneous connections
    #[arg(long)]
    max_connections: Option<usize>,

    /// Seconds of silence before a connection is dropped (0 = never)
    #[arg(long)]
    idle_timeout_secs: Option<u64>,

    /// Wire encoding: utf8 or utf16
    #[arg(long, value_parser = parse_encoding)]
    encoding: Option<Encoding>,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ServerConfig::default(),
        };
        if let Some(bind) = self.bind {
            config.bind_addr = bind;
        }
        if let Some(path) = self.accounts_file {
            config.accounts_file = path;
        }
        if let Some(max) = self.max_connections {
            config.max_connections = max;
        }
        if let Some(secs) = self.idle_timeout_secs {
            config.idle_timeout_secs = secs;
        }
        if let Some(encoding) = self.encoding {
            config.encoding = encoding;
        }
        Ok(config)
    }
}

fn parse_encoding(s: &str) -> Result<Encoding, String> {
    match s.to_ascii_lowercase().as_str() {
        "utf8" | "utf-8" => Ok(Encoding::Utf8),
        "utf16" | "utf-16" => Ok(Encoding::Utf16),
        other => Err(format!("unknown encoding `{other}` (expected utf8 or utf16)")),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pairplay=info")))
        .init();

    let config = Cli::parse().into_config()?;
    tracing::info!(
        accounts_file = %config.accounts_file.display(),
        max_connections = config.max_connections,
        "starting"
    );

    let server = PairplayServer::builder()
        .config(config)
        .build()
        .await
        .context("failed to start server")?;

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    tracing::info!("server stopped");
    Ok(())
}
