use anyhow::Context;
use clap::Parser;
use resgraph_api::Server;
use resgraph_core::ConfigManager;
use std::{
    net::{SocketAddr, ToSocketAddrs},
    path::PathBuf,
    sync::Arc,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "resgraph", version, about = "REST API over a Resource dependency graph")]
struct Args {
    /// Directory holding default.toml, <env>.toml and local.toml
    #[arg(long, env = "RESGRAPH_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Environment name selecting the <env>.* config layer
    #[arg(long, env = "APP_ENV")]
    env: Option<String>,

    /// Override server.host
    #[arg(long)]
    host: Option<String>,

    /// Override server.port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = ConfigManager::load(args.config_dir, args.env)?;
    config.override_server(args.host, args.port)?;
    let settings = config.settings();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.logging.level.as_str())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        config_dir = %config.config_dir().display(),
        env = config.env(),
        "configuration loaded"
    );

    let (host, port) = (settings.server.host.clone(), settings.server.port);
    let addr: SocketAddr = (host.as_str(), port)
        .to_socket_addrs()
        .with_context(|| format!("resolving listen address {host}:{port}"))?
        .next()
        .with_context(|| format!("no address for {host}:{port}"))?;

    let server = Server::new(addr, Arc::new(config)).await?;
    server.run().await?;
    Ok(())
}
