use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};
use server::config::{CliArgs, ServerConfig};
use server::network::NetworkServer;
use server::state::ServerState;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(args.log_level.as_str())).init();

    let config = ServerConfig::resolve(&args)?;
    info!(
        "Starting server: tick interval {} ms, configurations from {}",
        config.tick_interval_ms,
        config.configs_dir.display()
    );
    if !config.configs_dir.is_dir() {
        warn!(
            "Configuration directory {} does not exist; every start will fail",
            config.configs_dir.display()
        );
    }

    let state = Arc::new(ServerState::from_config(&config));
    let server = NetworkServer::bind(config.bind_address(), state).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server stopped: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
