//! flintdb - TCP server

use std::env;
use std::sync::Arc;

use anyhow::Result;
use flintdb::catalog::Registry;
use flintdb::server::{Server, ServerConfig};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args: Vec<String> = env::args().collect();
    let mut config = ServerConfig::new();
    let mut data_dir = "data".to_string();

    // Simple argument parsing
    for i in 1..args.len() {
        if args[i] == "--port" || args[i] == "-p" {
            if let Some(port_str) = args.get(i + 1) {
                if let Ok(port) = port_str.parse() {
                    config = config.port(port);
                }
            }
        }
        if args[i] == "--host" {
            if let Some(host) = args.get(i + 1) {
                config = config.host(host.clone());
            }
        }
        if args[i] == "--data-dir" {
            if let Some(dir) = args.get(i + 1) {
                data_dir = dir.clone();
            }
        }
    }

    let registry = Arc::new(Registry::new(&data_dir)?);
    registry.bootstrap_default()?;

    println!("Starting flintdb server on {}...", config.bind_address());
    let server = Server::new(config, registry);
    server.start()?;
    Ok(())
}
