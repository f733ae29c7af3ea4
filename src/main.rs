use std::sync::Arc;

use anyhow::Context;
use coffee_booking::{
    config::Config, database::sqlite::SqliteWindowStore, notify::line::LineNotifier,
    server::server::Server,
};
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use r2d2_sqlite::SqliteConnectionManager;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)?;
    info!(config = %config_path, database = %config.database_path, "starting coffee-booking v{}", env!("CARGO_PKG_VERSION"));

    let manager = SqliteConnectionManager::file(&config.database_path);
    let pool = r2d2::Pool::builder()
        .build(manager)
        .context("could not open the database")?;
    let pool = Arc::new(pool);

    let store = SqliteWindowStore::setup(pool).context("could not prepare window tables")?;
    let notifier = LineNotifier::new(&config);
    if config.access_token.is_none() {
        warn!("no access token configured, bookings will not be forwarded");
    }
    let server = Server::setup(store, notifier);

    let listener = TcpListener::bind(config.bind_address.as_str())
        .await
        .with_context(|| format!("could not bind {}", config.bind_address))?;
    info!(address = %config.bind_address, "listening");

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(connection) => connection,
            Err(err) => {
                warn!(error = %err, "could not accept connection");
                continue;
            }
        };
        let io = TokioIo::new(stream);
        let server_clone = server.clone();
        tokio::spawn(async move {
            if let Err(err) = http1::Builder::new()
                .serve_connection(io, server_clone)
                .await
            {
                warn!(%peer, error = %err, "connection error");
            }
        });
    }
}
