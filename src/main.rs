use anyhow::Context;
use tokio::net::TcpListener;

mod common;
mod config;
mod extractors;
mod logging;
mod middlewares;
mod models;
mod routes;
mod server;
mod services;
mod state;
mod utils;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::load()?;
    logging::registry_logs(config.logs.level)?;
    if config.admin.uses_default_secrets() {
        tracing::warn!(
            "Admin key or panel password is the built-in default, set ADMIN_KEY and ADMIN_PASS"
        );
    }
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    server::run_until_done(config, listener).await
}
