use crate::config::Config;
use crate::services::{FileRecordStore, MemoryRecordStore, RecordStore};
use crate::{routes, state};
use std::sync::Arc;
use tokio::{net::TcpListener, signal, task::JoinSet};
use tokio_util::sync::CancellationToken;

/// Serves until Ctrl+C or SIGTERM, then drains in-flight requests.
pub async fn run_until_done(config: Config, bind: TcpListener) -> anyhow::Result<()> {
    let mut join_set = JoinSet::new();
    let shutdown_signal = CancellationToken::new();
    let store: Arc<dyn RecordStore> = if config.storage.is_in_memory() {
        tracing::warn!("Using in-memory record store, records are lost on exit");
        Arc::new(MemoryRecordStore::seeded())
    } else {
        let store = FileRecordStore::open(config.storage.parse_path()).await?;
        tracing::info!("Using record store at {:?}", store.path());
        Arc::new(store)
    };
    let state = state::AppState::build(config, store);
    // axum serve
    {
        let shutdown_signal = shutdown_signal.clone();
        let routes = routes::build().with_state(state);
        join_set.spawn(async move {
            axum::serve(bind, routes.into_make_service())
                .with_graceful_shutdown(async move {
                    shutdown_signal.cancelled().await;
                })
                .await
        });
    }
    // register ctrl+c signal
    {
        let shutdown_signal = shutdown_signal.clone();
        join_set.spawn(async move {
            tokio::select! {
                _ = signal::ctrl_c() => {
                    tracing::debug!("Received Ctrl+C, start terminating");
                    shutdown_signal.cancel();
                }
                _ = shutdown_signal.cancelled() => {}
            }
            Ok(())
        });
    }
    #[cfg(unix)]
    {
        let shutdown_signal = shutdown_signal.clone();
        join_set.spawn(async move {
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::debug!("Received SIGTERM signal, start terminating");
                    shutdown_signal.cancel();
                }
                _ = shutdown_signal.cancelled() => {}
            }
            Ok(())
        });
    }
    while let Some(r) = join_set.join_next().await {
        match r {
            Ok(Ok(_)) => (),
            Ok(Err(e)) => {
                shutdown_signal.cancel();
                return Err(e.into());
            }
            Err(e) => anyhow::bail!("Internal error in spawn: {e}"),
        }
    }
    tracing::info!("Server stopped");
    Ok(())
}
