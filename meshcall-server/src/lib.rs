mod app;
mod config;
mod error;
pub mod http;
mod room;
mod signaling;

pub use app::router;
pub use config::ServerConfig;
pub use error::RegistryError;
pub use room::*;
pub use signaling::*;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

/// Bind `config.bind` and serve until ctrl-c.
pub async fn serve(config: ServerConfig) -> Result<()> {
    let relay = SignalingRelay::new(RoomRegistry::new(), config.ice_server_configs());

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!("Signaling server listening on http://{}", config.bind);

    serve_with(listener, relay, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutdown requested");
    })
    .await
}

/// Serve the signaling routes on an already bound listener until `shutdown`
/// resolves.
pub async fn serve_with<F>(listener: TcpListener, relay: SignalingRelay, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(relay))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server error")?;

    Ok(())
}
