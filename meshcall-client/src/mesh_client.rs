use crate::config::ClientConfig;
use crate::engine::{CallController, PeerSessionManager};
use crate::error::SessionError;
use crate::state::CallState;
use crate::transport::ConnectionFactory;
use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use meshcall_core::SignalMessage;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

pub struct MeshClient;

impl MeshClient {
    /// Open the signaling socket and start the session loop on it.
    pub async fn connect(
        config: ClientConfig,
        factory: Arc<dyn ConnectionFactory>,
    ) -> Result<ClientHandle> {
        let url = config.signaling_url()?;
        info!("Connecting to {}", url);

        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;
        let (mut write, mut read) = ws_stream.split();

        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<SignalMessage>();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<SignalMessage>();

        let writer = tokio::spawn(async move {
            while let Some(msg) = outbound_rx.recv().await {
                let json = match serde_json::to_string(&msg) {
                    Ok(json) => json,
                    Err(e) => {
                        error!("Failed to serialize signal message: {}", e);
                        continue;
                    }
                };
                if write.send(Message::text(json)).await.is_err() {
                    break;
                }
            }
            // session loop is gone: say goodbye so the relay frees our seat
            let _ = write.send(Message::Close(None)).await;
        });

        let reader = tokio::spawn(async move {
            while let Some(frame) = read.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<SignalMessage>(text.as_str()) {
                            Ok(msg) => {
                                if inbound_tx.send(msg).is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!("Invalid SignalMessage from server: {:?}", e),
                        }
                    }
                    Ok(Message::Close(frame)) => {
                        debug!("Server closed signaling socket: {:?}", frame);
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Signaling socket error: {}", e);
                        break;
                    }
                }
            }
        });

        let (manager, controller) =
            PeerSessionManager::new(&config, factory, inbound_rx, outbound_tx);
        let session = tokio::spawn(manager.run());

        Ok(ClientHandle {
            controller,
            session,
            reader,
            writer,
        })
    }
}

/// A running call. Dropping the handle does not leave; call [`leave`](Self::leave).
pub struct ClientHandle {
    controller: CallController,
    session: JoinHandle<Result<(), SessionError>>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl ClientHandle {
    pub fn controller(&self) -> CallController {
        self.controller.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CallState> {
        self.controller.subscribe()
    }

    pub fn state(&self) -> CallState {
        self.controller.state()
    }

    pub fn set_muted(&self, muted: bool) -> Result<(), SessionError> {
        self.controller.set_muted(muted)
    }

    pub fn leave(&self) -> Result<(), SessionError> {
        self.controller.leave()
    }

    /// Wait for the session loop to end and the socket to be closed.
    pub async fn join(self) -> Result<()> {
        let outcome = self.session.await.context("Session task failed")?;
        let _ = self.writer.await;
        self.reader.abort();
        outcome?;
        Ok(())
    }
}
