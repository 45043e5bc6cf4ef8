//! WebSocket transport for the producer channel

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{error, info, warn};

use monto_core::ProductStore;
use monto_protocol::Codec;

use crate::error::{TransportError, TransportResult};
use crate::handler::ProducerHandler;
use crate::ConfigReceiver;

/// WebSocket listener accepting producer connections.
pub struct WsProducerListener {
    store: Arc<ProductStore>,
    addr: SocketAddr,
    client_counter: AtomicU64,
    config: ConfigReceiver,
}

impl WsProducerListener {
    pub fn new(store: Arc<ProductStore>, addr: SocketAddr, config: ConfigReceiver) -> Self {
        Self {
            store,
            addr,
            client_counter: AtomicU64::new(0),
            config,
        }
    }

    /// Start the listener
    pub async fn run(&self) -> TransportResult<()> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|source| TransportError::Bind {
                addr: self.addr,
                source,
            })?;
        info!(addr = %self.addr, "Producer WebSocket listener ready");

        loop {
            match listener.accept().await {
                Ok((stream, peer_addr)) => {
                    let client_id = format!(
                        "ws:{}:{}",
                        peer_addr,
                        self.client_counter.fetch_add(1, Ordering::Relaxed)
                    );
                    let store = self.store.clone();
                    let config = self.config.clone();

                    tokio::spawn(async move {
                        if let Err(e) =
                            Self::handle_connection(stream, client_id.clone(), store, config).await
                        {
                            error!(client = %client_id, error = %e, "WebSocket connection error");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    async fn handle_connection(
        stream: TcpStream,
        client_id: String,
        store: Arc<ProductStore>,
        mut config: ConfigReceiver,
    ) -> TransportResult<()> {
        let ws_stream = accept_async(stream).await?;
        let (mut write, mut read) = ws_stream.split();

        info!(client = %client_id, "WebSocket producer connected");

        let mut handler = ProducerHandler::new(client_id.clone(), store);

        let initial = config.borrow_and_update().clone();
        if let Some(settings) = initial {
            let line = Codec::encode(&monto_protocol::EditorMessage::configuration(settings));
            write.send(Message::Text(line.into())).await?;
        }
        let mut config_open = true;

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            let mut data = text.as_bytes().to_vec();
                            // Ensure line ending for the codec
                            if !data.ends_with(b"\n") {
                                data.extend_from_slice(b"\r\n");
                            }

                            match handler.process(&data) {
                                Ok(replies) => {
                                    for reply in replies {
                                        let line = Codec::encode(&reply);
                                        write.send(Message::Text(line.into())).await?;
                                    }
                                }
                                Err(e) => {
                                    error!(client = %client_id, error = %e, "Protocol error, closing");
                                    return Err(e.into());
                                }
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            info!(client = %client_id, "WebSocket producer disconnected");
                            break;
                        }
                        Some(Ok(_)) => {
                            // Ignore other message types
                        }
                        Some(Err(e)) => {
                            error!(client = %client_id, error = %e, "WebSocket read error");
                            return Err(e.into());
                        }
                    }
                }

                changed = config.changed(), if config_open => {
                    match changed {
                        Ok(()) => {
                            let value = config.borrow_and_update().clone();
                            if let Some(settings) = value {
                                let line = Codec::encode(
                                    &monto_protocol::EditorMessage::configuration(settings),
                                );
                                if let Err(e) = write.send(Message::Text(line.into())).await {
                                    error!(client = %client_id, error = %e, "WebSocket write error");
                                    return Err(e.into());
                                }
                            }
                        }
                        Err(_) => {
                            warn!(client = %client_id, "Configuration channel closed");
                            config_open = false;
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
