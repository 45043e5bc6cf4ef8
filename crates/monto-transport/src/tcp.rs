//! TCP transport for the producer channel

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn};

use monto_core::ProductStore;
use monto_protocol::Codec;

use crate::error::{TransportError, TransportResult};
use crate::handler::ProducerHandler;
use crate::ConfigReceiver;

/// TCP listener accepting producer connections.
pub struct ProducerListener {
    store: Arc<ProductStore>,
    addr: SocketAddr,
    client_counter: AtomicU64,
    config: ConfigReceiver,
}

impl ProducerListener {
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
        info!(addr = %self.addr, "Producer TCP listener ready");

        loop {
            match listener.accept().await {
                Ok((stream, peer_addr)) => {
                    let client_id = format!(
                        "tcp:{}:{}",
                        peer_addr,
                        self.client_counter.fetch_add(1, Ordering::Relaxed)
                    );
                    let store = self.store.clone();
                    let config = self.config.clone();

                    tokio::spawn(async move {
                        if let Err(e) =
                            Self::handle_connection(stream, client_id.clone(), store, config).await
                        {
                            error!(client = %client_id, error = %e, "Connection error");
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
        mut stream: TcpStream,
        client_id: String,
        store: Arc<ProductStore>,
        mut config: ConfigReceiver,
    ) -> TransportResult<()> {
        info!(client = %client_id, "Producer connected");

        let mut handler = ProducerHandler::new(client_id.clone(), store);
        let mut buf = vec![0u8; 4096];

        // A late-joining producer gets the current settings immediately.
        let initial = config.borrow_and_update().clone();
        if let Some(settings) = initial {
            let line = Codec::encode(&monto_protocol::EditorMessage::configuration(settings));
            stream.write_all(line.as_bytes()).await?;
        }
        let mut config_open = true;

        loop {
            tokio::select! {
                // Handle incoming data from the producer
                result = stream.read(&mut buf) => {
                    match result {
                        Ok(0) => {
                            info!(client = %client_id, "Producer disconnected");
                            break;
                        }
                        Ok(n) => {
                            match handler.process(&buf[..n]) {
                                Ok(replies) => {
                                    for reply in replies {
                                        let line = Codec::encode(&reply);
                                        stream.write_all(line.as_bytes()).await?;
                                    }
                                }
                                Err(e) => {
                                    error!(client = %client_id, error = %e, "Protocol error, closing");
                                    return Err(e.into());
                                }
                            }
                        }
                        Err(e) => {
                            error!(client = %client_id, error = %e, "Read error");
                            return Err(e.into());
                        }
                    }
                }

                // Forward configuration changes verbatim
                changed = config.changed(), if config_open => {
                    match changed {
                        Ok(()) => {
                            let value = config.borrow_and_update().clone();
                            if let Some(settings) = value {
                                let line = Codec::encode(
                                    &monto_protocol::EditorMessage::configuration(settings),
                                );
                                if let Err(e) = stream.write_all(line.as_bytes()).await {
                                    error!(client = %client_id, error = %e, "Write error");
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
