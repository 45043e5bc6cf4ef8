//! Monto transport layer
//!
//! Accepts producer connections and bridges them to the product store:
//! - TCP: newline-delimited JSON over a raw socket (default)
//! - WebSocket: the same messages as text frames (optional feature)
//!
//! The editor-to-producer direction carries only configuration changes,
//! fanned out through a `watch` channel so late-joining producers see the
//! current settings.

pub mod error;
pub mod handler;
#[cfg(feature = "tcp")]
pub mod tcp;
#[cfg(feature = "websocket")]
pub mod websocket;

use tokio::sync::watch;

/// Receiving side of the opaque configuration fan-out.
pub type ConfigReceiver = watch::Receiver<Option<serde_json::Value>>;

pub use error::{TransportError, TransportResult};
pub use handler::ProducerHandler;
#[cfg(feature = "tcp")]
pub use tcp::ProducerListener;
#[cfg(feature = "websocket")]
pub use websocket::WsProducerListener;
