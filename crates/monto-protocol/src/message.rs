//! Producer channel message types
//!
//! Messages flow as newline-delimited JSON, one object per line, tagged
//! by `kind`. Delivery per connection is FIFO; the append protocol
//! depends on that ordering.

use monto_core::ProductUpdate;
use serde::{Deserialize, Serialize};

/// Inbound: producer -> editor side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ProducerMessage {
    /// Publish a product (replace or append, see the payload's `append`).
    Product(ProductUpdate),
    /// Liveness probe, answered with `pong`.
    Ping,
}

/// Outbound: editor side -> producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EditorMessage {
    /// Opaque settings object, forwarded verbatim on configuration
    /// change. Never validated here.
    Configuration { settings: serde_json::Value },
    Pong,
}

impl EditorMessage {
    pub fn configuration(settings: serde_json::Value) -> Self {
        EditorMessage::Configuration { settings }
    }
}
