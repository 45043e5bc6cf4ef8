//! Connection handler - feeds decoded producer messages into the store

use monto_core::ProductStore;
use monto_protocol::{Codec, EditorMessage, ProducerMessage, ProtocolError, ProtocolResult};
use std::sync::Arc;
use tracing::{debug, warn};

/// Handles one producer connection, transport-agnostic.
pub struct ProducerHandler {
    /// Unique client ID
    pub client_id: String,
    /// Product store reference
    store: Arc<ProductStore>,
    /// Line codec
    codec: Codec,
}

impl ProducerHandler {
    pub fn new(client_id: String, store: Arc<ProductStore>) -> Self {
        Self {
            client_id,
            store,
            codec: Codec::new(),
        }
    }

    /// Process incoming bytes and return outbound replies.
    ///
    /// Bad publications degrade silently: a malformed line or a rejected
    /// update is logged and skipped, the connection stays up. Only an
    /// oversized buffer is fatal (`Err`), which closes the connection.
    pub fn process(&mut self, data: &[u8]) -> ProtocolResult<Vec<EditorMessage>> {
        self.codec.feed(data)?;

        let mut replies = Vec::new();
        loop {
            match self.codec.decode() {
                Ok(Some(ProducerMessage::Product(update))) => {
                    match self.store.update(update) {
                        Ok(outcome) => {
                            debug!(client = %self.client_id, outcome = ?outcome, "Product update applied")
                        }
                        Err(e) => {
                            warn!(client = %self.client_id, error = %e, "Rejected product update")
                        }
                    }
                }
                Ok(Some(ProducerMessage::Ping)) => replies.push(EditorMessage::Pong),
                Ok(None) => break,
                Err(ProtocolError::InvalidJson(e)) => {
                    warn!(client = %self.client_id, error = %e, "Skipping malformed message");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(replies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monto_core::{Direction, ProductIdentity};

    #[test]
    fn test_publish_via_handler() {
        let store = Arc::new(ProductStore::new());
        let mut handler = ProducerHandler::new("test".into(), store.clone());

        let line = concat!(
            r#"{"kind":"product","uri":"file:/a.x","name":"ast","language":"json","#,
            r#""content":"{}","rangeMap":[{"source":{"start":0,"end":2},"target":[{"start":0,"end":2}]}],"#,
            r#""rangeMapRev":[{"source":{"start":0,"end":2},"target":[{"start":0,"end":2}]}]}"#,
            "\n"
        );
        let replies = handler.process(line.as_bytes()).unwrap();
        assert!(replies.is_empty());

        let id = ProductIdentity::derive("file:/a.x", "ast", "json").unwrap();
        assert_eq!(store.get(&id).unwrap().content, "{}");
        assert_eq!(
            store.resolve(&id, 1, Direction::Forward),
            Some(vec![monto_core::OffsetRange::new(0, 2)])
        );
    }

    #[test]
    fn test_ping_answered_with_pong() {
        let store = Arc::new(ProductStore::new());
        let mut handler = ProducerHandler::new("test".into(), store);

        let replies = handler.process(b"{\"kind\":\"ping\"}\n").unwrap();
        assert_eq!(replies, vec![EditorMessage::Pong]);
    }

    #[test]
    fn test_malformed_line_skipped_connection_survives() {
        let store = Arc::new(ProductStore::new());
        let mut handler = ProducerHandler::new("test".into(), store.clone());

        let replies = handler
            .process(b"garbage\n{\"kind\":\"ping\"}\n")
            .unwrap();
        assert_eq!(replies, vec![EditorMessage::Pong]);
    }

    #[test]
    fn test_rejected_update_does_not_fail_processing() {
        let store = Arc::new(ProductStore::new());
        let mut handler = ProducerHandler::new("test".into(), store.clone());

        // Forward target past the 2-char payload: rejected, logged, skipped.
        let line = concat!(
            r#"{"kind":"product","uri":"file:/a.x","name":"ast","language":"json","#,
            r#""content":"{}","rangeMap":[{"source":{"start":0,"end":2},"target":[{"start":0,"end":99}]}]}"#,
            "\n"
        );
        assert!(handler.process(line.as_bytes()).unwrap().is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_oversized_buffer_is_fatal() {
        let store = Arc::new(ProductStore::new());
        let mut handler = ProducerHandler::new("test".into(), store);

        let blob = vec![b'x'; 16 * 1024 * 1024 + 1];
        assert!(matches!(
            handler.process(&blob),
            Err(ProtocolError::MessageTooLarge { .. })
        ));
    }
}
