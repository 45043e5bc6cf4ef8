//! Buffered line codec for the producer channel

use crate::error::{ProtocolError, ProtocolResult};
use crate::message::{EditorMessage, ProducerMessage};
use bytes::BytesMut;

/// Maximum buffered message size (16MB) - product contents can be large
/// (full AST dumps), but a runaway producer must not exhaust memory.
const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Decoder for newline-delimited JSON producer messages.
pub struct Codec {
    buffer: BytesMut,
}

impl Codec {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
        }
    }

    /// Add data to the codec buffer
    pub fn feed(&mut self, data: &[u8]) -> ProtocolResult<()> {
        if self.buffer.len() + data.len() > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::MessageTooLarge {
                size: self.buffer.len() + data.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    /// Try to decode one complete message from the buffer. `Ok(None)`
    /// means more data is needed; blank lines are skipped.
    pub fn decode(&mut self) -> ProtocolResult<Option<ProducerMessage>> {
        loop {
            let line_end = match self.buffer.iter().position(|&b| b == b'\n') {
                Some(pos) => pos,
                None => return Ok(None), // Incomplete
            };

            // Exclude \r\n or \n
            let line_len = if line_end > 0 && self.buffer[line_end - 1] == b'\r' {
                line_end - 1
            } else {
                line_end
            };

            let line = self.buffer.split_to(line_end + 1);
            let line = &line[..line_len];
            if line.iter().all(|b| b.is_ascii_whitespace()) {
                continue;
            }

            return serde_json::from_slice(line)
                .map(Some)
                .map_err(|e| ProtocolError::InvalidJson(e.to_string()));
        }
    }

    /// Encode one outbound message as a single line.
    pub fn encode(message: &EditorMessage) -> String {
        // EditorMessage serialization cannot fail: plain enums plus an
        // already-parsed Value.
        let mut line = serde_json::to_string(message).unwrap_or_default();
        line.push('\n');
        line
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_single_message() {
        let mut codec = Codec::new();
        codec.feed(b"{\"kind\":\"ping\"}\r\n").unwrap();

        let msg = codec.decode().unwrap().unwrap();
        assert_eq!(msg, ProducerMessage::Ping);
        assert!(codec.decode().unwrap().is_none());
    }

    #[test]
    fn test_decode_incomplete_message() {
        let mut codec = Codec::new();
        codec.feed(b"{\"kind\":\"pi").unwrap();

        assert!(codec.decode().unwrap().is_none());

        codec.feed(b"ng\"}\n").unwrap();
        assert!(codec.decode().unwrap().is_some());
    }

    #[test]
    fn test_decode_skips_blank_lines() {
        let mut codec = Codec::new();
        codec.feed(b"\r\n\n{\"kind\":\"ping\"}\n").unwrap();

        assert_eq!(codec.decode().unwrap(), Some(ProducerMessage::Ping));
    }

    #[test]
    fn test_decode_multiple_messages_fifo() {
        let mut codec = Codec::new();
        codec.feed(
            b"{\"kind\":\"product\",\"uri\":\"file:/a.x\",\"name\":\"ast\",\"language\":\"json\",\"content\":\"a\"}\n{\"kind\":\"ping\"}\n",
        )
        .unwrap();

        assert!(matches!(
            codec.decode().unwrap(),
            Some(ProducerMessage::Product(_))
        ));
        assert_eq!(codec.decode().unwrap(), Some(ProducerMessage::Ping));
        assert_eq!(codec.decode().unwrap(), None);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let mut codec = Codec::new();
        codec.feed(b"not json\n").unwrap();

        assert!(matches!(
            codec.decode(),
            Err(ProtocolError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_oversize_feed_rejected() {
        let mut codec = Codec::new();
        let blob = vec![b'x'; MAX_MESSAGE_SIZE + 1];
        assert!(matches!(
            codec.feed(&blob),
            Err(ProtocolError::MessageTooLarge { .. })
        ));
    }

    #[test]
    fn test_encode_is_one_line() {
        let line = Codec::encode(&EditorMessage::Pong);
        assert_eq!(line, "{\"kind\":\"pong\"}\n");
    }
}
