//! Monto producer protocol
//!
//! Newline-delimited JSON over a byte channel, tagged by `kind`:
//!
//! ```text
//! {"kind":"product", "uri":..., "name":..., "language":..., "content":...,
//!  "append":..., "rangeMap":[...], "rangeMapRev":[...]}   # inbound
//! {"kind":"ping"}                                         # inbound
//! {"kind":"configuration", "settings":{...}}              # outbound
//! {"kind":"pong"}                                         # outbound
//! ```

pub mod codec;
pub mod error;
pub mod message;

pub use codec::Codec;
pub use error::{ProtocolError, ProtocolResult};
pub use message::{EditorMessage, ProducerMessage};
