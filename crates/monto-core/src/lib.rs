//! Monto Core - Product Store and Offset Resolution
//!
//! This crate provides the core functionality for monto:
//! - Offset ranges and directional range maps with append-time merge
//! - Product storage keyed by derived target identity
//! - First-match link resolution between source and product offsets

pub mod error;
pub mod product;
pub mod range;
pub mod resolver;
pub mod store;

pub use error::{Error, Result};
pub use product::{EchoState, Product, ProductIdentity, ProductUpdate, PRODUCT_SCHEME};
pub use range::{OffsetRange, RangeEntry, RangeMap};
pub use resolver::Direction;
pub use store::{ChangeSignal, ProductStore, UpdateOutcome};
