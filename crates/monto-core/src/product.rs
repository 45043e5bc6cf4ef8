//! Products and their identities

use crate::error::{Error, Result};
use crate::range::{OffsetRange, RangeEntry, RangeMap};
use serde::{Deserialize, Serialize};

/// Locator scheme reserved for derived product views, distinct from the
/// source file's own scheme.
pub const PRODUCT_SCHEME: &str = "monto";

/// Storage key and view locator for a product, derived deterministically
/// from `(source uri, name, language)`.
///
/// Shape: `monto:<path-of-uri>-<name>.<language>`, where `<path-of-uri>`
/// is everything after the source uri's own scheme. Re-publishing with
/// the same name and language therefore lands in the same slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductIdentity(String);

impl ProductIdentity {
    /// Derive the identity for a product of `source_uri`.
    pub fn derive(source_uri: &str, name: &str, language: &str) -> Result<Self> {
        let (scheme, path) = source_uri
            .split_once(':')
            .ok_or_else(|| Error::InvalidUri(source_uri.to_string()))?;
        if scheme.is_empty() {
            return Err(Error::InvalidUri(source_uri.to_string()));
        }
        Ok(Self(format!("{}:{}-{}.{}", PRODUCT_SCHEME, path, name, language)))
    }

    /// Reverse derivation: strip the `-<name>.<language>` suffix and
    /// reconstitute the originating locator under `scheme`.
    ///
    /// Returns `None` when the identity does not carry that suffix.
    pub fn source_locator(&self, name: &str, language: &str, scheme: &str) -> Option<String> {
        let path = self.0.strip_prefix(PRODUCT_SCHEME)?.strip_prefix(':')?;
        let path = path.strip_suffix(&format!("-{}.{}", name, language))?;
        Some(format!("{}:{}", scheme, path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Echo-suppression state for one product view.
///
/// Applying a selection programmatically fires the same change event a
/// user-driven selection would. `Idle` means the next product-view event
/// is consumed as the echo of our own apply; `AwaitingEcho` means the
/// echo has been consumed and the next event is a genuine user change.
/// A source->target propagation rearms the machine to `Idle` before
/// applying, so each programmatic update is absorbed exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EchoState {
    #[default]
    Idle,
    AwaitingEcho,
}

/// The latest published state of one derived artifact.
///
/// `content` is opaque text; offsets everywhere are character offsets
/// into it (or into the source document). `range_map` maps source
/// offsets to product offsets, `range_map_rev` the opposite direction.
/// `echo` is session-only state, never part of the wire contract.
#[derive(Debug, Clone)]
pub struct Product {
    pub source_uri: String,
    pub name: String,
    pub language: String,
    pub content: String,
    pub range_map: RangeMap,
    pub range_map_rev: RangeMap,
    pub echo: EchoState,
}

impl Product {
    /// The "no mapping available" stand-in returned to resolver callers
    /// for identities that were never published: empty content, each map
    /// holding exactly one degenerate `{0,0} -> [{0,0}]` entry. Queries
    /// against it resolve to nothing useful but never need a separate
    /// not-found branch.
    pub fn sentinel() -> Self {
        let degenerate = RangeMap::from_entries(vec![RangeEntry::new(
            OffsetRange::new(0, 0),
            vec![OffsetRange::new(0, 0)],
        )]);
        Self {
            source_uri: String::new(),
            name: String::new(),
            language: String::new(),
            content: String::new(),
            range_map: degenerate.clone(),
            range_map_rev: degenerate,
            echo: EchoState::Idle,
        }
    }

    pub fn identity(&self) -> Result<ProductIdentity> {
        ProductIdentity::derive(&self.source_uri, &self.name, &self.language)
    }

    /// Length of `content` in the offset domain (character count).
    pub fn content_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// One inbound publication, as delivered by the producer channel.
///
/// Field names follow the producer's JSON contract. `append == false`
/// replaces any prior state for the identity wholesale; `append == true`
/// extends it (content concatenation plus map merge).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub uri: String,
    pub name: String,
    pub language: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub append: bool,
    #[serde(default)]
    pub range_map: RangeMap,
    #[serde(default)]
    pub range_map_rev: RangeMap,
}

impl ProductUpdate {
    pub fn identity(&self) -> Result<ProductIdentity> {
        ProductIdentity::derive(&self.uri, &self.name, &self.language)
    }

    pub(crate) fn into_product(self) -> Product {
        Product {
            source_uri: self.uri,
            name: self.name,
            language: self.language,
            content: self.content,
            range_map: self.range_map,
            range_map_rev: self.range_map_rev,
            echo: EchoState::Idle,
        }
    }
}
