//! Product store - keyed table of the latest product per target identity,
//! with the append/replace update protocol.

use crate::error::{Error, Result};
use crate::product::{EchoState, Product, ProductIdentity, ProductUpdate};
use crate::range::{OffsetRange, RangeMap};
use crate::resolver::{self, Direction};
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::debug;

/// "Content changed" signal consumed by the view layer.
#[derive(Debug, Clone)]
pub struct ChangeSignal {
    pub identity: ProductIdentity,
    /// True when the stored product was replaced wholesale and the view
    /// needs a full redisplay. False is a bare refresh nudge (used to
    /// first-display an empty product); appends emit no signal at all -
    /// the live view picks those up through its own change notification
    /// mechanism.
    pub redisplay: bool,
}

/// What an update did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Non-append publish replaced (or first created) the slot.
    Replaced,
    /// First append for the identity, stored verbatim.
    Created,
    /// Append extended an existing product in place.
    Appended,
    /// Empty append: stored data untouched, refresh signaled.
    Refreshed,
}

/// Owns every stored product. Constructed once at startup and handed
/// around as an `Arc`; all mutation funnels through [`ProductStore::update`]
/// except the transient echo flag, which only the selection synchronizer
/// toggles.
pub struct ProductStore {
    products: DashMap<ProductIdentity, Product>,
    change_sender: broadcast::Sender<ChangeSignal>,
}

impl ProductStore {
    pub fn new() -> Self {
        let (change_sender, _) = broadcast::channel(1024);
        Self {
            products: DashMap::new(),
            change_sender,
        }
    }

    /// Apply one publication.
    ///
    /// Producer data is validated up front: malformed or out-of-bounds
    /// intervals are a data-integrity error from the producer and reject
    /// the whole update, leaving stored state untouched.
    pub fn update(&self, update: ProductUpdate) -> Result<UpdateOutcome> {
        let identity = update.identity()?;
        validate_update(&update)?;

        if !update.append {
            debug!(identity = %identity, len = update.content.len(), "Product replaced");
            self.products.insert(identity.clone(), update.into_product());
            self.signal(identity, true);
            return Ok(UpdateOutcome::Replaced);
        }

        if update.content.is_empty() {
            // No-op content signal, e.g. to show a just-created empty
            // container. Stored data is deliberately left alone.
            debug!(identity = %identity, "Empty append, refresh only");
            self.signal(identity, false);
            return Ok(UpdateOutcome::Refreshed);
        }

        match self.products.get_mut(&identity) {
            None => {
                debug!(identity = %identity, "First append acts as create");
                self.products.insert(identity, update.into_product());
                Ok(UpdateOutcome::Created)
            }
            Some(mut existing) => {
                let prior_len = existing.content_len();
                existing.content.push_str(&update.content);
                existing.range_map.merge_forward(update.range_map, prior_len);
                existing
                    .range_map_rev
                    .merge_reverse(update.range_map_rev, prior_len);
                debug!(
                    identity = %identity,
                    prior_len = prior_len,
                    appended = update.content.len(),
                    "Product appended"
                );
                Ok(UpdateOutcome::Appended)
            }
        }
    }

    /// The stored product, or `None` for an identity never published.
    pub fn get(&self, identity: &ProductIdentity) -> Option<Product> {
        self.products.get(identity).map(|p| p.value().clone())
    }

    /// The stored product, or the degenerate-map sentinel. Resolver
    /// callers go through this so "never published" needs no separate
    /// branch on their side.
    pub fn get_or_sentinel(&self, identity: &ProductIdentity) -> Product {
        self.get(identity).unwrap_or_else(Product::sentinel)
    }

    /// Resolve `offset` through the product stored at `identity`.
    pub fn resolve(
        &self,
        identity: &ProductIdentity,
        offset: usize,
        direction: Direction,
    ) -> Option<Vec<OffsetRange>> {
        let product = self.get_or_sentinel(identity);
        resolver::resolve(&product, offset, direction).map(|targets| targets.to_vec())
    }

    /// Current echo state for `identity` (`Idle` when unknown).
    pub fn echo(&self, identity: &ProductIdentity) -> EchoState {
        self.products
            .get(identity)
            .map(|p| p.echo)
            .unwrap_or_default()
    }

    /// Toggle the transient echo flag. Only the selection synchronizer
    /// calls this; unknown identities are a no-op.
    pub fn set_echo(&self, identity: &ProductIdentity, state: EchoState) {
        if let Some(mut product) = self.products.get_mut(identity) {
            product.echo = state;
        }
    }

    /// All identities with a stored product.
    pub fn identities(&self) -> Vec<ProductIdentity> {
        self.products.iter().map(|p| p.key().clone()).collect()
    }

    /// Identities whose product derives from `source_uri`.
    pub fn identities_for_source(&self, source_uri: &str) -> Vec<ProductIdentity> {
        self.products
            .iter()
            .filter(|p| p.value().source_uri == source_uri)
            .map(|p| p.key().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Subscribe to "content changed" signals.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeSignal> {
        self.change_sender.subscribe()
    }

    fn signal(&self, identity: ProductIdentity, redisplay: bool) {
        let _ = self.change_sender.send(ChangeSignal { identity, redisplay });
    }
}

impl Default for ProductStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Every interval well-formed, and every product-side interval (forward
/// targets, reverse sources) within the payload's own content length.
fn validate_update(update: &ProductUpdate) -> Result<()> {
    check_well_formed(&update.range_map)?;
    check_well_formed(&update.range_map_rev)?;

    let limit = update.content.chars().count();
    let target_bound = update.range_map.max_target_bound();
    if target_bound > limit {
        return Err(Error::MappingOutOfBounds { bound: target_bound, limit });
    }
    let source_bound = update.range_map_rev.max_source_bound();
    if source_bound > limit {
        return Err(Error::MappingOutOfBounds { bound: source_bound, limit });
    }
    Ok(())
}

fn check_well_formed(map: &RangeMap) -> Result<()> {
    for entry in map.entries() {
        for range in std::iter::once(&entry.source).chain(entry.target.iter()) {
            if !range.is_well_formed() {
                return Err(Error::InvalidRange {
                    start: range.start,
                    end: range.end,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::RangeEntry;

    fn entry(s: (usize, usize), targets: &[(usize, usize)]) -> RangeEntry {
        RangeEntry::new(
            OffsetRange::new(s.0, s.1),
            targets.iter().map(|&(a, b)| OffsetRange::new(a, b)).collect(),
        )
    }

    fn publish(content: &str, append: bool, forward: Vec<RangeEntry>, reverse: Vec<RangeEntry>) -> ProductUpdate {
        ProductUpdate {
            uri: "file:/a.x".into(),
            name: "ast".into(),
            language: "json".into(),
            content: content.into(),
            append,
            range_map: RangeMap::from_entries(forward),
            range_map_rev: RangeMap::from_entries(reverse),
        }
    }

    fn identity() -> ProductIdentity {
        ProductIdentity::derive("file:/a.x", "ast", "json").unwrap()
    }

    #[test]
    fn test_publish_and_get_scenario() {
        let store = ProductStore::new();

        let outcome = store
            .update(publish(
                "{}",
                false,
                vec![entry((0, 2), &[(0, 2)])],
                vec![entry((0, 2), &[(0, 2)])],
            ))
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::Replaced);

        let id = identity();
        assert_eq!(id.as_str(), "monto:/a.x-ast.json");

        let product = store.get(&id).unwrap();
        assert_eq!(product.content, "{}");
        assert_eq!(
            store.resolve(&id, 1, Direction::Forward),
            Some(vec![OffsetRange::new(0, 2)])
        );
    }

    #[test]
    fn test_get_missing_is_none_but_sentinel_resolves() {
        let store = ProductStore::new();
        let id = identity();

        assert!(store.get(&id).is_none());
        assert!(store.resolve(&id, 0, Direction::Forward).is_none());

        let sentinel = store.get_or_sentinel(&id);
        assert_eq!(sentinel.range_map.len(), 1);
    }

    #[test]
    fn test_replace_emits_redisplay_signal_and_resets_echo() {
        let store = ProductStore::new();
        let id = identity();
        let mut rx = store.subscribe();

        store.update(publish("{}", false, vec![], vec![])).unwrap();
        store.set_echo(&id, EchoState::AwaitingEcho);

        store.update(publish("[]", false, vec![], vec![])).unwrap();
        assert_eq!(store.echo(&id), EchoState::Idle);

        let signal = rx.try_recv().unwrap();
        assert!(signal.redisplay);
        assert_eq!(signal.identity, id);
    }

    #[test]
    fn test_empty_append_signals_without_storing() {
        let store = ProductStore::new();
        let mut rx = store.subscribe();

        let outcome = store.update(publish("", true, vec![], vec![])).unwrap();
        assert_eq!(outcome, UpdateOutcome::Refreshed);

        // Store unaffected, but a refresh signal went out.
        assert!(store.get(&identity()).is_none());
        let signal = rx.try_recv().unwrap();
        assert!(!signal.redisplay);
    }

    #[test]
    fn test_first_append_acts_like_create() {
        let store = ProductStore::new();
        let mut rx = store.subscribe();

        let outcome = store
            .update(publish("ab", true, vec![entry((0, 1), &[(0, 2)])], vec![]))
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::Created);
        assert_eq!(store.get(&identity()).unwrap().content, "ab");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_append_concatenates_and_merges() {
        let store = ProductStore::new();
        let id = identity();

        store
            .update(publish(
                "0123456789abcde", // 15 chars
                false,
                vec![entry((5, 10), &[(0, 3)])],
                vec![entry((0, 15), &[(0, 20)])],
            ))
            .unwrap();
        store
            .update(publish(
                "xyz",
                true,
                vec![entry((5, 10), &[(0, 3)])],
                vec![entry((0, 3), &[(20, 25)])],
            ))
            .unwrap();

        let product = store.get(&id).unwrap();
        assert_eq!(product.content, "0123456789abcdexyz");

        // Forward: same source key, targets unioned with +15 shift.
        assert_eq!(
            product.range_map.entries(),
            &[entry((5, 10), &[(0, 3), (15, 18)])]
        );

        // Reverse: shifted source, concatenated.
        assert_eq!(
            product.range_map_rev.entries(),
            &[entry((0, 15), &[(0, 20)]), entry((15, 18), &[(20, 25)])]
        );

        // No signal for a non-empty append.
        let mut rx = store.subscribe();
        store.update(publish("!", true, vec![], vec![])).unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_append_preserves_prior_content_prefix() {
        let store = ProductStore::new();
        let id = identity();

        let chunks = ["alpha", "beta", "gamma"];
        let mut expected = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            store
                .update(publish(chunk, i > 0, vec![], vec![]))
                .unwrap();
            expected.push_str(chunk);
            assert_eq!(store.get(&id).unwrap().content, expected);
        }
    }

    #[test]
    fn test_out_of_bounds_mapping_rejected() {
        let store = ProductStore::new();

        // Forward target past the end of a 2-char payload.
        let err = store
            .update(publish("{}", false, vec![entry((0, 2), &[(0, 3)])], vec![]))
            .unwrap_err();
        assert!(matches!(err, Error::MappingOutOfBounds { bound: 3, limit: 2 }));

        // Reverse source past the end.
        let err = store
            .update(publish("{}", false, vec![], vec![entry((0, 5), &[(0, 1)])]))
            .unwrap_err();
        assert!(matches!(err, Error::MappingOutOfBounds { bound: 5, limit: 2 }));

        // Nothing was stored.
        assert!(store.is_empty());
    }

    #[test]
    fn test_malformed_range_rejected() {
        let store = ProductStore::new();
        let err = store
            .update(publish("abcdef", false, vec![entry((4, 2), &[(0, 1)])], vec![]))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRange { start: 4, end: 2 }));
    }

    #[test]
    fn test_identities_for_source() {
        let store = ProductStore::new();
        store.update(publish("{}", false, vec![], vec![])).unwrap();

        let mut other = publish("x", false, vec![], vec![]);
        other.uri = "file:/b.y".into();
        store.update(other).unwrap();

        let ids = store.identities_for_source("file:/a.x");
        assert_eq!(ids, vec![identity()]);
        assert_eq!(store.len(), 2);
    }
}
