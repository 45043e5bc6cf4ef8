//! Selection synchronizer - keeps a source document's selection and its
//! derived product views' selections mutually consistent without
//! feedback loops.

use crate::columns::ViewColumnTable;
use crate::editor::{EditorHost, EditorResult};
use monto_core::resolver::{self, Direction};
use monto_core::{EchoState, OffsetRange, ProductIdentity, ProductStore};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Orchestrates bidirectional selection propagation through a product's
/// range maps.
///
/// Applying a selection to an editor programmatically triggers the same
/// change notification a user-driven selection would; each product
/// carries a two-state echo machine ([`EchoState`]) so every programmatic
/// update is absorbed exactly once instead of oscillating.
pub struct SelectionSynchronizer {
    store: Arc<ProductStore>,
    host: Arc<dyn EditorHost>,
    columns: Arc<ViewColumnTable>,
}

impl SelectionSynchronizer {
    pub fn new(
        store: Arc<ProductStore>,
        host: Arc<dyn EditorHost>,
        columns: Arc<ViewColumnTable>,
    ) -> Self {
        Self { store, host, columns }
    }

    /// Source selection changed: propagate to every visible product view
    /// of that source.
    pub async fn source_selection_changed(&self, source_uri: &str, selections: &[OffsetRange]) {
        for identity in self.host.visible_products(source_uri).await {
            self.propagate_to_product(&identity, selections).await;
        }
    }

    async fn propagate_to_product(&self, identity: &ProductIdentity, selections: &[OffsetRange]) {
        let product = self.store.get_or_sentinel(identity);
        let union = resolver::resolve_selections(&product, selections, Direction::Forward);
        if union.is_empty() {
            return;
        }

        // Rearm the echo machine BEFORE applying: the apply below fires a
        // product-view selection event, and exactly that one must be
        // absorbed.
        self.store.set_echo(identity, EchoState::Idle);

        match self.host.apply_selections(identity.as_str(), &union).await {
            Ok(true) => {
                debug!(identity = %identity, count = union.len(), "Applied product selections")
            }
            Ok(false) => {
                debug!(identity = %identity, "Product view no longer visible, apply skipped")
            }
            Err(e) => {
                // Abandon this product's propagation only; no retry.
                warn!(identity = %identity, error = %e, "Selection apply failed");
            }
        }
    }

    /// A selection-change event originating in a product view.
    ///
    /// `Idle` means this event is our own just-applied change: consume it
    /// and arm for genuine input. `AwaitingEcho` means a user drove it:
    /// reverse-resolve and push the selection back into the source view.
    pub async fn product_selection_changed(
        &self,
        identity: &ProductIdentity,
        selections: &[OffsetRange],
    ) {
        match self.store.echo(identity) {
            EchoState::Idle => {
                self.store.set_echo(identity, EchoState::AwaitingEcho);
                debug!(identity = %identity, "Absorbed own selection echo");
            }
            EchoState::AwaitingEcho => {
                let product = self.store.get_or_sentinel(identity);
                let union = resolver::resolve_selections(&product, selections, Direction::Reverse);
                if union.is_empty() {
                    return;
                }
                if product.source_uri.is_empty() {
                    return;
                }

                match self.host.apply_selections(&product.source_uri, &union).await {
                    Ok(true) => debug!(
                        source = %product.source_uri,
                        count = union.len(),
                        "Applied source selections"
                    ),
                    Ok(false) => {
                        debug!(source = %product.source_uri, "Source view not visible, apply skipped")
                    }
                    Err(e) => {
                        warn!(source = %product.source_uri, error = %e, "Selection apply failed")
                    }
                }
            }
        }
    }

    /// The "select linked editors" command: a one-shot source->target
    /// propagation from the active source view. Always succeeds - this is
    /// a UI action, not a process.
    pub async fn select_linked_editors(&self) -> EditorResult<()> {
        if let Some((source_uri, selections)) = self.host.active_source().await {
            self.source_selection_changed(&source_uri, &selections).await;
        }
        Ok(())
    }

    /// Consume "content changed" signals and open redisplayed products at
    /// their assigned column. Refresh-only signals are the content
    /// provider's business and are skipped here. Runs until the store is
    /// dropped.
    pub async fn run_display_loop(&self) {
        let mut rx = self.store.subscribe();
        loop {
            match rx.recv().await {
                Ok(signal) if signal.redisplay => {
                    let column = self.columns.assign(&signal.identity);
                    if let Err(e) = self.host.open_view(signal.identity.as_str(), column).await {
                        // View-open failure abandons this signal; the next
                        // publish recomputes from current state anyway.
                        warn!(identity = %signal.identity, error = %e, "View open failed");
                    }
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(missed = n, "Display loop lagged behind change signals");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}
