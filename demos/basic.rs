//! Basic monto example
//!
//! Publishes a product into an embedded store, resolves offsets both
//! ways, and drives a selection round-trip through the synchronizer
//! with a toy editor host.
//!
//! Run with: cargo run --example basic

use std::sync::Arc;

use async_trait::async_trait;
use monto_core::{
    Direction, OffsetRange, ProductIdentity, ProductStore, ProductUpdate, RangeEntry, RangeMap,
};
use monto_sync::{
    EditorHost, EditorResult, SelectionSynchronizer, ViewColumn, ViewColumnTable,
};

/// Editor host that just prints what it is asked to do.
struct PrintingEditor {
    identity: ProductIdentity,
}

#[async_trait]
impl EditorHost for PrintingEditor {
    async fn active_source(&self) -> Option<(String, Vec<OffsetRange>)> {
        Some(("file:/demo.x".into(), vec![OffsetRange::new(0, 3)]))
    }

    async fn visible_products(&self, _source_uri: &str) -> Vec<ProductIdentity> {
        vec![self.identity.clone()]
    }

    async fn apply_selections(
        &self,
        locator: &str,
        selections: &[OffsetRange],
    ) -> EditorResult<bool> {
        println!("  apply {:?} in {}", selections, locator);
        Ok(true)
    }

    async fn open_view(&self, locator: &str, column: ViewColumn) -> EditorResult<()> {
        println!("  open {} in column {}", locator, column.0);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("Monto Basic Example\n");

    let store = Arc::new(ProductStore::new());

    // Publish an AST dump for a 10-char source document.
    store.update(ProductUpdate {
        uri: "file:/demo.x".into(),
        name: "ast".into(),
        language: "json".into(),
        content: r#"{"node":1}"#.into(),
        append: false,
        range_map: RangeMap::from_entries(vec![RangeEntry::new(
            OffsetRange::new(0, 5),
            vec![OffsetRange::new(1, 7)],
        )]),
        range_map_rev: RangeMap::from_entries(vec![RangeEntry::new(
            OffsetRange::new(1, 7),
            vec![OffsetRange::new(0, 5)],
        )]),
    })?;

    let identity = ProductIdentity::derive("file:/demo.x", "ast", "json")?;
    println!("Stored under identity: {}\n", identity);

    // Offset translation, both directions.
    println!(
        "source offset 2 -> product {:?}",
        store.resolve(&identity, 2, Direction::Forward)
    );
    println!(
        "product offset 3 -> source {:?}\n",
        store.resolve(&identity, 3, Direction::Reverse)
    );

    // Append an increment: same source key, rebased targets.
    store.update(ProductUpdate {
        uri: "file:/demo.x".into(),
        name: "ast".into(),
        language: "json".into(),
        content: ",{}".into(),
        append: true,
        range_map: RangeMap::from_entries(vec![RangeEntry::new(
            OffsetRange::new(0, 5),
            vec![OffsetRange::new(0, 3)],
        )]),
        range_map_rev: RangeMap::from_entries(vec![RangeEntry::new(
            OffsetRange::new(0, 3),
            vec![OffsetRange::new(0, 5)],
        )]),
    })?;
    println!(
        "after append, source offset 2 -> product {:?}\n",
        store.resolve(&identity, 2, Direction::Forward)
    );

    // Selection round-trip through the synchronizer.
    let host = Arc::new(PrintingEditor {
        identity: identity.clone(),
    });
    let sync = SelectionSynchronizer::new(store, host, Arc::new(ViewColumnTable::new()));

    println!("select linked editors:");
    sync.select_linked_editors().await?;

    println!("user selection in the product view:");
    sync.product_selection_changed(&identity, &[OffsetRange::new(2, 4)])
        .await; // first event is absorbed as our own echo
    sync.product_selection_changed(&identity, &[OffsetRange::new(2, 4)])
        .await;

    Ok(())
}
