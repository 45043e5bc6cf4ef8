//! View-column assignment table
//!
//! Process-wide state owned by one object and injected wherever needed.
//! Placement policy itself is the host's business; this table only keeps
//! assignments sticky so a re-published product reopens where it was.

use dashmap::DashMap;
use monto_core::ProductIdentity;
use std::sync::atomic::{AtomicU64, Ordering};

/// 1-based editor view column. Column 1 holds the source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewColumn(pub u8);

/// Sticky per-identity column assignments, cycling the columns beside
/// the source for new identities.
pub struct ViewColumnTable {
    columns: DashMap<ProductIdentity, ViewColumn>,
    assigned: AtomicU64,
}

impl ViewColumnTable {
    pub fn new() -> Self {
        Self {
            columns: DashMap::new(),
            assigned: AtomicU64::new(0),
        }
    }

    /// Column for `identity`, assigning the next one (2, 3, 2, ...) on
    /// first sight.
    pub fn assign(&self, identity: &ProductIdentity) -> ViewColumn {
        *self
            .columns
            .entry(identity.clone())
            .or_insert_with(|| {
                let n = self.assigned.fetch_add(1, Ordering::Relaxed);
                ViewColumn(2 + (n % 2) as u8)
            })
            .value()
    }

    pub fn get(&self, identity: &ProductIdentity) -> Option<ViewColumn> {
        self.columns.get(identity).map(|c| *c.value())
    }
}

impl Default for ViewColumnTable {
    fn default() -> Self {
        Self::new()
    }
}
