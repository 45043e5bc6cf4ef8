//! Editor host seam
//!
//! The editor's buffers, rendering and layout are external collaborators.
//! Only the boundary is typed here: the synchronizer asks what is
//! visible, reads selections, applies selections and opens views, all
//! asynchronously (the host may suspend on any of these).

use crate::columns::ViewColumn;
use async_trait::async_trait;
use monto_core::{OffsetRange, ProductIdentity};
use thiserror::Error;

/// Editor host failures. Only view opening is allowed to fail a
/// propagation step; everything else degrades silently.
#[derive(Error, Debug)]
pub enum EditorError {
    #[error("View unavailable: {0}")]
    ViewUnavailable(String),

    #[error("Editor host error: {0}")]
    Host(String),
}

/// Result type for editor host operations
pub type EditorResult<T> = Result<T, EditorError>;

/// Host editor operations the synchronizer depends on.
#[async_trait]
pub trait EditorHost: Send + Sync {
    /// The focused source view and its current selections, if any.
    async fn active_source(&self) -> Option<(String, Vec<OffsetRange>)>;

    /// Product views currently visible for `source_uri`.
    async fn visible_products(&self, source_uri: &str) -> Vec<ProductIdentity>;

    /// Apply selections to the view showing `locator`. Returns `Ok(false)`
    /// when the view is no longer visible by the time the host resumes;
    /// the apply is simply skipped and that is harmless.
    async fn apply_selections(
        &self,
        locator: &str,
        selections: &[OffsetRange],
    ) -> EditorResult<bool>;

    /// Open (or reveal) the view for `locator` in `column`.
    async fn open_view(&self, locator: &str, column: ViewColumn) -> EditorResult<()>;
}
