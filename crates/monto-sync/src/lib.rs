//! Monto selection synchronization
//!
//! Bidirectional propagation of editor selection changes between a
//! source document and its derived product views:
//! - an async editor-host seam (the editor itself is an external
//!   collaborator)
//! - the two-state echo machine that absorbs each programmatic selection
//!   update exactly once
//! - the sticky view-column table for product views

pub mod columns;
pub mod editor;
pub mod synchronizer;

pub use columns::{ViewColumn, ViewColumnTable};
pub use editor::{EditorError, EditorHost, EditorResult};
pub use synchronizer::SelectionSynchronizer;
