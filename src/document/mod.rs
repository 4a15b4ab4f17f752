//! Document state management and text utilities.
//!
//! This module provides:
//! - `LineIndex` and offset conversion helpers for byte <-> LSP positions
//! - `DocumentState` and `DocumentStore` for document lifecycle management
//! - Incremental edit application and changed-line detection

mod state;
mod text;

pub use state::{apply_content_changes, changed_lines, DocumentState, DocumentStore};
pub use text::{compute_line_starts, offset_at, offset_to_position, utf16_len, LineIndex};
