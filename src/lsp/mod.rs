//! LSP protocol feature implementations.
//!
//! This module provides:
//! - The per-line diagnostic cache
//! - Hover rendering and gating
//! - Semantic token encoding and the fixed legend
//! - Custom decoration notifications

mod diagnostics;
mod hover;
mod notifications;
mod semantic_tokens;

pub use diagnostics::DiagnosticCache;
pub use hover::{hover_allowed, hover_for_token, reference_query, render_hover, token_at};
pub use notifications::{
    CommentHighlights, ContentHighlights, HighlightRangesParams, SemanticHighlights,
    SemanticHighlightsParams,
};
pub use semantic_tokens::{
    encode_tokens, highlight_tokens, legend, tokens_for_document, HighlightToken, TOKEN_MODIFIERS,
    TOKEN_TYPES,
};
