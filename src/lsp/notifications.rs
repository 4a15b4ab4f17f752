//! Custom notifications pushed to the editor client.
//!
//! Three decoration channels complement standard diagnostics: comment
//! highlight ranges, content highlight ranges, and a simplified semantic
//! highlight stream used for masked documents whose primary protocol tokens
//! are suppressed.

use serde::{Deserialize, Serialize};
use tower_lsp::lsp_types::notification::Notification;
use tower_lsp::lsp_types::{Range, Url};

use super::semantic_tokens::HighlightToken;

/// Parameters shared by the comment and content range channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightRangesParams {
    pub uri: Url,
    pub ranges: Vec<Range>,
}

/// Parameters for the simplified semantic highlight channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticHighlightsParams {
    pub uri: Url,
    pub tokens: Vec<HighlightToken>,
}

/// `kousei/commentHighlights` — comment ranges in the open document.
#[derive(Debug)]
pub enum CommentHighlights {}

impl Notification for CommentHighlights {
    type Params = HighlightRangesParams;
    const METHOD: &'static str = "kousei/commentHighlights";
}

/// `kousei/contentHighlights` — analyzable content ranges (text nodes,
/// prose runs, and comments) in the open document.
#[derive(Debug)]
pub enum ContentHighlights {}

impl Notification for ContentHighlights {
    type Params = HighlightRangesParams;
    const METHOD: &'static str = "kousei/contentHighlights";
}

/// `kousei/semanticHighlights` — simplified token decorations for masked
/// documents. Empty for Japanese documents, which use protocol tokens.
#[derive(Debug)]
pub enum SemanticHighlights {}

impl Notification for SemanticHighlights {
    type Params = SemanticHighlightsParams;
    const METHOD: &'static str = "kousei/semanticHighlights";
}
