//! Hover information for analyzed tokens.
//!
//! Shows the surface form, the raw feature record, and the lexical fields
//! of the token under the cursor. Noun hovers are enriched with a cached
//! reference summary when one is available; a cache miss starts a detached
//! background lookup and the current hover returns without the enrichment.

use tower_lsp::lsp_types::{
    Hover, HoverContents, MarkupContent, MarkupKind, Position, Range,
};

use crate::analysis::Token;
use crate::document::DocumentState;
use crate::reference::{error_message, CacheEntry};

/// Find the token under a position.
pub fn token_at(tokens: &[Token], position: Position) -> Option<&Token> {
    tokens.iter().find(|t| {
        t.line == position.line
            && position.character >= t.start_char
            && position.character < t.end_char
    })
}

/// Whether hover is allowed at this byte offset of the document.
///
/// Japanese documents are hoverable everywhere. Masked documents only show
/// hovers inside a comment segment, or inside a content range for languages
/// that have them (HTML text nodes, LaTeX prose).
pub fn hover_allowed(state: &DocumentState, offset: usize) -> bool {
    if state.is_japanese() {
        return true;
    }
    state.mask.offset_in_comment(offset) || state.mask.offset_in_content(offset)
}

/// Render hover markdown for a token, with optional reference enrichment.
pub fn render_hover(token: &Token, reference: Option<&CacheEntry>) -> String {
    let mut markdown = format!("**{}**\n```\n{}\n```\n", token.surface, token.feature);

    if !token.feature.base_form.is_empty() {
        markdown.push_str(&format!("**原形**: {}\n", token.feature.base_form));
    }
    if !token.feature.reading.is_empty() {
        markdown.push_str(&format!("**読み**: {}\n", token.feature.reading));
    }
    if !token.feature.pronunciation.is_empty() {
        markdown.push_str(&format!("**発音**: {}\n", token.feature.pronunciation));
    }

    if let Some(entry) = reference {
        markdown.push_str("\n---\n");
        if entry.status == 200 {
            markdown.push_str(&format!("**Wikipedia**: {}", entry.content));
        } else {
            markdown.push_str(&format!("**Wikipedia**: {}", error_message(entry.status)));
        }
    }

    markdown
}

/// Build the hover response for a token.
pub fn hover_for_token(token: &Token, reference: Option<&CacheEntry>) -> Hover {
    Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: render_hover(token, reference),
        }),
        range: Some(Range::new(
            Position::new(token.line, token.start_char),
            Position::new(token.line, token.end_char),
        )),
    }
}

/// The lookup query for a noun token: base form when known, else surface.
pub fn reference_query(token: &Token) -> String {
    if token.feature.base_form.is_empty() {
        token.surface.clone()
    } else {
        token.feature.base_form.clone()
    }
}
