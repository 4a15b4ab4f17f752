//! Document state management and edit synchronization.
//!
//! The store owns each document's text exclusively; every edit batch
//! produces a new [`DocumentState`] from a full analysis pass (masking,
//! tokenization, sentence segmentation, grammar diagnostics). Changed-line
//! detection drives diagnostic-cache invalidation only; re-analysis is
//! always whole-document.

use std::collections::BTreeSet;
use std::sync::Arc;

use dashmap::DashMap;
use tower_lsp::lsp_types::{Diagnostic, TextDocumentContentChangeEvent, Url};

use crate::analysis::{check_grammar, split_sentences, SentenceBoundary, Token, Tokenizer};
use crate::mask::{mask_document, MaskOutcome, JAPANESE_LANGUAGE_ID};
use crate::settings::Settings;

use super::text::{compute_line_starts, offset_at, LineIndex};

/// Analyzed state for a single document.
#[derive(Debug, Clone)]
pub struct DocumentState {
    /// Language identifier reported by the client at open time.
    pub language_id: String,
    /// Document version from the client.
    pub version: i32,
    /// Line index over the original text.
    pub line_index: LineIndex,
    /// Masked analysis text plus comment/content ranges.
    pub mask: MaskOutcome,
    /// Tokens from the last analysis pass, in masked-text coordinates.
    pub tokens: Vec<Token>,
    /// Sentence spans from the last analysis pass.
    pub sentences: Vec<SentenceBoundary>,
    /// Grammar diagnostics from the last analysis pass.
    pub diagnostics: Vec<Diagnostic>,
}

impl DocumentState {
    /// Run a full analysis pass over `source`.
    pub fn analyze(
        source: String,
        language_id: String,
        version: i32,
        tokenizer: &dyn Tokenizer,
        settings: &Settings,
    ) -> Self {
        let mask = mask_document(&source, &language_id);
        let line_index = LineIndex::new(source);

        let mut tokens = Vec::new();
        let mut sentences = Vec::new();
        let mut diagnostics = Vec::new();

        if japanese_ratio(&mask.masked) >= settings.analysis.min_japanese_ratio {
            tokens = tokenizer.tokenize(&mask.masked);
            sentences = split_sentences(&mask.masked);
            diagnostics = check_grammar(
                &mask.masked,
                &line_index,
                &tokens,
                &sentences,
                &settings.analysis,
            );
        } else {
            tracing::debug!("below minimum Japanese ratio, skipping analysis");
        }

        Self {
            language_id,
            version,
            line_index,
            mask,
            tokens,
            sentences,
            diagnostics,
        }
    }

    /// Get the original source text.
    pub fn source(&self) -> &str {
        self.line_index.source()
    }

    /// Whether this document is plain Japanese (unmasked analysis).
    pub fn is_japanese(&self) -> bool {
        self.language_id.eq_ignore_ascii_case(JAPANESE_LANGUAGE_ID)
    }
}

/// Ratio of Japanese characters (kana and CJK ideographs) to non-whitespace
/// characters. Empty or whitespace-only text reports 0.
fn japanese_ratio(text: &str) -> f64 {
    let mut total = 0usize;
    let mut japanese = 0usize;
    for c in text.chars() {
        if c.is_whitespace() {
            continue;
        }
        total += 1;
        if matches!(c, '\u{3040}'..='\u{30FF}' | '\u{4E00}'..='\u{9FFF}' | '\u{3000}'..='\u{303F}' | '\u{FF00}'..='\u{FFEF}')
        {
            japanese += 1;
        }
    }
    if total == 0 {
        0.0
    } else {
        japanese as f64 / total as f64
    }
}

/// Apply one batch of content changes to `text`.
///
/// Edits are applied in forward order; each ranged edit's positions are
/// converted against the document state current at the time that edit is
/// applied. A change without a range replaces the whole buffer.
pub fn apply_content_changes(text: &str, changes: &[TextDocumentContentChangeEvent]) -> String {
    let mut current = text.to_string();
    for change in changes {
        match change.range {
            Some(range) => {
                let line_starts = compute_line_starts(&current);
                let start = offset_at(&current, &line_starts, range.start);
                let end = offset_at(&current, &line_starts, range.end);
                let (start, end) = (start.min(end), start.max(end));
                current.replace_range(start..end, &change.text);
            }
            None => current = change.text.clone(),
        }
    }
    current
}

/// Compare two texts line by line and return the indices where content
/// differs; when one text has strictly more lines, the extra lines count as
/// changed.
pub fn changed_lines(old_text: &str, new_text: &str) -> BTreeSet<u32> {
    let old_lines: Vec<&str> = old_text.split('\n').collect();
    let new_lines: Vec<&str> = new_text.split('\n').collect();

    let mut changed = BTreeSet::new();
    let max_lines = old_lines.len().max(new_lines.len());
    for i in 0..max_lines {
        match (old_lines.get(i), new_lines.get(i)) {
            (Some(old), Some(new)) if old == new => {}
            _ => {
                changed.insert(i as u32);
            }
        }
    }
    changed
}

/// Thread-safe storage for open documents.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: DashMap<Url, Arc<DocumentState>>,
}

impl DocumentStore {
    /// Create a new empty document store.
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
        }
    }

    /// Open or update a document, running a full analysis pass.
    pub fn open(
        &self,
        uri: Url,
        source: String,
        language_id: String,
        version: i32,
        tokenizer: &dyn Tokenizer,
        settings: &Settings,
    ) -> Arc<DocumentState> {
        let state = Arc::new(DocumentState::analyze(
            source,
            language_id,
            version,
            tokenizer,
            settings,
        ));
        self.documents.insert(uri, Arc::clone(&state));
        state
    }

    /// Close a document.
    pub fn close(&self, uri: &Url) {
        self.documents.remove(uri);
    }

    /// Get a document's state.
    pub fn get(&self, uri: &Url) -> Option<Arc<DocumentState>> {
        self.documents.get(uri).map(|r| Arc::clone(&r))
    }
}
