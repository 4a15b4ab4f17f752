//! Per-document, per-line diagnostic cache.
//!
//! Diagnostics are grouped by the line their range starts on, supporting
//! selective invalidation of changed lines. The current policy invalidates
//! changed lines and then rebuilds from a fresh whole-document analysis;
//! invalidation is the correctness seam for a future line-scoped analysis.

use std::collections::{BTreeSet, HashMap};

use dashmap::DashMap;
use tower_lsp::lsp_types::{Diagnostic, Url};

/// Line-indexed diagnostic cache keyed by document.
#[derive(Debug, Default)]
pub struct DiagnosticCache {
    per_document: DashMap<Url, HashMap<u32, Vec<Diagnostic>>>,
}

impl DiagnosticCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self {
            per_document: DashMap::new(),
        }
    }

    /// Clear and repopulate a document's entry from a fresh diagnostic set.
    pub fn rebuild(&self, uri: &Url, diagnostics: &[Diagnostic]) {
        let mut by_line: HashMap<u32, Vec<Diagnostic>> = HashMap::new();
        for diagnostic in diagnostics {
            by_line
                .entry(diagnostic.range.start.line)
                .or_default()
                .push(diagnostic.clone());
        }
        self.per_document.insert(uri.clone(), by_line);
    }

    /// Remove cached diagnostics for the given lines.
    pub fn invalidate_lines(&self, uri: &Url, lines: &BTreeSet<u32>) {
        if let Some(mut entry) = self.per_document.get_mut(uri) {
            for line in lines {
                entry.remove(line);
            }
        }
    }

    /// Flatten a document's cached diagnostics. Line order is unspecified;
    /// consumers must not depend on it.
    pub fn all_diagnostics(&self, uri: &Url) -> Vec<Diagnostic> {
        self.per_document
            .get(uri)
            .map(|entry| entry.values().flatten().cloned().collect())
            .unwrap_or_default()
    }

    /// Drop a document's entry entirely.
    pub fn remove(&self, uri: &Url) {
        self.per_document.remove(uri);
    }
}
