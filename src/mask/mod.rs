//! Analyzable-span masking.
//!
//! Derives, per document language, which byte ranges are analyzable content
//! and produces a masked buffer of **identical byte length** to the input:
//! structural syntax becomes spaces, newlines and carriage returns survive
//! verbatim, and analyzable spans keep their original (or sanitized) bytes.
//! Downstream byte offsets are computed against this buffer and translated
//! back to document positions against the original buffer, so the two must
//! share length and newline layout exactly.

mod comments;
mod html;
mod latex;

use std::ops::Range;

pub use comments::{extract_comments, is_language_supported, CommentSegment};

/// Language id for plain Japanese documents, which are analyzed unmasked.
pub const JAPANESE_LANGUAGE_ID: &str = "japanese";

/// Result of masking one document.
#[derive(Debug, Clone, Default)]
pub struct MaskOutcome {
    /// Masked text, byte-for-byte the same length as the input.
    pub masked: String,
    /// Comment segments, sanitized in place, in original-text coordinates.
    pub comments: Vec<CommentSegment>,
    /// Non-comment analyzable ranges (HTML text nodes, LaTeX prose runs).
    pub content: Vec<Range<usize>>,
}

impl MaskOutcome {
    fn unmasked(text: &str) -> Self {
        Self {
            masked: text.to_string(),
            comments: Vec::new(),
            content: Vec::new(),
        }
    }

    /// Ranges highlighted as analyzable content: content ranges plus comment
    /// spans. Empty for languages where only comments are analyzed.
    pub fn content_highlight_ranges(&self) -> Vec<Range<usize>> {
        if self.content.is_empty() {
            return Vec::new();
        }
        let mut ranges = self.content.clone();
        ranges.extend(self.comments.iter().map(|s| s.start..s.end));
        ranges
    }

    /// Whether `offset` falls inside a comment segment.
    pub fn offset_in_comment(&self, offset: usize) -> bool {
        self.comments
            .iter()
            .any(|s| offset >= s.start && offset < s.end)
    }

    /// Whether `offset` falls inside a non-comment content range.
    pub fn offset_in_content(&self, offset: usize) -> bool {
        self.content
            .iter()
            .any(|r| offset >= r.start && offset < r.end)
    }
}

/// Mask a document according to its language id.
///
/// Japanese documents and documents in unrecognized languages pass through
/// unmasked with the full text as content; the latter is a documented
/// fallback, not an error.
pub fn mask_document(text: &str, language_id: &str) -> MaskOutcome {
    let language_id = language_id.to_ascii_lowercase();

    if language_id == JAPANESE_LANGUAGE_ID {
        return MaskOutcome::unmasked(text);
    }

    match language_id.as_str() {
        "html" => {
            let (segments, content) = html::extract(text);
            let masked = mask_with(text, &content, &segments);
            MaskOutcome {
                masked,
                comments: segments,
                content,
            }
        }
        "latex" => {
            let segments = latex::collect_comments(text);
            let content = latex::collect_content_ranges(text);
            let masked = mask_with(text, &content, &segments);
            MaskOutcome {
                masked,
                comments: segments,
                content,
            }
        }
        other if comments::is_language_supported(other) => {
            let segments = comments::extract_comments(other, text);
            let masked = mask_with(text, &[], &segments);
            MaskOutcome {
                masked,
                comments: segments,
                content: Vec::new(),
            }
        }
        _ => MaskOutcome::unmasked(text),
    }
}

/// Blank everything except newlines, then restore content ranges from the
/// original text and overlay sanitized comment bodies.
fn mask_with(text: &str, content: &[Range<usize>], comments: &[CommentSegment]) -> String {
    let mut buf: Vec<u8> = text
        .bytes()
        .map(|b| if b == b'\n' || b == b'\r' { b } else { b' ' })
        .collect();

    for range in content {
        if range.start >= buf.len() {
            continue;
        }
        let len = (range.end - range.start).min(buf.len() - range.start);
        buf[range.start..range.start + len]
            .copy_from_slice(&text.as_bytes()[range.start..range.start + len]);
    }

    for segment in comments {
        if segment.start >= buf.len() {
            continue;
        }
        let sanitized = segment.sanitized.as_bytes();
        let len = sanitized.len().min(buf.len() - segment.start);
        buf[segment.start..segment.start + len].copy_from_slice(&sanitized[..len]);
    }

    match String::from_utf8(buf) {
        Ok(masked) => masked,
        // Extractors emit char-aligned ranges, so this branch is defensive
        // only; keep the length invariant by blanking everything.
        Err(_) => text
            .bytes()
            .map(|b| if b == b'\n' || b == b'\r' { b as char } else { ' ' })
            .collect(),
    }
}
