//! Analyzable-span extraction for HTML documents.
//!
//! Content is the set of trimmed text-node spans plus comment bodies;
//! markup is everything else. The scanner walks bytes so the resulting
//! ranges are valid offsets into the original buffer.

use std::ops::Range;

use super::comments::{sanitize_block, CommentSegment};

/// Extract comment segments and trimmed text-node content ranges.
pub fn extract(text: &str) -> (Vec<CommentSegment>, Vec<Range<usize>>) {
    let bytes = text.as_bytes();
    let mut comments = Vec::new();
    let mut content = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'<' {
            if bytes[i..].starts_with(b"<!--") {
                let end = find_subslice(bytes, i + 4, b"-->")
                    .map(|pos| pos + 3)
                    .unwrap_or(bytes.len());
                let mut buf = bytes[i..end].to_vec();
                sanitize_block(&mut buf);
                comments.push(CommentSegment {
                    start: i,
                    end,
                    sanitized: String::from_utf8_lossy(&buf).into_owned(),
                });
                i = end;
            } else {
                i = skip_tag(bytes, i);
            }
            continue;
        }

        // Text node: everything up to the next tag or comment.
        let start = i;
        while i < bytes.len() && bytes[i] != b'<' {
            i += 1;
        }
        if let Some(range) = trim_ascii_whitespace(bytes, start, i) {
            content.push(range);
        }
    }

    (comments, content)
}

/// Skip a tag starting at `<`, honoring quoted attribute values.
fn skip_tag(bytes: &[u8], start: usize) -> usize {
    let mut i = start + 1;
    let mut quote: Option<u8> = None;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                }
            }
            None => {
                if b == b'"' || b == b'\'' {
                    quote = Some(b);
                } else if b == b'>' {
                    return i + 1;
                }
            }
        }
        i += 1;
    }
    bytes.len()
}

/// Trim ASCII whitespace from both ends of `bytes[start..end]`; `None` when
/// nothing remains.
fn trim_ascii_whitespace(bytes: &[u8], start: usize, end: usize) -> Option<Range<usize>> {
    let mut s = start;
    while s < end && bytes[s].is_ascii_whitespace() {
        s += 1;
    }
    let mut e = end;
    while e > s && bytes[e - 1].is_ascii_whitespace() {
        e -= 1;
    }
    (e > s).then_some(s..e)
}

fn find_subslice(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from >= bytes.len() {
        return None;
    }
    bytes[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| from + p)
}
