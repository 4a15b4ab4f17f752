//! Comment extraction and in-place sanitization for source languages.
//!
//! For languages other than Japanese, HTML and LaTeX, the analyzable content
//! of a document is its comment bodies. The extractor scans for comments
//! while skipping string literals, and sanitizes each segment by replacing
//! delimiter characters and leading markers with spaces *in place*, so the
//! sanitized text has exactly the byte length of the original segment.

use std::collections::HashMap;
use std::sync::LazyLock;

/// One comment found in a document, with its sanitized replacement text.
///
/// `sanitized` always has the same byte length as `text[start..end]` and the
/// same newline layout; only delimiter and marker bytes differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentSegment {
    pub start: usize,
    pub end: usize,
    pub sanitized: String,
}

/// Comment syntax for one language.
struct CommentSyntax {
    line: &'static [&'static str],
    block: &'static [(&'static str, &'static str)],
    /// String literal delimiters; comment markers inside these are ignored.
    strings: &'static [u8],
}

const C_LIKE: CommentSyntax = CommentSyntax {
    line: &["//"],
    block: &[("/*", "*/")],
    strings: &[b'"', b'\''],
};

const SCRIPT_LIKE: CommentSyntax = CommentSyntax {
    line: &["//"],
    block: &[("/*", "*/")],
    strings: &[b'"', b'\'', b'`'],
};

const HASH_LINE: CommentSyntax = CommentSyntax {
    line: &["#"],
    block: &[],
    strings: &[b'"', b'\''],
};

const RUST_LIKE: CommentSyntax = CommentSyntax {
    line: &["//"],
    block: &[("/*", "*/")],
    strings: &[b'"'],
};

static LANGUAGES: LazyLock<HashMap<&'static str, &'static CommentSyntax>> = LazyLock::new(|| {
    HashMap::from([
        ("c", &C_LIKE),
        ("cpp", &C_LIKE),
        ("c++", &C_LIKE),
        ("javascript", &SCRIPT_LIKE),
        ("javascriptreact", &SCRIPT_LIKE),
        ("typescript", &SCRIPT_LIKE),
        ("typescriptreact", &SCRIPT_LIKE),
        ("tsx", &SCRIPT_LIKE),
        ("python", &HASH_LINE),
        ("rust", &RUST_LIKE),
    ])
});

/// Whether a comment extractor is registered for this language id.
pub fn is_language_supported(language_id: &str) -> bool {
    LANGUAGES.contains_key(language_id.to_ascii_lowercase().as_str())
}

/// Extract sanitized comment segments from a document.
///
/// Returns an empty list for languages without a registered syntax.
pub fn extract_comments(language_id: &str, text: &str) -> Vec<CommentSegment> {
    let Some(syntax) = LANGUAGES.get(language_id.to_ascii_lowercase().as_str()) else {
        return Vec::new();
    };

    let bytes = text.as_bytes();
    let mut segments = Vec::new();
    let mut i = 0;

    'scan: while i < bytes.len() {
        let b = bytes[i];

        if syntax.strings.contains(&b) {
            i = skip_string_literal(bytes, i, b);
            continue;
        }

        for marker in syntax.line {
            if bytes[i..].starts_with(marker.as_bytes()) {
                let end = find_byte(bytes, i, b'\n').unwrap_or(bytes.len());
                segments.push(make_segment(text, i, end, CommentKind::Line));
                i = end;
                continue 'scan;
            }
        }

        for (open, close) in syntax.block {
            if bytes[i..].starts_with(open.as_bytes()) {
                let body_start = i + open.len();
                let end = find_subslice(bytes, body_start, close.as_bytes())
                    .map(|pos| pos + close.len())
                    .unwrap_or(bytes.len());
                segments.push(make_segment(text, i, end, CommentKind::Block));
                i = end;
                continue 'scan;
            }
        }

        i += 1;
    }

    segments
}

/// Skip a string literal starting at `start` with delimiter `delim`.
///
/// Single- and double-quoted strings also terminate at an unescaped newline
/// so an unbalanced quote cannot swallow the rest of the document; backtick
/// strings may span lines.
fn skip_string_literal(bytes: &[u8], start: usize, delim: u8) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\\' {
            i += 2;
            continue;
        }
        if b == delim {
            return i + 1;
        }
        if b == b'\n' && delim != b'`' {
            return i;
        }
        i += 1;
    }
    bytes.len()
}

fn find_byte(bytes: &[u8], from: usize, needle: u8) -> Option<usize> {
    bytes[from..].iter().position(|&b| b == needle).map(|p| from + p)
}

fn find_subslice(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || from >= bytes.len() {
        return None;
    }
    bytes[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| from + p)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommentKind {
    Line,
    Block,
}

fn make_segment(text: &str, start: usize, end: usize, kind: CommentKind) -> CommentSegment {
    let mut buf = text.as_bytes()[start..end].to_vec();
    match kind {
        CommentKind::Line => sanitize_line(&mut buf),
        CommentKind::Block => sanitize_block(&mut buf),
    }
    CommentSegment {
        start,
        end,
        // Sanitization only rewrites ASCII bytes, so the buffer stays UTF-8.
        sanitized: String::from_utf8_lossy(&buf).into_owned(),
    }
}

/// Replace a byte with a space unless it is part of the newline layout.
fn set_space(buf: &mut [u8], i: usize) {
    if buf[i] != b'\n' && buf[i] != b'\r' {
        buf[i] = b' ';
    }
}

/// Blank the leading marker of a line comment: `//`, `#`, `%` or `--`,
/// doc-comment continuations (`///`, `//!`, `#!`), and following whitespace.
pub(crate) fn sanitize_line(buf: &mut [u8]) {
    let len = buf.len();
    if len == 0 {
        return;
    }

    let mut i = 0;

    if len >= 2 && buf[0] == b'/' && buf[1] == b'/' {
        set_space(buf, 0);
        set_space(buf, 1);
        i = 2;
        while i < len && (buf[i] == b'/' || buf[i] == b'!') {
            set_space(buf, i);
            i += 1;
        }
    } else if buf[0] == b'#' {
        while i < len && buf[i] == b'#' {
            set_space(buf, i);
            i += 1;
        }
        if i < len && buf[i] == b'!' {
            set_space(buf, i);
            i += 1;
        }
    } else if buf[0] == b'%' {
        set_space(buf, 0);
        i = 1;
    } else if len >= 2 && buf[0] == b'-' && buf[1] == b'-' {
        set_space(buf, 0);
        set_space(buf, 1);
        i = 2;
    }

    while i < len && (buf[i] == b' ' || buf[i] == b'\t') {
        set_space(buf, i);
        i += 1;
    }
}

/// Blank the delimiters of a block comment (`/* */` or `<!-- -->`) and the
/// decorative `*` / `-` gutter at the start of each interior line.
pub(crate) fn sanitize_block(buf: &mut [u8]) {
    let len = buf.len();
    if len == 0 {
        return;
    }

    if len >= 4 && &buf[..4] == b"<!--" {
        for i in 0..4 {
            set_space(buf, i);
        }
        let mut i = 4;
        while i < len && buf[i] == b'-' {
            set_space(buf, i);
            i += 1;
        }
        while i < len && (buf[i] == b' ' || buf[i] == b'\t') {
            set_space(buf, i);
            i += 1;
        }
    } else if len >= 2 && &buf[..2] == b"/*" {
        set_space(buf, 0);
        set_space(buf, 1);
        let mut i = 2;
        while i < len && buf[i] == b'*' {
            set_space(buf, i);
            i += 1;
        }
        while i < len && (buf[i] == b' ' || buf[i] == b'\t') {
            set_space(buf, i);
            i += 1;
        }
    }

    if len >= 3 && &buf[len - 3..] == b"-->" {
        for i in len - 3..len {
            set_space(buf, i);
        }
        let mut i = len - 3;
        while i > 0 {
            i -= 1;
            if buf[i] == b'-' || buf[i] == b' ' || buf[i] == b'\t' {
                set_space(buf, i);
            } else {
                break;
            }
        }
    } else if len >= 2 && &buf[len - 2..] == b"*/" {
        set_space(buf, len - 2);
        set_space(buf, len - 1);
        let mut i = len - 2;
        while i > 0 {
            i -= 1;
            if buf[i] == b'*' || buf[i] == b' ' || buf[i] == b'\t' {
                set_space(buf, i);
            } else {
                break;
            }
        }
    }

    // Interior lines: blank leading whitespace and a decorative gutter.
    let mut pos = 0;
    while pos < len {
        let line_end = find_byte(buf, pos, b'\n').unwrap_or(len);

        let mut i = pos;
        while i < line_end && (buf[i] == b' ' || buf[i] == b'\t' || buf[i] == b'\r') {
            set_space(buf, i);
            i += 1;
        }
        if i < line_end && (buf[i] == b'*' || buf[i] == b'-') {
            set_space(buf, i);
            i += 1;
            if i < line_end && buf[i] == b' ' {
                set_space(buf, i);
            }
        }

        pos = if line_end < len { line_end + 1 } else { len };
    }
}
