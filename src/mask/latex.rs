//! Analyzable-span extraction for LaTeX documents.
//!
//! Content is the set of prose token runs: everything that is not a comment
//! (`%` to end of line, honoring backslash escaping), a math region
//! (`$...$` or `$$...$$`), a control sequence (`\name`, optionally starred),
//! a brace, or whitespace. Comments are sanitized and still count as
//! analyzable content.

use std::ops::Range;

use super::comments::CommentSegment;

/// True when the byte at `pos` is preceded by an odd number of backslashes.
fn is_escaped(bytes: &[u8], pos: usize) -> bool {
    let mut count = 0;
    while pos > count && bytes[pos - count - 1] == b'\\' {
        count += 1;
    }
    count % 2 == 1
}

/// Find the next unescaped `$` at or after `pos`.
fn find_closing_dollar(bytes: &[u8], pos: usize) -> Option<usize> {
    (pos..bytes.len()).find(|&i| bytes[i] == b'$' && !is_escaped(bytes, i))
}

/// Find the next unescaped `$$` at or after `pos`.
fn find_closing_double_dollar(bytes: &[u8], pos: usize) -> Option<usize> {
    let mut i = pos;
    while i + 1 < bytes.len() {
        if bytes[i] == b'$' && bytes[i + 1] == b'$' && !is_escaped(bytes, i) {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Blank the `%` marker (and any piled-up markers and padding) of a comment.
fn sanitize_comment_text(raw: &str) -> String {
    let mut buf = raw.as_bytes().to_vec();
    if buf.is_empty() {
        return String::new();
    }
    buf[0] = b' ';
    let mut i = 1;
    while i < buf.len() && buf[i] == b'%' {
        buf[i] = b' ';
        i += 1;
    }
    while i < buf.len() && (buf[i] == b' ' || buf[i] == b'\t') {
        buf[i] = b' ';
        i += 1;
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Collect comment segments: the first unescaped `%` of each line to its end.
pub fn collect_comments(text: &str) -> Vec<CommentSegment> {
    let bytes = text.as_bytes();
    let mut segments = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let line_end = bytes[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|p| pos + p)
            .unwrap_or(bytes.len());

        if let Some(marker) =
            (pos..line_end).find(|&i| bytes[i] == b'%' && !is_escaped(bytes, i))
        {
            segments.push(CommentSegment {
                start: marker,
                end: line_end,
                sanitized: sanitize_comment_text(&text[marker..line_end]),
            });
        }

        if line_end >= bytes.len() {
            break;
        }
        pos = line_end + 1;
    }

    segments
}

/// Collect prose content ranges, skipping comments, math, control sequences,
/// braces and whitespace. An unclosed math delimiter ends the scan.
pub fn collect_content_ranges(text: &str) -> Vec<Range<usize>> {
    let bytes = text.as_bytes();
    let mut ranges = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        if b == b'%' && !is_escaped(bytes, i) {
            match bytes[i..].iter().position(|&c| c == b'\n') {
                Some(p) => {
                    i += p + 1;
                    continue;
                }
                None => break,
            }
        }

        if b == b'$' && !is_escaped(bytes, i) {
            if i + 1 < bytes.len() && bytes[i + 1] == b'$' {
                match find_closing_double_dollar(bytes, i + 2) {
                    Some(closing) => {
                        i = closing + 2;
                        continue;
                    }
                    None => break,
                }
            }
            match find_closing_dollar(bytes, i + 1) {
                Some(closing) => {
                    i = closing + 1;
                    continue;
                }
                None => break,
            }
        }

        if b == b'\\' {
            i += 1;
            while i < bytes.len() && (bytes[i].is_ascii_alphabetic() || bytes[i] == b'@') {
                i += 1;
            }
            if i < bytes.len() && bytes[i] == b'*' {
                i += 1;
            }
            continue;
        }

        if b == b'{' || b == b'}' {
            i += 1;
            continue;
        }

        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        // Prose run: advance until structural syntax, ASCII whitespace or
        // ASCII punctuation.
        let start = i;
        while i < bytes.len() {
            let d = bytes[i];
            if d == b'\\'
                || d == b'$'
                || d == b'{'
                || d == b'}'
                || (d == b'%' && !is_escaped(bytes, i))
            {
                break;
            }
            if d < 0x80 && (d.is_ascii_whitespace() || d.is_ascii_punctuation()) {
                break;
            }
            i += utf8_char_len(d);
        }
        if i > start {
            ranges.push(start..i);
        } else {
            i += 1;
        }
    }

    ranges
}

fn utf8_char_len(lead: u8) -> usize {
    if lead < 0x80 {
        1
    } else if lead >> 5 == 0b110 {
        2
    } else if lead >> 4 == 0b1110 {
        3
    } else if lead >> 3 == 0b11110 {
        4
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content<'a>(text: &'a str) -> Vec<&'a str> {
        collect_content_ranges(text)
            .into_iter()
            .map(|r| &text[r])
            .collect()
    }

    #[test]
    fn prose_between_commands() {
        assert_eq!(
            content("\\section{序論}\n本文です。"),
            // Braced argument text and the prose body are both content;
            // the full stop is ASCII-safe punctuation only when ASCII.
            vec!["序論", "本文です。"]
        );
    }

    #[test]
    fn math_regions_are_skipped() {
        assert_eq!(content("数式 $x + y$ のあと"), vec!["数式", "のあと"]);
        assert_eq!(content("表示 $$a=b$$ のあと"), vec!["表示", "のあと"]);
    }

    #[test]
    fn escaped_dollar_is_prose() {
        // \$100 — the backslash escapes the dollar; "100" remains content.
        assert_eq!(content("\\$100"), vec!["100"]);
    }

    #[test]
    fn unclosed_math_ends_scan() {
        assert_eq!(content("前 $x + y"), vec!["前"]);
    }

    #[test]
    fn starred_commands_are_skipped() {
        assert_eq!(content("\\section*{見出し}"), vec!["見出し"]);
    }

    #[test]
    fn comment_lines_are_skipped_by_content_scan() {
        assert_eq!(content("本文\n% コメント\n続き"), vec!["本文", "続き"]);
    }

    #[test]
    fn comments_are_collected_and_sanitized() {
        let text = "本文 % 注釈\n%% 二重\n";
        let segments = collect_comments(text);
        assert_eq!(segments.len(), 2);

        assert_eq!(&text[segments[0].start..segments[0].end], "% 注釈");
        assert_eq!(segments[0].sanitized, "  注釈");

        assert_eq!(&text[segments[1].start..segments[1].end], "%% 二重");
        assert_eq!(segments[1].sanitized, "   二重");
    }

    #[test]
    fn escaped_percent_is_not_a_comment() {
        let segments = collect_comments("50\\% です\n");
        assert!(segments.is_empty());
    }

    #[test]
    fn sanitized_comment_preserves_length() {
        let segments = collect_comments("% コメント本体\n");
        assert_eq!(
            segments[0].sanitized.len(),
            segments[0].end - segments[0].start
        );
    }
}
