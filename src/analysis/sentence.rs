//! Sentence segmentation over masked text.
//!
//! Splits a masked buffer into ordered, non-overlapping sentence spans.
//! Boundaries are recognized, in priority order, at a newline, a tab, or a
//! full-width terminal punctuation mark (。 ？ ！). Spans are byte half-open
//! ranges in masked-text coordinates; sentence text is trimmed for analysis
//! but the raw span is preserved for diagnostics.

/// Forward-progress safety cap on a single sentence scan, in bytes.
const MAX_SENTENCE_SCAN: usize = 10_000;

/// Maximum ASCII whitespace bytes skipped between sentences.
const MAX_WHITESPACE_SKIP: usize = 100;

/// One sentence span in masked-text byte coordinates.
///
/// Ids are dense integers starting at 0 over emitted sentences; spans whose
/// text is empty after trimming are discarded and consume no id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceBoundary {
    /// Byte offset where the raw span starts (half-open).
    pub start: usize,
    /// Byte offset just past the raw span, including the boundary character.
    pub end: usize,
    /// Dense id among emitted sentences.
    pub id: usize,
    /// Sentence text with ASCII whitespace and the trailing newline trimmed.
    pub text: String,
}

/// True when `bytes[pos..]` starts with a full-width terminal mark.
///
/// 。 is E3 80 82, ？ is EF BC 9F, ！ is EF BC 81; all three are 3 bytes.
fn is_terminal_punctuation(bytes: &[u8], pos: usize) -> bool {
    let Some(seq) = bytes.get(pos..pos + 3) else {
        return false;
    };
    matches!(seq, [0xE3, 0x80, 0x82] | [0xEF, 0xBC, 0x9F] | [0xEF, 0xBC, 0x81])
}

/// Split masked text into ordered sentence spans.
pub fn split_sentences(text: &str) -> Vec<SentenceBoundary> {
    let bytes = text.as_bytes();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut next_id = 0;

    while start < bytes.len() {
        let cap = bytes.len().min(start + MAX_SENTENCE_SCAN);
        let mut end = start;
        let mut found = false;

        while end < cap {
            let b = bytes[end];
            if b == b'\n' || b == b'\t' {
                end += 1;
                found = true;
                break;
            }
            if is_terminal_punctuation(bytes, end) {
                end += 3;
                found = true;
                break;
            }
            end += 1;
        }

        // No boundary within the scan window: force one at the cap.
        if !found {
            end = cap;
        }

        if end > start {
            let raw = &bytes[start..end];

            let mut text_start = 0;
            while text_start < raw.len() && matches!(raw[text_start], b' ' | b'\t' | b'\r') {
                text_start += 1;
            }
            let mut text_end = raw.len();
            while text_end > text_start
                && matches!(raw[text_end - 1], b' ' | b'\t' | b'\r' | b'\n')
            {
                text_end -= 1;
            }

            if text_end > text_start {
                let sentence = SentenceBoundary {
                    start,
                    end,
                    id: next_id,
                    text: String::from_utf8_lossy(&raw[text_start..text_end]).into_owned(),
                };
                tracing::debug!(
                    id = sentence.id,
                    start = sentence.start,
                    end = sentence.end,
                    "sentence emitted"
                );
                sentences.push(sentence);
                next_id += 1;
            }
        }

        start = end;

        let mut skipped = 0;
        while start < bytes.len()
            && skipped < MAX_WHITESPACE_SKIP
            && matches!(bytes[start], b' ' | b'\t' | b'\r')
        {
            start += 1;
            skipped += 1;
        }
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_has_no_sentences() {
        assert!(split_sentences("").is_empty());
    }

    #[test]
    fn split_on_full_stop() {
        let sentences = split_sentences("猫が好き。犬も好き。");
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].text, "猫が好き。");
        assert_eq!(sentences[1].text, "犬も好き。");
        assert_eq!(sentences[0].start, 0);
        assert_eq!(sentences[0].end, 15);
        assert_eq!(sentences[1].start, 15);
        assert_eq!(sentences[1].end, 30);
    }

    #[test]
    fn split_on_question_and_exclamation() {
        let sentences = split_sentences("元気？はい！");
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].text, "元気？");
        assert_eq!(sentences[1].text, "はい！");
    }

    #[test]
    fn newline_takes_priority_and_is_trimmed_from_text() {
        let sentences = split_sentences("一行目\n二行目");
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].text, "一行目");
        // Raw span keeps the newline.
        assert_eq!(sentences[0].end, 10);
        assert_eq!(sentences[1].text, "二行目");
    }

    #[test]
    fn tab_is_a_boundary() {
        let sentences = split_sentences("見出し\t本文");
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].text, "見出し");
        assert_eq!(sentences[1].text, "本文");
    }

    #[test]
    fn whitespace_only_spans_are_discarded_and_ids_stay_dense() {
        let sentences = split_sentences("あ。   \n   い。");
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].id, 0);
        assert_eq!(sentences[1].id, 1);
        assert_eq!(sentences[1].text, "い。");
    }

    #[test]
    fn sentences_are_ordered_and_non_overlapping() {
        let sentences = split_sentences("ａ。ｂ。\nｃ？ｄ！    ｅ。");
        for pair in sentences.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }

    #[test]
    fn leading_whitespace_is_trimmed_but_span_is_raw() {
        let sentences = split_sentences("  猫。");
        assert_eq!(sentences.len(), 1);
        assert_eq!(sentences[0].text, "猫。");
        assert_eq!(sentences[0].start, 0);
    }

    #[test]
    fn scan_cap_forces_a_boundary() {
        // 12,000 bytes of 'a' with no boundary characters at all.
        let text = "a".repeat(12_000);
        let sentences = split_sentences(&text);
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].start, 0);
        assert_eq!(sentences[0].end, 10_000);
        assert_eq!(sentences[1].start, 10_000);
        assert_eq!(sentences[1].end, 12_000);
    }
}
