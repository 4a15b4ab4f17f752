use proptest::prelude::*;

use kousei::document::LineIndex;
use kousei::mask::mask_document;
use kousei::{analysis, NullTokenizer, Settings};

proptest! {
    // Position codec round trip: converting a char-boundary byte offset to a
    // protocol position and back reproduces the offset.
    #[test]
    fn position_round_trip(text in "(?:\\PC|\\n)*", frac in 0.0f64..1.0) {
        let index = LineIndex::new(text.clone());

        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let pick = ((boundaries.len() - 1) as f64 * frac) as usize;
        let offset = boundaries[pick];

        // Offsets pointing at a newline round-trip to the line end, which is
        // still the same byte for line-interior offsets.
        let pos = index.offset_to_position(offset);
        prop_assert_eq!(index.offset_at(pos), offset);
    }

    // Masking preserves byte length for every supported language id.
    #[test]
    fn mask_preserves_length(text in "(?:\\PC|\\n)*") {
        for language_id in ["japanese", "html", "latex", "rust", "python", "c", "plaintext"] {
            let outcome = mask_document(&text, language_id);
            prop_assert_eq!(outcome.masked.len(), text.len(), "language {}", language_id);
        }
    }

    // Masking never moves a newline.
    #[test]
    fn mask_preserves_newlines(text in "(?s)[ -~\\n猫犬好き。、]*") {
        for language_id in ["japanese", "html", "latex", "rust", "python", "c", "plaintext"] {
            let outcome = mask_document(&text, language_id);
            for (i, (a, b)) in text.bytes().zip(outcome.masked.bytes()).enumerate() {
                prop_assert_eq!(
                    a == b'\n',
                    b == b'\n',
                    "language {} byte {}",
                    language_id,
                    i
                );
            }
        }
    }

    // Emitted sentences are ordered and non-overlapping, and the segmenter
    // never panics on arbitrary input.
    #[test]
    fn sentences_are_ordered(text in "(?:\\PC|\\n)*") {
        let sentences = analysis::split_sentences(&text);
        for pair in sentences.windows(2) {
            prop_assert!(pair[0].end <= pair[1].start);
        }
        for (i, sentence) in sentences.iter().enumerate() {
            prop_assert_eq!(sentence.id, i);
            prop_assert!(sentence.start < sentence.end);
        }
    }

    // A whole analysis pass never panics, whatever the document contains.
    #[test]
    fn analysis_is_total(text in "(?:\\PC|\\n)*", language in "japanese|html|latex|rust|plaintext") {
        let _ = kousei::DocumentState::analyze(
            text,
            language,
            0,
            &NullTokenizer,
            &Settings::default(),
        );
    }
}
