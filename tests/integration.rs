use std::collections::BTreeSet;

use expect_test::expect;
use tower_lsp::lsp_types::{Diagnostic, Position, Range, TextDocumentContentChangeEvent, Url};

use kousei::analysis::{Token, Tokenizer};
use kousei::document::{apply_content_changes, changed_lines, DocumentState, LineIndex};
use kousei::lsp::{encode_tokens, tokens_for_document, DiagnosticCache};
use kousei::mask::mask_document;
use kousei::{NullTokenizer, Settings};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Tokenizer test double: lays out a fixed (surface, feature) sequence over
/// whatever text it is asked to analyze, the way a morphological backend
/// would, by locating each surface in order.
struct FixtureTokenizer {
    entries: Vec<(&'static str, &'static str)>,
}

impl FixtureTokenizer {
    fn new(entries: &[(&'static str, &'static str)]) -> Self {
        Self {
            entries: entries.to_vec(),
        }
    }
}

impl Tokenizer for FixtureTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let index = LineIndex::new(text.to_string());
        let mut cursor = 0;
        let mut tokens = Vec::new();
        for (surface, feature) in &self.entries {
            let Some(at) = text[cursor..].find(surface).map(|p| cursor + p) else {
                continue;
            };
            let pos = index.offset_to_position(at);
            tokens.push(Token::from_feature_str(
                pos.line,
                pos.character,
                surface,
                feature,
                "UTF-8",
            ));
            cursor = at + surface.len();
        }
        tokens
    }
}

/// Format diagnostics into a deterministic, human-readable string.
///
/// Each diagnostic becomes one line:
///   <start_line>:<start_col>-<end_line>:<end_col> <severity>: <message>
fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    if diagnostics.is_empty() {
        return "OK (no diagnostics)".to_string();
    }

    let mut lines: Vec<String> = diagnostics
        .iter()
        .map(|d| {
            let severity = match d.severity {
                Some(tower_lsp::lsp_types::DiagnosticSeverity::ERROR) => "error",
                Some(tower_lsp::lsp_types::DiagnosticSeverity::WARNING) => "warning",
                Some(tower_lsp::lsp_types::DiagnosticSeverity::INFORMATION) => "info",
                Some(tower_lsp::lsp_types::DiagnosticSeverity::HINT) => "hint",
                _ => "unknown",
            };
            format!(
                "{}:{}-{}:{} {}: {}",
                d.range.start.line,
                d.range.start.character,
                d.range.end.line,
                d.range.end.character,
                severity,
                d.message.trim_end(),
            )
        })
        .collect();

    lines.sort();
    lines.join("\n")
}

/// Analyze a Japanese document with a fixture tokenizer and return formatted
/// diagnostics.
fn check_japanese(text: &str, entries: &[(&'static str, &'static str)]) -> String {
    let tokenizer = FixtureTokenizer::new(entries);
    let state = DocumentState::analyze(
        text.to_string(),
        "japanese".to_string(),
        0,
        &tokenizer,
        &Settings::default(),
    );
    format_diagnostics(&state.diagnostics)
}

// ---------------------------------------------------------------------------
// Tests — grammar diagnostics
// ---------------------------------------------------------------------------

#[test]
fn comma_limit_diagnostic() {
    // Default limit is 3 commas per sentence; this sentence has 4.
    let actual = check_japanese("一、二、三、四、五。", &[]);
    let expected = expect![[r#"
        0:0-0:10 warning: 一文に使用できる読点「、」は最大3個までです (現在4個)"#]];
    expected.assert_eq(&actual);
}

#[test]
fn comma_at_limit_is_clean() {
    let actual = check_japanese("一、二、三、四。", &[]);
    let expected = expect![[r#"OK (no diagnostics)"#]];
    expected.assert_eq(&actual);
}

#[test]
fn adversative_ga_diagnostic() {
    let actual = check_japanese(
        "猫が好きだが犬も好きだ。",
        &[
            ("猫", "名詞,一般,*,*,*,*,猫,ネコ,ネコ"),
            ("が", "助詞,接続助詞,*,*,*,*,が,ガ,ガ"),
            ("好き", "名詞,形容動詞語幹,*,*,*,*,好き,スキ,スキ"),
            ("だ", "助動詞,*,*,*,特殊・ダ,基本形,だ,ダ,ダ"),
            ("が", "助詞,接続助詞,*,*,*,*,が,ガ,ガ"),
            ("犬", "名詞,一般,*,*,*,*,犬,イヌ,イヌ"),
            ("も", "助詞,係助詞,*,*,*,*,も,モ,モ"),
            ("好き", "名詞,形容動詞語幹,*,*,*,*,好き,スキ,スキ"),
            ("だ", "助動詞,*,*,*,特殊・ダ,基本形,だ,ダ,ダ"),
        ],
    );
    // The repeated が surface also trips the duplicate-particle check under
    // default settings; the two rules do not interact but may overlap.
    let expected = expect![[r#"
        0:0-0:12 warning: 逆接の接続助詞「が」が同一文で2回以上使われています (2回)
        0:1-0:6 warning: 同じ助詞「が」が連続しています"#]];
    expected.assert_eq(&actual);
}

#[test]
fn ra_dropping_diagnostic() {
    let actual = check_japanese(
        "朝なら食べれると思う。",
        &[
            ("朝", "名詞,副詞可能,*,*,*,*,朝,アサ,アサ"),
            ("なら", "助動詞,*,*,*,特殊・ダ,仮定形,だ,ナラ,ナラ"),
            ("食べ", "動詞,自立,*,*,一段,未然形,食べる,タベ,タベ"),
            ("れる", "動詞,接尾,*,*,一段,基本形,れる,レル,レル"),
            ("と", "助詞,格助詞,引用,*,*,*,と,ト,ト"),
            ("思う", "動詞,自立,*,*,五段・ワ行促音便,基本形,思う,オモウ,オモウ"),
        ],
    );
    let expected = expect![[r#"
        0:3-0:7 warning: ら抜き言葉を使用しています"#]];
    expected.assert_eq(&actual);
}

#[test]
fn multiple_rules_fire_independently() {
    let actual = check_japanese(
        "今日は、しかし、雨だが、しかし、出かけるが、楽しい。",
        &[
            ("しかし", "接続詞,*,*,*,*,*,しかし,シカシ,シカシ"),
            ("が", "助詞,接続助詞,*,*,*,*,が,ガ,ガ"),
            ("しかし", "接続詞,*,*,*,*,*,しかし,シカシ,シカシ"),
            ("が", "助詞,接続助詞,*,*,*,*,が,ガ,ガ"),
        ],
    );
    let expected = expect![[r#"
        0:0-0:26 warning: 一文に使用できる読点「、」は最大3個までです (現在5個)
        0:0-0:26 warning: 逆接の接続助詞「が」が同一文で2回以上使われています (2回)
        0:10-0:21 warning: 同じ助詞「が」が連続しています
        0:4-0:15 warning: 同じ接続詞「しかし」が連続しています"#]];
    expected.assert_eq(&actual);
}

// ---------------------------------------------------------------------------
// Tests — masking
// ---------------------------------------------------------------------------

#[test]
fn html_masking_scenario() {
    let text = "<div>こんにちは<!-- hi --></div>";
    let outcome = mask_document(text, "html");

    // Same byte length, tags blanked, text node and comment body kept.
    assert_eq!(outcome.masked.len(), text.len());
    let expected = format!("{}こんにちは{}hi{}", " ".repeat(5), " ".repeat(5), " ".repeat(10));
    assert_eq!(outcome.masked, expected);

    assert_eq!(outcome.content, vec![5..20]);
    assert_eq!(outcome.comments.len(), 1);
    assert_eq!(outcome.comments[0].start, 20);
    assert_eq!(outcome.comments[0].end, 31);
}

#[test]
fn unrecognized_language_is_unmasked() {
    let text = "ただのテキストです。";
    let outcome = mask_document(text, "plaintext");
    assert_eq!(outcome.masked, text);
    assert!(outcome.comments.is_empty());
    assert!(outcome.content.is_empty());
}

#[test]
fn rust_comments_are_the_only_content() {
    let text = "fn main() {\n    // 猫が好きだ。\n}\n";
    let outcome = mask_document(text, "rust");
    assert_eq!(outcome.masked.len(), text.len());
    let expected = format!("{}\n{}猫が好きだ。\n \n", " ".repeat(11), " ".repeat(7));
    assert_eq!(outcome.masked, expected);
}

// ---------------------------------------------------------------------------
// Tests — document synchronization
// ---------------------------------------------------------------------------

#[test]
fn incremental_edit_scenario() {
    let change = TextDocumentContentChangeEvent {
        range: Some(Range::new(Position::new(0, 2), Position::new(0, 4))),
        range_length: None,
        text: "XY".to_string(),
    };
    let new_text = apply_content_changes("ABCDEF", &[change]);
    assert_eq!(new_text, "ABXYEF");
    assert_eq!(changed_lines("ABCDEF", &new_text), BTreeSet::from([0]));
}

#[test]
fn full_analysis_after_edit() {
    let tokenizer = NullTokenizer;
    let settings = Settings::default();

    let state = DocumentState::analyze(
        "一、二。".to_string(),
        "japanese".to_string(),
        1,
        &tokenizer,
        &settings,
    );
    assert!(state.diagnostics.is_empty());

    // Edit introduces three more commas; re-analysis finds the violation.
    let new_text = apply_content_changes(
        state.source(),
        &[TextDocumentContentChangeEvent {
            range: Some(Range::new(Position::new(0, 3), Position::new(0, 3))),
            range_length: None,
            text: "三、四、五、".to_string(),
        }],
    );
    let state = DocumentState::analyze(
        new_text,
        "japanese".to_string(),
        2,
        &tokenizer,
        &settings,
    );
    let actual = format_diagnostics(&state.diagnostics);
    let expected = expect![[r#"
        0:0-0:10 warning: 一文に使用できる読点「、」は最大3個までです (現在4個)"#]];
    expected.assert_eq(&actual);
}

// ---------------------------------------------------------------------------
// Tests — diagnostic cache
// ---------------------------------------------------------------------------

#[test]
fn cache_invalidation_keeps_other_lines() {
    let cache = DiagnosticCache::new();
    let uri = Url::parse("file:///doc.ja.txt").expect("valid url");

    let on_line = |line: u32| Diagnostic {
        range: Range::new(Position::new(line, 0), Position::new(line, 1)),
        message: format!("d{line}"),
        ..Diagnostic::default()
    };
    cache.rebuild(&uri, &[on_line(2), on_line(5), on_line(9)]);
    cache.invalidate_lines(&uri, &BTreeSet::from([5]));

    let mut lines: Vec<u32> = cache
        .all_diagnostics(&uri)
        .iter()
        .map(|d| d.range.start.line)
        .collect();
    lines.sort();
    assert_eq!(lines, vec![2, 9]);
}

// ---------------------------------------------------------------------------
// Tests — semantic tokens
// ---------------------------------------------------------------------------

#[test]
fn semantic_token_deltas_reconstruct_positions() {
    let tokenizer = FixtureTokenizer::new(&[
        ("猫", "名詞,一般,*,*,*,*,猫,ネコ,ネコ"),
        ("が", "助詞,格助詞,一般,*,*,*,が,ガ,ガ"),
        ("走る", "動詞,自立,*,*,五段・ラ行,基本形,走る,ハシル,ハシル"),
    ]);
    let text = "猫が走る。\n猫が走る。";
    let tokens = tokenizer.tokenize(text);
    let encoded = encode_tokens(&tokens);

    let mut line = 0u32;
    let mut col = 0u32;
    for (raw, token) in encoded.iter().zip(&tokens) {
        line += raw.delta_line;
        col = if raw.delta_line == 0 {
            col + raw.delta_start
        } else {
            raw.delta_start
        };
        assert_eq!((line, col), (token.line, token.start_char));
    }
}

#[test]
fn semantic_tokens_null_for_non_japanese() {
    let state = DocumentState::analyze(
        "<div>こんにちは</div>".to_string(),
        "html".to_string(),
        0,
        &NullTokenizer,
        &Settings::default(),
    );
    // Null result, not an empty token array.
    assert!(tokens_for_document(&state).is_none());

    let japanese = DocumentState::analyze(
        "こんにちは。".to_string(),
        "japanese".to_string(),
        0,
        &NullTokenizer,
        &Settings::default(),
    );
    assert!(tokens_for_document(&japanese).is_some());
}
