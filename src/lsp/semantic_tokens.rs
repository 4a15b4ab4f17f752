//! Semantic tokens for part-of-speech highlighting.
//!
//! Converts the ordered token list into the protocol's delta-encoded
//! integer stream. The legend is fixed once per session and must match what
//! is advertised to the client at initialization.

use serde::{Deserialize, Serialize};
use tower_lsp::lsp_types::{
    Position, Range, SemanticToken, SemanticTokenModifier, SemanticTokenType, SemanticTokensLegend,
};

use crate::analysis::Token;
use crate::document::DocumentState;

/// Display category names, in legend order.
pub const TOKEN_TYPES: [&str; 12] = [
    "noun",
    "verb",
    "adjective",
    "adverb",
    "particle",
    "aux",
    "conjunction",
    "symbol",
    "interj",
    "prefix",
    "suffix",
    "unknown",
];

/// Modifier names, in bit order matching `analysis::modifiers`.
pub const TOKEN_MODIFIERS: [&str; 5] = ["kana", "kanji", "numeric", "proper", "independentVerb"];

/// Get the semantic tokens legend for capability declaration.
pub fn legend() -> SemanticTokensLegend {
    SemanticTokensLegend {
        token_types: TOKEN_TYPES.iter().map(|&n| SemanticTokenType::new(n)).collect(),
        token_modifiers: TOKEN_MODIFIERS
            .iter()
            .map(|&n| SemanticTokenModifier::new(n))
            .collect(),
    }
}

/// Index of a display category name in the legend; unknown names map to 0.
fn legend_index(name: &str) -> u32 {
    TOKEN_TYPES
        .iter()
        .position(|&t| t == name)
        .unwrap_or(0) as u32
}

/// Delta-encode tokens already in ascending (line, column) order.
///
/// Five values per token: delta line, delta start column (absolute on a new
/// line), length in UTF-16 units, legend index, modifier bitmask.
pub fn encode_tokens(tokens: &[Token]) -> Vec<SemanticToken> {
    let mut result = Vec::with_capacity(tokens.len());
    let mut prev_line = 0u32;
    let mut prev_start = 0u32;

    for token in tokens {
        let delta_line = token.line - prev_line;
        let delta_start = if delta_line == 0 {
            token.start_char - prev_start
        } else {
            token.start_char
        };

        result.push(SemanticToken {
            delta_line,
            delta_start,
            length: token.end_char - token.start_char,
            token_type: legend_index(token.category.name()),
            token_modifiers_bitset: token.modifiers,
        });

        prev_line = token.line;
        prev_start = token.start_char;
    }

    result
}

/// Protocol semantic-token response content for a document.
///
/// Token data is returned only when the document's language is Japanese;
/// masked documents get `None` (a null result, not an empty array) and are
/// served by the simplified highlight channel instead.
pub fn tokens_for_document(state: &DocumentState) -> Option<Vec<SemanticToken>> {
    if !state.is_japanese() {
        return None;
    }
    Some(encode_tokens(&state.tokens))
}

/// One entry in the simplified highlight channel used for masked documents,
/// whose primary protocol tokens are suppressed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightToken {
    pub range: Range,
    #[serde(rename = "type")]
    pub token_type: String,
    pub modifiers: u32,
}

/// Build the simplified highlight entries for a token list.
pub fn highlight_tokens(tokens: &[Token]) -> Vec<HighlightToken> {
    tokens
        .iter()
        .map(|token| HighlightToken {
            range: Range::new(
                Position::new(token.line, token.start_char),
                Position::new(token.line, token.end_char),
            ),
            token_type: token.category.name().to_string(),
            modifiers: token.modifiers,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Token;

    fn token(line: u32, start: u32, surface: &str, feature: &str) -> Token {
        Token::from_feature_str(line, start, surface, feature, "UTF-8")
    }

    #[test]
    fn legend_matches_constants() {
        let leg = legend();
        assert_eq!(leg.token_types.len(), TOKEN_TYPES.len());
        assert_eq!(leg.token_modifiers.len(), TOKEN_MODIFIERS.len());
        assert_eq!(leg.token_types[0], SemanticTokenType::new("noun"));
        assert_eq!(leg.token_types[11], SemanticTokenType::new("unknown"));
    }

    #[test]
    fn unknown_category_maps_to_index_zero() {
        assert_eq!(legend_index("nonexistent"), 0);
        assert_eq!(legend_index("particle"), 4);
    }

    #[test]
    fn deltas_reconstruct_absolute_positions() {
        let tokens = vec![
            token(0, 0, "猫", "名詞,一般,*,*,*,*,猫,ネコ,ネコ"),
            token(0, 1, "が", "助詞,格助詞,一般,*,*,*,が,ガ,ガ"),
            token(2, 3, "走る", "動詞,自立,*,*,五段・ラ行,基本形,走る,ハシル,ハシル"),
            token(2, 5, "。", "記号,句点,*,*,*,*,。,。,。"),
        ];
        let encoded = encode_tokens(&tokens);
        assert_eq!(encoded.len(), tokens.len());

        let mut line = 0u32;
        let mut col = 0u32;
        for (raw, original) in encoded.iter().zip(&tokens) {
            line += raw.delta_line;
            col = if raw.delta_line == 0 {
                col + raw.delta_start
            } else {
                raw.delta_start
            };
            assert_eq!(line, original.line);
            assert_eq!(col, original.start_char);
            assert_eq!(raw.length, original.end_char - original.start_char);
        }
    }

    #[test]
    fn token_type_indices_follow_legend() {
        let tokens = vec![
            token(0, 0, "しかし", "接続詞,*,*,*,*,*,しかし,シカシ,シカシ"),
            token(0, 3, "猫", "名詞,一般,*,*,*,*,猫,ネコ,ネコ"),
        ];
        let encoded = encode_tokens(&tokens);
        assert_eq!(encoded[0].token_type, 6); // conjunction
        assert_eq!(encoded[1].token_type, 0); // noun
    }

    #[test]
    fn modifier_bits_survive_encoding() {
        let t = token(0, 0, "東京", "名詞,固有名詞,地域,一般,*,*,東京,トウキョウ,トーキョー");
        let encoded = encode_tokens(std::slice::from_ref(&t));
        assert_eq!(encoded[0].token_modifiers_bitset, t.modifiers);
        assert_ne!(encoded[0].token_modifiers_bitset & crate::analysis::modifiers::PROPER, 0);
    }
}
