//! Grammar diagnostic engine.
//!
//! Six independent rule checks over morphological tokens and sentence spans.
//! Rule spans are produced in masked-text byte coordinates and converted to
//! protocol positions against the original document text; masked and
//! original buffers share byte length and newline layout, so byte offsets
//! are valid in both.

use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, Position};

use crate::document::{offset_at, LineIndex};
use crate::settings::AnalysisSettings;

use super::sentence::SentenceBoundary;
use super::token::Token;

/// All engine diagnostics currently share this severity (Warning).
const ENGINE_SEVERITY: i64 = 2;

/// Read-only bundle passed to every rule check. Rebuilt per analysis pass.
struct RuleContext<'a> {
    /// Masked analysis text.
    text: &'a str,
    tokens: &'a [Token],
    sentences: &'a [SentenceBoundary],
    /// Line index over the *original* document text, for protocol positions.
    index: &'a LineIndex,
    /// Byte offset of each token's start in the masked text.
    token_offsets: Vec<usize>,
    severity: DiagnosticSeverity,
}

impl RuleContext<'_> {
    fn make_diagnostic(&self, start_byte: usize, end_byte: usize, message: String) -> Diagnostic {
        Diagnostic {
            range: self.index.span_to_range(&(start_byte..end_byte)),
            severity: Some(self.severity),
            source: Some("kousei".to_string()),
            message,
            ..Diagnostic::default()
        }
    }

    fn in_sentence(&self, byte_pos: usize, sentence: &SentenceBoundary) -> bool {
        byte_pos >= sentence.start && byte_pos < sentence.end
    }
}

/// Convert each token's (line, UTF-16 column) start to a byte offset in the
/// masked text, which is what the tokenizer ran on.
fn compute_token_offsets(tokens: &[Token], masked: &str, line_starts: &[usize]) -> Vec<usize> {
    tokens
        .iter()
        .map(|t| offset_at(masked, line_starts, Position::new(t.line, t.start_char)))
        .collect()
}

/// Count occurrences of the ideographic comma 、 in a sentence.
fn count_commas(text: &str) -> usize {
    text.matches('、').count()
}

/// Run all enabled rules over one analysis pass.
///
/// The engine's fixed severity is compared against the configured minimum:
/// when it falls below the threshold the whole engine short-circuits and the
/// per-rule toggles are moot.
pub fn check_grammar(
    masked: &str,
    index: &LineIndex,
    tokens: &[Token],
    sentences: &[SentenceBoundary],
    settings: &AnalysisSettings,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    if !settings.grammar_check {
        return diagnostics;
    }
    if ENGINE_SEVERITY < settings.warning_min_severity {
        return diagnostics;
    }

    let line_starts = crate::document::compute_line_starts(masked);
    let ctx = RuleContext {
        text: masked,
        tokens,
        sentences,
        index,
        token_offsets: compute_token_offsets(tokens, masked, &line_starts),
        severity: DiagnosticSeverity::WARNING,
    };

    let rules = &settings.rules;
    if rules.comma_limit {
        check_comma_limit(&ctx, &mut diagnostics, rules.comma_limit_max);
    }
    if rules.adversative_ga {
        check_adversative_ga(&ctx, &mut diagnostics, rules.adversative_ga_max);
    }
    if rules.duplicate_particle_surface {
        check_duplicate_particle_surface(
            &ctx,
            &mut diagnostics,
            rules.duplicate_particle_surface_max_repeat,
        );
    }
    if rules.adjacent_particles {
        check_adjacent_particles(&ctx, &mut diagnostics, rules.adjacent_particles_max_repeat);
    }
    if rules.conjunction_repeat {
        check_conjunction_repeats(&ctx, &mut diagnostics, rules.conjunction_repeat_max);
    }
    if rules.ra_dropping {
        check_ra_dropping(&ctx, &mut diagnostics);
    }

    diagnostics
}

/// Too many ideographic commas in one sentence.
fn check_comma_limit(ctx: &RuleContext, diags: &mut Vec<Diagnostic>, limit: i64) {
    if limit <= 0 {
        return;
    }

    for sentence in ctx.sentences {
        let comma_count = count_commas(&sentence.text);
        if comma_count <= limit as usize {
            continue;
        }

        tracing::debug!(sentence = sentence.id, count = comma_count, "comma limit exceeded");
        diags.push(ctx.make_diagnostic(
            sentence.start,
            sentence.end,
            format!(
                "一文に使用できる読点「、」は最大{}個までです (現在{}個) ",
                limit, comma_count
            ),
        ));
    }
}

/// More adversative conjunctive particles が than allowed in one sentence.
fn check_adversative_ga(ctx: &RuleContext, diags: &mut Vec<Diagnostic>, max_count: i64) {
    if max_count <= 0 {
        return;
    }

    for sentence in ctx.sentences {
        let count = ctx
            .tokens
            .iter()
            .zip(&ctx.token_offsets)
            .filter(|(token, &offset)| {
                token.feature.is_adversative_ga() && ctx.in_sentence(offset, sentence)
            })
            .count();

        if count <= max_count as usize {
            continue;
        }

        tracing::debug!(sentence = sentence.id, count, "adversative が exceeded");
        diags.push(ctx.make_diagnostic(
            sentence.start,
            sentence.end,
            format!(
                "逆接の接続助詞「が」が同一文で{}回以上使われています ({}回) ",
                max_count + 1,
                count
            ),
        ));
    }
}

/// A streak of particle tokens with identical surface text and identical
/// (main category, first subcategory) key within one sentence.
fn check_duplicate_particle_surface(ctx: &RuleContext, diags: &mut Vec<Diagnostic>, max_repeat: i64) {
    if max_repeat <= 0 {
        return;
    }

    for sentence in ctx.sentences {
        let mut last: Option<&Token> = None;
        let mut streak = 1i64;
        let mut streak_start_byte = 0;

        for (token, &offset) in ctx.tokens.iter().zip(&ctx.token_offsets) {
            if !ctx.in_sentence(offset, sentence) || !token.feature.is_particle() {
                continue;
            }

            let continues = last.is_some_and(|prev| {
                prev.surface == token.surface
                    && prev.feature.particle_key() == token.feature.particle_key()
            });

            if continues {
                streak += 1;
                if streak > max_repeat {
                    tracing::debug!(
                        sentence = sentence.id,
                        surface = %token.surface,
                        "duplicate particle streak"
                    );
                    diags.push(ctx.make_diagnostic(
                        streak_start_byte,
                        offset + token.surface.len(),
                        format!("同じ助詞「{}」が連続しています", token.surface),
                    ));
                }
            } else {
                streak = 1;
                streak_start_byte = offset;
            }

            last = Some(token);
        }
    }
}

/// A streak of byte-contiguous particle tokens sharing the same
/// (main category, first subcategory) key; surfaces may differ.
fn check_adjacent_particles(ctx: &RuleContext, diags: &mut Vec<Diagnostic>, max_repeat: i64) {
    if max_repeat <= 0 {
        return;
    }

    for sentence in ctx.sentences {
        let mut prev: Option<(&Token, usize)> = None;
        let mut prev_is_particle = false;
        let mut streak = 1i64;
        let mut streak_start_byte = 0;

        for (token, &offset) in ctx.tokens.iter().zip(&ctx.token_offsets) {
            if !ctx.in_sentence(offset, sentence) {
                continue;
            }

            let is_particle = token.feature.is_particle();
            let continues = is_particle
                && prev_is_particle
                && prev.is_some_and(|(prev_token, prev_offset)| {
                    prev_token.feature.particle_key() == token.feature.particle_key()
                        && offset == prev_offset + prev_token.surface.len()
                });

            if continues {
                streak += 1;
                if streak > max_repeat {
                    tracing::debug!(
                        sentence = sentence.id,
                        surface = %token.surface,
                        "adjacent particle streak"
                    );
                    diags.push(ctx.make_diagnostic(
                        streak_start_byte,
                        offset + token.surface.len(),
                        "助詞が連続して使われています".to_string(),
                    ));
                }
            } else {
                streak = 1;
                if is_particle {
                    streak_start_byte = offset;
                }
            }

            prev_is_particle = is_particle;
            if is_particle {
                prev = Some((token, offset));
            }
        }
    }
}

/// Consecutive conjunction tokens with identical surface text, document-wide.
/// The streak resets when a newline appears strictly between the previous
/// occurrence's end and the current occurrence's start.
fn check_conjunction_repeats(ctx: &RuleContext, diags: &mut Vec<Diagnostic>, max_repeat: i64) {
    if max_repeat <= 0 {
        return;
    }

    let bytes = ctx.text.as_bytes();
    let mut last: Option<(&Token, usize, usize)> = None;
    let mut streak = 1i64;
    let mut streak_start_byte = 0;

    for (token, &offset) in ctx.tokens.iter().zip(&ctx.token_offsets) {
        if !token.feature.is_conjunction() {
            continue;
        }

        let current_end = offset + token.surface.len();
        let continues = last.is_some_and(|(prev_token, _, prev_end)| {
            let gap = bytes.get(prev_end..offset).unwrap_or(&[]);
            prev_token.surface == token.surface && !gap.contains(&b'\n')
        });

        if continues {
            streak += 1;
            if streak > max_repeat {
                tracing::debug!(surface = %token.surface, "conjunction repeated");
                diags.push(ctx.make_diagnostic(
                    streak_start_byte,
                    current_end,
                    format!("同じ接続詞「{}」が連続しています", token.surface),
                ));
            }
        } else {
            streak = 1;
            streak_start_byte = offset;
        }

        last = Some((token, offset, current_end));
    }
}

/// Irregular contracted potential forms flagged as single tokens.
fn is_special_ra_case(token: &Token) -> bool {
    token.feature.is_verb()
        && (token.feature.base_form == "来れる" || token.feature.base_form == "見れる")
}

/// Ichidan imperfective independent verb, the left half of the two-token
/// contracted potential pattern.
fn is_ra_target_verb(token: &Token) -> bool {
    token.feature.is_verb()
        && token.feature.sub1 == "自立"
        && token.feature.inflection == "一段"
        && token.feature.conjugation == "未然形"
}

/// Suffix verb れる, the right half of the two-token pattern.
fn is_ra_suffix(token: &Token) -> bool {
    token.feature.is_verb()
        && token.feature.sub1 == "接尾"
        && token.feature.base_form == "れる"
}

/// Contracted potential form ("ら抜き言葉"), document-wide.
fn check_ra_dropping(ctx: &RuleContext, diags: &mut Vec<Diagnostic>) {
    const MESSAGE: &str = "ら抜き言葉を使用しています";

    // Single-token irregular contractions (来れる, 見れる).
    for (token, &offset) in ctx.tokens.iter().zip(&ctx.token_offsets) {
        if !is_special_ra_case(token) {
            continue;
        }
        tracing::debug!(surface = %token.surface, "ra-dropping (irregular form)");
        diags.push(ctx.make_diagnostic(
            offset,
            offset + token.surface.len(),
            MESSAGE.to_string(),
        ));
    }

    // Two-token pattern: ichidan imperfective verb + suffix れる.
    for (pair, offsets) in ctx.tokens.windows(2).zip(ctx.token_offsets.windows(2)) {
        if is_ra_target_verb(&pair[0]) && is_ra_suffix(&pair[1]) {
            tracing::debug!(
                first = %pair[0].surface,
                second = %pair[1].surface,
                "ra-dropping (two-token pattern)"
            );
            diags.push(ctx.make_diagnostic(
                offsets[0],
                offsets[1] + pair[1].surface.len(),
                MESSAGE.to_string(),
            ));
        }
    }
}
