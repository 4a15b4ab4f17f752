//! Best-effort character-set conversion for tokenizer feature output.
//!
//! Morphological dictionaries may emit feature strings in a non-UTF-8 system
//! charset. The analysis pipeline only understands UTF-8, so tokenizer
//! implementations route feature fields through [`system_to_utf8`] before
//! parsing. Conversion never fails outward: unsupported charset pairs degrade
//! to returning the input unchanged.

/// Convert `input` from `from_charset` to `to_charset`.
///
/// Identity conversions (same charset on both sides) return the input as-is.
/// Anything else is currently unsupported and also passes through unchanged;
/// callers must treat the result as best-effort.
pub fn convert(input: &str, from_charset: &str, to_charset: &str) -> String {
    if input.is_empty() || charsets_equal(from_charset, to_charset) {
        return input.to_string();
    }

    tracing::debug!(from = from_charset, to = to_charset, "unsupported charset conversion, passing through");
    input.to_string()
}

/// Convert a tokenizer system-charset string to UTF-8.
pub fn system_to_utf8(input: &str, system_charset: &str) -> String {
    if system_charset.is_empty() || charsets_equal(system_charset, "UTF-8") {
        return input.to_string();
    }
    convert(input, system_charset, "UTF-8")
}

fn charsets_equal(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}
