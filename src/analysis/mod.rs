//! Japanese text analysis: tokens, sentences, and grammar diagnostics.
//!
//! The morphological tokenizer itself is an external capability injected
//! through the [`Tokenizer`] trait; everything else in this module operates
//! on its output.

mod grammar;
mod sentence;
mod token;

pub use grammar::check_grammar;
pub use sentence::{split_sentences, SentenceBoundary};
pub use token::{
    compute_modifiers, modifiers, DependencyChunk, DisplayCategory, NullTokenizer, PosFeature,
    Token, Tokenizer,
};
