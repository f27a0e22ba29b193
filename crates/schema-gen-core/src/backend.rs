//! The capability interface the generator drives.
//!
//! `TokenBackend` abstracts a tokenizer + decoder + sampler. The generator
//! mutates it on every commit, so it is modeled as a mutable capability
//! (`&mut self` throughout), not value-semantic.

use std::collections::HashSet;

/// A single vocabulary token id.
pub type TokenId = u32;

/// Abstraction over a tokenizer + decoder + sampler.
///
/// Implementations own the model's vocabulary, the running decode context,
/// and the token budget. `Generator` holds one of these exclusively for the
/// duration of a single `generate()` call.
pub trait TokenBackend {
    /// Deterministically tokenize a literal. Returns an empty sequence if
    /// `text` is empty; the generator treats that as a failure only when
    /// the first token is required (e.g. the opening `"`).
    fn tokenize(&self, text: &str) -> anyhow::Result<Vec<TokenId>>;

    /// The canonical decoded text of a single vocabulary token, or `None`
    /// for structural/special tokens that should never enter content masks.
    fn token_text(&self, id: TokenId) -> Option<&str>;

    /// True for control/meta tokens that must never appear in content.
    fn is_special(&self, id: TokenId) -> bool;

    /// Commit a chosen token to the decode stream and decrement
    /// `remaining_tokens` by one.
    fn decode(&mut self, id: TokenId) -> anyhow::Result<()>;

    /// Choose a token strictly from `allowed`. Implementations typically
    /// mask logits to `allowed` (hard, `-inf` outside the set) before
    /// applying their own temperature/top-k/top-p policy. Must fail if
    /// `allowed` is empty or sampling cannot converge.
    fn sample(&mut self, allowed: &HashSet<TokenId>) -> anyhow::Result<TokenId>;

    /// The end-of-sequence token id.
    fn eos_token(&self) -> TokenId;

    /// Superset of terminal tokens, including EOS, that a backend may treat
    /// as ending generation (e.g. additional stop tokens).
    fn end_tokens(&self) -> &HashSet<TokenId>;

    /// Size of the vocabulary; valid ids are `0..vocab_size`.
    fn vocab_size(&self) -> usize;

    /// Tokens still permitted before the generator must abort with
    /// `token_budget_exceeded`.
    fn remaining_tokens(&self) -> usize;

    /// Constant reference point for proportional caps (e.g. the free-string
    /// cap derives from this).
    fn total_token_budget(&self) -> usize;
}
