//! Deterministic mock `TokenBackend`, gated behind `test-util`.
//!
//! Digits `0`-`9` map to ids `0`-`9`, lowercase letters `a`-`z` to ids
//! `10`-`35`, uppercase letters follow, then a handful of explicitly
//! configured punctuation and whitespace tokens, and `sample` always
//! returns the lexicographically-smallest (i.e. numerically smallest)
//! token id in the allowed set. That makes every run of a given schema
//! reproducible, which is what lets scenario and property tests assert
//! exact output.

use std::collections::HashMap;
use std::collections::HashSet;

use anyhow::{anyhow, bail};

use crate::backend::{TokenBackend, TokenId};

/// Default EOS id used by `MockBackend::new`.
pub const DEFAULT_EOS: TokenId = 100;
/// Default vocabulary size used by `MockBackend::new`.
pub const DEFAULT_VOCAB_SIZE: usize = 128;
/// Default token budget used by `MockBackend::new`.
pub const DEFAULT_BUDGET: usize = 256;

/// A fully deterministic backend for tests: no real model, no randomness.
#[derive(Debug, Clone)]
pub struct MockBackend {
    text_for_id: HashMap<TokenId, String>,
    id_for_char: HashMap<char, TokenId>,
    eos: TokenId,
    end_tokens: HashSet<TokenId>,
    vocab_size: usize,
    remaining_tokens: usize,
    total_token_budget: usize,
    /// Every token ever committed via `decode`, in order -- useful for
    /// asserting budget monotonicity and reconstructing the decode stream.
    pub decoded: Vec<TokenId>,
}

impl MockBackend {
    /// The standard layout scenarios A-F and the property tests assume.
    pub fn new() -> Self {
        Self::with_budget(DEFAULT_BUDGET)
    }

    /// Same vocabulary layout as [`MockBackend::new`] but with a caller-
    /// chosen starting budget, for tests that need to land on a specific
    /// `remaining_tokens` parity (e.g. the `AnyOf` determinism scenario).
    pub fn with_budget(budget: usize) -> Self {
        let mut text_for_id = HashMap::new();
        let mut id_for_char = HashMap::new();

        let mut register = |id: TokenId, ch: char| {
            text_for_id.insert(id, ch.to_string());
            id_for_char.insert(ch, id);
        };

        for (i, d) in ('0'..='9').enumerate() {
            register(i as TokenId, d);
        }
        for (i, c) in ('a'..='z').enumerate() {
            register(10 + i as TokenId, c);
        }
        for (i, c) in ('A'..='Z').enumerate() {
            register(36 + i as TokenId, c);
        }
        let punctuation = ['_', ' ', '\t', '\n', '"', ',', ':', '{', '}', '[', ']', '-', '.'];
        for (i, c) in punctuation.into_iter().enumerate() {
            register(62 + i as TokenId, c);
        }

        let eos = DEFAULT_EOS;
        let mut end_tokens = HashSet::new();
        end_tokens.insert(eos);

        Self {
            text_for_id,
            id_for_char,
            eos,
            end_tokens,
            vocab_size: DEFAULT_VOCAB_SIZE,
            remaining_tokens: budget,
            total_token_budget: budget,
            decoded: Vec::new(),
        }
    }

    /// Fast-forward the remaining budget without touching the decode
    /// stream, for tests exercising the deterministic `AnyOf`/optional-key
    /// entropy source.
    pub fn set_remaining_tokens(&mut self, remaining: usize) {
        self.remaining_tokens = remaining;
    }

    /// Render the decode stream as text, using `token_text`.
    pub fn decoded_text(&self) -> String {
        self.decoded
            .iter()
            .filter_map(|id| self.text_for_id.get(id))
            .cloned()
            .collect()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenBackend for MockBackend {
    fn tokenize(&self, text: &str) -> anyhow::Result<Vec<TokenId>> {
        if text.is_empty() {
            return Ok(Vec::new());
        }
        text.chars()
            .map(|c| {
                self.id_for_char
                    .get(&c)
                    .copied()
                    .ok_or_else(|| anyhow!("no mock token for character {c:?}"))
            })
            .collect()
    }

    fn token_text(&self, id: TokenId) -> Option<&str> {
        self.text_for_id.get(&id).map(String::as_str)
    }

    fn is_special(&self, id: TokenId) -> bool {
        !self.text_for_id.contains_key(&id) && id != self.eos
    }

    fn decode(&mut self, id: TokenId) -> anyhow::Result<()> {
        if self.remaining_tokens == 0 {
            bail!("token budget exhausted");
        }
        self.decoded.push(id);
        self.remaining_tokens -= 1;
        Ok(())
    }

    fn sample(&mut self, allowed: &HashSet<TokenId>) -> anyhow::Result<TokenId> {
        allowed
            .iter()
            .copied()
            .min()
            .ok_or_else(|| anyhow!("allowed token set is empty"))
    }

    fn eos_token(&self) -> TokenId {
        self.eos
    }

    fn end_tokens(&self) -> &HashSet<TokenId> {
        &self.end_tokens
    }

    fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    fn remaining_tokens(&self) -> usize {
        self.remaining_tokens
    }

    fn total_token_budget(&self) -> usize {
        self.total_token_budget
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_quote_and_structural_literals() {
        let backend = MockBackend::new();
        assert_eq!(backend.tokenize("\"").unwrap().len(), 1);
        assert_eq!(backend.tokenize(",").unwrap().len(), 1);
        assert_eq!(backend.tokenize("true").unwrap().len(), 4);
    }

    #[test]
    fn sample_is_lexicographically_smallest_id() {
        let mut backend = MockBackend::new();
        let allowed: HashSet<TokenId> = [29, 15, 40].into_iter().collect();
        assert_eq!(backend.sample(&allowed).unwrap(), 15);
    }

    #[test]
    fn decode_decrements_budget_and_fails_at_zero() {
        let mut backend = MockBackend::with_budget(1);
        assert_eq!(backend.remaining_tokens(), 1);
        backend.decode(0).unwrap();
        assert_eq!(backend.remaining_tokens(), 0);
        assert!(backend.decode(0).is_err());
    }
}
