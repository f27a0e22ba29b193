//! A `TokenBackend` adapter over a real `tokenizers::Tokenizer`.
//!
//! This host has no model to score logits with, so `sample` picks uniformly
//! at random among whatever `Generator` says is allowed -- a stand-in for
//! the nucleus/top-k sampler a real inference server would plug in here.

use std::collections::HashSet;

use anyhow::{anyhow, Context, Result};
use schema_gen_core::{TokenBackend, TokenId};
use tokenizers::Tokenizer;

pub struct TokenizerBackend {
    tokenizer: Tokenizer,
    token_text: Vec<Option<String>>,
    eos: TokenId,
    end_tokens: HashSet<TokenId>,
    vocab_size: usize,
    remaining_tokens: usize,
    total_token_budget: usize,
}

impl TokenizerBackend {
    pub fn load(path: &str, eos_token: &str, budget: usize) -> Result<Self> {
        let tokenizer = Tokenizer::from_file(path)
            .map_err(|e| anyhow!("failed to load tokenizer from {path}: {e}"))?;
        let vocab_size = tokenizer.get_vocab_size(true);
        let token_text = (0..vocab_size as u32)
            .map(|id| tokenizer.id_to_token(id))
            .collect();
        let eos = tokenizer
            .token_to_id(eos_token)
            .with_context(|| format!("eos token {eos_token:?} not found in tokenizer vocabulary"))?;
        let mut end_tokens = HashSet::new();
        end_tokens.insert(eos);

        Ok(Self {
            tokenizer,
            token_text,
            eos,
            end_tokens,
            vocab_size,
            remaining_tokens: budget,
            total_token_budget: budget,
        })
    }
}

impl TokenBackend for TokenizerBackend {
    fn tokenize(&self, text: &str) -> Result<Vec<TokenId>> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| anyhow!("tokenization failed for {text:?}: {e}"))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn token_text(&self, id: TokenId) -> Option<&str> {
        self.token_text.get(id as usize)?.as_deref()
    }

    fn is_special(&self, id: TokenId) -> bool {
        self.token_text(id).is_none() || id == self.eos
    }

    fn decode(&mut self, _id: TokenId) -> Result<()> {
        if self.remaining_tokens == 0 {
            anyhow::bail!("token budget exhausted");
        }
        self.remaining_tokens -= 1;
        Ok(())
    }

    fn sample(&mut self, allowed: &HashSet<TokenId>) -> Result<TokenId> {
        let candidates: Vec<TokenId> = allowed.iter().copied().collect();
        let index = fastrand::usize(..candidates.len().max(1));
        candidates
            .get(index)
            .copied()
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
