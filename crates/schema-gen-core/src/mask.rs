//! Vocabulary Analyzer: partitions the vocabulary into the reusable
//! allowed-token sets every sampling call draws from.
//!
//! Built once per `Generator`, in its constructor, by scanning vocabulary
//! indices `0..vocab_size` and classifying each token's text.

use std::collections::HashSet;

use crate::backend::{TokenBackend, TokenId};
use crate::error::{GeneratorError, Result};

/// The seven precomputed allowed-token sets every sampling call draws from.
#[derive(Debug, Clone)]
pub struct VocabMasks {
    pub quote_token: TokenId,
    pub string_terminators: HashSet<TokenId>,
    pub string_initial_allowed: HashSet<TokenId>,
    pub string_continuation_allowed: HashSet<TokenId>,
    pub basic_terminators: HashSet<TokenId>,
    pub integer_terminators: HashSet<TokenId>,
    pub double_terminators: HashSet<TokenId>,
}

/// A character is JSON-string-safe if it's printable and not a control
/// character, `"`, or `\`.
fn is_string_safe_char(c: char) -> bool {
    !c.is_control() && c != '"' && c != '\\'
}

/// Non-empty text, every character string-safe, and if the whole text is
/// whitespace it must be exactly one space/tab/newline.
fn is_string_content_token(text: &str) -> bool {
    if text.is_empty() || !text.chars().all(is_string_safe_char) {
        return false;
    }
    if text.chars().all(char::is_whitespace) {
        return matches!(text, " " | "\t" | "\n");
    }
    true
}

/// Non-empty, characters only `0-9`/`-`, at least one digit.
fn is_integer_digit_token(text: &str) -> bool {
    !text.is_empty()
        && text.chars().all(|c| c.is_ascii_digit() || c == '-')
        && text.chars().any(|c| c.is_ascii_digit())
}

/// Non-empty, characters only `0-9`/`-`/`.`, at least one digit.
fn is_decimal_digit_token(text: &str) -> bool {
    !text.is_empty()
        && text.chars().all(|c| c.is_ascii_digit() || c == '-' || c == '.')
        && text.chars().any(|c| c.is_ascii_digit())
}

/// Tokenize `literal` and return its first token, if tokenization succeeds
/// and yields at least one token. Used to find the single-token id for each
/// structural punctuation mark.
fn first_token_for(backend: &dyn TokenBackend, literal: &str) -> Option<TokenId> {
    backend.tokenize(literal).ok()?.into_iter().next()
}

impl VocabMasks {
    /// Scan `backend`'s vocabulary once and build every mask. Fails with
    /// `tokenization_failed` if no vocabulary token's text is exactly `"`.
    pub fn build(backend: &dyn TokenBackend) -> Result<Self> {
        let quote_token = first_token_for(backend, "\"")
            .ok_or_else(|| GeneratorError::TokenizationFailed("no '\"' token in vocabulary".into()))?;

        let end_tokens = backend.end_tokens().clone();

        let mut string_initial_allowed = HashSet::new();
        let mut integer_digit_tokens = HashSet::new();
        let mut decimal_digit_tokens = HashSet::new();

        for id in 0..backend.vocab_size() as TokenId {
            if backend.is_special(id) || end_tokens.contains(&id) {
                continue;
            }
            let Some(text) = backend.token_text(id) else {
                continue;
            };
            if is_string_content_token(text) {
                string_initial_allowed.insert(id);
            }
            if is_integer_digit_token(text) {
                integer_digit_tokens.insert(id);
            }
            if is_decimal_digit_token(text) {
                decimal_digit_tokens.insert(id);
            }
        }

        let mut string_terminators = end_tokens.clone();
        string_terminators.insert(quote_token);

        let mut string_continuation_allowed = string_initial_allowed.clone();
        string_continuation_allowed.extend(string_terminators.iter().copied());

        let mut basic_terminators = end_tokens.clone();
        for lit in [",", "}", "]", ":"] {
            if let Some(id) = first_token_for(backend, lit) {
                basic_terminators.insert(id);
            }
        }

        let mut integer_terminators = basic_terminators.clone();
        integer_terminators.extend(integer_digit_tokens);

        let mut double_terminators = basic_terminators.clone();
        double_terminators.extend(decimal_digit_tokens);

        Ok(Self {
            quote_token,
            string_terminators,
            string_initial_allowed,
            string_continuation_allowed,
            basic_terminators,
            integer_terminators,
            double_terminators,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_safe_excludes_quote_and_backslash_and_control() {
        assert!(is_string_safe_char('a'));
        assert!(!is_string_safe_char('"'));
        assert!(!is_string_safe_char('\\'));
        assert!(!is_string_safe_char('\u{0007}'));
    }

    #[test]
    fn string_content_token_allows_single_whitespace_chars_only() {
        assert!(is_string_content_token(" "));
        assert!(is_string_content_token("\t"));
        assert!(is_string_content_token("\n"));
        assert!(!is_string_content_token("  "));
        assert!(is_string_content_token("ab"));
        assert!(!is_string_content_token(""));
    }

    #[test]
    fn integer_digit_token_requires_at_least_one_digit() {
        assert!(is_integer_digit_token("123"));
        assert!(is_integer_digit_token("-5"));
        assert!(!is_integer_digit_token("-"));
        assert!(!is_integer_digit_token(""));
        assert!(!is_integer_digit_token("1.5"));
    }

    #[test]
    fn decimal_digit_token_allows_dot() {
        assert!(is_decimal_digit_token("1.5"));
        assert!(is_decimal_digit_token("-0.3"));
        assert!(!is_decimal_digit_token("."));
        assert!(!is_decimal_digit_token("-"));
    }
}
