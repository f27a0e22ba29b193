//! The generator's error taxonomy.
//!
//! `Backend` wraps whatever the `TokenBackend` implementation raised,
//! verbatim -- the generator never inspects or retries on it.

use std::fmt;

/// Errors a `Generator::generate()` call can surface.
#[derive(Debug)]
pub enum GeneratorError {
    /// A required literal (notably `"`) tokenized to nothing, or every
    /// candidate in a choice set tokenized to nothing.
    TokenizationFailed(String),
    /// A sampling or emission step began with `remaining_tokens == 0`.
    TokenBudgetExceeded,
    /// A `Ref(name)` did not resolve against `defs`.
    MissingReference(String),
    /// An `AnyOf` node had zero variants.
    EmptyAnyOf,
    /// Propagated verbatim from `TokenBackend::sample`, `decode`, or
    /// `tokenize`.
    Backend(anyhow::Error),
}

impl fmt::Display for GeneratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorError::TokenizationFailed(what) => {
                write!(f, "tokenization failed: {what}")
            }
            GeneratorError::TokenBudgetExceeded => write!(f, "token budget exceeded"),
            GeneratorError::MissingReference(name) => {
                write!(f, "missing reference: {name}")
            }
            GeneratorError::EmptyAnyOf => write!(f, "anyOf has no variants"),
            GeneratorError::Backend(err) => write!(f, "backend error: {err}"),
        }
    }
}

impl std::error::Error for GeneratorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GeneratorError::Backend(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for GeneratorError {
    fn from(err: anyhow::Error) -> Self {
        GeneratorError::Backend(err)
    }
}

pub type Result<T> = std::result::Result<T, GeneratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_name_the_kind() {
        assert!(GeneratorError::TokenBudgetExceeded.to_string().contains("budget"));
        assert!(GeneratorError::EmptyAnyOf.to_string().contains("anyOf"));
        assert!(GeneratorError::MissingReference("Foo".into())
            .to_string()
            .contains("Foo"));
    }

    #[test]
    fn backend_errors_convert_via_from() {
        let err: GeneratorError = anyhow::anyhow!("sampler exploded").into();
        assert!(matches!(err, GeneratorError::Backend(_)));
    }
}
