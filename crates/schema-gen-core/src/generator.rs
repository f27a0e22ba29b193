//! The Constrained Generator: the state machine that recursively walks a
//! [`Schema`] and drives sampling through a [`TokenBackend`], one node at a
//! time, committing only tokens a precomputed vocabulary mask allows.

use std::collections::HashSet;

use crate::backend::{TokenBackend, TokenId};
use crate::error::{GeneratorError, Result};
use crate::mask::VocabMasks;
use crate::schema::{Node, Schema};

/// Owns a backend exclusively for one `generate()` call, plus the
/// precomputed masks and the running string of emitted characters.
pub struct Generator<'s, B: TokenBackend> {
    backend: B,
    masks: VocabMasks,
    schema: &'s Schema,
    output: String,
}

impl<'s, B: TokenBackend> Generator<'s, B> {
    /// Build the vocabulary masks and bind to `schema`. Fails if no
    /// vocabulary token's text is exactly `"`.
    pub fn new(backend: B, schema: &'s Schema) -> Result<Self> {
        let masks = VocabMasks::build(&backend)?;
        Ok(Self {
            backend,
            masks,
            schema,
            output: String::new(),
        })
    }

    /// The characters committed so far. Mainly for inspection mid-generation
    /// in tests; a completed `generate()` call returns the same text.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Hand the backend back to the caller once generation is done.
    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Walk the schema root and return the concatenation of every character
    /// committed to the backend during traversal.
    pub fn generate(&mut self) -> Result<String> {
        let starting_budget = self.backend.remaining_tokens();
        tracing::debug!(event = "generation_start", starting_budget, "generation starting");

        let result = self.check_budget().and_then(|()| {
            let root = self.schema.root.clone();
            self.generate_node(&root)?;
            Ok(self.output.clone())
        });

        let consumed = starting_budget.saturating_sub(self.backend.remaining_tokens());
        match &result {
            Ok(output) => tracing::debug!(
                event = "generation_complete",
                consumed,
                output_len = output.len(),
                "generation complete"
            ),
            Err(error) => tracing::debug!(
                event = "generation_failed",
                consumed,
                error = %error,
                "generation failed"
            ),
        }
        result
    }

    fn check_budget(&self) -> Result<()> {
        if self.backend.remaining_tokens() == 0 {
            Err(GeneratorError::TokenBudgetExceeded)
        } else {
            Ok(())
        }
    }

    /// Commit a single already-chosen token and append its text to `output`.
    fn emit_token(&mut self, id: TokenId) -> Result<()> {
        self.check_budget()?;
        self.backend.decode(id)?;
        if let Some(text) = self.backend.token_text(id) {
            self.output.push_str(text);
        }
        Ok(())
    }

    /// Sample a token from `allowed` and commit it, without touching
    /// `output` -- callers decide where the resulting text goes (plain
    /// append, or into a buffer that still needs trimming).
    fn sample_and_commit(&mut self, allowed: &HashSet<TokenId>) -> Result<TokenId> {
        self.check_budget()?;
        let token = self.backend.sample(allowed)?;
        self.backend.decode(token)?;
        Ok(token)
    }

    /// Emit a fixed structural literal: tokenize it, then commit each
    /// resulting token in turn. Deterministic; never samples.
    fn emit_literal(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let tokens = self.backend.tokenize(text)?;
        if tokens.is_empty() {
            return Err(GeneratorError::TokenizationFailed(format!(
                "literal {text:?} tokenized to nothing"
            )));
        }
        for token in tokens {
            self.emit_token(token)?;
        }
        Ok(())
    }

    fn generate_node(&mut self, node: &Node) -> Result<()> {
        match node {
            Node::Object {
                properties,
                required,
            } => self.generate_object(properties, required),
            Node::Array {
                items,
                min_items,
                max_items,
            } => self.generate_array(items, *min_items, *max_items),
            Node::String { enum_choices } => self.generate_string(enum_choices.as_deref()),
            Node::Number {
                integer_only,
                minimum,
                maximum,
            } => self.generate_number(*integer_only, *minimum, *maximum),
            Node::Boolean => self.generate_boolean(),
            Node::Ref(name) => {
                let resolved = self
                    .schema
                    .resolve(name)
                    .ok_or_else(|| GeneratorError::MissingReference(name.clone()))?;
                self.generate_node(resolved)
            }
            Node::AnyOf(variants) => self.generate_any_of(variants),
        }
    }

    // -- Object generation -----------------------------------------------

    fn generate_object(
        &mut self,
        properties: &std::collections::BTreeMap<String, Node>,
        required: &std::collections::BTreeSet<String>,
    ) -> Result<()> {
        let threshold = (self.backend.total_token_budget() / 10).max(8);

        // BTreeMap already iterates in lexicographic key order.
        let mut included: Vec<(&String, &Node)> = Vec::new();
        for (name, node) in properties.iter() {
            let include = if required.contains(name) {
                true
            } else {
                let remaining = self.backend.remaining_tokens();
                remaining > threshold && omission_keep(name, remaining)
            };
            if include {
                included.push((name, node));
            }
        }

        self.emit_literal("{")?;
        for (i, (name, node)) in included.into_iter().enumerate() {
            if i > 0 {
                self.emit_literal(",")?;
            }
            self.emit_literal(&format!("\"{name}\":"))?;
            self.generate_node(node)?;
        }
        self.emit_literal("}")?;
        Ok(())
    }

    // -- Array generation --------------------------------------------

    fn generate_array(
        &mut self,
        items: &Node,
        min_items: Option<usize>,
        max_items: Option<usize>,
    ) -> Result<()> {
        let count = resolve_item_count(min_items, max_items);

        self.emit_literal("[")?;
        for i in 0..count {
            if i > 0 {
                self.emit_literal(",")?;
            }
            self.generate_node(items)?;
        }
        self.emit_literal("]")?;
        Ok(())
    }

    // -- String generation -------------------------------------------

    fn generate_string(&mut self, enum_choices: Option<&[String]>) -> Result<()> {
        self.emit_token(self.masks.quote_token)?;

        let content = match enum_choices.filter(|c| !c.is_empty()) {
            Some(choices) => self.prefix_choice_select(choices)?,
            None => self.free_string_sample()?,
        };
        self.output.push_str(content.trim());

        self.emit_token(self.masks.quote_token)?;
        Ok(())
    }

    fn free_string_sample(&mut self) -> Result<String> {
        let total_budget = self.backend.total_token_budget();
        let cap = self.backend.remaining_tokens().min((total_budget / 4).max(32));

        let mut content = String::new();
        let mut produced = 0usize;
        while self.backend.remaining_tokens() > 0 && produced < cap {
            let allowed = if content.is_empty() {
                &self.masks.string_initial_allowed
            } else {
                &self.masks.string_continuation_allowed
            };
            self.check_budget()?;
            let token = self.backend.sample(allowed)?;
            if self.masks.string_terminators.contains(&token) {
                break;
            }
            let mut text = self.backend.token_text(token).unwrap_or("").to_string();
            if content.ends_with(char::is_whitespace) && text.starts_with(char::is_whitespace) {
                text = text.trim_start().to_string();
            }
            content.push_str(&text);
            self.backend.decode(token)?;
            produced += 1;
        }
        Ok(content)
    }

    // -- Prefix-constrained choice selection ---------------------------

    fn prefix_choice_select(&mut self, candidates: &[String]) -> Result<String> {
        let mut prefixes: Vec<Vec<TokenId>> = candidates
            .iter()
            .filter_map(|c| match self.backend.tokenize(c) {
                Ok(tokens) if !tokens.is_empty() => Some(tokens),
                _ => None,
            })
            .collect();
        if prefixes.is_empty() {
            return Err(GeneratorError::TokenizationFailed(
                "every choice candidate tokenized to nothing".to_string(),
            ));
        }

        let mut position = 0usize;
        let mut emitted = String::new();

        while self.backend.remaining_tokens() > 0 {
            if prefixes.iter().any(|p| p.len() == position) {
                break;
            }
            let allowed: HashSet<TokenId> = prefixes
                .iter()
                .filter(|p| position < p.len())
                .map(|p| p[position])
                .collect();
            if allowed.is_empty() {
                break;
            }
            let token = self.sample_and_commit(&allowed)?;
            if let Some(text) = self.backend.token_text(token) {
                emitted.push_str(text);
            }
            prefixes.retain(|p| p.get(position) == Some(&token));
            position += 1;
            if prefixes.is_empty() {
                break;
            }
        }
        Ok(emitted)
    }

    // -- Number generation -------------------------------------------

    fn generate_number(
        &mut self,
        integer_only: bool,
        minimum: Option<f64>,
        maximum: Option<f64>,
    ) -> Result<()> {
        let allowed = if integer_only {
            self.masks.integer_terminators.clone()
        } else {
            self.masks.double_terminators.clone()
        };

        let mut accumulated = String::new();
        for _ in 0..16 {
            if self.backend.remaining_tokens() == 0 {
                break;
            }
            let token = self.backend.sample(&allowed)?;
            if self.masks.basic_terminators.contains(&token) {
                break;
            }
            if let Some(text) = self.backend.token_text(token) {
                accumulated.push_str(text);
            }
            self.backend.decode(token)?;
        }

        let rendered = if integer_only {
            render_clamped_integer(&accumulated, minimum, maximum)
        } else {
            render_clamped_real(&accumulated, minimum, maximum)
        };
        self.output.push_str(&rendered);
        Ok(())
    }

    // -- Boolean generation ------------------------------------------

    fn generate_boolean(&mut self) -> Result<()> {
        let candidates = ["true".to_string(), "false".to_string()];
        let content = self.prefix_choice_select(&candidates)?;
        self.output.push_str(&content);
        Ok(())
    }

    // -- Reference and any-of resolution -------------------------------

    fn generate_any_of(&mut self, variants: &[Node]) -> Result<()> {
        match variants.len() {
            0 => Err(GeneratorError::EmptyAnyOf),
            1 => self.generate_node(&variants[0]),
            n => {
                let index = self.backend.remaining_tokens() % n;
                self.generate_node(&variants[index])
            }
        }
    }
}

/// A 31-multiply hash accumulator over the key name, XORed against the
/// remaining budget to decide whether to keep an optional key. Deliberately
/// deterministic, not random, so a given schema and budget always produce
/// the same document.
fn omission_keep(name: &str, remaining: usize) -> bool {
    let mut h: u64 = 0;
    for b in name.as_bytes() {
        h = h.wrapping_mul(31).wrapping_add(*b as u64);
    }
    (h ^ remaining as u64) % 2 == 0
}

fn resolve_item_count(min_items: Option<usize>, max_items: Option<usize>) -> usize {
    match (min_items, max_items) {
        (Some(min), Some(max)) if min <= max => {
            if min == max {
                min
            } else {
                min + fastrand::usize(0..=(max - min))
            }
        }
        (Some(min), Some(max)) => min.min(max),
        (Some(min), None) => min,
        (None, Some(max)) => max,
        (None, None) => 4,
    }
}

fn render_clamped_integer(text: &str, minimum: Option<f64>, maximum: Option<f64>) -> String {
    let parsed = if text.is_empty() {
        0i64
    } else {
        text.parse::<i64>().unwrap_or(0)
    };
    let mut value = parsed;
    if let Some(min) = minimum {
        value = value.max(min.ceil() as i64);
    }
    if let Some(max) = maximum {
        value = value.min(max.floor() as i64);
    }
    value.to_string()
}

fn render_clamped_real(text: &str, minimum: Option<f64>, maximum: Option<f64>) -> String {
    let parsed = if text.is_empty() {
        0.0f64
    } else {
        text.parse::<f64>().unwrap_or(0.0)
    };
    let mut value = parsed;
    if let Some(min) = minimum {
        value = value.max(min);
    }
    if let Some(max) = maximum {
        value = value.min(max);
    }
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format_six_significant_digits(value)
    }
}

/// A compact six-significant-digit decimal representation (no scientific
/// notation, no trailing zeros).
fn format_six_significant_digits(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let magnitude = value.abs().log10().floor() as i32;
    let decimals = (5 - magnitude).clamp(0, 12) as usize;
    let mut rendered = format!("{value:.decimals$}");
    if rendered.contains('.') {
        while rendered.ends_with('0') {
            rendered.pop();
        }
        if rendered.ends_with('.') {
            rendered.pop();
        }
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBackend;

    fn gen<'s>(schema: &'s Schema, backend: MockBackend) -> Generator<'s, MockBackend> {
        Generator::new(backend, schema).unwrap()
    }

    #[test]
    fn bare_boolean_picks_smallest_id_literal() {
        let schema = Schema::new(Node::Boolean);
        let mut g = gen(&schema, MockBackend::new());
        assert_eq!(g.generate().unwrap(), "false");
    }

    #[test]
    fn enum_string_picks_lexicographically_first_candidate() {
        let schema = Schema::new(Node::string_enum(["apple".to_string(), "banana".to_string()]));
        let mut g = gen(&schema, MockBackend::new());
        assert_eq!(g.generate().unwrap(), "\"apple\"");
    }

    #[test]
    fn required_integer_clamps_sampled_value_to_minimum() {
        let schema = Schema::new(Node::object(
            [("n".to_string(), Node::integer(Some(5.0), Some(9.0)))],
            ["n".to_string()],
        ));
        let mut g = gen(&schema, MockBackend::new());
        assert_eq!(g.generate().unwrap(), "{\"n\":5}");
    }

    #[test]
    fn array_with_equal_min_and_max_emits_fixed_count() {
        let schema = Schema::new(Node::array(Node::Boolean, Some(2), Some(2)));
        let mut g = gen(&schema, MockBackend::new());
        assert_eq!(g.generate().unwrap(), "[false,false]");
    }

    #[test]
    fn any_of_selection_is_deterministic_on_remaining_tokens() {
        let schema = Schema::new(Node::AnyOf(vec![
            Node::string_enum(["x".to_string()]),
            Node::string_enum(["y".to_string()]),
        ]));
        let mut g = gen(&schema, MockBackend::new());
        assert_eq!(g.generate().unwrap(), "\"x\"");
    }

    #[test]
    fn unresolved_ref_errors_with_missing_reference() {
        let schema = Schema::new(Node::Ref("Missing".to_string()));
        let mut g = gen(&schema, MockBackend::new());
        match g.generate() {
            Err(GeneratorError::MissingReference(name)) => assert_eq!(name, "Missing"),
            other => panic!("expected missing_reference, got {other:?}"),
        }
    }

    #[test]
    fn empty_any_of_errors() {
        let schema = Schema::new(Node::AnyOf(vec![]));
        let mut g = gen(&schema, MockBackend::new());
        assert!(matches!(g.generate(), Err(GeneratorError::EmptyAnyOf)));
    }

    #[test]
    fn single_variant_any_of_recurses_without_consuming_choice() {
        let schema = Schema::new(Node::AnyOf(vec![Node::Boolean]));
        let mut g = gen(&schema, MockBackend::new());
        assert_eq!(g.generate().unwrap(), "false");
    }

    #[test]
    fn budget_exhaustion_surfaces_as_error() {
        let schema = Schema::new(Node::Boolean);
        let mut g = gen(&schema, MockBackend::with_budget(0));
        assert!(matches!(g.generate(), Err(GeneratorError::TokenBudgetExceeded)));
    }

    #[test]
    fn object_without_optional_keys_included_only_when_budget_allows() {
        // total_budget = 256 -> threshold = max(8, 25) = 25. With ample
        // budget remaining, optional keys are eligible (subject to the hash
        // predicate); required keys are always present regardless.
        let schema = Schema::new(Node::object(
            [
                ("required_key".to_string(), Node::Boolean),
                ("optional_key".to_string(), Node::Boolean),
            ],
            ["required_key".to_string()],
        ));
        let mut g = gen(&schema, MockBackend::new());
        let out = g.generate().unwrap();
        assert!(out.contains("\"required_key\":"));
    }

    #[test]
    fn property_ordering_is_lexicographic() {
        let schema = Schema::new(Node::object(
            [
                ("zeta".to_string(), Node::Boolean),
                ("alpha".to_string(), Node::Boolean),
            ],
            ["zeta".to_string(), "alpha".to_string()],
        ));
        let mut g = gen(&schema, MockBackend::new());
        let out = g.generate().unwrap();
        assert!(out.find("alpha").unwrap() < out.find("zeta").unwrap());
    }

    #[test]
    fn number_output_never_contains_a_dot_when_integer_only() {
        let schema = Schema::new(Node::integer(None, None));
        let mut g = gen(&schema, MockBackend::new());
        let out = g.generate().unwrap();
        assert!(!out.contains('.'));
    }

    #[test]
    fn free_string_output_is_quoted_and_string_safe() {
        let schema = Schema::new(Node::string());
        let mut g = gen(&schema, MockBackend::new());
        let out = g.generate().unwrap();
        assert!(out.starts_with('"') && out.ends_with('"'));
        assert!(!out[1..out.len() - 1].contains('"'));
    }

    #[test]
    fn every_sampled_token_belongs_to_the_offered_allowed_set() {
        // The mock's `sample` always returns the min of what it was given;
        // if the generator ever widened the set ad hoc, `decoded` would
        // contain ids outside the masks it precomputed. Spot check against
        // basic_terminators / digit tokens for a plain integer.
        let schema = Schema::new(Node::integer(None, None));
        let backend = MockBackend::new();
        let mut g = gen(&schema, backend);
        g.generate().unwrap();
        let backend = g.into_backend();
        for id in &backend.decoded {
            assert!(backend.token_text(*id).is_some() || backend.end_tokens().contains(id));
        }
    }
}
