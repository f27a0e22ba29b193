//! Structured logging for the demo host, following the wide-event /
//! canonical-log-line pattern: one record per category, one line per
//! completed generation.

use std::time::Instant;

/// Host lifecycle events.
pub mod lifecycle {
    pub fn host_startup(binary: &str, version: &str) {
        tracing::info!(
            event = "host_startup",
            binary = %binary,
            version = %version,
            "Host starting"
        );
    }

    pub fn config_loaded(config_path: &str) {
        tracing::info!(
            event = "config_loaded",
            config_path = %config_path,
            "Configuration loaded"
        );
    }

    pub fn tokenizer_loaded(path: &str, vocab_size: usize) {
        tracing::info!(
            event = "tokenizer_loaded",
            path = %path,
            vocab_size = vocab_size,
            "Tokenizer loaded"
        );
    }

    pub fn schema_loaded(path: &str) {
        tracing::info!(event = "schema_loaded", path = %path, "Schema loaded");
    }
}

/// Accumulates context across one `generate()` call and emits a single
/// canonical line when it finishes.
#[derive(Debug)]
pub struct GenerationContext {
    pub request_id: String,
    start_time: Instant,
    pub budget: usize,
}

impl GenerationContext {
    pub fn new(budget: usize) -> Self {
        Self {
            request_id: uuid::Uuid::now_v7().to_string(),
            start_time: Instant::now(),
            budget,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    /// Emit the canonical log line for a completed generation, successful or not.
    pub fn emit_canonical_log(&self, output_len: usize, error: Option<&str>) {
        let duration_ms = self.duration_ms();
        match error {
            None => tracing::info!(
                event = "generation_complete",
                canonical = true,
                request_id = %self.request_id,
                budget = self.budget,
                output_len = output_len,
                duration_ms = duration_ms,
                "Generation completed"
            ),
            Some(error) => tracing::warn!(
                event = "generation_failed",
                canonical = true,
                request_id = %self.request_id,
                budget = self.budget,
                duration_ms = duration_ms,
                error = %error,
                "Generation failed"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_is_nonzero_after_elapsing() {
        let ctx = GenerationContext::new(64);
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(ctx.duration_ms() > 0);
    }
}
