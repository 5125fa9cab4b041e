use async_trait::async_trait;
use tracing::debug;

use crate::errors::Result;

/// Token-counting capability injected into the engine.
///
/// The engine never tokenizes text itself; callers supply any conforming
/// counter (a local tokenizer, a cloud endpoint, a test double). Counting
/// is the engine's only suspension point, so implementations are free to
/// perform I/O.
#[async_trait]
pub trait TokenCounter: Send + Sync {
    /// Counts the tokens in `text`.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying tokenizer fails; the engine
    /// treats that as fatal for the in-progress call.
    async fn count_tokens(&self, text: &str) -> Result<usize>;
}

/// Heuristic counter for callers without a real tokenizer.
///
/// Estimates one token per four characters, which tracks typical
/// subword tokenizers closely enough for budget enforcement.
#[derive(Debug, Clone, Default)]
pub struct EstimatingTokenCounter;

impl EstimatingTokenCounter {
    const CHARS_PER_TOKEN: usize = 4;

    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TokenCounter for EstimatingTokenCounter {
    async fn count_tokens(&self, text: &str) -> Result<usize> {
        let chars = text.chars().count();
        let estimate = chars.div_ceil(Self::CHARS_PER_TOKEN);
        debug!(chars, estimate, "Estimated token count");
        Ok(estimate)
    }
}
