use tiktoken_rs::{cl100k_base, CoreBPE};
use tracing::warn;

/// Multiplier applied to the whitespace word count when no tokenizer is
/// available. Matches the usual token-per-word ratio for source code.
const HEURISTIC_TOKENS_PER_WORD: f64 = 1.3;

/// Token counting with truncation support.
///
/// `Exact` uses the `cl100k_base` BPE and counts an encode without
/// beginning/end-of-sequence markers. `Heuristic` estimates
/// `ceil(words * 1.3)` from the whitespace word count; callers should treat
/// heuristic counts (and truncations) as approximations, not exact values.
pub enum TokenCounter {
    Exact(CoreBPE),
    Heuristic,
}

impl TokenCounter {
    /// Builds the exact counter, falling back to the heuristic when the
    /// tokenizer data cannot be loaded.
    pub fn new() -> Self {
        match cl100k_base() {
            Ok(bpe) => TokenCounter::Exact(bpe),
            Err(err) => {
                warn!(error = %err, "failed to load tokenizer, using word-count heuristic");
                TokenCounter::Heuristic
            }
        }
    }

    /// Counter that only ever uses the word-count heuristic.
    pub fn heuristic() -> Self {
        TokenCounter::Heuristic
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, TokenCounter::Exact(_))
    }

    /// Token count for `text`. Never fails; empty text counts 0.
    pub fn count(&self, text: &str) -> usize {
        match self {
            TokenCounter::Exact(bpe) => bpe.encode_ordinary(text).len(),
            TokenCounter::Heuristic => heuristic_count(text),
        }
    }

    /// Truncates `text` to at most `max_tokens`, returning the new text and
    /// its token count. Text already within the budget is returned
    /// unchanged, so truncation is idempotent.
    pub fn truncate(&self, text: &str, max_tokens: usize) -> (String, usize) {
        match self {
            TokenCounter::Exact(bpe) => {
                let tokens = bpe.encode_ordinary(text);
                if tokens.len() <= max_tokens {
                    return (text.to_string(), tokens.len());
                }
                let mut kept = tokens[..max_tokens].to_vec();
                // The cut can land inside a multi-byte sequence; back off
                // token by token until the prefix decodes cleanly.
                loop {
                    match bpe.decode(kept.clone()) {
                        Ok(decoded) => return (decoded, kept.len()),
                        Err(_) => {
                            kept.pop();
                            if kept.is_empty() {
                                return (String::new(), 0);
                            }
                        }
                    }
                }
            }
            TokenCounter::Heuristic => {
                let count = heuristic_count(text);
                if count <= max_tokens {
                    return (text.to_string(), count);
                }
                let keep_words = (max_tokens as f64 / HEURISTIC_TOKENS_PER_WORD).floor() as usize;
                let truncated = text
                    .split_whitespace()
                    .take(keep_words)
                    .collect::<Vec<_>>()
                    .join(" ");
                let count = heuristic_count(&truncated);
                (truncated, count)
            }
        }
    }
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new()
    }
}

fn heuristic_count(text: &str) -> usize {
    let words = text.split_whitespace().count();
    (words as f64 * HEURISTIC_TOKENS_PER_WORD).ceil() as usize
}
