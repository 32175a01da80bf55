//! Token counting and context-window utilities.
//!
//! Precise tokenizers are an optional capability: a vendor either has a
//! [`TokenCounter`] injected or falls back to the word-count heuristic
//! `round(words * 1.3)`. The ratio is fixed so estimates stay comparable
//! across runs and machines.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use parley_core::Vendor;

/// Tokens per whitespace-delimited word used by the heuristic.
pub const WORD_TOKEN_RATIO: f64 = 1.3;

/// Space held back for the reply framing when budgeting a prompt.
const PROMPT_SAFETY_MARGIN: usize = 100;

static SENTENCE_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").expect("valid regex"));

/// A tokenizer that can count tokens for some family of models.
pub trait TokenCounter: Send + Sync {
    /// Short name for diagnostics (e.g. `"cl100k_base"`).
    fn name(&self) -> &str;

    /// Count tokens in `text`. `model` lets a counter pick a model-specific encoding.
    fn count(&self, text: &str, model: Option<&str>) -> usize;
}

/// Number of whitespace-delimited words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// `round(words * 1.3)`, with halves rounded to even.
pub fn heuristic_tokens(text: &str) -> usize {
    (word_count(text) as f64 * WORD_TOKEN_RATIO).round_ties_even() as usize
}

/// The word-count heuristic as a [`TokenCounter`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicCounter;

impl TokenCounter for HeuristicCounter {
    fn name(&self) -> &str {
        "word-heuristic"
    }

    fn count(&self, text: &str, _model: Option<&str>) -> usize {
        heuristic_tokens(text)
    }
}

/// BPE counter backed by `tiktoken-rs`.
#[cfg(feature = "tiktoken")]
pub struct TiktokenCounter {
    cl100k: tiktoken_rs::CoreBPE,
    o200k: tiktoken_rs::CoreBPE,
}

#[cfg(feature = "tiktoken")]
impl TiktokenCounter {
    pub fn new() -> parley_core::Result<Self> {
        let cl100k = tiktoken_rs::cl100k_base()
            .map_err(|e| parley_core::Error::Config(format!("cl100k tokenizer: {e}")))?;
        let o200k = tiktoken_rs::o200k_base()
            .map_err(|e| parley_core::Error::Config(format!("o200k tokenizer: {e}")))?;
        Ok(Self { cl100k, o200k })
    }
}

#[cfg(feature = "tiktoken")]
impl TokenCounter for TiktokenCounter {
    fn name(&self) -> &str {
        "tiktoken"
    }

    fn count(&self, text: &str, model: Option<&str>) -> usize {
        // GPT-4o and newer use o200k; everything else is close enough to cl100k
        let bpe = match model {
            Some(m) if m.contains("gpt-4o") || m.starts_with("o1") => &self.o200k,
            _ => &self.cl100k,
        };
        bpe.encode_with_special_tokens(text).len()
    }
}

/// Result of checking text against a context window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitReport {
    pub estimated_tokens: usize,
    pub context_window: usize,
    pub fits: bool,
    pub utilization_percent: f64,
    pub remaining_tokens: usize,
}

/// Basic statistics about a piece of text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextStats {
    pub characters: usize,
    pub words: usize,
    pub sentences: usize,
    pub estimated_tokens: usize,
    pub avg_word_length: f64,
    pub avg_sentence_length: f64,
}

/// Outcome of fitting a prompt into a window while reserving reply space.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptBudget {
    pub optimized_prompt: String,
    pub original_tokens: usize,
    pub optimized_tokens: usize,
    pub truncated: bool,
    pub available_tokens: usize,
    pub response_space: usize,
    /// Characters kept over characters in the original, set only when truncated
    pub truncation_ratio: Option<f64>,
}

/// Vendor-aware token estimator.
#[derive(Clone, Default)]
pub struct TokenEstimator {
    counters: HashMap<Vendor, Arc<dyn TokenCounter>>,
}

impl TokenEstimator {
    /// An estimator that uses the heuristic for every vendor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a precise counter for one vendor.
    pub fn with_counter(mut self, vendor: Vendor, counter: Arc<dyn TokenCounter>) -> Self {
        self.counters.insert(vendor, counter);
        self
    }

    /// Estimator with BPE counters for OpenAI and Anthropic.
    #[cfg(feature = "tiktoken")]
    pub fn with_tiktoken() -> parley_core::Result<Self> {
        let counter: Arc<dyn TokenCounter> = Arc::new(TiktokenCounter::new()?);
        Ok(Self::new()
            .with_counter(Vendor::OpenAI, counter.clone())
            .with_counter(Vendor::Anthropic, counter))
    }

    /// The estimator used when nothing is configured explicitly.
    pub fn platform_default() -> Self {
        #[cfg(feature = "tiktoken")]
        {
            match Self::with_tiktoken() {
                Ok(estimator) => return estimator,
                Err(e) => tracing::warn!("Tokenizer unavailable, using word heuristic: {}", e),
            }
        }
        Self::new()
    }

    /// The injected counter for a vendor, if any.
    pub fn counter_for(&self, vendor: Vendor) -> Option<Arc<dyn TokenCounter>> {
        self.counters.get(&vendor).cloned()
    }

    /// Estimate tokens in `text` for a vendor and optional model.
    pub fn estimate(&self, text: &str, vendor: Vendor, model: Option<&str>) -> usize {
        match self.counters.get(&vendor) {
            Some(counter) => counter.count(text, model),
            None => {
                debug!(vendor = %vendor, "No tokenizer available, using word heuristic");
                heuristic_tokens(text)
            }
        }
    }

    /// Check whether `text` fits in `context_window`.
    pub fn check_fit(
        &self,
        text: &str,
        context_window: usize,
        vendor: Vendor,
        model: Option<&str>,
    ) -> FitReport {
        let estimated_tokens = self.estimate(text, vendor, model);
        let utilization_percent = if context_window > 0 {
            estimated_tokens as f64 / context_window as f64 * 100.0
        } else {
            0.0
        };

        FitReport {
            estimated_tokens,
            context_window,
            fits: estimated_tokens <= context_window,
            utilization_percent,
            remaining_tokens: context_window.saturating_sub(estimated_tokens),
        }
    }

    /// Longest whitespace-word prefix of `text` whose estimate is within `max_tokens`.
    ///
    /// Returns `text` untouched when it already fits. Otherwise the kept words
    /// are re-joined with single spaces; words are never split.
    pub fn truncate_to_tokens(
        &self,
        text: &str,
        max_tokens: usize,
        vendor: Vendor,
        model: Option<&str>,
    ) -> String {
        if self.estimate(text, vendor, model) <= max_tokens {
            return text.to_string();
        }

        let words: Vec<&str> = text.split_whitespace().collect();
        let (mut lo, mut hi) = (0usize, words.len());

        while lo < hi {
            let mid = (lo + hi + 1) / 2;
            let candidate = words[..mid].join(" ");
            if self.estimate(&candidate, vendor, model) <= max_tokens {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }

        words[..lo].join(" ")
    }

    /// Truncate a prompt so that it plus `max_response_tokens` fits the window.
    pub fn optimize_prompt(
        &self,
        prompt: &str,
        max_prompt_tokens: usize,
        max_response_tokens: usize,
        context_window: usize,
        vendor: Vendor,
        model: Option<&str>,
    ) -> PromptBudget {
        let available_tokens = max_prompt_tokens.min(
            context_window
                .saturating_sub(max_response_tokens)
                .saturating_sub(PROMPT_SAFETY_MARGIN),
        );
        let original_tokens = self.estimate(prompt, vendor, model);

        if original_tokens <= available_tokens {
            return PromptBudget {
                optimized_prompt: prompt.to_string(),
                original_tokens,
                optimized_tokens: original_tokens,
                truncated: false,
                available_tokens,
                response_space: context_window.saturating_sub(original_tokens),
                truncation_ratio: None,
            };
        }

        let optimized_prompt = self.truncate_to_tokens(prompt, available_tokens, vendor, model);
        let optimized_tokens = self.estimate(&optimized_prompt, vendor, model);
        let ratio = optimized_prompt.chars().count() as f64 / prompt.chars().count().max(1) as f64;

        PromptBudget {
            optimized_prompt,
            original_tokens,
            optimized_tokens,
            truncated: true,
            available_tokens,
            response_space: context_window.saturating_sub(optimized_tokens),
            truncation_ratio: Some(ratio),
        }
    }

    /// Character, word and sentence statistics.
    pub fn analyze(text: &str) -> TextStats {
        let words: Vec<&str> = text.split_whitespace().collect();
        let sentences = SENTENCE_SPLIT
            .split(text)
            .filter(|s| !s.trim().is_empty())
            .count();
        let letters: usize = words.iter().map(|w| w.chars().count()).sum();

        TextStats {
            characters: text.chars().count(),
            words: words.len(),
            sentences,
            estimated_tokens: heuristic_tokens(text),
            avg_word_length: letters as f64 / words.len().max(1) as f64,
            avg_sentence_length: words.len() as f64 / sentences.max(1) as f64,
        }
    }
}

impl std::fmt::Debug for TokenEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<(&str, &str)> = self
            .counters
            .iter()
            .map(|(v, c)| (v.id(), c.name()))
            .collect();
        names.sort();
        f.debug_struct("TokenEstimator").field("counters", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counts characters; lets tests tell injected counters from the heuristic.
    struct CharCounter;

    impl TokenCounter for CharCounter {
        fn name(&self) -> &str {
            "chars"
        }

        fn count(&self, text: &str, _model: Option<&str>) -> usize {
            text.chars().count()
        }
    }

    #[test]
    fn test_heuristic_matches_formula() {
        assert_eq!(heuristic_tokens(""), 0);
        assert_eq!(heuristic_tokens("one"), 1);
        assert_eq!(heuristic_tokens("one two three"), 4);
        assert_eq!(heuristic_tokens("a b c d e f g h i j"), 13);
        assert_eq!(heuristic_tokens("  spaced\n\tout   words "), 4);
    }

    #[test]
    fn test_heuristic_rounds_halves_to_even() {
        let words = |n: usize| vec!["w"; n].join(" ");
        assert_eq!(heuristic_tokens(&words(5)), 6);
        assert_eq!(heuristic_tokens(&words(15)), 20);
        assert_eq!(heuristic_tokens(&words(25)), 32);
        assert_eq!(heuristic_tokens(&words(35)), 46);
    }

    #[test]
    fn test_check_fit_on_rounding_tie() {
        let estimator = TokenEstimator::new();
        let fit = estimator.check_fit("one two three four five", 6, Vendor::OpenAI, None);
        assert_eq!(fit.estimated_tokens, 6);
        assert!(fit.fits);
    }

    #[test]
    fn test_estimate_uses_injected_counter() {
        let estimator = TokenEstimator::new().with_counter(Vendor::OpenAI, Arc::new(CharCounter));
        assert_eq!(estimator.estimate("hello world", Vendor::OpenAI, None), 11);
        assert_eq!(estimator.estimate("hello world", Vendor::Anthropic, None), 3);
    }

    #[test]
    fn test_check_fit() {
        let estimator = TokenEstimator::new();
        let text = "a b c d e f g h i j"; // 13 tokens

        let roomy = estimator.check_fit(text, 100, Vendor::OpenAI, None);
        assert!(roomy.fits);
        assert_eq!(roomy.remaining_tokens, 87);
        assert!((roomy.utilization_percent - 13.0).abs() < 1e-9);

        let tight = estimator.check_fit(text, 10, Vendor::OpenAI, None);
        assert!(!tight.fits);
        assert_eq!(tight.remaining_tokens, 0);

        let exact = estimator.check_fit(text, 13, Vendor::OpenAI, None);
        assert!(exact.fits);
        assert_eq!(exact.remaining_tokens, 0);

        let zero = estimator.check_fit(text, 0, Vendor::OpenAI, None);
        assert_eq!(zero.utilization_percent, 0.0);
    }

    #[test]
    fn test_truncate_returns_input_when_it_fits() {
        let estimator = TokenEstimator::new();
        let text = "keep   this\ttext";
        assert_eq!(estimator.truncate_to_tokens(text, 50, Vendor::OpenAI, None), text);
    }

    #[test]
    fn test_truncate_keeps_longest_fitting_prefix() {
        let estimator = TokenEstimator::new();
        let text = "a b c d e f g h i j";
        // 7 words -> 9 tokens, 8 words -> 10 tokens, 9 words -> 12 tokens
        let out = estimator.truncate_to_tokens(text, 10, Vendor::OpenAI, None);
        assert_eq!(out, "a b c d e f g h");
        assert!(estimator.estimate(&out, Vendor::OpenAI, None) <= 10);
    }

    #[test]
    fn test_truncate_never_exceeds_limit() {
        let estimator = TokenEstimator::new();
        let text = "the quick brown fox jumps over the lazy dog again and again";
        for limit in 0..heuristic_tokens(text) {
            let out = estimator.truncate_to_tokens(text, limit, Vendor::HuggingFace, None);
            assert!(estimator.estimate(&out, Vendor::HuggingFace, None) <= limit);
            assert!(text.starts_with(&out));
        }
    }

    #[test]
    fn test_truncate_with_injected_counter_splits_on_words() {
        let estimator =
            TokenEstimator::new().with_counter(Vendor::Anthropic, Arc::new(CharCounter));
        let out = estimator.truncate_to_tokens("alpha beta gamma", 12, Vendor::Anthropic, None);
        assert_eq!(out, "alpha beta");
    }

    #[test]
    fn test_optimize_prompt_untouched() {
        let estimator = TokenEstimator::new();
        let budget = estimator.optimize_prompt("short prompt", 1000, 500, 4096, Vendor::OpenAI, None);
        assert!(!budget.truncated);
        assert_eq!(budget.available_tokens, 1000);
        assert_eq!(budget.optimized_prompt, "short prompt");
        assert_eq!(budget.response_space, 4096 - 3);
        assert!(budget.truncation_ratio.is_none());
    }

    #[test]
    fn test_optimize_prompt_truncates() {
        let estimator = TokenEstimator::new();
        let prompt = "word ".repeat(100);
        // window 300 - 180 response - 100 margin = 20 tokens available
        let budget = estimator.optimize_prompt(&prompt, 1000, 180, 300, Vendor::OpenAI, None);
        assert!(budget.truncated);
        assert_eq!(budget.available_tokens, 20);
        assert!(budget.optimized_tokens <= 20);
        assert!(budget.truncation_ratio.unwrap() < 1.0);
    }

    #[test]
    fn test_analyze() {
        let stats = TokenEstimator::analyze("Hello there. How are you? Fine!");
        assert_eq!(stats.words, 6);
        assert_eq!(stats.sentences, 3);
        assert_eq!(stats.estimated_tokens, 8);
        assert!((stats.avg_sentence_length - 2.0).abs() < 1e-9);
    }
}
