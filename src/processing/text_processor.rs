//! Text normalization ahead of embedding

use regex::Regex;
use std::sync::LazyLock;

static DEFAULT_PROCESSOR: LazyLock<TextProcessor> = LazyLock::new(TextProcessor::new);

/// Canonical form used for every text that is embedded.
///
/// Lowercases, replaces anything that is not an ASCII letter or whitespace with
/// a space, then collapses whitespace and trims. Idempotent.
pub fn normalize(text: &str) -> String {
    DEFAULT_PROCESSOR.normalize(text)
}

pub struct TextProcessor {
    non_letter_regex: Regex,
    whitespace_regex: Regex,
}

impl Default for TextProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextProcessor {
    pub fn new() -> Self {
        let non_letter_regex = Regex::new(r"[^a-zA-Z\s]").expect("Invalid non-letter regex");
        let whitespace_regex = Regex::new(r"\s+").expect("Invalid whitespace regex");

        Self {
            non_letter_regex,
            whitespace_regex,
        }
    }

    pub fn normalize(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let lowered = text.to_lowercase();
        let letters_only = self.non_letter_regex.replace_all(&lowered, " ");
        self.whitespace_regex
            .replace_all(&letters_only, " ")
            .trim()
            .to_string()
    }
}
