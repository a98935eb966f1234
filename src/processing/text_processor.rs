//! Text normalization and word-count chunking

use crate::error::{Result, ZoneGapError};
use regex::Regex;
use std::str::SplitWhitespace;

/// Default chunk size in words
pub const DEFAULT_MAX_TOKENS: usize = 200;

/// Canonicalizes raw zone text before it is embedded.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    whitespace_regex: Regex,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextNormalizer {
    pub fn new() -> Self {
        let whitespace_regex = Regex::new(r"\s+").expect("Invalid whitespace regex");
        Self { whitespace_regex }
    }

    /// Lowercase, collapse whitespace runs to one space, trim.
    pub fn normalize(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        self.whitespace_regex
            .replace_all(&lowered, " ")
            .trim()
            .to_string()
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Positional word-count chunker.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    max_tokens: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl Chunker {
    pub fn new(max_tokens: usize) -> Result<Self> {
        if max_tokens == 0 {
            return Err(ZoneGapError::InvalidInput(
                "max_tokens must be greater than zero".to_string(),
            ));
        }
        Ok(Self { max_tokens })
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Lazily split `text` into groups of at most `max_tokens` words.
    /// The iterator is `Clone`, so a sequence can be restarted from any point.
    pub fn chunks<'a>(&self, text: &'a str) -> Chunks<'a> {
        Chunks {
            words: text.split_whitespace(),
            max_tokens: self.max_tokens,
        }
    }

    /// ceil(word_count / max_tokens)
    pub fn chunk_count(&self, text: &str) -> usize {
        word_count(text).div_ceil(self.max_tokens)
    }

    pub fn needs_chunking(&self, text: &str) -> bool {
        word_count(text) > self.max_tokens
    }
}

#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    words: SplitWhitespace<'a>,
    max_tokens: usize,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let group: Vec<&str> = self.words.by_ref().take(self.max_tokens).collect();
        if group.is_empty() {
            None
        } else {
            Some(group.join(" "))
        }
    }
}
