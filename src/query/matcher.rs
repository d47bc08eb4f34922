//! Tag matching engine
//!
//! Builds one case-insensitive regular expression from a comma-separated
//! filter. Tokens at or above the configured length are wrapped as
//! wildcard substrings; shorter tokens match literally, which keeps 1-3
//! character tokens from firing inside unrelated words. Substring
//! matches crossing word boundaries are accepted behavior, not a bug.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Inline flags applied to every built pattern: multiline, unicode,
/// case-insensitive, dot matches newline.
const PATTERN_FLAGS: &str = "(?muis)";

/// Tuning for the matching engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Minimum token length (in characters) for wildcard wrapping.
    pub wildcard_min_len: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self { wildcard_min_len: 4 }
    }
}

/// Build the combined pattern for a comma-separated filter.
///
/// Returns `None` when no token survives trimming; blank filters mean
/// "match nothing", never "match everything".
pub fn build_pattern(filter: &str, config: &MatchConfig) -> Option<String> {
    let tokens: Vec<String> = filter
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| token_pattern(t, config))
        .collect();

    if tokens.is_empty() {
        return None;
    }
    Some(format!("{}{}", PATTERN_FLAGS, tokens.join("|")))
}

/// Compile a built pattern with the match operator's full-string
/// semantics: the pattern must cover the entire text. Literal tokens
/// therefore match only the whole value, while wildcarded tokens reach
/// anywhere through their explicit `.*` bounds.
pub fn compile_full_match(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"\A(?:{})\z", pattern))
}

fn token_pattern(token: &str, config: &MatchConfig) -> String {
    let lowered = token.to_lowercase();
    let escaped = regex::escape(&lowered);
    if token.chars().count() >= config.wildcard_min_len {
        format!(".*{}.*", escaped)
    } else {
        escaped
    }
}
