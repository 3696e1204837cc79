/*!
 * Reversible protection of technical markup.
 *
 * Variable spans (`{[name]}`) and tag spans (`<b>`, `</color>`) are swapped for
 * indexed safe tokens such as `__VAR0__` or `__TAG1__` before text reaches a
 * provider, and swapped back afterwards.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

/// Variable substitution spans
static VAR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\[[^}]+\]\}").expect("Invalid variable placeholder regex")
});

/// Angle-bracket markup spans
static TAG_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<[^>]+>").expect("Invalid tag placeholder regex")
});

/// Safe tokens emitted by `TokenProtector::protect`
static TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"__(?:VAR|TAG)\d+__").expect("Invalid token regex")
});

/// Kind of markup a token stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCategory {
    /// `{[...]}` substitution
    Variable,
    /// `<...>` markup
    Tag,
}

impl TokenCategory {
    /// Prefix embedded in every token of this category
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Variable => "VAR",
            Self::Tag => "TAG",
        }
    }

    /// Token for the given zero-based sequence number
    pub fn token(&self, index: usize) -> String {
        format!("__{}{}__", self.prefix(), index)
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            Self::Variable => &VAR_PATTERN,
            Self::Tag => &TAG_PATTERN,
        }
    }
}

/// Mapping from safe token to the markup span it replaced.
///
/// Iteration is in sorted token-string order, which is also the order
/// `TokenProtector::restore` substitutes in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenMap {
    entries: BTreeMap<String, String>,
}

impl TokenMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a token and the span it replaces
    pub fn insert(&mut self, token: impl Into<String>, original: impl Into<String>) {
        self.entries.insert(token.into(), original.into());
    }

    /// Original span for a token
    pub fn get(&self, token: &str) -> Option<&str> {
        self.entries.get(token).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tokens in sorted order
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// `(token, original)` pairs in sorted token order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TokenMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = TokenMap::new();
        for (token, original) in iter {
            map.insert(token, original);
        }
        map
    }
}

/// Output of `TokenProtector::protect`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedText {
    /// Text with every markup span replaced by a token
    pub text: String,
    /// How to undo the replacement
    pub tokens: TokenMap,
}

/// Protects and restores markup spans
pub struct TokenProtector;

impl TokenProtector {
    /// Replace markup spans with safe tokens.
    ///
    /// Variables are tokenized first, then tags are recognized on the result,
    /// so a tag wrapping a variable is captured whole (already tokenized inside).
    /// Malformed markup simply does not match and stays as plain text.
    pub fn protect(text: &str) -> ProtectedText {
        let mut tokens = TokenMap::new();
        let protected = Self::replace_category(text, TokenCategory::Variable, &mut tokens);
        let protected = Self::replace_category(&protected, TokenCategory::Tag, &mut tokens);

        ProtectedText {
            text: protected,
            tokens,
        }
    }

    fn replace_category(input: &str, category: TokenCategory, tokens: &mut TokenMap) -> String {
        let mut output = String::with_capacity(input.len());
        let mut last = 0;

        for (index, found) in category.pattern().find_iter(input).enumerate() {
            output.push_str(&input[last..found.start()]);
            let token = category.token(index);
            output.push_str(&token);
            tokens.insert(token, found.as_str());
            last = found.end();
        }
        output.push_str(&input[last..]);
        output
    }

    /// Put the original spans back.
    ///
    /// Substitution runs over tokens in sorted token-string order. `TAG` sorts
    /// before `VAR`, so a tag that captured a variable token is expanded before
    /// that variable token is replaced.
    pub fn restore(text: &str, tokens: &TokenMap) -> String {
        let mut restored = text.to_string();
        for (token, original) in tokens.iter() {
            restored = restored.replace(token, original);
        }
        restored
    }

    /// All safe tokens in `text`, in order of appearance
    pub fn extract_tokens(text: &str) -> Vec<String> {
        TOKEN_PATTERN
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Whether every token occurs in `text` at strictly increasing positions.
    ///
    /// The search cursor only moves forward: each token is looked up starting
    /// one byte past where the previous one was found.
    pub fn tokens_in_order<S: AsRef<str>>(text: &str, tokens: &[S]) -> bool {
        let mut cursor = 0;
        for token in tokens {
            match text[cursor..].find(token.as_ref()) {
                Some(offset) => cursor += offset + 1,
                None => return false,
            }
        }
        true
    }
}
