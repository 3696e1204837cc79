/*!
 * Token survival checks for translated text.
 *
 * After a provider answers, every token present in the protected source must
 * still appear in the translation, and in the same relative order.
 */

use log::debug;

use crate::translation::placeholders::TokenProtector;

/// Result of checking one translation against its source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOutcome {
    /// Tokens in the protected source, in order of appearance
    pub source_tokens: Vec<String>,
    /// Tokens found in the translated text, in order of appearance
    pub target_tokens: Vec<String>,
    /// Source tokens absent from the translated text
    pub missing_tokens: Vec<String>,
    /// All tokens present but not in source order
    pub out_of_order: bool,
}

impl ValidationOutcome {
    /// Translation can be restored and written
    pub fn is_valid(&self) -> bool {
        self.missing_tokens.is_empty() && !self.out_of_order
    }
}

/// Validates token preservation
pub struct TokenValidator;

impl TokenValidator {
    /// Validate a translation (still in protected form) against its raw source text
    pub fn validate(source_text: &str, translated_text: &str) -> ValidationOutcome {
        let protected = TokenProtector::protect(source_text);
        let source_tokens = TokenProtector::extract_tokens(&protected.text);
        Self::validate_tokens(&source_tokens, translated_text)
    }

    /// Validate a translation against an already derived token sequence
    pub fn validate_tokens(source_tokens: &[String], translated_text: &str) -> ValidationOutcome {
        let target_tokens = TokenProtector::extract_tokens(translated_text);

        let missing_tokens: Vec<String> = source_tokens
            .iter()
            .filter(|token| !translated_text.contains(token.as_str()))
            .cloned()
            .collect();

        // Order only matters once everything is present
        let out_of_order = missing_tokens.is_empty()
            && !source_tokens.is_empty()
            && !TokenProtector::tokens_in_order(translated_text, source_tokens);

        debug!(
            "Token validation: source={}, target={}, missing={}, out_of_order={}",
            source_tokens.len(),
            target_tokens.len(),
            missing_tokens.len(),
            out_of_order
        );

        ValidationOutcome {
            source_tokens: source_tokens.to_vec(),
            target_tokens,
            missing_tokens,
            out_of_order,
        }
    }
}
