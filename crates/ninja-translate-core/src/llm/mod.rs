//! Translation gateway
//!
//! Wraps a single outbound chat-completion call that turns text in one
//! language into another. Failures carry a reason code meant for logs only.

mod http_utils;
/// xAI chat-completions backend
pub mod xai;

pub use xai::XaiTranslator;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while translating
#[derive(Debug, Error)]
pub enum TranslationError {
    /// The backend could not be reached (connect failure, timeout)
    #[error("Network error: {0}")]
    Network(String),
    /// The backend answered with a non-success status
    #[error("API error: {0}")]
    BadResponse(String),
    /// The response body was not the expected JSON shape
    #[error("Parse error: {0}")]
    ParseError(String),
    /// Anything else
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl TranslationError {
    /// Short reason code used in log lines.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::BadResponse(_) => "badResponse",
            Self::ParseError(_) => "parseError",
            Self::Unexpected(_) => "unexpected",
        }
    }
}

/// Interface for translation backends
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` between two bare language names (no flag glyphs).
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, TranslationError>;
}

/// System instruction sent ahead of the user's text.
#[must_use]
pub fn system_prompt(source_language: &str, target_language: &str) -> String {
    format!(
        "You are a professional translator. Translate the following text from {source_language} to {target_language}. \
         Return only the translated text without explanations or additional comments. \
         If you can't identify the language, respond with the original text."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_codes() {
        assert_eq!(TranslationError::Network(String::new()).reason(), "network");
        assert_eq!(
            TranslationError::BadResponse(String::new()).reason(),
            "badResponse"
        );
        assert_eq!(
            TranslationError::ParseError(String::new()).reason(),
            "parseError"
        );
        assert_eq!(
            TranslationError::Unexpected(String::new()).reason(),
            "unexpected"
        );
    }

    #[test]
    fn test_prompt_uses_bare_names() {
        let prompt = system_prompt("English", "Arabic");
        assert!(prompt.contains("from English to Arabic"));
        assert!(prompt.contains("Return only the translated text"));
        assert!(prompt.contains("respond with the original text"));
    }
}
