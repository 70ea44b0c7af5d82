use super::http_utils::{create_http_client, extract_text_content, send_json_request};
use super::{system_prompt, TranslationError, Translator};
use crate::config::{get_llm_http_timeout_secs, CoreSettings, TRANSLATION_TEMPERATURE};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::{json, Value};
use tracing::debug;

/// Translator backed by the xAI chat-completions API
pub struct XaiTranslator {
    http: HttpClient,
    api_url: String,
    api_key: String,
    model: String,
}

impl XaiTranslator {
    /// Create a translator from settings, using the configured HTTP timeout
    #[must_use]
    pub fn new(settings: &CoreSettings) -> Self {
        Self::with_client(
            create_http_client(get_llm_http_timeout_secs()),
            settings.xai_api_url.clone(),
            settings.xai_api_key.clone(),
            settings.xai_model.clone(),
        )
    }

    /// Create a translator with an explicit HTTP client
    #[must_use]
    pub fn with_client(http: HttpClient, api_url: String, api_key: String, model: String) -> Self {
        Self {
            http,
            api_url,
            api_key,
            model,
        }
    }

    fn request_body(&self, text: &str, source_language: &str, target_language: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": system_prompt(source_language, target_language),
                },
                {
                    "role": "user",
                    "content": text,
                }
            ],
            "temperature": TRANSLATION_TEMPERATURE,
            "stream": false,
        })
    }
}

#[async_trait]
impl Translator for XaiTranslator {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, TranslationError> {
        let body = self.request_body(text, source_language, target_language);
        let auth = format!("Bearer {}", self.api_key);

        debug!(
            model = %self.model,
            chars = text.chars().count(),
            "Requesting translation {source_language} -> {target_language}"
        );

        let response = send_json_request(&self.http, &self.api_url, &body, Some(&auth)).await?;
        let content = extract_text_content(&response, &["choices", "0", "message", "content"])?;

        if content.trim().is_empty() {
            return Err(TranslationError::Unexpected("Empty response".to_string()));
        }
        Ok(content)
    }
}
