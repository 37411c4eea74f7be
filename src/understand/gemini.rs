use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};

use crate::bundle::ContentBundle;
use crate::config::ModelConfig;
use crate::error::ImportError;
use crate::understand::prompt::{with_hint, EXTRACTION_PROMPT, PHOTO_PROMPT};
use crate::understand::RecipeModel;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini implementation of the understanding step. Chosen because it
/// accepts inline video/image parts in the same request as the text content.
pub struct GeminiModel {
    client: Client,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    base_url: String,
}

impl GeminiModel {
    /// Create a provider from configuration, falling back to the
    /// GOOGLE_API_KEY environment variable for the key.
    pub fn new(config: &ModelConfig) -> Result<Self, ImportError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
            .ok_or_else(|| {
                ImportError::InvalidRequest(
                    "GOOGLE_API_KEY not found in config or environment".to_string(),
                )
            })?;

        Ok(GeminiModel {
            client: Client::new(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(api_key: String, base_url: String, model: String) -> Self {
        GeminiModel {
            client: Client::new(),
            api_key,
            model,
            temperature: 0.2,
            max_tokens: 4000,
            base_url,
        }
    }

    async fn build_parts(&self, bundle: &ContentBundle) -> Result<Vec<Value>, ImportError> {
        let base = if bundle.media.iter().any(|m| m.mime.starts_with("image/")) {
            format!("{EXTRACTION_PROMPT}\n\n{PHOTO_PROMPT}")
        } else {
            EXTRACTION_PROMPT.to_string()
        };
        let prompt = with_hint(&base, bundle.hint.as_deref());

        let mut parts = vec![json!({
            "text": format!(
                "{prompt}\n\nSource: {} ({})\n\n{}",
                bundle.source_url,
                bundle.platform.as_str(),
                bundle.text
            )
        })];

        for media in &bundle.media {
            let data = tokio::fs::read(&media.path).await?;
            parts.push(json!({
                "inline_data": {
                    "mime_type": media.mime,
                    "data": STANDARD.encode(&data),
                }
            }));
        }

        Ok(parts)
    }
}

#[async_trait]
impl RecipeModel for GeminiModel {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn analyze(&self, bundle: &ContentBundle) -> Result<String, ImportError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let parts = self.build_parts(bundle).await?;

        let response = self
            .client
            .post(&url)
            .json(&json!({
                "contents": [{"parts": parts}],
                "generationConfig": {
                    "temperature": self.temperature,
                    "maxOutputTokens": self.max_tokens,
                    "responseMimeType": "application/json"
                }
            }))
            .send()
            .await?
            .error_for_status()?;

        let response_body: Value = response.json().await?;
        debug!("{:?}", response_body);

        response_body["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| {
                ImportError::ResponseParse(
                    "no candidate text in understanding response".to_string(),
                )
            })
    }
}
