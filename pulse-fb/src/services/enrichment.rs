//! LLM enrichment client
//!
//! Client for an OpenAI-compatible chat-completions endpoint (Groq in
//! production). Produces the three per-submission derivations plus the
//! dashboard's corpus-level insights. Every derivation is attempted once,
//! bounded by the configured timeout, with no retry and no rate limiting;
//! callers substitute the documented fallback text on failure.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ProviderConfig;
use pulse_common::events::DerivationKind;

const USER_AGENT: &str = concat!("pulse-fb/", env!("CARGO_PKG_VERSION"));

const SYSTEM_PROMPT: &str = "You are a helpful customer feedback analysis assistant.";

/// Fallback acknowledgement when `derive_response` fails
pub const FALLBACK_RESPONSE: &str =
    "Thank you for your feedback. We appreciate you taking the time to share your experience with us.";

/// Fallback summary when `derive_summary` fails
pub const FALLBACK_SUMMARY: &str = "Customer feedback received.";

/// Fallback action list when `derive_actions` fails
pub const FALLBACK_ACTIONS: &str = "- Review this feedback with the team\n- Follow up with the customer if contact details are available";

/// Documented fallback text for a derivation
pub fn fallback_text(kind: DerivationKind) -> &'static str {
    match kind {
        DerivationKind::Response => FALLBACK_RESPONSE,
        DerivationKind::Summary => FALLBACK_SUMMARY,
        DerivationKind::Actions => FALLBACK_ACTIONS,
    }
}

/// Enrichment provider errors
///
/// All variants are non-fatal to the submission pipeline: the orchestrator
/// logs a warning and substitutes the fallback text.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Provider rejected API key")]
    Unauthorized,

    #[error("Provider rate limit exceeded")]
    RateLimited,

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Provider returned no usable text")]
    EmptyCompletion,
}

/// Sampling options for one generation call
#[derive(Debug, Clone, Copy)]
pub struct GenerateOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            max_tokens: 1024,
        }
    }
}

/// Chat-completions request body
#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

/// One chat message (request side)
#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Chat-completions response body (fields we consume)
#[derive(Debug, Clone, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// LLM enrichment client
#[derive(Clone)]
pub struct EnrichmentClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl EnrichmentClient {
    /// Build a client from resolved provider configuration
    ///
    /// The configured timeout bounds every generation call.
    pub fn new(config: &ProviderConfig) -> Result<Self, EnrichmentError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| EnrichmentError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    /// Single completion call: one attempt, no retry
    pub async fn generate(
        &self,
        prompt: &str,
        options: GenerateOptions,
    ) -> Result<String, EnrichmentError> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        tracing::debug!(
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            "Requesting completion"
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();

        if status == 401 {
            return Err(EnrichmentError::Unauthorized);
        }

        if status == 429 {
            return Err(EnrichmentError::RateLimited);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EnrichmentError::ApiError(status.as_u16(), error_text));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| EnrichmentError::ParseError(e.to_string()))?;

        let content = extract_content(completion)?;
        tracing::debug!(content_chars = content.chars().count(), "Completion received");
        Ok(content)
    }

    /// Derive the 2-3 sentence empathetic acknowledgement
    pub async fn derive_response(
        &self,
        rating: u8,
        review: &str,
    ) -> Result<String, EnrichmentError> {
        self.generate(&response_prompt(rating, review), GenerateOptions::default())
            .await
    }

    /// Derive the one-sentence summary (at most ~15 words)
    pub async fn derive_summary(&self, review: &str) -> Result<String, EnrichmentError> {
        let options = GenerateOptions {
            temperature: 0.3,
            max_tokens: 64,
        };
        self.generate(&summary_prompt(review), options).await
    }

    /// Derive the 2-3 suggested follow-up actions
    pub async fn derive_actions(
        &self,
        rating: u8,
        review: &str,
    ) -> Result<String, EnrichmentError> {
        let options = GenerateOptions {
            temperature: 1.0,
            max_tokens: 256,
        };
        self.generate(&actions_prompt(rating, review), options).await
    }

    /// Derive dashboard insights over a digest of stored feedback
    pub async fn derive_insights(&self, corpus: &str) -> Result<String, EnrichmentError> {
        self.generate(&insights_prompt(corpus), GenerateOptions::default())
            .await
    }
}

fn classify_request_error(e: reqwest::Error) -> EnrichmentError {
    if e.is_timeout() {
        EnrichmentError::Timeout
    } else {
        EnrichmentError::NetworkError(e.to_string())
    }
}

fn extract_content(completion: ChatCompletion) -> Result<String, EnrichmentError> {
    let content = completion
        .choices
        .into_iter()
        .next()
        .ok_or(EnrichmentError::EmptyCompletion)?
        .message
        .content;

    let content = content.trim().to_string();
    if content.is_empty() {
        return Err(EnrichmentError::EmptyCompletion);
    }
    Ok(content)
}

fn response_prompt(rating: u8, review: &str) -> String {
    format!(
        "A customer left the following feedback.\n\
         Rating: {}/5\n\
         Review: {}\n\n\
         Write a brief empathetic response to the customer (2-3 sentences) \
         that acknowledges the specifics of what they wrote.",
        rating, review
    )
}

fn summary_prompt(review: &str) -> String {
    format!(
        "Summarize the following customer review in one sentence of at most \
         15 words:\n\n{}",
        review
    )
}

fn actions_prompt(rating: u8, review: &str) -> String {
    format!(
        "A customer left the following feedback.\n\
         Rating: {}/5\n\
         Review: {}\n\n\
         Suggest 2-3 concrete follow-up actions for the business, one per \
         line, each starting with \"- \".",
        rating, review
    )
}

fn insights_prompt(corpus: &str) -> String {
    format!(
        "Analyze this collection of customer feedback:\n\n{}\n\n\
         Provide: 1) the key recurring themes, 2) the overall sentiment, \
         and 3) the top 3 recommended action items.",
        corpus
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_config(base_url: &str) -> ProviderConfig {
        ProviderConfig {
            base_url: base_url.to_string(),
            api_key: "test-key".to_string(),
            model: "mixtral-8x7b-32768".to_string(),
            timeout: Duration::from_secs(2),
        }
    }

    #[test]
    fn test_client_creation() {
        let client = EnrichmentClient::new(&test_config("https://api.groq.com/openai/v1"));
        assert!(client.is_ok());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = EnrichmentClient::new(&test_config("http://localhost:9999/v1/")).unwrap();
        assert_eq!(client.base_url, "http://localhost:9999/v1");
    }

    #[test]
    fn test_fallbacks_are_distinct_and_nonempty() {
        let all = [
            fallback_text(DerivationKind::Response),
            fallback_text(DerivationKind::Summary),
            fallback_text(DerivationKind::Actions),
        ];
        for text in all {
            assert!(!text.is_empty());
        }
        assert_ne!(all[0], all[1]);
        assert_ne!(all[1], all[2]);
        assert_eq!(fallback_text(DerivationKind::Summary), "Customer feedback received.");
    }

    #[test]
    fn test_prompts_embed_input() {
        let prompt = response_prompt(2, "slow delivery");
        assert!(prompt.contains("2/5"));
        assert!(prompt.contains("slow delivery"));

        let prompt = summary_prompt("great value");
        assert!(prompt.contains("great value"));
        assert!(prompt.contains("15 words"));

        let prompt = actions_prompt(4, "friendly staff");
        assert!(prompt.contains("4/5"));
        assert!(prompt.contains("friendly staff"));
    }

    #[test]
    fn test_extract_content_trims() {
        let completion = ChatCompletion {
            choices: vec![ChatChoice {
                message: ChatChoiceMessage {
                    content: "  some text \n".to_string(),
                },
            }],
        };
        assert_eq!(extract_content(completion).unwrap(), "some text");
    }

    #[test]
    fn test_extract_content_rejects_empty() {
        let no_choices = ChatCompletion { choices: vec![] };
        assert!(matches!(
            extract_content(no_choices),
            Err(EnrichmentError::EmptyCompletion)
        ));

        let blank = ChatCompletion {
            choices: vec![ChatChoice {
                message: ChatChoiceMessage {
                    content: "   ".to_string(),
                },
            }],
        };
        assert!(matches!(
            extract_content(blank),
            Err(EnrichmentError::EmptyCompletion)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_network_error() {
        // Port 1 on loopback refuses connections immediately
        let client = EnrichmentClient::new(&test_config("http://127.0.0.1:1")).unwrap();
        let result = client.derive_summary("anything").await;
        assert!(matches!(
            result,
            Err(EnrichmentError::NetworkError(_)) | Err(EnrichmentError::Timeout)
        ));
    }
}
