use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::warn;

use maitred_core::config::{LlmConfig, LlmProvider};

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// OpenAI-compatible chat-completions client. Transport failures, non-2xx
/// responses, and timeouts all degrade to an empty completion: the pipeline
/// treats "no useful output" as a normal stage outcome, never a turn-fatal
/// fault.
pub struct HttpLlmClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
    max_retries: u32,
}

impl HttpLlmClient {
    pub fn from_config(config: &LlmConfig) -> Self {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| default_base_url(config.provider).to_string());

        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.as_ref().map(|key| key.expose_secret().to_string()),
            timeout: Duration::from_secs(config.timeout_secs),
            max_retries: config.max_retries,
        }
    }

    async fn request_completion(&self, prompt: &str) -> Result<String> {
        let payload = ChatCompletionRequest {
            model: &self.model,
            messages: vec![WireMessage { role: "user", content: prompt }],
            max_tokens: 300,
            temperature: 0.7,
        };

        let mut request = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .timeout(self.timeout)
            .json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?.error_for_status()?;
        let body: ChatCompletionResponse = response.json().await?;

        Ok(body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let attempts = self.max_retries.saturating_add(1);
        for attempt in 1..=attempts {
            match self.request_completion(prompt).await {
                Ok(completion) => return Ok(completion),
                Err(error) => {
                    warn!(
                        event_name = "llm.completion.failed",
                        attempt,
                        attempts,
                        error = %error,
                        "completion request failed"
                    );
                }
            }
        }

        Ok(String::new())
    }
}

fn default_base_url(provider: LlmProvider) -> &'static str {
    match provider {
        LlmProvider::Groq => "https://api.groq.com/openai/v1",
        LlmProvider::OpenAi => "https://api.openai.com/v1",
        LlmProvider::Ollama => "http://localhost:11434/v1",
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use maitred_core::config::{AppConfig, LlmProvider};

    use super::HttpLlmClient;

    #[test]
    fn provider_defaults_fill_in_the_base_url() {
        let mut config = AppConfig::default().llm;
        config.base_url = None;

        config.provider = LlmProvider::OpenAi;
        let client = HttpLlmClient::from_config(&config);
        assert_eq!(client.base_url, "https://api.openai.com/v1");

        config.provider = LlmProvider::Ollama;
        let client = HttpLlmClient::from_config(&config);
        assert_eq!(client.base_url, "http://localhost:11434/v1");
    }

    #[test]
    fn configured_base_url_wins_and_loses_its_trailing_slash() {
        let mut config = AppConfig::default().llm;
        config.base_url = Some("http://localhost:8000/v1/".to_string());

        let client = HttpLlmClient::from_config(&config);
        assert_eq!(client.base_url, "http://localhost:8000/v1");
    }

    #[test]
    fn empty_completion_body_decodes_to_empty_string() {
        let body: super::ChatCompletionResponse =
            serde_json::from_str("{\"choices\":[]}").expect("decode");
        assert!(body.choices.is_empty());
    }
}
