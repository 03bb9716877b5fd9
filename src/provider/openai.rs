use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use super::{excerpt, http_client, transport_error, Provider, ProviderKind};
use crate::config::ProviderConfig;
use crate::errors::{VibeError, VibeResult};
use crate::wire::{CompletionOptions, Instruction};

/// Chat-completions client. The system part of an instruction becomes a
/// `system` message ahead of the user turn.
pub struct OpenAi {
    model: String,
    api_key: Option<String>,
    api_base: String,
    client: Client,
}

impl OpenAi {
    pub fn new(cfg: &ProviderConfig, api_key: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            model: cfg.model.clone(),
            api_key,
            api_base: cfg.api_base.clone(),
            client: http_client(timeout)?,
        })
    }
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[async_trait]
impl Provider for OpenAi {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    async fn complete(&self, ins: &Instruction, opts: &CompletionOptions) -> VibeResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| VibeError::Provider("OPENAI_API_KEY is not set".into()))?;

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &ins.system {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": ins.user }));

        let body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": opts.temperature,
            "max_tokens": opts.max_tokens,
        });

        let url = format!("{}/v1/chat/completions", self.api_base.trim_end_matches('/'));
        debug!(url = %url, model = %self.model, "openai: POST");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("openai", e))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| transport_error("openai", e))?;
        debug!(%status, bytes = text.len(), "openai: response");

        if !status.is_success() {
            return Err(VibeError::Provider(format!(
                "OpenAI API error ({status}): {}",
                excerpt(&text)
            )));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| VibeError::Provider(format!("failed to parse OpenAI response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| VibeError::Provider("empty response from OpenAI".into()))
    }
}
