use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{excerpt, http_client, transport_error, Provider, ProviderKind};
use crate::config::ProviderConfig;
use crate::errors::{VibeError, VibeResult};
use crate::wire::{CompletionOptions, Instruction};

pub struct Anthropic {
    model: String,
    api_key: Option<String>,
    api_base: String,
    api_version: String,
    client: Client,
}

impl Anthropic {
    pub fn new(cfg: &ProviderConfig, api_key: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            model: cfg.model.clone(),
            api_key,
            api_base: cfg.api_base.clone(),
            api_version: cfg.api_version.clone().unwrap_or_else(|| "2023-06-01".into()),
            client: http_client(timeout)?,
        })
    }
}

#[derive(Serialize)]
struct MsgRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Msg<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MsgResponse {
    #[serde(default)]
    content: Vec<Block>,
}

#[derive(Deserialize)]
struct Block {
    #[serde(default)]
    text: String,
    #[serde(default)]
    r#type: String,
}

#[async_trait]
impl Provider for Anthropic {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Claude
    }

    async fn complete(&self, ins: &Instruction, opts: &CompletionOptions) -> VibeResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| VibeError::Provider("ANTHROPIC_API_KEY is not set".into()))?;

        let url = format!("{}/v1/messages", self.api_base.trim_end_matches('/'));
        let body = MsgRequest {
            model: &self.model,
            max_tokens: opts.max_tokens,
            temperature: opts.temperature,
            messages: vec![Msg { role: "user", content: &ins.user }],
            system: ins.system.as_deref(),
        };
        debug!(url = %url, model = %self.model, "anthropic: POST");

        let resp = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", &self.api_version)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("anthropic", e))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| transport_error("anthropic", e))?;
        debug!(%status, bytes = text.len(), "anthropic: response");

        if !status.is_success() {
            return Err(VibeError::Provider(format!(
                "anthropic API error ({status}): {}",
                excerpt(&text)
            )));
        }

        let parsed: MsgResponse = serde_json::from_str(&text)
            .map_err(|e| VibeError::Provider(format!("anthropic response parse error: {e}")))?;

        // Only the first content block is read.
        let block = parsed
            .content
            .into_iter()
            .next()
            .ok_or_else(|| VibeError::Provider("empty response from Claude".into()))?;
        if block.r#type != "text" || block.text.is_empty() {
            return Err(VibeError::Provider("empty text content from Claude".into()));
        }
        Ok(block.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, key: Option<&str>) -> Anthropic {
        let cfg = ProviderConfig { api_base: server.uri(), ..ProviderConfig::claude() };
        Anthropic::new(&cfg, key.map(str::to_string), Duration::from_secs(5)).unwrap()
    }

    fn opts() -> CompletionOptions {
        CompletionOptions { temperature: 0.9, max_tokens: 4000 }
    }

    #[tokio::test]
    async fn returns_first_text_block() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-test"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_partial_json(json!({
                "model": "claude-3-haiku-20240307",
                "max_tokens": 4000,
                "messages": [{ "role": "user", "content": "hello" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{ "type": "text", "text": "{\"ok\":true}" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let out = client(&server, Some("sk-test"))
            .complete(&Instruction::user("hello".into()), &opts())
            .await
            .unwrap();
        assert_eq!(out, "{\"ok\":true}");
    }

    #[tokio::test]
    async fn upstream_error_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server, Some("sk-test"))
            .complete(&Instruction::user("hi".into()), &opts())
            .await
            .unwrap_err();
        match err {
            VibeError::Provider(msg) => assert!(msg.contains("429"), "{msg}"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn zero_content_blocks_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "content": [] })))
            .mount(&server)
            .await;

        let err = client(&server, Some("sk-test"))
            .complete(&Instruction::user("hi".into()), &opts())
            .await
            .unwrap_err();
        assert!(matches!(err, VibeError::Provider(_)));
    }

    #[tokio::test]
    async fn missing_key_fails_without_a_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = client(&server, None)
            .complete(&Instruction::user("hi".into()), &opts())
            .await
            .unwrap_err();
        assert_eq!(err, VibeError::Provider("ANTHROPIC_API_KEY is not set".into()));
    }
}
