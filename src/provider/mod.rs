use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{ApiKeys, Config};
use crate::errors::{VibeError, VibeResult};
use crate::wire::{CompletionOptions, Instruction};

pub mod anthropic;
pub mod openai;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[value(alias = "anthropic")]
    Claude,
    #[value(name = "openai", alias = "open-ai")]
    #[serde(rename = "openai")]
    OpenAi,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Claude => "claude",
            ProviderKind::OpenAi => "openai",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = VibeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "claude" | "anthropic" => Ok(ProviderKind::Claude),
            "openai" | "open-ai" => Ok(ProviderKind::OpenAi),
            other => Err(VibeError::InvalidInput(format!("invalid AI provider '{other}'"))),
        }
    }
}

/// A text-completion service. One call, one outbound request, no retries.
#[async_trait]
pub trait Provider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    async fn complete(&self, ins: &Instruction, opts: &CompletionOptions) -> VibeResult<String>;
}

pub type DynProvider = Arc<dyn Provider>;

/// One client per provider kind, plus the options each is called with.
#[derive(Clone, Default)]
pub struct ProviderSet {
    entries: HashMap<ProviderKind, (DynProvider, CompletionOptions)>,
}

impl ProviderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider: DynProvider, opts: CompletionOptions) -> Self {
        self.entries.insert(provider.kind(), (provider, opts));
        self
    }

    pub fn get(&self, kind: ProviderKind) -> VibeResult<(&DynProvider, &CompletionOptions)> {
        self.entries
            .get(&kind)
            .map(|(p, o)| (p, o))
            .ok_or_else(|| VibeError::Provider(format!("{kind} provider is not configured")))
    }

    pub fn from_config(cfg: &Config, keys: &ApiKeys) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(cfg.timeout_secs);
        let claude = anthropic::Anthropic::new(&cfg.claude, keys.anthropic.clone(), timeout)?;
        let openai = openai::OpenAi::new(&cfg.openai, keys.openai.clone(), timeout)?;
        Ok(Self::new()
            .with(Arc::new(claude), options(cfg, ProviderKind::Claude))
            .with(Arc::new(openai), options(cfg, ProviderKind::OpenAi)))
    }
}

fn options(cfg: &Config, kind: ProviderKind) -> CompletionOptions {
    let p = cfg.provider(kind);
    CompletionOptions { temperature: p.temperature, max_tokens: p.max_tokens }
}

/// Shared HTTP client construction for the concrete providers.
pub(crate) fn http_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// Maps a transport failure onto the provider error kind.
pub(crate) fn transport_error(name: &str, err: reqwest::Error) -> VibeError {
    if err.is_timeout() {
        VibeError::Provider(format!("{name} request timed out"))
    } else {
        VibeError::Provider(format!("{name} request failed: {err}"))
    }
}

/// Keeps the upstream error body short enough to surface to a user.
pub(crate) fn excerpt(body: &str) -> String {
    const MAX: usize = 300;
    let body = body.trim();
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}…", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_names_parse() {
        assert_eq!("claude".parse::<ProviderKind>().unwrap(), ProviderKind::Claude);
        assert_eq!("OpenAI".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert!(matches!("bard".parse::<ProviderKind>(), Err(VibeError::InvalidInput(_))));
    }

    #[test]
    fn provider_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ProviderKind::OpenAi).unwrap(), "\"openai\"");
        assert_eq!(serde_json::to_string(&ProviderKind::Claude).unwrap(), "\"claude\"");
    }

    #[test]
    fn missing_provider_is_a_provider_error() {
        let set = ProviderSet::new();
        assert!(matches!(set.get(ProviderKind::Claude), Err(VibeError::Provider(_))));
    }

    #[test]
    fn long_bodies_are_truncated() {
        let long = "x".repeat(1000);
        assert_eq!(excerpt(&long).chars().count(), 301);
        assert_eq!(excerpt(" short "), "short");
    }
}
