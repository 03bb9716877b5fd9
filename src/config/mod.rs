use anyhow::Context;
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::provider::ProviderKind;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderConfig {
    pub model: String,
    pub api_base: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Only sent by the Anthropic client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

impl ProviderConfig {
    pub fn claude() -> Self {
        Self {
            model: "claude-3-haiku-20240307".into(),
            api_base: "https://api.anthropic.com".into(),
            temperature: 0.9,
            max_tokens: 4000,
            api_version: Some("2023-06-01".into()),
        }
    }

    pub fn openai() -> Self {
        Self {
            model: "gpt-3.5-turbo".into(),
            api_base: "https://api.openai.com".into(),
            temperature: 0.9,
            max_tokens: 3000,
            api_version: None,
        }
    }

    fn apply(&mut self, o: ProviderOverrides) {
        if let Some(v) = o.model {
            self.model = v;
        }
        if let Some(v) = o.api_base {
            self.api_base = v;
        }
        if let Some(v) = o.temperature {
            self.temperature = v;
        }
        if let Some(v) = o.max_tokens {
            self.max_tokens = v;
        }
        if o.api_version.is_some() {
            self.api_version = o.api_version;
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProviderOverrides {
    model: Option<String>,
    api_base: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    api_version: Option<String>,
}

/// On-disk shape: every key optional, layered over `Config::default()`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    provider: Option<ProviderKind>,
    claude: Option<ProviderOverrides>,
    openai: Option<ProviderOverrides>,
    timeout_secs: Option<u64>,
    bind: Option<String>,
    artifact_dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub provider: ProviderKind,
    pub claude: ProviderConfig,
    pub openai: ProviderConfig,
    pub timeout_secs: u64,
    pub bind: String,
    pub artifact_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Claude,
            claude: ProviderConfig::claude(),
            openai: ProviderConfig::openai(),
            timeout_secs: 120,
            bind: "127.0.0.1:3000".into(),
            artifact_dir: ".vibe".into(),
        }
    }
}

impl Config {
    /// Defaults when `path` is `None`, otherwise the TOML file layered over
    /// the defaults. An explicit path that cannot be read is an error.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = fs::read_to_string(path)?;
        let file: ConfigFile = toml::from_str(&raw)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(Self::default().merge(file))
    }

    fn merge(mut self, file: ConfigFile) -> Self {
        if let Some(v) = file.provider {
            self.provider = v;
        }
        if let Some(o) = file.claude {
            self.claude.apply(o);
        }
        if let Some(o) = file.openai {
            self.openai.apply(o);
        }
        if let Some(v) = file.timeout_secs {
            self.timeout_secs = v;
        }
        if let Some(v) = file.bind {
            self.bind = v;
        }
        if let Some(v) = file.artifact_dir {
            self.artifact_dir = v;
        }
        self
    }

    pub fn provider(&self, kind: ProviderKind) -> &ProviderConfig {
        match kind {
            ProviderKind::Claude => &self.claude,
            ProviderKind::OpenAi => &self.openai,
        }
    }
}

/// Provider API keys, read once at startup. Missing keys are kept as `None`;
/// the matching client then fails every call instead of aborting startup.
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    pub anthropic: Option<String>,
    pub openai: Option<String>,
}

impl ApiKeys {
    pub fn from_env() -> Self {
        let _ = dotenv::dotenv();
        let read = |name: &str| dotenv::var(name).ok().filter(|k| !k.trim().is_empty());
        Self {
            anthropic: read("ANTHROPIC_API_KEY"),
            openai: read("OPENAI_API_KEY"),
        }
    }
}
