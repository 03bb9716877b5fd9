use serde::{Deserialize, Serialize};

use crate::brief::{GenerationResult, OriginalContext, Territory, TerritoryExpansion, UserContext};
use crate::provider::ProviderKind;

/// ========================================
/// Prompt and HTTP wire shapes
/// ========================================

/// One provider-agnostic prompt. Providers without a system slot fold
/// `system` into the user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub user: String,
}

impl Instruction {
    pub fn user(user: String) -> Self {
        Self { system: None, user }
    }

    pub fn with_system(system: String, user: String) -> Self {
        Self { system: Some(system), user }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// `POST /generate`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub product: String,
    pub direction: String,
    /// Comma-joined.
    #[serde(default)]
    pub vibes: String,
    #[serde(default)]
    pub target_audience: Option<String>,
    #[serde(default, alias = "aiProvider")]
    pub provider: Option<String>,
}

impl GenerateRequest {
    pub fn provider_kind(&self) -> Result<ProviderKind, crate::errors::VibeError> {
        match self.provider.as_deref() {
            None => Ok(ProviderKind::Claude),
            Some(name) => name.parse(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub generated_vibes: GenerationResult,
}

/// `POST /expand-territory`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandRequest {
    pub territory: Territory,
    #[serde(default)]
    pub original_context: OriginalContext,
    #[serde(default)]
    pub user_context: UserContext,
    #[serde(default)]
    pub is_update: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandResponse {
    pub expansion: TerritoryExpansion,
    #[serde(default, skip_serializing_if = "UserContext::is_empty")]
    pub user_context: UserContext,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
