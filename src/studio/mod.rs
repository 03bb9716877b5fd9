use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::artifacts::ArtifactSink;
use crate::brief::{CreativeBrief, GenerationResult, OriginalContext, TerritoryExpansion};
use crate::cache::{CachedExpansion, ExpansionCache, RequestFence};
use crate::errors::{VibeError, VibeResult};
use crate::prompt;
use crate::provider::{ProviderKind, ProviderSet};
use crate::recover;
use crate::wire::{ExpandRequest, Instruction};

const GENERATION_KEY: &str = "generation";

/// The brief and the generation currently on display.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub brief: CreativeBrief,
    pub result: GenerationResult,
}

impl Session {
    pub fn original_context(&self) -> OriginalContext {
        OriginalContext::from_generation(&self.brief, &self.result)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expanded {
    pub entry: CachedExpansion,
    pub from_cache: bool,
}

/// Prompt -> completion -> recovery, with the expansion cache and the
/// current generation as the only shared state.
pub struct Studio {
    providers: ProviderSet,
    cache: ExpansionCache,
    fence: RequestFence,
    current: Mutex<Option<Session>>,
    artifacts: Option<ArtifactSink>,
    expansion_provider: ProviderKind,
}

impl Studio {
    pub fn new(providers: ProviderSet, cache: ExpansionCache) -> Self {
        Self {
            providers,
            cache,
            fence: RequestFence::new(),
            current: Mutex::new(None),
            artifacts: None,
            expansion_provider: ProviderKind::Claude,
        }
    }

    pub fn with_artifacts(mut self, sink: ArtifactSink) -> Self {
        self.artifacts = Some(sink);
        self
    }

    pub fn cache(&self) -> &ExpansionCache {
        &self.cache
    }

    pub fn current(&self) -> Option<Session> {
        self.current.lock().clone()
    }

    /// Generates from `brief`. On success the current session is replaced
    /// wholesale and cached expansions are dropped, unless a newer
    /// generation started meanwhile; the caller still gets its own result.
    pub async fn generate(&self, brief: CreativeBrief, kind: ProviderKind) -> VibeResult<GenerationResult> {
        let tx = Uuid::new_v4();
        let ticket = self.fence.begin(GENERATION_KEY);
        let ins = prompt::generation_prompt(kind, &brief);

        let text = self.complete(tx, "generate", kind, &ins).await?;
        let recovered = recover::recover(&text).inspect_err(|e| {
            self.record::<Value>(tx, "generate", kind, &ins, Some(&text), None);
            warn!(%tx, error = %e, "generation response could not be recovered");
        })?;
        let stage = recovered.stage;
        let result: GenerationResult = recover::shape(Value::Object(recovered.value))?;
        self.record(tx, "generate", kind, &ins, Some(&text), Some(&result));

        if !result.has_territories() {
            warn!(%tx, "generation contained no territories");
        }
        let dups = result.duplicate_names();
        if !dups.is_empty() {
            warn!(%tx, duplicates = ?dups, "territory names are not unique; expansions share cache entries");
        }
        info!(%tx, provider = %kind, stage = stage.as_str(), territories = result.territories.len(), "generation complete");

        let session = Session { brief, result: result.clone() };
        let written = self.fence.commit(&ticket, || {
            *self.current.lock() = Some(session);
            self.cache.clear();
        });
        if !written {
            debug!(%tx, "newer generation in flight; session left untouched");
        }
        Ok(result)
    }

    /// Expands one territory. A cached entry is returned as-is unless the
    /// request is an update; fresh results are cached only when neither a
    /// newer request for the same territory nor a new generation has started.
    pub async fn expand(&self, req: ExpandRequest) -> VibeResult<Expanded> {
        let key = req.territory.name.trim().to_string();
        if key.is_empty() {
            return Err(VibeError::InvalidInput("territory name is required".into()));
        }

        if !req.is_update {
            if let Some(entry) = self.cache.get(&key) {
                debug!(territory = %key, "expansion served from cache");
                return Ok(Expanded { entry, from_cache: true });
            }
        }

        let tx = Uuid::new_v4();
        let epoch = self.fence.observe(GENERATION_KEY);
        let ticket = self.fence.begin(&format!("expand:{key}"));
        let kind = self.expansion_provider;
        let ins = prompt::expansion_prompt(&req.territory, &req.original_context, &req.user_context, req.is_update);

        let text = self.complete(tx, "expand", kind, &ins).await?;
        let recovered = recover::recover(&text).inspect_err(|e| {
            self.record::<Value>(tx, "expand", kind, &ins, Some(&text), None);
            warn!(%tx, territory = %key, error = %e, "expansion response could not be recovered");
        })?;
        let expansion: TerritoryExpansion =
            recover::shape(TerritoryExpansion::unwrap_envelope(Value::Object(recovered.value)))?;
        self.record(tx, "expand", kind, &ins, Some(&text), Some(&expansion));

        let entry = CachedExpansion { expansion, user_context: req.user_context };
        // A regeneration since `epoch` cleared the cache; this entry belongs
        // to the generation it replaced.
        let written = self.fence.commit_all(&[&ticket, &epoch], || self.cache.put(&key, entry.clone()));
        if written {
            info!(%tx, territory = %key, update = req.is_update, "expansion cached");
        } else {
            debug!(%tx, territory = %key, "stale expansion discarded");
        }
        Ok(Expanded { entry, from_cache: false })
    }

    async fn complete(&self, tx: Uuid, stage: &str, kind: ProviderKind, ins: &Instruction) -> VibeResult<String> {
        let (provider, opts) = self.providers.get(kind)?;
        let started = Instant::now();
        match provider.complete(ins, opts).await {
            Ok(text) => {
                debug!(%tx, stage, provider = %kind, elapsed_ms = started.elapsed().as_millis() as u64, bytes = text.len(), "completion received");
                Ok(text)
            }
            Err(e) => {
                self.record::<Value>(tx, stage, kind, ins, None, None);
                warn!(%tx, stage, provider = %kind, error = %e, "completion failed");
                Err(e)
            }
        }
    }

    fn record<T: Serialize>(
        &self,
        tx: Uuid,
        stage: &str,
        kind: ProviderKind,
        ins: &Instruction,
        completion: Option<&str>,
        result: Option<&T>,
    ) {
        let Some(sink) = &self.artifacts else { return };
        match sink.save_stage(tx, stage, kind.as_str(), ins, completion, result) {
            Ok(saved) => debug!(dir = %saved.dir.display(), stage, "artifacts saved"),
            Err(e) => warn!(error = %e, stage, "failed to save artifacts"),
        }
    }
}
