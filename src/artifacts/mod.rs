use chrono::{DateTime, Utc};
use fs_err as fs;
use serde::Serialize;
use serde_json::to_string_pretty;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::wire::Instruction;

/// Where one stage of a transaction was written.
#[derive(Debug, Clone)]
pub struct SavedPaths {
    pub dir: PathBuf,
    pub prompt: PathBuf,
    pub completion: Option<PathBuf>,
    pub result: Option<PathBuf>,
}

#[derive(Serialize)]
struct PromptRecord<'a> {
    stage: &'a str,
    provider: &'a str,
    timestamp: DateTime<Utc>,
    instruction: &'a Instruction,
}

/// Writes prompts, raw completions and recovered objects under
/// `<root>/tx/<uuid>/`.
#[derive(Debug, Clone)]
pub struct ArtifactSink {
    root: PathBuf,
}

impl ArtifactSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn tx_dir(&self, tx: Uuid) -> PathBuf {
        tx_dir(&self.root, tx)
    }

    pub fn save_stage<T: Serialize>(
        &self,
        tx: Uuid,
        stage: &str,
        provider: &str,
        instruction: &Instruction,
        completion: Option<&str>,
        result: Option<&T>,
    ) -> anyhow::Result<SavedPaths> {
        let dir = self.tx_dir(tx);
        fs::create_dir_all(&dir)?;

        let prompt = dir.join(format!("{stage}.prompt.json"));
        let record = PromptRecord { stage, provider, timestamp: Utc::now(), instruction };
        fs::write(&prompt, to_string_pretty(&record)?)?;

        let mut completion_path = None;
        if let Some(text) = completion {
            let p = dir.join(format!("{stage}.completion.txt"));
            fs::write(&p, text)?;
            completion_path = Some(p);
        }

        let mut result_path = None;
        if let Some(value) = result {
            let p = dir.join(format!("{stage}.result.json"));
            fs::write(&p, to_string_pretty(value)?)?;
            result_path = Some(p);
        }

        Ok(SavedPaths { dir, prompt, completion: completion_path, result: result_path })
    }
}

fn tx_dir(root: &Path, tx: Uuid) -> PathBuf {
    root.join("tx").join(tx.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn writes_all_three_files_for_a_successful_stage() {
        let dir = tempfile::tempdir().unwrap();
        let sink = ArtifactSink::new(dir.path());
        let tx = Uuid::new_v4();
        let ins = Instruction::user("Product: X".into());

        let saved = sink
            .save_stage(tx, "generate", "claude", &ins, Some("{\"a\":1}"), Some(&json!({ "a": 1 })))
            .unwrap();

        assert_eq!(saved.dir, dir.path().join("tx").join(tx.to_string()));
        let prompt: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&saved.prompt).unwrap()).unwrap();
        assert_eq!(prompt["stage"], "generate");
        assert_eq!(prompt["instruction"]["user"], "Product: X");
        assert_eq!(fs::read_to_string(saved.completion.unwrap()).unwrap(), "{\"a\":1}");
        assert!(saved.result.unwrap().exists());
    }

    #[test]
    fn failed_stage_keeps_only_the_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let sink = ArtifactSink::new(dir.path());
        let saved = sink
            .save_stage::<serde_json::Value>(
                Uuid::new_v4(),
                "expand",
                "claude",
                &Instruction::user("x".into()),
                None,
                None,
            )
            .unwrap();
        assert!(saved.prompt.exists());
        assert!(saved.completion.is_none());
        assert!(saved.result.is_none());
    }
}
