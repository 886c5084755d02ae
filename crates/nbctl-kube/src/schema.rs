//! Resource definition stage
//!
//! The definitions themselves ship as plain manifest files in a directory;
//! this stage only applies, inspects and removes them.

use crate::error::{KubeError, Result};
use crate::kubectl::Kubectl;
use async_trait::async_trait;
use nbctl_core::{BoxError, DeployContext, Stage, StageKind};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct SchemaStage {
    kubectl: Arc<Kubectl>,
    manifest_dir: PathBuf,
}

impl SchemaStage {
    pub fn new(kubectl: Arc<Kubectl>, manifest_dir: impl Into<PathBuf>) -> Self {
        Self {
            kubectl,
            manifest_dir: manifest_dir.into(),
        }
    }

    pub fn manifest_dir(&self) -> &Path {
        &self.manifest_dir
    }

    fn dir(&self) -> Result<String> {
        if !self.manifest_dir.is_dir() {
            return Err(KubeError::Manifest(format!(
                "resource definition directory {} not found",
                self.manifest_dir.display()
            )));
        }
        Ok(self.manifest_dir.to_string_lossy().to_string())
    }

    /// Manifest files in name order
    async fn manifest_files(&self) -> Result<Vec<PathBuf>> {
        self.dir()?;
        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.manifest_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_yaml = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == "yaml" || e == "yml");
            if is_yaml {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

#[async_trait]
impl Stage for SchemaStage {
    fn kind(&self) -> StageKind {
        StageKind::SchemaLayer
    }

    async fn apply(&self, _ctx: &DeployContext) -> std::result::Result<(), BoxError> {
        let out = self.kubectl.apply_path(&self.dir()?, false).await?;
        tracing::info!("{}", out.trim());
        Ok(())
    }

    async fn upgrade(&self, _ctx: &DeployContext) -> std::result::Result<(), BoxError> {
        // large schemas overflow the client-side last-applied annotation
        let out = self.kubectl.apply_path(&self.dir()?, true).await?;
        tracing::info!("{}", out.trim());
        Ok(())
    }

    async fn status(&self, _ctx: &DeployContext) -> std::result::Result<String, BoxError> {
        let list = self.kubectl.get_path_json(&self.manifest_dir).await?;
        Ok(describe_definitions(&list))
    }

    /// Definitions first, then (with cleanup) the namespace
    async fn delete(&self, ctx: &DeployContext) -> std::result::Result<(), BoxError> {
        let out = self.kubectl.delete_path(&self.dir()?).await?;
        tracing::info!("{}", out.trim());

        if ctx.flags.cleanup {
            let out = self
                .kubectl
                .delete_objects(&[format!("namespace/{}", ctx.namespace)], None)
                .await?;
            tracing::info!("{}", out.trim());
        }
        Ok(())
    }

    async fn is_ready(&self, _ctx: &DeployContext) -> std::result::Result<bool, BoxError> {
        let list = self.kubectl.get_path_json(&self.manifest_dir).await?;
        Ok(all_established(&list))
    }

    async fn render(&self, _ctx: &DeployContext) -> std::result::Result<Option<String>, BoxError> {
        let mut documents = Vec::new();
        for file in self.manifest_files().await? {
            let content = tokio::fs::read_to_string(&file).await?;
            let content = content.trim().trim_start_matches("---").trim();
            if !content.is_empty() {
                documents.push(content.to_string());
            }
        }
        if documents.is_empty() {
            return Ok(None);
        }
        Ok(Some(documents.join("\n---\n")))
    }
}

fn items(list: &Value) -> Vec<&Value> {
    match list.get("items").and_then(Value::as_array) {
        Some(items) => items.iter().collect(),
        // a single object comes back unwrapped
        None if list.get("kind").is_some() => vec![list],
        None => Vec::new(),
    }
}

fn is_established(definition: &Value) -> bool {
    definition
        .pointer("/status/conditions")
        .and_then(Value::as_array)
        .is_some_and(|conditions| {
            conditions.iter().any(|c| {
                c.get("type").and_then(Value::as_str) == Some("Established")
                    && c.get("status").and_then(Value::as_str) == Some("True")
            })
        })
}

/// Every listed definition reports `Established`
pub fn all_established(list: &Value) -> bool {
    let items = items(list);
    !items.is_empty() && items.iter().all(|d| is_established(d))
}

pub fn describe_definitions(list: &Value) -> String {
    let items = items(list);
    if items.is_empty() {
        return "  No resource definitions found".to_string();
    }
    items
        .iter()
        .map(|d| {
            let name = d
                .pointer("/metadata/name")
                .and_then(Value::as_str)
                .unwrap_or("<unnamed>");
            let state = if is_established(d) {
                "Established"
            } else {
                "Pending"
            };
            format!("  {name}: {state}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
