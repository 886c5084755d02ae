//! System instance stage

use crate::error::Result;
use crate::kubectl::Kubectl;
use crate::templates::ManifestTemplates;
use async_trait::async_trait;
use nbctl_core::{BoxError, DeployContext, Stage, StageKind};
use serde_json::{Value, json};
use std::sync::Arc;

const SYSTEM_KIND: &str = "noobaa";

/// Confirmation the operator requires before it destroys bucket data
const DESTROY_DATA_CONFIRMATION: &str = "yes-really-destroy-all-data";

pub struct SystemStage {
    kubectl: Arc<Kubectl>,
    templates: Arc<ManifestTemplates>,
}

impl SystemStage {
    pub fn new(kubectl: Arc<Kubectl>, templates: Arc<ManifestTemplates>) -> Self {
        Self { kubectl, templates }
    }

    async fn system(&self, ctx: &DeployContext) -> Result<Option<Value>> {
        self.kubectl
            .get_json(SYSTEM_KIND, &ctx.system_name, &ctx.namespace)
            .await
    }
}

#[async_trait]
impl Stage for SystemStage {
    fn kind(&self) -> StageKind {
        StageKind::SystemInstance
    }

    async fn apply(&self, ctx: &DeployContext) -> std::result::Result<(), BoxError> {
        let manifest = self.templates.system(ctx)?;
        let out = self.kubectl.apply_manifest(&manifest, false).await?;
        tracing::info!("{}", out.trim());
        Ok(())
    }

    async fn status(&self, ctx: &DeployContext) -> std::result::Result<String, BoxError> {
        Ok(match self.system(ctx).await? {
            Some(system) => describe_system(&system),
            None => format!(
                "  NooBaa {}/{} not found",
                ctx.namespace, ctx.system_name
            ),
        })
    }

    async fn delete(&self, ctx: &DeployContext) -> std::result::Result<(), BoxError> {
        if ctx.flags.cleanup_data && self.system(ctx).await?.is_some() {
            tracing::warn!(system = %ctx.system_name, "bucket data will be destroyed");
            let patch = json!({
                "spec": {"cleanupPolicy": {"confirmation": DESTROY_DATA_CONFIRMATION}}
            });
            self.kubectl
                .patch_merge(SYSTEM_KIND, &ctx.system_name, &ctx.namespace, &patch)
                .await?;
        }
        let out = self
            .kubectl
            .delete(SYSTEM_KIND, &ctx.system_name, &ctx.namespace)
            .await?;
        tracing::info!("{}", out.trim());
        Ok(())
    }

    async fn is_ready(&self, ctx: &DeployContext) -> std::result::Result<bool, BoxError> {
        Ok(self
            .system(ctx)
            .await?
            .is_some_and(|s| system_phase(&s) == Some("Ready")))
    }

    async fn render(&self, ctx: &DeployContext) -> std::result::Result<Option<String>, BoxError> {
        Ok(Some(self.templates.system(ctx)?))
    }
}

pub fn system_phase(system: &Value) -> Option<&str> {
    system.pointer("/status/phase").and_then(Value::as_str)
}

fn field<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Phase followed by every reported condition
pub fn describe_system(system: &Value) -> String {
    let name = system
        .pointer("/metadata/name")
        .and_then(Value::as_str)
        .unwrap_or("<unnamed>");
    let mut lines = vec![format!(
        "  NooBaa {name}: phase {}",
        system_phase(system).unwrap_or("Unknown")
    )];

    let conditions = system
        .pointer("/status/conditions")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for condition in conditions {
        let mut line = format!(
            "    {}={}",
            field(condition, "type"),
            field(condition, "status")
        );
        let reason = field(condition, "reason");
        if !reason.is_empty() {
            line.push_str(&format!(" ({reason})"));
        }
        let message = field(condition, "message");
        if !message.is_empty() {
            line.push_str(&format!(": {message}"));
        }
        lines.push(line);
    }
    lines.join("\n")
}
