//! Operator stages
//!
//! Both operators end up as a Deployment whose readiness decides when the
//! system instance may be created. The platform operator is rendered from the
//! embedded template, the database operator is the upstream release manifest.

use crate::error::Result;
use crate::kubectl::Kubectl;
use crate::templates::{ManifestTemplates, OPERATOR_DEPLOYMENT};
use async_trait::async_trait;
use nbctl_core::{BoxError, DeployContext, Stage, StageKind};
use serde_json::Value;
use std::sync::Arc;

/// Where an operator's manifest comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorSource {
    /// Embedded template, rendered per run
    Template,
    /// Release manifest applied straight from a URL
    RemoteUrl(String),
}

/// Objects the database operator release creates for the operator itself,
/// deleted in this order. The release's CRDs are shared by every database in
/// the cluster and are only removed with a confirmed cleanup.
const DATABASE_OPERATOR_CLUSTER_OBJECTS: [&str; 2] = [
    "mutatingwebhookconfiguration/cnpg-mutating-webhook-configuration",
    "validatingwebhookconfiguration/cnpg-validating-webhook-configuration",
];
const DATABASE_OPERATOR_OBJECTS: [&str; 3] = [
    "service/cnpg-webhook-service",
    "serviceaccount/cnpg-manager",
    "configmap/cnpg-default-monitoring",
];
const DATABASE_OPERATOR_RBAC: [&str; 2] = [
    "clusterrolebinding/cnpg-manager-rolebinding",
    "clusterrole/cnpg-manager",
];

pub struct OperatorStage {
    kind: StageKind,
    kubectl: Arc<Kubectl>,
    templates: Arc<ManifestTemplates>,
    source: OperatorSource,
    /// Fixed namespace; `None` follows the run's namespace
    namespace: Option<String>,
    deployment: String,
}

impl OperatorStage {
    /// The platform's own operator, installed next to the system
    pub fn platform(kubectl: Arc<Kubectl>, templates: Arc<ManifestTemplates>) -> Self {
        Self {
            kind: StageKind::PlatformOperator,
            kubectl,
            templates,
            source: OperatorSource::Template,
            namespace: None,
            deployment: OPERATOR_DEPLOYMENT.to_string(),
        }
    }

    /// The database operator from its release manifest
    pub fn database(
        kubectl: Arc<Kubectl>,
        templates: Arc<ManifestTemplates>,
        manifest_url: impl Into<String>,
        namespace: impl Into<String>,
        deployment: impl Into<String>,
    ) -> Self {
        Self {
            kind: StageKind::DatabaseOperator,
            kubectl,
            templates,
            source: OperatorSource::RemoteUrl(manifest_url.into()),
            namespace: Some(namespace.into()),
            deployment: deployment.into(),
        }
    }

    pub fn source(&self) -> &OperatorSource {
        &self.source
    }

    pub fn deployment(&self) -> &str {
        &self.deployment
    }

    pub fn namespace<'a>(&'a self, ctx: &'a DeployContext) -> &'a str {
        self.namespace.as_deref().unwrap_or(&ctx.namespace)
    }

    /// Operator manifest preceded by its namespace
    fn template_manifest(&self, ctx: &DeployContext) -> Result<String> {
        Ok(format!(
            "{}\n---\n{}",
            self.templates.namespace(ctx)?.trim(),
            self.templates.operator(ctx)?.trim()
        ))
    }

    async fn install(&self, ctx: &DeployContext) -> Result<String> {
        match &self.source {
            OperatorSource::Template => {
                let manifest = self.template_manifest(ctx)?;
                self.kubectl.apply_manifest(&manifest, false).await
            }
            // the release manifest carries CRDs too large for client-side apply
            OperatorSource::RemoteUrl(url) => self.kubectl.apply_path(url, true).await,
        }
    }

    /// Remove the operator's own workload, leaving shared definitions alone
    async fn delete_workload(&self, ctx: &DeployContext) -> Result<String> {
        let namespace = self.namespace(ctx);
        let mut out = self
            .kubectl
            .delete_objects(&owned(&DATABASE_OPERATOR_CLUSTER_OBJECTS), None)
            .await?;

        let mut namespaced = vec![format!("deployment/{}", self.deployment)];
        namespaced.extend(owned(&DATABASE_OPERATOR_OBJECTS));
        out.push_str(
            &self
                .kubectl
                .delete_objects(&namespaced, Some(namespace))
                .await?,
        );

        out.push_str(
            &self
                .kubectl
                .delete_objects(&owned(&DATABASE_OPERATOR_RBAC), None)
                .await?,
        );
        Ok(out)
    }

    async fn deployment_json(&self, ctx: &DeployContext) -> Result<Option<Value>> {
        self.kubectl
            .get_json("deployment", &self.deployment, self.namespace(ctx))
            .await
    }
}

#[async_trait]
impl Stage for OperatorStage {
    fn kind(&self) -> StageKind {
        self.kind
    }

    async fn apply(&self, ctx: &DeployContext) -> std::result::Result<(), BoxError> {
        let out = self.install(ctx).await?;
        tracing::info!("{}", out.trim());
        Ok(())
    }

    async fn status(&self, ctx: &DeployContext) -> std::result::Result<String, BoxError> {
        let namespace = self.namespace(ctx);
        Ok(match self.deployment_json(ctx).await? {
            Some(deployment) => describe_deployment(&deployment),
            None => format!("  Deployment {namespace}/{} not found", self.deployment),
        })
    }

    async fn delete(&self, ctx: &DeployContext) -> std::result::Result<(), BoxError> {
        let out = match &self.source {
            OperatorSource::Template => {
                // without the namespace; SchemaStage removes it on cleanup
                let manifest = self.templates.operator(ctx)?;
                self.kubectl.delete_manifest(&manifest).await?
            }
            OperatorSource::RemoteUrl(url) if ctx.flags.cleanup => {
                tracing::warn!(%url, "removing the database operator release with its CRDs");
                self.kubectl.delete_path(url).await?
            }
            OperatorSource::RemoteUrl(_) => self.delete_workload(ctx).await?,
        };
        tracing::info!("{}", out.trim());
        Ok(())
    }

    async fn is_ready(&self, ctx: &DeployContext) -> std::result::Result<bool, BoxError> {
        Ok(self
            .deployment_json(ctx)
            .await?
            .is_some_and(|d| deployment_ready(&d)))
    }

    async fn render(&self, ctx: &DeployContext) -> std::result::Result<Option<String>, BoxError> {
        match &self.source {
            OperatorSource::Template => Ok(Some(self.template_manifest(ctx)?)),
            OperatorSource::RemoteUrl(_) => Ok(None),
        }
    }
}

fn owned(objects: &[&str]) -> Vec<String> {
    objects.iter().map(|o| o.to_string()).collect()
}

fn replicas(deployment: &Value) -> (u64, u64) {
    let desired = deployment
        .pointer("/spec/replicas")
        .and_then(Value::as_u64)
        .unwrap_or(1);
    let ready = deployment
        .pointer("/status/readyReplicas")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    (desired, ready)
}

/// All desired replicas are ready; a deployment scaled to zero never is
pub fn deployment_ready(deployment: &Value) -> bool {
    let (desired, ready) = replicas(deployment);
    desired > 0 && ready >= desired
}

pub fn describe_deployment(deployment: &Value) -> String {
    let name = deployment
        .pointer("/metadata/name")
        .and_then(Value::as_str)
        .unwrap_or("<unnamed>");
    let namespace = deployment
        .pointer("/metadata/namespace")
        .and_then(Value::as_str)
        .unwrap_or("default");
    let image = deployment
        .pointer("/spec/template/spec/containers/0/image")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    let (desired, ready) = replicas(deployment);
    format!("  Deployment {namespace}/{name}: {ready}/{desired} ready\n  Image: {image}")
}
