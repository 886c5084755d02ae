//! Version report

use crate::kubectl::Kubectl;
use async_trait::async_trait;
use nbctl_core::{BoxError, DeployContext, Report};
use std::sync::Arc;

/// Client, image and cluster versions
///
/// Never fails: an unreachable cluster is reported inline.
pub struct VersionReport {
    kubectl: Arc<Kubectl>,
    cli_version: String,
}

impl VersionReport {
    pub fn new(kubectl: Arc<Kubectl>, cli_version: impl Into<String>) -> Self {
        Self {
            kubectl,
            cli_version: cli_version.into(),
        }
    }
}

#[async_trait]
impl Report for VersionReport {
    fn title(&self) -> &str {
        "Versions"
    }

    async fn render(&self, ctx: &DeployContext) -> Result<String, BoxError> {
        let server = match self.kubectl.server_version().await {
            Ok(version) => version,
            Err(e) => format!("unavailable ({e})"),
        };
        Ok(format!(
            "CLI version: {}\nCore image: {}\nOperator image: {}\nDB image: {}\nKubernetes server: {}",
            self.cli_version, ctx.images.core, ctx.images.operator, ctx.images.db, server
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbctl_core::ImageSet;

    #[tokio::test]
    async fn test_missing_kubectl_is_reported_inline() {
        let kubectl = Arc::new(Kubectl::default().with_binary("nbctl-no-such-kubectl"));
        let ctx = DeployContext::new("storage", "noobaa").with_images(ImageSet {
            core: "core:1".to_string(),
            operator: "operator:1".to_string(),
            db: "db:1".to_string(),
        });

        let text = VersionReport::new(kubectl, "0.1.0")
            .render(&ctx)
            .await
            .unwrap();
        assert!(text.starts_with("CLI version: 0.1.0\nCore image: core:1"));
        assert!(text.contains("Kubernetes server: unavailable (kubectl not found"));
    }
}
