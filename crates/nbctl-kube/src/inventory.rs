//! Resource inventories printed after the stage status

use crate::kubectl::Kubectl;
use async_trait::async_trait;
use nbctl_core::{BoxError, DeployContext, Report};
use std::sync::Arc;

/// Kinds listed by `status`, in print order
pub const INVENTORY: [(&str, &str); 5] = [
    ("Backing Stores", "backingstores.noobaa.io"),
    ("Namespace Stores", "namespacestores.noobaa.io"),
    ("Bucket Classes", "bucketclasses.noobaa.io"),
    ("NooBaa Accounts", "noobaaaccounts.noobaa.io"),
    ("Bucket Claims", "objectbucketclaims.objectbucket.io"),
];

/// `kubectl get <resource>` in the run's namespace
pub struct ResourceListing {
    title: String,
    resource: String,
    kubectl: Arc<Kubectl>,
}

impl ResourceListing {
    pub fn new(title: impl Into<String>, resource: impl Into<String>, kubectl: Arc<Kubectl>) -> Self {
        Self {
            title: title.into(),
            resource: resource.into(),
            kubectl,
        }
    }

    pub fn all(kubectl: &Arc<Kubectl>) -> Vec<Arc<dyn Report>> {
        INVENTORY
            .iter()
            .map(|(title, resource)| {
                Arc::new(Self::new(*title, *resource, kubectl.clone())) as Arc<dyn Report>
            })
            .collect()
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }
}

#[async_trait]
impl Report for ResourceListing {
    fn title(&self) -> &str {
        &self.title
    }

    async fn render(&self, ctx: &DeployContext) -> Result<String, BoxError> {
        let table = self.kubectl.get_table(&self.resource, &ctx.namespace).await?;
        if table.trim().is_empty() {
            return Ok(format!("No resources found in {} namespace.", ctx.namespace));
        }
        Ok(table.trim_end().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_listings() {
        let kubectl = Arc::new(Kubectl::default());
        let listings = ResourceListing::all(&kubectl);
        let titles: Vec<_> = listings.iter().map(|l| l.title().to_string()).collect();
        assert_eq!(
            titles,
            vec![
                "Backing Stores",
                "Namespace Stores",
                "Bucket Classes",
                "NooBaa Accounts",
                "Bucket Claims"
            ]
        );
    }
}
