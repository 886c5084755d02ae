//! Embedded manifest templates

use crate::error::Result;
use nbctl_core::DeployContext;
use tera::{Context, Tera};

const NAMESPACE_TEMPLATE: &str = "namespace.yaml";
const OPERATOR_TEMPLATE: &str = "operator.yaml";
const SYSTEM_TEMPLATE: &str = "system.yaml";

/// Deployment name of the platform operator
pub const OPERATOR_DEPLOYMENT: &str = "noobaa-operator";

/// Renders the operator and system manifests from the run's context
pub struct ManifestTemplates {
    tera: Tera,
}

impl ManifestTemplates {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (
                NAMESPACE_TEMPLATE,
                include_str!("../templates/namespace.yaml.tera"),
            ),
            (
                OPERATOR_TEMPLATE,
                include_str!("../templates/operator.yaml.tera"),
            ),
            (SYSTEM_TEMPLATE, include_str!("../templates/system.yaml.tera")),
        ])?;
        Ok(Self { tera })
    }

    fn context(ctx: &DeployContext) -> Context {
        let mut context = Context::new();
        context.insert("namespace", &ctx.namespace);
        context.insert("name", &ctx.system_name);
        context.insert("deployment", OPERATOR_DEPLOYMENT);
        context.insert("core_image", &ctx.images.core);
        context.insert("operator_image", &ctx.images.operator);
        context.insert("db_image", &ctx.images.db);
        context.insert("use_standalone_db", &ctx.flags.use_standalone_db);
        context.insert("use_obc_cleanup_policy", &ctx.flags.use_obc_cleanup_policy);
        context
    }

    /// The target namespace itself
    pub fn namespace(&self, ctx: &DeployContext) -> Result<String> {
        Ok(self.tera.render(NAMESPACE_TEMPLATE, &Self::context(ctx))?)
    }

    pub fn operator(&self, ctx: &DeployContext) -> Result<String> {
        Ok(self.tera.render(OPERATOR_TEMPLATE, &Self::context(ctx))?)
    }

    pub fn system(&self, ctx: &DeployContext) -> Result<String> {
        Ok(self.tera.render(SYSTEM_TEMPLATE, &Self::context(ctx))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbctl_core::{DeployFlags, ImageSet};
    use serde_json::Value;

    fn ctx(flags: DeployFlags) -> DeployContext {
        DeployContext::new("storage", "noobaa")
            .with_images(ImageSet {
                core: "noobaa/noobaa-core:5.18.0".to_string(),
                operator: "noobaa/noobaa-operator:5.18.0".to_string(),
                db: "quay.io/sclorg/postgresql-15-c9s:latest".to_string(),
            })
            .with_flags(flags)
    }

    fn documents(yaml: &str) -> Vec<Value> {
        yaml.split("\n---\n")
            .map(|doc| serde_yaml::from_str(doc).unwrap())
            .collect()
    }

    #[test]
    fn test_operator_manifest() {
        let templates = ManifestTemplates::new().unwrap();
        let docs = documents(&templates.operator(&ctx(DeployFlags::default())).unwrap());

        let deployment = docs
            .iter()
            .find(|d| d["kind"] == "Deployment")
            .unwrap();
        assert_eq!(deployment["metadata"]["name"], OPERATOR_DEPLOYMENT);
        assert_eq!(deployment["metadata"]["namespace"], "storage");
        assert_eq!(
            deployment["spec"]["template"]["spec"]["containers"][0]["image"],
            "noobaa/noobaa-operator:5.18.0"
        );
        assert!(docs.iter().all(|d| d["metadata"]["name"].is_string()));
    }

    #[test]
    fn test_namespace_manifest() {
        let templates = ManifestTemplates::new().unwrap();
        let namespace: Value =
            serde_yaml::from_str(&templates.namespace(&ctx(DeployFlags::default())).unwrap())
                .unwrap();

        assert_eq!(namespace["kind"], "Namespace");
        assert_eq!(namespace["metadata"]["name"], "storage");
    }

    #[test]
    fn test_system_manifest_default() {
        let templates = ManifestTemplates::new().unwrap();
        let system: Value =
            serde_yaml::from_str(&templates.system(&ctx(DeployFlags::default())).unwrap()).unwrap();

        assert_eq!(system["kind"], "NooBaa");
        assert_eq!(system["metadata"]["name"], "noobaa");
        assert_eq!(system["spec"]["image"], "noobaa/noobaa-core:5.18.0");
        assert_eq!(system["spec"]["dbSpec"]["instances"], 1);
        assert!(system["spec"].get("cleanupPolicy").is_none());
        assert!(system["spec"].get("dbType").is_none());
    }

    #[test]
    fn test_system_manifest_flags() {
        let templates = ManifestTemplates::new().unwrap();
        let flags = DeployFlags {
            use_standalone_db: true,
            use_obc_cleanup_policy: true,
            ..Default::default()
        };
        let system: Value = serde_yaml::from_str(&templates.system(&ctx(flags)).unwrap()).unwrap();

        assert_eq!(system["spec"]["dbType"], "postgres");
        assert!(system["spec"].get("dbSpec").is_none());
        assert_eq!(system["spec"]["cleanupPolicy"]["allowNoobaaDeletion"], true);
    }
}
