use crate::GlobalOpts;
use anyhow::Context;
use nbctl_config::Settings;
use nbctl_core::{DeployContext, DeployFlags, Deployment, ImageSet, PollPolicy, Stage};
use nbctl_kube::{
    Kubectl, ManifestTemplates, OperatorStage, ResourceListing, SchemaStage, SystemStage,
    VersionReport,
};
use std::sync::Arc;

/// Settings file merged with the command-line overrides
pub fn load_settings(global: &GlobalOpts) -> anyhow::Result<Settings> {
    let mut settings =
        nbctl_config::load_settings(global.config.as_deref()).context("failed to load settings")?;
    global.apply(&mut settings);
    settings.validate()?;
    tracing::debug!(namespace = %settings.namespace, "settings resolved");
    Ok(settings)
}

pub fn deploy_context(settings: &Settings, flags: DeployFlags) -> DeployContext {
    DeployContext::new(&settings.namespace, &settings.system_name)
        .with_images(ImageSet {
            core: settings.images.core.clone(),
            operator: settings.images.operator.clone(),
            db: settings.images.db.clone(),
        })
        .with_flags(flags)
}

/// Orchestrator wired to the kubectl-backed stages and reports
pub fn deployment(settings: &Settings) -> anyhow::Result<Deployment> {
    let kubectl = Arc::new(Kubectl::new(settings.kube_context.clone()));
    let templates = Arc::new(ManifestTemplates::new().context("failed to load manifest templates")?);
    let manifests = &settings.manifests;

    let stages: Vec<Arc<dyn Stage>> = vec![
        Arc::new(SchemaStage::new(kubectl.clone(), manifests.crd_dir.clone())),
        Arc::new(OperatorStage::platform(kubectl.clone(), templates.clone())),
        Arc::new(OperatorStage::database(
            kubectl.clone(),
            templates.clone(),
            manifests.cnpg_manifest_url.clone(),
            manifests.cnpg_namespace.clone(),
            manifests.cnpg_deployment.clone(),
        )),
        Arc::new(SystemStage::new(kubectl.clone(), templates)),
    ];

    let readiness = &settings.readiness;
    let mut deployment = Deployment::new(stages)
        .with_versions(Arc::new(VersionReport::new(
            kubectl.clone(),
            env!("CARGO_PKG_VERSION"),
        )))
        .with_readiness(PollPolicy::new(readiness.interval(), readiness.timeout()))
        .with_settle_delay(readiness.settle());
    for listing in ResourceListing::all(&kubectl) {
        deployment = deployment.with_inventory(listing);
    }
    Ok(deployment)
}
