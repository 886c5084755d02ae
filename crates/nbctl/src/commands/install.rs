use crate::utils;
use anyhow::Context;
use nbctl_config::Settings;
use nbctl_core::DeployFlags;

pub async fn handle(settings: &Settings, flags: DeployFlags) -> anyhow::Result<()> {
    let ctx = utils::deploy_context(settings, flags);
    let outcome = utils::deployment(settings)?
        .install(&ctx)
        .await
        .context("install failed")?;
    super::conclude(&outcome, "install")
}

/// Manifests only; nothing but YAML goes to stdout
pub async fn handle_yaml(settings: &Settings, flags: DeployFlags) -> anyhow::Result<()> {
    let ctx = utils::deploy_context(settings, flags);
    let yaml = utils::deployment(settings)?
        .render_yaml(&ctx)
        .await
        .context("failed to render manifests")?;
    print!("{yaml}");
    Ok(())
}
