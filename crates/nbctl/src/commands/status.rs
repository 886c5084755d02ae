use crate::utils;
use nbctl_config::Settings;
use nbctl_core::DeployFlags;

/// Read-only; stage errors are printed inline and never fail the command
pub async fn handle(settings: &Settings) -> anyhow::Result<()> {
    let ctx = utils::deploy_context(settings, DeployFlags::default());
    let outcome = utils::deployment(settings)?.status(&ctx).await;
    super::conclude(&outcome, "status")
}
