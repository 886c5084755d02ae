use crate::utils;
use anyhow::Context;
use nbctl_config::Settings;
use nbctl_core::DeployFlags;

pub async fn handle(settings: &Settings, use_standalone_db: bool) -> anyhow::Result<()> {
    let flags = DeployFlags {
        use_standalone_db,
        ..Default::default()
    };
    let ctx = utils::deploy_context(settings, flags);
    let outcome = utils::deployment(settings)?
        .upgrade(&ctx)
        .await
        .context("upgrade failed")?;
    super::conclude(&outcome, "upgrade")
}
