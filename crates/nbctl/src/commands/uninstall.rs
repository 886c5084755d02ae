use crate::utils;
use anyhow::Context;
use nbctl_config::Settings;
use nbctl_core::{ConfirmationGate, DeployFlags};

const CLEANUP_QUESTION: &str = "--cleanup removes the namespace and the CRDs (cluster scope), affecting every NooBaa system and database in the cluster. Are you sure? y/n";

pub async fn handle(settings: &Settings, cleanup: bool, cleanup_data: bool) -> anyhow::Result<()> {
    let flags = DeployFlags {
        cleanup,
        cleanup_data,
        ..Default::default()
    };
    let ctx = utils::deploy_context(settings, flags);
    let mut gate = ConfirmationGate::stdin(CLEANUP_QUESTION);
    utils::deployment(settings)?
        .uninstall(&ctx, &mut gate)
        .await
        .context("uninstall failed")
}
