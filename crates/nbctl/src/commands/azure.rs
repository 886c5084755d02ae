use crate::{AccountCommands, AzureCommands, ContainerCommands, ResourceGroupOpt};
use anyhow::Context;
use colored::Colorize;
use nbctl_cloud_azure::{
    AzureEndpoints, AzureSettings, CloudCredentialMode, StorageConnector, StorageProvisioner,
};
use nbctl_config::{AzureConfig, Settings};

pub async fn handle(settings: &Settings, command: AzureCommands) -> anyhow::Result<()> {
    let mut config = settings.azure.clone();
    config.merge_env();
    let provisioner = StorageProvisioner::new(azure_settings(&config)?);

    match command {
        AzureCommands::Account(command) => account(&provisioner, &config, command).await,
        AzureCommands::Container(command) => container(&provisioner, &config, command).await,
    }
}

/// Provisioner settings from the merged file and environment values
pub fn azure_settings(config: &AzureConfig) -> anyhow::Result<AzureSettings> {
    let mode = CloudCredentialMode::select(
        config.tenant_id.clone(),
        config.client_id.clone(),
        config.client_secret.clone(),
        config.federated_token_file.clone(),
    )?;
    tracing::debug!(mode = mode.name(), "azure credential mode selected");

    let mut endpoints = AzureEndpoints::default();
    if let Some(host) = &config.authority_host {
        endpoints.authority_host = host.clone();
    }
    if let Some(manager) = &config.resource_manager {
        endpoints.resource_manager = manager.clone();
    }
    if let Some(domain) = &config.blob_domain {
        endpoints.blob_domain = domain.clone();
    }

    let settings = AzureSettings::new(
        config.subscription_id.clone().unwrap_or_default(),
        config.region.clone().unwrap_or_default(),
        mode,
    )?;
    Ok(settings.with_endpoints(endpoints))
}

fn resource_group(opt: &ResourceGroupOpt, config: &AzureConfig) -> anyhow::Result<String> {
    opt.resource_group
        .clone()
        .or_else(|| config.resource_group.clone())
        .context("resource group is required: pass --resource-group or set azure.resource_group")
}

async fn account<C: StorageConnector>(
    provisioner: &StorageProvisioner<C>,
    config: &AzureConfig,
    command: AccountCommands,
) -> anyhow::Result<()> {
    match command {
        AccountCommands::Create {
            name,
            group,
            no_wait,
        } => {
            let group = resource_group(&group, config)?;
            println!(
                "{}",
                format!(
                    "Creating storage account {name} in {}...",
                    provisioner.settings().region
                )
                .blue()
            );
            let op = provisioner
                .create_storage_account(&name, &group)
                .await
                .with_context(|| format!("failed to create storage account {name}"))?;

            if no_wait {
                if op.is_completed() {
                    println!("{} storage account {name} created", "✓".green());
                } else {
                    println!(
                        "{}",
                        "NOTE: creation submitted, not waiting for it to finish".yellow()
                    );
                }
                return Ok(());
            }

            let created = provisioner
                .poll_until_done(op)
                .await
                .with_context(|| format!("creating storage account {name} did not succeed"))?;
            println!("{} storage account {} created", "✓".green(), created.name);
            print!("{created}");
            Ok(())
        }
        AccountCommands::Show { name, group } => {
            let group = resource_group(&group, config)?;
            let account = provisioner
                .get_storage_account(&name, &group)
                .await
                .with_context(|| format!("failed to get storage account {name}"))?;
            print!("{account}");
            if !account.matches_policy(&provisioner.creation_policy()) {
                println!(
                    "{}",
                    "⚠ account settings differ from the creation policy".yellow()
                );
            }
            Ok(())
        }
        AccountCommands::Delete { name, group } => {
            let group = resource_group(&group, config)?;
            match provisioner.delete_storage_account(&name, &group).await {
                Ok(()) => println!("{} storage account {name} deleted", "✓".green()),
                Err(e) if e.is_not_found() => {
                    println!("  storage account {name} does not exist")
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("failed to delete storage account {name}"));
                }
            }
            Ok(())
        }
        AccountCommands::CheckName { name } => {
            let availability = provisioner
                .check_account_name_availability(&name)
                .await
                .with_context(|| format!("failed to check account name {name}"))?;
            if availability.name_available {
                println!("{} {name} is available", "✓".green());
            } else {
                println!(
                    "{} {name} is not available: {}",
                    "✗".red(),
                    availability
                        .message
                        .or(availability.reason)
                        .unwrap_or_else(|| "no reason given".to_string())
                );
            }
            Ok(())
        }
        AccountCommands::Keys { name, group } => {
            let group = resource_group(&group, config)?;
            let keys = provisioner
                .get_account_keys(&name, &group)
                .await
                .with_context(|| format!("failed to list keys of storage account {name}"))?;
            for key in keys {
                println!(
                    "{} ({}): {}",
                    key.key_name.bold(),
                    key.permissions.as_deref().unwrap_or("unknown"),
                    key.value.as_deref().unwrap_or("")
                );
            }
            Ok(())
        }
    }
}

async fn container<C: StorageConnector>(
    provisioner: &StorageProvisioner<C>,
    config: &AzureConfig,
    command: ContainerCommands,
) -> anyhow::Result<()> {
    match command {
        ContainerCommands::Create {
            account,
            name,
            group,
        } => {
            let group = resource_group(&group, config)?;
            let created = provisioner
                .create_container(&account, &group, &name)
                .await
                .with_context(|| format!("failed to create container {account}/{name}"))?;
            println!("{} container {account}/{name} created", "✓".green());
            print!("{created}");
            Ok(())
        }
        ContainerCommands::Show {
            account,
            name,
            group,
        } => {
            let group = resource_group(&group, config)?;
            let container = provisioner
                .get_container(&account, &group, &name)
                .await
                .with_context(|| format!("failed to get container {account}/{name}"))?;
            print!("{container}");
            Ok(())
        }
        ContainerCommands::Delete {
            account,
            name,
            group,
        } => {
            let group = resource_group(&group, config)?;
            match provisioner.delete_container(&account, &group, &name).await {
                Ok(()) => println!("{} container {account}/{name} deleted", "✓".green()),
                Err(e) if e.is_not_found() => {
                    println!("  container {account}/{name} does not exist")
                }
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("failed to delete container {account}/{name}"));
                }
            }
            Ok(())
        }
    }
}
