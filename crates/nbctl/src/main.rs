mod commands;
mod utils;

use clap::{Args, Parser, Subcommand};
use nbctl_config::Settings;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nbctl")]
#[command(version, about = "Install and manage a NooBaa object storage system", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides applied on top of the settings file
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Namespace the system lives in
    #[arg(short = 'n', long, env = "NBCTL_NAMESPACE", global = true)]
    pub namespace: Option<String>,

    /// kubeconfig context to use
    #[arg(long, env = "NBCTL_KUBE_CONTEXT", global = true)]
    pub kube_context: Option<String>,

    /// Core image of the system
    #[arg(long, global = true)]
    pub noobaa_image: Option<String>,

    /// Operator image
    #[arg(long, global = true)]
    pub operator_image: Option<String>,

    /// Database image
    #[arg(long, global = true)]
    pub db_image: Option<String>,

    /// Settings file (default: discovered, see NBCTL_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

impl GlobalOpts {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(namespace) = &self.namespace {
            settings.namespace = namespace.clone();
        }
        if let Some(context) = &self.kube_context {
            settings.kube_context = Some(context.clone());
        }
        if let Some(image) = &self.noobaa_image {
            settings.images.core = image.clone();
        }
        if let Some(image) = &self.operator_image {
            settings.images.operator = image.clone();
        }
        if let Some(image) = &self.db_image {
            settings.images.db = image.clone();
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Install the operator and create the system
    Install {
        #[command(subcommand)]
        command: Option<InstallCommands>,
        /// Let bucket claims delete their buckets on removal
        #[arg(long)]
        use_obc_cleanup_policy: bool,
        /// Run the standalone database instead of the database operator
        #[arg(long)]
        use_standalone_db: bool,
        /// Return right after the system is created
        #[arg(long)]
        no_wait: bool,
    },
    /// Upgrade every installed component to the configured images
    Upgrade {
        /// The system runs the standalone database
        #[arg(long)]
        use_standalone_db: bool,
    },
    /// Remove the system and the operator
    Uninstall {
        /// Also remove the namespace and the cluster-wide resource definitions
        #[arg(long)]
        cleanup: bool,
        /// Destroy bucket data together with the system
        #[arg(long = "cleanup_data")]
        cleanup_data: bool,
    },
    /// Report the state of every component
    Status,
    /// Provision Azure storage accounts and containers
    #[command(subcommand)]
    Azure(AzureCommands),
}

#[derive(Subcommand)]
enum InstallCommands {
    /// Print the manifests install would apply, without touching the cluster
    Yaml,
}

#[derive(Subcommand)]
pub enum AzureCommands {
    /// Storage accounts
    #[command(subcommand)]
    Account(AccountCommands),
    /// Blob containers
    #[command(subcommand)]
    Container(ContainerCommands),
}

/// Resource group shared by every Azure command
#[derive(Args, Debug, Clone)]
pub struct ResourceGroupOpt {
    /// Resource group (default: azure.resource_group / AZURE_RESOURCE_GROUP)
    #[arg(short = 'g', long)]
    pub resource_group: Option<String>,
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create a storage account with the fixed security policy
    Create {
        name: String,
        #[command(flatten)]
        group: ResourceGroupOpt,
        /// Submit the creation and return without waiting
        #[arg(long)]
        no_wait: bool,
    },
    /// Show a storage account
    Show {
        name: String,
        #[command(flatten)]
        group: ResourceGroupOpt,
    },
    /// Delete a storage account
    Delete {
        name: String,
        #[command(flatten)]
        group: ResourceGroupOpt,
    },
    /// Check whether an account name is still free
    CheckName { name: String },
    /// List the access keys of a storage account
    Keys {
        name: String,
        #[command(flatten)]
        group: ResourceGroupOpt,
    },
}

#[derive(Subcommand)]
pub enum ContainerCommands {
    /// Create a private blob container
    Create {
        account: String,
        name: String,
        #[command(flatten)]
        group: ResourceGroupOpt,
    },
    /// Show a blob container
    Show {
        account: String,
        name: String,
        #[command(flatten)]
        group: ResourceGroupOpt,
    },
    /// Delete a blob container
    Delete {
        account: String,
        name: String,
        #[command(flatten)]
        group: ResourceGroupOpt,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries reports (and `install yaml`); diagnostics go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let settings = utils::load_settings(&cli.global)?;

    match cli.command {
        Commands::Install {
            command: Some(InstallCommands::Yaml),
            use_obc_cleanup_policy,
            use_standalone_db,
            ..
        } => {
            let flags = nbctl_core::DeployFlags {
                use_obc_cleanup_policy,
                use_standalone_db,
                ..Default::default()
            };
            commands::install::handle_yaml(&settings, flags).await
        }
        Commands::Install {
            command: None,
            use_obc_cleanup_policy,
            use_standalone_db,
            no_wait,
        } => {
            let flags = nbctl_core::DeployFlags {
                use_obc_cleanup_policy,
                use_standalone_db,
                no_wait,
                ..Default::default()
            };
            commands::install::handle(&settings, flags).await
        }
        Commands::Upgrade { use_standalone_db } => {
            commands::upgrade::handle(&settings, use_standalone_db).await
        }
        Commands::Uninstall {
            cleanup,
            cleanup_data,
        } => commands::uninstall::handle(&settings, cleanup, cleanup_data).await,
        Commands::Status => commands::status::handle(&settings).await,
        Commands::Azure(command) => commands::azure::handle(&settings, command).await,
    }
}
