//! Settings model
//!
//! Every field has a default so a partial YAML file (or none at all) yields a
//! usable configuration.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level nbctl settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Namespace the platform is installed into
    pub namespace: String,

    /// kubectl context, `None` uses the current context
    pub kube_context: Option<String>,

    /// Name of the system custom resource
    pub system_name: String,

    pub images: Images,
    pub manifests: Manifests,
    pub readiness: Readiness,
    pub azure: AzureConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            namespace: "noobaa".to_string(),
            kube_context: None,
            system_name: "noobaa".to_string(),
            images: Images::default(),
            manifests: Manifests::default(),
            readiness: Readiness::default(),
            azure: AzureConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::ConfigFileMissing(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    /// Parse settings from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Settings =
            serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
                path: PathBuf::from("<inline>"),
                message: e.to_string(),
            })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values no command could work with
    pub fn validate(&self) -> Result<()> {
        if self.namespace.trim().is_empty() {
            return Err(ConfigError::InvalidSetting(
                "namespace must not be empty".to_string(),
            ));
        }
        if self.system_name.trim().is_empty() {
            return Err(ConfigError::InvalidSetting(
                "system_name must not be empty".to_string(),
            ));
        }
        if self.readiness.interval_secs == 0 {
            return Err(ConfigError::InvalidSetting(
                "readiness.interval_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Container images deployed by the stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Images {
    pub core: String,
    pub operator: String,
    pub db: String,
}

impl Default for Images {
    fn default() -> Self {
        Self {
            core: "noobaa/noobaa-core:5.18.0".to_string(),
            operator: "noobaa/noobaa-operator:5.18.0".to_string(),
            db: "quay.io/sclorg/postgresql-15-c9s:latest".to_string(),
        }
    }
}

/// Where stage manifests come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifests {
    /// Directory holding the resource definition manifests
    pub crd_dir: PathBuf,

    /// Release manifest of the database operator
    pub cnpg_manifest_url: String,

    /// Namespace the database operator runs in
    pub cnpg_namespace: String,

    /// Deployment name of the database operator
    pub cnpg_deployment: String,
}

impl Default for Manifests {
    fn default() -> Self {
        Self {
            crd_dir: PathBuf::from("deploy/crds"),
            cnpg_manifest_url: "https://raw.githubusercontent.com/cloudnative-pg/cloudnative-pg/release-1.24/releases/cnpg-1.24.1.yaml".to_string(),
            cnpg_namespace: "cnpg-system".to_string(),
            cnpg_deployment: "cnpg-controller-manager".to_string(),
        }
    }
}

/// Readiness polling policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Readiness {
    pub interval_secs: u64,

    /// Upper bound of a single wait, 0 waits forever
    pub timeout_secs: u64,

    /// Pause after an upgrade so a stale ready state is not observed
    pub settle_secs: u64,
}

impl Default for Readiness {
    fn default() -> Self {
        Self {
            interval_secs: 3,
            timeout_secs: 600,
            settle_secs: 3,
        }
    }
}

impl Readiness {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    pub fn settle(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }
}

/// Azure identity and placement
///
/// When `federated_token_file` is set the cluster runs with workload
/// identity and the client secret is ignored.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AzureConfig {
    pub subscription_id: Option<String>,
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub federated_token_file: Option<PathBuf>,
    pub region: Option<String>,
    pub resource_group: Option<String>,

    /// Overrides for sovereign clouds
    pub authority_host: Option<String>,
    pub resource_manager: Option<String>,
    pub blob_domain: Option<String>,
}

impl fmt::Debug for AzureConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureConfig")
            .field("subscription_id", &self.subscription_id)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("federated_token_file", &self.federated_token_file)
            .field("region", &self.region)
            .field("resource_group", &self.resource_group)
            .field("authority_host", &self.authority_host)
            .field("resource_manager", &self.resource_manager)
            .field("blob_domain", &self.blob_domain)
            .finish()
    }
}

impl AzureConfig {
    /// Fill unset fields from the conventional `AZURE_*` environment variables
    pub fn merge_env(&mut self) {
        fn env(name: &str) -> Option<String> {
            std::env::var(name).ok().filter(|v| !v.is_empty())
        }
        if self.subscription_id.is_none() {
            self.subscription_id = env("AZURE_SUBSCRIPTION_ID");
        }
        if self.tenant_id.is_none() {
            self.tenant_id = env("AZURE_TENANT_ID");
        }
        if self.client_id.is_none() {
            self.client_id = env("AZURE_CLIENT_ID");
        }
        if self.client_secret.is_none() {
            self.client_secret = env("AZURE_CLIENT_SECRET");
        }
        if self.federated_token_file.is_none() {
            self.federated_token_file = env("AZURE_FEDERATED_TOKEN_FILE").map(PathBuf::from);
        }
        if self.region.is_none() {
            self.region = env("AZURE_REGION");
        }
        if self.resource_group.is_none() {
            self.resource_group = env("AZURE_RESOURCE_GROUP");
        }
    }
}
