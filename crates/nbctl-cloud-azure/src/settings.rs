//! Provisioner settings

use crate::credential::CloudCredentialMode;
use crate::error::{AzureError, Result};

/// Azure public cloud
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
pub const DEFAULT_RESOURCE_MANAGER: &str = "https://management.azure.com";
pub const DEFAULT_BLOB_DOMAIN: &str = "blob.core.windows.net";

/// Service endpoints; override for sovereign clouds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureEndpoints {
    pub authority_host: String,
    pub resource_manager: String,
    pub blob_domain: String,
}

impl Default for AzureEndpoints {
    fn default() -> Self {
        Self {
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
            resource_manager: DEFAULT_RESOURCE_MANAGER.to_string(),
            blob_domain: DEFAULT_BLOB_DOMAIN.to_string(),
        }
    }
}

impl AzureEndpoints {
    pub fn token_url(&self, tenant_id: &str) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host.trim_end_matches('/'),
            tenant_id
        )
    }

    pub fn management_scope(&self) -> String {
        format!("{}/.default", self.resource_manager.trim_end_matches('/'))
    }

    pub fn blob_account_url(&self, account: &str) -> String {
        format!("https://{}.{}", account, self.blob_domain.trim_matches('.'))
    }
}

/// Everything the provisioner needs besides per-call resource names
#[derive(Debug, Clone)]
pub struct AzureSettings {
    pub subscription_id: String,
    pub region: String,
    pub mode: CloudCredentialMode,
    pub endpoints: AzureEndpoints,
}

impl AzureSettings {
    pub fn new(
        subscription_id: impl Into<String>,
        region: impl Into<String>,
        mode: CloudCredentialMode,
    ) -> Result<Self> {
        let subscription_id = subscription_id.into();
        let region = region.into();
        if subscription_id.trim().is_empty() {
            return Err(AzureError::CredentialConstruction(
                "subscription id is missing".to_string(),
            ));
        }
        if region.trim().is_empty() {
            return Err(AzureError::CredentialConstruction(
                "region is missing".to_string(),
            ));
        }
        Ok(Self {
            subscription_id,
            region,
            mode,
            endpoints: AzureEndpoints::default(),
        })
    }

    pub fn with_endpoints(mut self, endpoints: AzureEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }
}
