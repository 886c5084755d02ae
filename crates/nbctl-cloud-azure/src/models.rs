//! Storage resource models (resource manager JSON shapes)

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkuName {
    #[serde(rename = "Standard_LRS")]
    StandardLrs,
    #[serde(rename = "Standard_GRS")]
    StandardGrs,
    #[serde(rename = "Standard_RAGRS")]
    StandardRagrs,
    #[serde(rename = "Standard_ZRS")]
    StandardZrs,
    #[serde(rename = "Premium_LRS")]
    PremiumLrs,
    #[serde(rename = "Premium_ZRS")]
    PremiumZrs,
    #[serde(other)]
    Other,
}

impl SkuName {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkuName::StandardLrs => "Standard_LRS",
            SkuName::StandardGrs => "Standard_GRS",
            SkuName::StandardRagrs => "Standard_RAGRS",
            SkuName::StandardZrs => "Standard_ZRS",
            SkuName::PremiumLrs => "Premium_LRS",
            SkuName::PremiumZrs => "Premium_ZRS",
            SkuName::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountKind {
    Storage,
    StorageV2,
    BlobStorage,
    FileStorage,
    BlockBlobStorage,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MinimumTlsVersion {
    #[serde(rename = "TLS1_0")]
    Tls10,
    #[serde(rename = "TLS1_1")]
    Tls11,
    #[serde(rename = "TLS1_2")]
    Tls12,
    #[serde(other)]
    Other,
}

impl MinimumTlsVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            MinimumTlsVersion::Tls10 => "TLS1_0",
            MinimumTlsVersion::Tls11 => "TLS1_1",
            MinimumTlsVersion::Tls12 => "TLS1_2",
            MinimumTlsVersion::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sku {
    pub name: SkuName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
}

/// Body of a storage account create request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountCreateParameters {
    pub sku: Sku,
    pub kind: AccountKind,
    pub location: String,
    pub properties: AccountCreateProperties,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountCreateProperties {
    pub supports_https_traffic_only: bool,
    pub allow_blob_public_access: bool,
    pub minimum_tls_version: MinimumTlsVersion,
}

impl AccountCreateParameters {
    /// The only policy accounts are created with
    pub fn fixed_policy(region: impl Into<String>) -> Self {
        Self {
            sku: Sku {
                name: SkuName::StandardLrs,
                tier: None,
            },
            kind: AccountKind::StorageV2,
            location: region.into(),
            properties: AccountCreateProperties {
                supports_https_traffic_only: true,
                allow_blob_public_access: false,
                minimum_tls_version: MinimumTlsVersion::Tls12,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageAccount {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub location: String,
    pub sku: Sku,
    pub kind: AccountKind,
    #[serde(default)]
    pub properties: AccountProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountProperties {
    #[serde(default)]
    pub provisioning_state: Option<String>,
    #[serde(default)]
    pub supports_https_traffic_only: Option<bool>,
    #[serde(default)]
    pub allow_blob_public_access: Option<bool>,
    #[serde(default)]
    pub minimum_tls_version: Option<MinimumTlsVersion>,
    #[serde(default)]
    pub primary_endpoints: Option<Endpoints>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    #[serde(default)]
    pub blob: Option<String>,
}

impl StorageAccount {
    /// Whether the account still carries the creation policy
    pub fn matches_policy(&self, policy: &AccountCreateParameters) -> bool {
        self.sku.name == policy.sku.name
            && self.kind == policy.kind
            && self.properties.minimum_tls_version
                == Some(policy.properties.minimum_tls_version)
            && self.properties.supports_https_traffic_only
                == Some(policy.properties.supports_https_traffic_only)
            && self.properties.allow_blob_public_access
                == Some(policy.properties.allow_blob_public_access)
    }
}

impl fmt::Display for StorageAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name:      {}", self.name)?;
        writeln!(f, "Location:  {}", self.location)?;
        writeln!(f, "SKU:       {}", self.sku.name.as_str())?;
        writeln!(f, "Kind:      {:?}", self.kind)?;
        if let Some(tls) = self.properties.minimum_tls_version {
            writeln!(f, "Min TLS:   {}", tls.as_str())?;
        }
        if let Some(state) = &self.properties.provisioning_state {
            writeln!(f, "State:     {state}")?;
        }
        if let Some(blob) = self
            .properties
            .primary_endpoints
            .as_ref()
            .and_then(|e| e.blob.as_ref())
        {
            writeln!(f, "Blob:      {blob}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountKey {
    pub key_name: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub permissions: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct AccountKeyList {
    #[serde(default)]
    pub keys: Vec<AccountKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameAvailability {
    pub name_available: bool,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Blob container as reported by the data plane headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerProperties {
    pub name: String,
    pub url: String,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub public_access: Option<String>,
}

impl fmt::Display for ContainerProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name:          {}", self.name)?;
        writeln!(f, "URL:           {}", self.url)?;
        if let Some(modified) = &self.last_modified {
            writeln!(f, "Last modified: {modified}")?;
        }
        writeln!(
            f,
            "Public access: {}",
            self.public_access.as_deref().unwrap_or("none")
        )
    }
}
