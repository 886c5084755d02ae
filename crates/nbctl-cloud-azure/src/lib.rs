//! nbctl Azure provider
//!
//! Storage accounts through the resource manager API and blob containers
//! through the data plane, authenticated either with a federated workload
//! identity token or a client-secret service principal.

pub mod api;
pub mod arm;
pub mod blob;
pub mod credential;
pub mod error;
pub mod models;
pub mod provisioner;
pub mod settings;
pub mod shared_key;
pub mod token;

pub use api::{AccountsApi, ContainersApi, StorageConnector};
pub use credential::{CloudCredentialMode, Credential, resolve_credential};
pub use error::{AzureError, Result};
pub use models::{
    AccountCreateParameters, AccountKey, AccountKind, ContainerProperties, MinimumTlsVersion,
    NameAvailability, Sku, SkuName, StorageAccount,
};
pub use provisioner::{HttpConnector, StorageProvisioner};
pub use settings::{AzureEndpoints, AzureSettings};
