//! Client seams used by the provisioner
//!
//! The HTTP implementations live in [`crate::arm`] and [`crate::blob`].
//! A [`StorageConnector`] builds fresh clients for every operation.

use crate::credential::Credential;
use crate::error::{AzureError, Result};
use crate::models::{
    AccountCreateParameters, AccountKey, ContainerProperties, NameAvailability, StorageAccount,
};
use crate::settings::{AzureEndpoints, AzureSettings};
use async_trait::async_trait;
use nbctl_cloud::{LongRunningOperation, OperationPoller, OperationState};

/// Management plane operations on storage accounts
#[async_trait]
pub trait AccountsApi: Send + Sync {
    /// Submit a create; the returned handle must be polled
    async fn begin_create(
        &self,
        resource_group: &str,
        account: &str,
        parameters: &AccountCreateParameters,
    ) -> Result<LongRunningOperation>;

    /// One status query for a create submitted by `begin_create`
    async fn poll_create(
        &self,
        op: &LongRunningOperation,
    ) -> Result<OperationState<StorageAccount>>;

    async fn get_properties(&self, resource_group: &str, account: &str) -> Result<StorageAccount>;

    async fn delete(&self, resource_group: &str, account: &str) -> Result<()>;

    async fn check_name_availability(&self, account: &str) -> Result<NameAvailability>;

    async fn list_keys(&self, resource_group: &str, account: &str) -> Result<Vec<AccountKey>>;
}

/// Data plane operations on one account's containers
#[async_trait]
pub trait ContainersApi: Send + Sync {
    /// No metadata, no public access
    async fn create(&self, container: &str) -> Result<ContainerProperties>;

    async fn get_properties(&self, container: &str) -> Result<ContainerProperties>;

    async fn delete(&self, container: &str) -> Result<()>;
}

/// Builds authenticated clients
pub trait StorageConnector: Send + Sync {
    fn accounts(
        &self,
        settings: &AzureSettings,
        credential: Credential,
    ) -> Result<Box<dyn AccountsApi>>;

    /// Client scoped to `account`, authenticated with `account_key`
    fn containers(
        &self,
        endpoints: &AzureEndpoints,
        account: &str,
        account_key: &str,
    ) -> Result<Box<dyn ContainersApi>>;
}

/// Drives [`AccountsApi::poll_create`] from the generic poll loop
pub(crate) struct CreatePoller<'a>(pub &'a dyn AccountsApi);

#[async_trait]
impl OperationPoller for CreatePoller<'_> {
    type Output = StorageAccount;
    type Error = AzureError;

    async fn poll_once(&self, op: &LongRunningOperation) -> Result<OperationState<StorageAccount>> {
        self.0.poll_create(op).await
    }
}
