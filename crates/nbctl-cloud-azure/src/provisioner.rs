//! Storage account and container provisioning
//!
//! Every operation resolves the credential again and builds fresh clients.
//! Nothing about accounts or containers is remembered between calls.

use crate::api::{AccountsApi, ContainersApi, CreatePoller, StorageConnector};
use crate::arm::ArmAccountsClient;
use crate::blob::BlobContainerClient;
use crate::credential::{Credential, resolve_credential};
use crate::error::{AzureError, Result};
use crate::models::{
    AccountCreateParameters, AccountKey, ContainerProperties, NameAvailability, StorageAccount,
};
use crate::settings::{AzureEndpoints, AzureSettings};
use nbctl_cloud::{LongRunningOperation, PollConfig, poll_until_done};

/// Connector issuing real HTTPS requests
#[derive(Clone, Default)]
pub struct HttpConnector {
    http: reqwest::Client,
}

impl HttpConnector {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl StorageConnector for HttpConnector {
    fn accounts(
        &self,
        settings: &AzureSettings,
        credential: Credential,
    ) -> Result<Box<dyn AccountsApi>> {
        Ok(Box::new(ArmAccountsClient::new(
            self.http.clone(),
            settings,
            credential,
        )))
    }

    fn containers(
        &self,
        endpoints: &AzureEndpoints,
        account: &str,
        account_key: &str,
    ) -> Result<Box<dyn ContainersApi>> {
        Ok(Box::new(BlobContainerClient::new(
            self.http.clone(),
            endpoints,
            account,
            account_key,
        )?))
    }
}

pub struct StorageProvisioner<C = HttpConnector> {
    settings: AzureSettings,
    connector: C,
    poll: PollConfig,
}

impl StorageProvisioner<HttpConnector> {
    pub fn new(settings: AzureSettings) -> Self {
        Self::with_connector(settings, HttpConnector::default())
    }
}

impl<C: StorageConnector> StorageProvisioner<C> {
    pub fn with_connector(settings: AzureSettings, connector: C) -> Self {
        Self {
            settings,
            connector,
            poll: PollConfig::default(),
        }
    }

    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn settings(&self) -> &AzureSettings {
        &self.settings
    }

    /// Policy every account is created with
    pub fn creation_policy(&self) -> AccountCreateParameters {
        AccountCreateParameters::fixed_policy(&self.settings.region)
    }

    fn accounts(&self) -> Result<Box<dyn AccountsApi>> {
        let credential = resolve_credential(&self.settings.mode)?;
        self.connector.accounts(&self.settings, credential)
    }

    /// Submit account creation
    ///
    /// Name availability is not checked first; the create call is the
    /// authority. The returned handle has to go through
    /// [`poll_until_done`](Self::poll_until_done) before the account is usable.
    pub async fn create_storage_account(
        &self,
        account: &str,
        resource_group: &str,
    ) -> Result<LongRunningOperation> {
        tracing::info!(%account, %resource_group, region = %self.settings.region, "creating storage account");
        self.accounts()?
            .begin_create(resource_group, account, &self.creation_policy())
            .await
    }

    /// Resolve a create handle; a failed or canceled operation is an error
    pub async fn poll_until_done(&self, op: LongRunningOperation) -> Result<StorageAccount> {
        let accounts = self.accounts()?;
        poll_until_done(&CreatePoller(accounts.as_ref()), op, &self.poll).await
    }

    pub async fn get_storage_account(
        &self,
        account: &str,
        resource_group: &str,
    ) -> Result<StorageAccount> {
        self.accounts()?.get_properties(resource_group, account).await
    }

    /// A missing account comes back as not-found; see
    /// [`AzureError::is_not_found`]
    pub async fn delete_storage_account(&self, account: &str, resource_group: &str) -> Result<()> {
        tracing::info!(%account, %resource_group, "deleting storage account");
        self.accounts()?.delete(resource_group, account).await
    }

    /// Advisory only; creation never consults it
    pub async fn check_account_name_availability(&self, account: &str) -> Result<NameAvailability> {
        self.accounts()?.check_name_availability(account).await
    }

    /// Fails with [`AzureError::NoAccountKeys`] when the account has no
    /// usable key
    pub async fn get_account_keys(
        &self,
        account: &str,
        resource_group: &str,
    ) -> Result<Vec<AccountKey>> {
        let keys = self.accounts()?.list_keys(resource_group, account).await?;
        let usable = keys
            .first()
            .and_then(|k| k.value.as_deref())
            .is_some_and(|v| !v.is_empty());
        if !usable {
            return Err(AzureError::NoAccountKeys {
                account: account.to_string(),
            });
        }
        Ok(keys)
    }

    async fn containers(&self, account: &str, resource_group: &str) -> Result<Box<dyn ContainersApi>> {
        let keys = self.get_account_keys(account, resource_group).await?;
        let primary = keys
            .into_iter()
            .next()
            .and_then(|k| k.value)
            .ok_or_else(|| AzureError::NoAccountKeys {
                account: account.to_string(),
            })?;
        self.connector
            .containers(&self.settings.endpoints, account, &primary)
    }

    pub async fn create_container(
        &self,
        account: &str,
        resource_group: &str,
        container: &str,
    ) -> Result<ContainerProperties> {
        self.containers(account, resource_group)
            .await?
            .create(container)
            .await
    }

    pub async fn get_container(
        &self,
        account: &str,
        resource_group: &str,
        container: &str,
    ) -> Result<ContainerProperties> {
        self.containers(account, resource_group)
            .await?
            .get_properties(container)
            .await
    }

    pub async fn delete_container(
        &self,
        account: &str,
        resource_group: &str,
        container: &str,
    ) -> Result<()> {
        self.containers(account, resource_group)
            .await?
            .delete(container)
            .await
    }
}
