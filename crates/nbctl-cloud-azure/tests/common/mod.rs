use async_trait::async_trait;
use nbctl_cloud::{CloudError, LongRunningOperation, OperationState};
use nbctl_cloud_azure::{
    AccountCreateParameters, AccountKey, AccountsApi, AzureSettings, CloudCredentialMode,
    ContainerProperties, ContainersApi, Credential, NameAvailability, Result, StorageAccount,
    StorageConnector,
};
use nbctl_cloud_azure::models::{AccountProperties, Sku};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TENANT: &str = "72f988bf-86f1-41af-91ab-2d7cd011db47";
pub const CLIENT: &str = "04b07795-8ddb-461a-bbee-02f9e1bf7b46";
pub const PRIMARY_KEY: &str = "a2V5MQ==";

pub fn secret_mode() -> CloudCredentialMode {
    CloudCredentialMode::ClientSecretPrincipal {
        client_id: CLIENT.to_string(),
        tenant_id: TENANT.to_string(),
        secret: "s3cret".to_string(),
    }
}

pub fn settings(mode: CloudCredentialMode) -> AzureSettings {
    AzureSettings::new("sub-1", "westeurope", mode).unwrap()
}

/// In-memory stand-in for the provider
pub struct FakeState {
    pub accounts: HashMap<(String, String), StorageAccount>,
    pub pending: HashMap<String, (u32, StorageAccount)>,
    pub containers: HashSet<(String, String)>,
    /// `None` returns a single usable key
    pub keys: Option<Vec<AccountKey>>,
    /// In-progress polls before a create finishes
    pub polls_before_done: u32,
    pub fail_create_with: Option<String>,
    pub calls: Vec<String>,
    pub connects: u32,
    pub container_keys: Vec<String>,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            accounts: HashMap::new(),
            pending: HashMap::new(),
            containers: HashSet::new(),
            keys: None,
            polls_before_done: 2,
            fail_create_with: None,
            calls: Vec::new(),
            connects: 0,
            container_keys: Vec::new(),
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeConnector {
    pub state: Arc<Mutex<FakeState>>,
}

#[allow(dead_code)]
impl FakeConnector {
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn connects(&self) -> u32 {
        self.state.lock().unwrap().connects
    }

    pub fn set_keys(&self, keys: Vec<AccountKey>) {
        self.state.lock().unwrap().keys = Some(keys);
    }
}

impl StorageConnector for FakeConnector {
    fn accounts(
        &self,
        _settings: &AzureSettings,
        _credential: Credential,
    ) -> Result<Box<dyn AccountsApi>> {
        self.state.lock().unwrap().connects += 1;
        Ok(Box::new(FakeAccounts {
            state: self.state.clone(),
        }))
    }

    fn containers(
        &self,
        _endpoints: &nbctl_cloud_azure::AzureEndpoints,
        account: &str,
        account_key: &str,
    ) -> Result<Box<dyn ContainersApi>> {
        self.state
            .lock()
            .unwrap()
            .container_keys
            .push(account_key.to_string());
        Ok(Box::new(FakeContainers {
            state: self.state.clone(),
            account: account.to_string(),
        }))
    }
}

struct FakeAccounts {
    state: Arc<Mutex<FakeState>>,
}

fn not_found(what: &str) -> nbctl_cloud_azure::AzureError {
    CloudError::ResourceNotFound(what.to_string()).into()
}

#[async_trait]
impl AccountsApi for FakeAccounts {
    async fn begin_create(
        &self,
        resource_group: &str,
        account: &str,
        parameters: &AccountCreateParameters,
    ) -> Result<LongRunningOperation> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("begin_create {account}"));

        let created = StorageAccount {
            id: format!("{resource_group}/{account}"),
            name: account.to_string(),
            location: parameters.location.clone(),
            sku: Sku {
                name: parameters.sku.name,
                tier: Some("Standard".to_string()),
            },
            kind: parameters.kind,
            properties: AccountProperties {
                provisioning_state: Some("Succeeded".to_string()),
                supports_https_traffic_only: Some(parameters.properties.supports_https_traffic_only),
                allow_blob_public_access: Some(parameters.properties.allow_blob_public_access),
                minimum_tls_version: Some(parameters.properties.minimum_tls_version),
                primary_endpoints: None,
            },
        };
        let url = format!("https://fake/operations/{resource_group}/{account}");
        let polls = state.polls_before_done;
        state.pending.insert(url.clone(), (polls, created));

        Ok(LongRunningOperation::pending(
            format!("create storage account {account}"),
            format!("{resource_group}/{account}"),
            url,
            Some(Duration::from_secs(1)),
        ))
    }

    async fn poll_create(
        &self,
        op: &LongRunningOperation,
    ) -> Result<OperationState<StorageAccount>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("poll_create".to_string());
        if let Some(detail) = state.fail_create_with.clone() {
            return Ok(OperationState::Failed(detail));
        }

        let url = op.poll_url.clone().unwrap_or_default();
        let Some((remaining, account)) = state.pending.remove(&url) else {
            return Err(not_found(&url));
        };
        if remaining > 0 {
            state.pending.insert(url, (remaining - 1, account));
            return Ok(OperationState::InProgress { retry_after: None });
        }

        let (rg, name) = op
            .resource
            .split_once('/')
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .unwrap_or_default();
        state.accounts.insert((rg, name), account.clone());
        Ok(OperationState::Succeeded(account))
    }

    async fn get_properties(&self, resource_group: &str, account: &str) -> Result<StorageAccount> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("get {account}"));
        state
            .accounts
            .get(&(resource_group.to_string(), account.to_string()))
            .cloned()
            .ok_or_else(|| not_found(account))
    }

    async fn delete(&self, resource_group: &str, account: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("delete {account}"));
        state
            .accounts
            .remove(&(resource_group.to_string(), account.to_string()))
            .map(|_| ())
            .ok_or_else(|| not_found(account))
    }

    async fn check_name_availability(&self, account: &str) -> Result<NameAvailability> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("check_name {account}"));
        let taken = state.accounts.keys().any(|(_, name)| name == account);
        Ok(NameAvailability {
            name_available: !taken,
            reason: taken.then(|| "AlreadyExists".to_string()),
            message: None,
        })
    }

    async fn list_keys(&self, resource_group: &str, account: &str) -> Result<Vec<AccountKey>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("list_keys {account}"));
        if !state
            .accounts
            .contains_key(&(resource_group.to_string(), account.to_string()))
        {
            return Err(not_found(account));
        }
        Ok(state.keys.clone().unwrap_or_else(|| {
            vec![AccountKey {
                key_name: "key1".to_string(),
                value: Some(PRIMARY_KEY.to_string()),
                permissions: Some("FULL".to_string()),
            }]
        }))
    }
}

struct FakeContainers {
    state: Arc<Mutex<FakeState>>,
    account: String,
}

impl FakeContainers {
    fn props(&self, container: &str) -> ContainerProperties {
        ContainerProperties {
            name: container.to_string(),
            url: format!("https://{}.blob.core.windows.net/{container}", self.account),
            etag: Some("\"0x1\"".to_string()),
            last_modified: None,
            public_access: None,
        }
    }
}

#[async_trait]
impl ContainersApi for FakeContainers {
    async fn create(&self, container: &str) -> Result<ContainerProperties> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("create_container {container}"));
        if !state
            .containers
            .insert((self.account.clone(), container.to_string()))
        {
            return Err(CloudError::ResourceAlreadyExists(container.to_string()).into());
        }
        Ok(self.props(container))
    }

    async fn get_properties(&self, container: &str) -> Result<ContainerProperties> {
        let state = self.state.lock().unwrap();
        if state
            .containers
            .contains(&(self.account.clone(), container.to_string()))
        {
            Ok(self.props(container))
        } else {
            Err(not_found(container))
        }
    }

    async fn delete(&self, container: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state
            .containers
            .remove(&(self.account.clone(), container.to_string()))
        {
            Ok(())
        } else {
            Err(not_found(container))
        }
    }
}
