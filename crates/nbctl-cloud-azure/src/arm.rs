//! Resource manager client for storage accounts

use crate::api::AccountsApi;
use crate::credential::Credential;
use crate::error::Result;
use crate::models::{
    AccountCreateParameters, AccountKey, AccountKeyList, NameAvailability, StorageAccount,
};
use crate::settings::{AzureEndpoints, AzureSettings};
use crate::token::acquire_token;
use async_trait::async_trait;
use nbctl_cloud::{CloudError, LongRunningOperation, OperationState};
use reqwest::StatusCode;
use reqwest::header::{CONTENT_LENGTH, HeaderMap, LOCATION, RETRY_AFTER};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::OnceCell;

pub const ARM_API_VERSION: &str = "2023-05-01";

const ASYNC_OPERATION: &str = "azure-asyncoperation";
const ACCOUNT_RESOURCE_TYPE: &str = "Microsoft.Storage/storageAccounts";

/// Storage accounts client for one subscription
///
/// Built per operation; the access token is fetched on first use and lives
/// only as long as the client.
pub struct ArmAccountsClient {
    http: reqwest::Client,
    endpoints: AzureEndpoints,
    subscription_id: String,
    credential: Credential,
    token: OnceCell<String>,
}

impl ArmAccountsClient {
    pub fn new(http: reqwest::Client, settings: &AzureSettings, credential: Credential) -> Self {
        Self {
            http,
            endpoints: settings.endpoints.clone(),
            subscription_id: settings.subscription_id.clone(),
            credential,
            token: OnceCell::new(),
        }
    }

    /// Resource id of a storage account
    pub fn account_id(&self, resource_group: &str, account: &str) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/{}/{}",
            self.subscription_id, resource_group, ACCOUNT_RESOURCE_TYPE, account
        )
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}{}?api-version={}",
            self.endpoints.resource_manager.trim_end_matches('/'),
            path,
            ARM_API_VERSION
        )
    }

    async fn bearer(&self) -> Result<&str> {
        let token = self
            .token
            .get_or_try_init(|| acquire_token(&self.http, &self.endpoints, &self.credential))
            .await?;
        Ok(token.as_str())
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let request = request.bearer_auth(self.bearer().await?).build()?;
        tracing::debug!("{} {}", request.method(), request.url());
        Ok(self.http.execute(request).await?)
    }

    async fn get_by_id(&self, id: &str) -> Result<StorageAccount> {
        let response = self.send(self.http.get(self.url(id))).await?;
        let response = check(response, id).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl AccountsApi for ArmAccountsClient {
    async fn begin_create(
        &self,
        resource_group: &str,
        account: &str,
        parameters: &AccountCreateParameters,
    ) -> Result<LongRunningOperation> {
        let id = self.account_id(resource_group, account);
        let operation = format!("create storage account {account}");

        let response = self
            .send(self.http.put(self.url(&id)).json(parameters))
            .await?;
        let status = response.status();
        let headers = response.headers().clone();
        check(response, &id).await?;

        if status == StatusCode::OK {
            return Ok(LongRunningOperation::completed(operation, id));
        }

        match poll_url(&headers) {
            Some(url) => {
                tracing::info!(%account, %url, "storage account create accepted");
                Ok(LongRunningOperation::pending(
                    operation,
                    id,
                    url,
                    retry_after(&headers),
                ))
            }
            None => Ok(LongRunningOperation::completed(operation, id)),
        }
    }

    async fn poll_create(
        &self,
        op: &LongRunningOperation,
    ) -> Result<OperationState<StorageAccount>> {
        let Some(url) = &op.poll_url else {
            return Ok(OperationState::Succeeded(self.get_by_id(&op.resource).await?));
        };

        let response = self.send(self.http.get(url)).await?;
        let status = response.status();
        let headers = response.headers().clone();

        if status == StatusCode::ACCEPTED {
            return Ok(OperationState::InProgress {
                retry_after: retry_after(&headers),
            });
        }

        let response = check(response, &op.resource).await?;
        let body = response.text().await?;

        match interpret_poll_body(&body)? {
            PollBody::Resource(account) => Ok(OperationState::Succeeded(*account)),
            PollBody::Status(OperationState::Succeeded(())) => Ok(OperationState::Succeeded(
                self.get_by_id(&op.resource).await?,
            )),
            PollBody::Status(OperationState::InProgress { .. }) => {
                Ok(OperationState::InProgress {
                    retry_after: retry_after(&headers),
                })
            }
            PollBody::Status(OperationState::Failed(detail)) => Ok(OperationState::Failed(detail)),
            PollBody::Status(OperationState::Canceled) => Ok(OperationState::Canceled),
        }
    }

    async fn get_properties(&self, resource_group: &str, account: &str) -> Result<StorageAccount> {
        self.get_by_id(&self.account_id(resource_group, account))
            .await
    }

    async fn delete(&self, resource_group: &str, account: &str) -> Result<()> {
        let id = self.account_id(resource_group, account);
        let response = self.send(self.http.delete(self.url(&id))).await?;
        if response.status() == StatusCode::NO_CONTENT {
            // 204 means it was already gone
            return Err(CloudError::ResourceNotFound(id).into());
        }
        check(response, &id).await?;
        Ok(())
    }

    async fn check_name_availability(&self, account: &str) -> Result<NameAvailability> {
        let path = format!(
            "/subscriptions/{}/providers/Microsoft.Storage/checkNameAvailability",
            self.subscription_id
        );
        let body = serde_json::json!({ "name": account, "type": ACCOUNT_RESOURCE_TYPE });
        let response = self.send(self.http.post(self.url(&path)).json(&body)).await?;
        let response = check(response, account).await?;
        Ok(response.json().await?)
    }

    async fn list_keys(&self, resource_group: &str, account: &str) -> Result<Vec<AccountKey>> {
        let id = self.account_id(resource_group, account);
        let url = self.url(&format!("{id}/listKeys"));
        let response = self
            .send(self.http.post(url).header(CONTENT_LENGTH, "0"))
            .await?;
        let response = check(response, &id).await?;
        let keys: AccountKeyList = response.json().await?;
        Ok(keys.keys)
    }
}

/// Map a non-success response onto the error taxonomy
async fn check(response: reqwest::Response, resource: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(CloudError::ResourceNotFound(resource.to_string()).into());
    }
    let body = response.text().await.unwrap_or_default();
    Err(CloudError::Api {
        status: status.as_u16(),
        message: arm_error_message(&body),
    }
    .into())
}

#[derive(Debug, Deserialize)]
struct ArmErrorBody {
    error: ArmErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ArmErrorDetail {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

fn arm_error_message(body: &str) -> String {
    match serde_json::from_str::<ArmErrorBody>(body) {
        Ok(ArmErrorBody { error }) if !error.code.is_empty() => {
            format!("{}: {}", error.code, error.message)
        }
        Ok(ArmErrorBody { error }) => error.message,
        Err(_) if body.trim().is_empty() => "no error details".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

fn poll_url(headers: &HeaderMap) -> Option<String> {
    headers
        .get(ASYNC_OPERATION)
        .or_else(|| headers.get(LOCATION))
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Delay-seconds form only
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[derive(Debug)]
enum PollBody {
    Status(OperationState<()>),
    Resource(Box<StorageAccount>),
}

#[derive(Debug, Deserialize)]
struct AsyncOperationBody {
    status: String,
    #[serde(default)]
    error: Option<ArmErrorDetail>,
}

/// Body of a 200 from a status URL: either an async-operation status or
/// the finished resource itself. Empty means done.
fn interpret_poll_body(body: &str) -> Result<PollBody> {
    if body.trim().is_empty() {
        return Ok(PollBody::Status(OperationState::Succeeded(())));
    }

    let value: serde_json::Value = serde_json::from_str(body)?;
    if value.get("status").is_some() {
        let op: AsyncOperationBody = serde_json::from_value(value)?;
        let state = match op.status.as_str() {
            "Succeeded" => OperationState::Succeeded(()),
            "Failed" => OperationState::Failed(
                op.error
                    .map(|e| format!("{}: {}", e.code, e.message))
                    .unwrap_or_else(|| "operation failed without details".to_string()),
            ),
            "Canceled" => OperationState::Canceled,
            _ => OperationState::InProgress { retry_after: None },
        };
        return Ok(PollBody::Status(state));
    }

    let account: StorageAccount = serde_json::from_value(value)?;
    Ok(PollBody::Resource(Box::new(account)))
}
