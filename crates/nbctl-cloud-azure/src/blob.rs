//! Blob container client (data plane, Shared Key auth)

use crate::api::ContainersApi;
use crate::error::Result;
use crate::models::ContainerProperties;
use crate::settings::AzureEndpoints;
use crate::shared_key::{STORAGE_API_VERSION, SharedKeyCredential, SignableRequest, ms_date};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nbctl_cloud::CloudError;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, ETAG, HeaderMap, LAST_MODIFIED};
use reqwest::{Method, StatusCode};

const ERROR_CODE: &str = "x-ms-error-code";
const PUBLIC_ACCESS: &str = "x-ms-blob-public-access";

/// Containers of one storage account
pub struct BlobContainerClient {
    http: reqwest::Client,
    account_url: String,
    credential: SharedKeyCredential,
}

impl BlobContainerClient {
    pub fn new(
        http: reqwest::Client,
        endpoints: &AzureEndpoints,
        account: &str,
        account_key: &str,
    ) -> Result<Self> {
        Ok(Self {
            http,
            account_url: endpoints.blob_account_url(account),
            credential: SharedKeyCredential::new(account, account_key)?,
        })
    }

    pub fn container_url(&self, container: &str) -> String {
        format!("{}/{}", self.account_url, container)
    }

    fn resource(&self, container: &str) -> String {
        format!("{}/{}", self.credential.account(), container)
    }

    /// Signed container request; no metadata or public-access headers are
    /// ever added
    pub(crate) fn build_request(
        &self,
        method: Method,
        container: &str,
        now: DateTime<Utc>,
    ) -> Result<reqwest::Request> {
        let date = ms_date(now);
        let path = format!("/{container}");
        let authorization = self.credential.authorization(&SignableRequest {
            method: method.as_str(),
            path: &path,
            query: &[("restype", "container")],
            ms_headers: &[("x-ms-date", &date), ("x-ms-version", STORAGE_API_VERSION)],
            content_length: 0,
        });

        let mut builder = self
            .http
            .request(method.clone(), self.container_url(container))
            .query(&[("restype", "container")])
            .header("x-ms-date", date)
            .header("x-ms-version", STORAGE_API_VERSION)
            .header(AUTHORIZATION, authorization);
        if method == Method::PUT {
            builder = builder.header(CONTENT_LENGTH, "0");
        }
        Ok(builder.build()?)
    }

    async fn execute(&self, method: Method, container: &str) -> Result<reqwest::Response> {
        let request = self.build_request(method, container, Utc::now())?;
        tracing::debug!("{} {}", request.method(), request.url());
        let response = self.http.execute(request).await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let code = header(response.headers(), ERROR_CODE);
        let resource = self.resource(container);
        let err = match (status, code.as_deref()) {
            (StatusCode::NOT_FOUND, _) => CloudError::ResourceNotFound(resource),
            (StatusCode::CONFLICT, Some("ContainerAlreadyExists")) => {
                CloudError::ResourceAlreadyExists(resource)
            }
            (_, code) => CloudError::Api {
                status: status.as_u16(),
                message: format!("{} on {resource}", code.unwrap_or("request failed")),
            },
        };
        Err(err.into())
    }

    fn properties(&self, container: &str, headers: &HeaderMap) -> ContainerProperties {
        ContainerProperties {
            name: container.to_string(),
            url: self.container_url(container),
            etag: header(headers, ETAG.as_str()),
            last_modified: header(headers, LAST_MODIFIED.as_str()),
            public_access: header(headers, PUBLIC_ACCESS),
        }
    }
}

#[async_trait]
impl ContainersApi for BlobContainerClient {
    async fn create(&self, container: &str) -> Result<ContainerProperties> {
        let response = self.execute(Method::PUT, container).await?;
        tracing::info!(container = %self.resource(container), "container created");
        Ok(self.properties(container, response.headers()))
    }

    async fn get_properties(&self, container: &str) -> Result<ContainerProperties> {
        let response = self.execute(Method::GET, container).await?;
        Ok(self.properties(container, response.headers()))
    }

    async fn delete(&self, container: &str) -> Result<()> {
        self.execute(Method::DELETE, container).await?;
        tracing::info!(container = %self.resource(container), "container deleted");
        Ok(())
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
