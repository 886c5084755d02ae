//! Credential resolution
//!
//! A [`CloudCredentialMode`] is picked once from the identity configuration.
//! [`resolve_credential`] turns it into a [`Credential`] and is called again
//! for every provisioner operation; nothing is cached between calls.

use crate::error::{AzureError, Result};
use std::fmt;
use std::path::{Path, PathBuf};

const JWT_BEARER_ASSERTION: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// How the provisioner authenticates
#[derive(Clone, PartialEq, Eq)]
pub enum CloudCredentialMode {
    /// Federated token projected into the pod
    WorkloadIdentity {
        token_file: PathBuf,
        client_id: String,
        tenant_id: String,
    },
    /// Service principal with a client secret
    ClientSecretPrincipal {
        client_id: String,
        tenant_id: String,
        secret: String,
    },
}

impl CloudCredentialMode {
    /// Pick the mode from identity settings
    ///
    /// A federated token file means workload identity; otherwise a client
    /// secret is required.
    pub fn select(
        tenant_id: Option<String>,
        client_id: Option<String>,
        secret: Option<String>,
        token_file: Option<PathBuf>,
    ) -> Result<Self> {
        let tenant_id = tenant_id.unwrap_or_default();
        let client_id = client_id.unwrap_or_default();

        match (token_file, secret) {
            (Some(token_file), _) => Ok(CloudCredentialMode::WorkloadIdentity {
                token_file,
                client_id,
                tenant_id,
            }),
            (None, Some(secret)) => Ok(CloudCredentialMode::ClientSecretPrincipal {
                client_id,
                tenant_id,
                secret,
            }),
            (None, None) => Err(AzureError::CredentialConstruction(
                "either a federated token file or a client secret is required".to_string(),
            )),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CloudCredentialMode::WorkloadIdentity { .. } => "workload-identity",
            CloudCredentialMode::ClientSecretPrincipal { .. } => "client-secret",
        }
    }
}

impl fmt::Debug for CloudCredentialMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloudCredentialMode::WorkloadIdentity {
                token_file,
                client_id,
                tenant_id,
            } => f
                .debug_struct("WorkloadIdentity")
                .field("token_file", token_file)
                .field("client_id", client_id)
                .field("tenant_id", tenant_id)
                .finish(),
            CloudCredentialMode::ClientSecretPrincipal {
                client_id,
                tenant_id,
                ..
            } => f
                .debug_struct("ClientSecretPrincipal")
                .field("client_id", client_id)
                .field("tenant_id", tenant_id)
                .field("secret", &"<redacted>")
                .finish(),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
enum ClientProof {
    Secret(String),
    /// Read at token time; the file is rotated underneath us
    FederatedTokenFile(PathBuf),
}

/// A validated identity, ready to request tokens with
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    tenant_id: String,
    client_id: String,
    proof: ClientProof,
}

impl Credential {
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn is_workload_identity(&self) -> bool {
        matches!(self.proof, ClientProof::FederatedTokenFile(_))
    }

    /// Form fields of a client-credentials token request
    pub(crate) async fn token_form(&self, scope: &str) -> Result<Vec<(&'static str, String)>> {
        let mut form = vec![
            ("grant_type", "client_credentials".to_string()),
            ("client_id", self.client_id.clone()),
            ("scope", scope.to_string()),
        ];

        match &self.proof {
            ClientProof::Secret(secret) => form.push(("client_secret", secret.clone())),
            ClientProof::FederatedTokenFile(path) => {
                let assertion = tokio::fs::read_to_string(path).await.map_err(|e| {
                    AzureError::TokenAcquisition(format!(
                        "cannot read federated token file {}: {e}",
                        path.display()
                    ))
                })?;
                let assertion = assertion.trim();
                if assertion.is_empty() {
                    return Err(AzureError::TokenAcquisition(format!(
                        "federated token file {} is empty",
                        path.display()
                    )));
                }
                form.push(("client_assertion_type", JWT_BEARER_ASSERTION.to_string()));
                form.push(("client_assertion", assertion.to_string()));
            }
        }

        Ok(form)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("workload_identity", &self.is_workload_identity())
            .finish()
    }
}

/// Build a credential for `mode`
///
/// Fails with [`AzureError::CredentialConstruction`] when an identifier is
/// missing or malformed. No network access happens here.
pub fn resolve_credential(mode: &CloudCredentialMode) -> Result<Credential> {
    let credential = match mode {
        CloudCredentialMode::WorkloadIdentity {
            token_file,
            client_id,
            tenant_id,
        } => {
            validate_ids(tenant_id, client_id)?;
            validate_token_file(token_file)?;
            Credential {
                tenant_id: tenant_id.clone(),
                client_id: client_id.clone(),
                proof: ClientProof::FederatedTokenFile(token_file.clone()),
            }
        }
        CloudCredentialMode::ClientSecretPrincipal {
            client_id,
            tenant_id,
            secret,
        } => {
            validate_ids(tenant_id, client_id)?;
            if secret.trim().is_empty() {
                return Err(AzureError::CredentialConstruction(
                    "client secret is empty".to_string(),
                ));
            }
            Credential {
                tenant_id: tenant_id.clone(),
                client_id: client_id.clone(),
                proof: ClientProof::Secret(secret.clone()),
            }
        }
    };

    tracing::debug!(mode = mode.name(), tenant = %credential.tenant_id, "resolved credential");
    Ok(credential)
}

fn validate_ids(tenant_id: &str, client_id: &str) -> Result<()> {
    if tenant_id.is_empty() {
        return Err(AzureError::CredentialConstruction(
            "tenant id is missing".to_string(),
        ));
    }
    if !is_guid(tenant_id) && !is_domain(tenant_id) {
        return Err(AzureError::CredentialConstruction(format!(
            "tenant id {tenant_id:?} is neither a GUID nor a domain name"
        )));
    }
    if client_id.is_empty() {
        return Err(AzureError::CredentialConstruction(
            "client id is missing".to_string(),
        ));
    }
    if !is_guid(client_id) {
        return Err(AzureError::CredentialConstruction(format!(
            "client id {client_id:?} is not a GUID"
        )));
    }
    Ok(())
}

fn validate_token_file(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(AzureError::CredentialConstruction(
            "federated token file path is missing".to_string(),
        ));
    }
    Ok(())
}

/// 8-4-4-4-12 hex digits
fn is_guid(s: &str) -> bool {
    let groups: Vec<&str> = s.split('-').collect();
    groups.len() == 5
        && groups
            .iter()
            .zip([8, 4, 4, 4, 12])
            .all(|(g, len)| g.len() == len && g.chars().all(|c| c.is_ascii_hexdigit()))
}

fn is_domain(s: &str) -> bool {
    s.contains('.')
        && s.split('.').all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}
