//! OAuth2 client-credentials token requests

use crate::credential::Credential;
use crate::error::{AzureError, Result};
use crate::settings::AzureEndpoints;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Request a management-plane access token for `credential`
pub async fn acquire_token(
    http: &reqwest::Client,
    endpoints: &AzureEndpoints,
    credential: &Credential,
) -> Result<String> {
    let url = endpoints.token_url(credential.tenant_id());
    let form = credential.token_form(&endpoints.management_scope()).await?;

    tracing::debug!("POST {}", url);
    let response = http
        .post(&url)
        .form(&form)
        .send()
        .await
        .map_err(|e| AzureError::TokenAcquisition(e.to_string()))?;

    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(AzureError::TokenAcquisition(token_error_message(
            status.as_u16(),
            &body,
        )));
    }

    let token: TokenResponse = serde_json::from_str(&body)?;
    tracing::debug!(expires_in = ?token.expires_in, "acquired access token");
    Ok(token.access_token)
}

fn token_error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<TokenErrorResponse>(body) {
        Ok(err) => match err.error_description {
            Some(description) => format!("{} ({status}): {}", err.error, description),
            None => format!("{} ({status})", err.error),
        },
        Err(_) => format!("token endpoint returned {status}"),
    }
}
