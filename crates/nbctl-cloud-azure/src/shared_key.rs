//! Shared Key request signing for the blob data plane

use crate::error::{AzureError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ring::hmac;

pub const STORAGE_API_VERSION: &str = "2021-08-06";

/// The parts of a request that go into the signature
#[derive(Debug, Clone)]
pub struct SignableRequest<'a> {
    pub method: &'a str,
    /// Path below the account, starting with `/`
    pub path: &'a str,
    pub query: &'a [(&'a str, &'a str)],
    /// Every `x-ms-*` header sent
    pub ms_headers: &'a [(&'a str, &'a str)],
    pub content_length: u64,
}

/// Account name plus decoded account key
pub struct SharedKeyCredential {
    account: String,
    key: hmac::Key,
}

impl SharedKeyCredential {
    pub fn new(account: impl Into<String>, account_key: &str) -> Result<Self> {
        let account = account.into();
        let decoded = STANDARD.decode(account_key.trim()).map_err(|e| {
            AzureError::CredentialConstruction(format!(
                "account key of {account} is not valid base64: {e}"
            ))
        })?;
        Ok(Self {
            account,
            key: hmac::Key::new(hmac::HMAC_SHA256, &decoded),
        })
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn string_to_sign(&self, request: &SignableRequest<'_>) -> String {
        // zero length is signed as empty
        let content_length = match request.content_length {
            0 => String::new(),
            n => n.to_string(),
        };

        let mut out = String::new();
        out.push_str(&request.method.to_ascii_uppercase());
        out.push('\n');
        // Content-Encoding, Content-Language
        out.push_str("\n\n");
        out.push_str(&content_length);
        out.push('\n');
        // Content-MD5, Content-Type, Date, If-Modified-Since, If-Match,
        // If-None-Match, If-Unmodified-Since, Range
        out.push_str(&"\n".repeat(8));
        out.push_str(&canonical_headers(request.ms_headers));
        out.push_str(&self.canonical_resource(request.path, request.query));
        out
    }

    pub fn sign(&self, string_to_sign: &str) -> String {
        let tag = hmac::sign(&self.key, string_to_sign.as_bytes());
        STANDARD.encode(tag.as_ref())
    }

    /// Value of the `Authorization` header
    pub fn authorization(&self, request: &SignableRequest<'_>) -> String {
        let signature = self.sign(&self.string_to_sign(request));
        format!("SharedKey {}:{}", self.account, signature)
    }

    fn canonical_resource(&self, path: &str, query: &[(&str, &str)]) -> String {
        let mut resource = format!("/{}{}", self.account, path);

        let mut params: Vec<(String, &str)> = query
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), *v))
            .collect();
        params.sort();

        let mut i = 0;
        while i < params.len() {
            let name = params[i].0.clone();
            let mut values = Vec::new();
            while i < params.len() && params[i].0 == name {
                values.push(params[i].1);
                i += 1;
            }
            resource.push_str(&format!("\n{}:{}", name, values.join(",")));
        }
        resource
    }
}

fn canonical_headers(headers: &[(&str, &str)]) -> String {
    let mut headers: Vec<(String, &str)> = headers
        .iter()
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim()))
        .filter(|(k, _)| k.starts_with("x-ms-"))
        .collect();
    headers.sort();
    headers
        .into_iter()
        .map(|(k, v)| format!("{k}:{v}\n"))
        .collect()
}

/// RFC 1123 timestamp for `x-ms-date`
pub fn ms_date(now: chrono::DateTime<chrono::Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
