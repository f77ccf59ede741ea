//! Mercado Pago REST client and webhook signature checks

use async_trait::async_trait;
use hmac::{digest::InvalidLength, Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use sha2::Sha256;
use std::time::Duration;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Errors talking to the payment provider
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Payment provider request failed: {0}")]
    Transport(String),

    #[error("Payment provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode payment: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::Decode(err.to_string())
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}

/// Authoritative payment state as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderPayment {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub status_detail: Option<String>,
    #[serde(default)]
    pub external_reference: Option<String>,
}

/// Mercado Pago sends numeric ids in payment bodies and string ids in
/// notifications; both are normalized to strings.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

/// Source of authoritative payment details
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn fetch_payment(&self, payment_id: &str) -> Result<ProviderPayment, ProviderError>;
}

/// Mercado Pago `/v1/payments` client
pub struct MercadoPagoClient {
    http: Client,
    api_url: String,
    access_token: String,
}

impl MercadoPagoClient {
    pub fn new(
        api_url: String,
        access_token: String,
        timeout_seconds: u64,
    ) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            api_url,
            access_token,
        })
    }
}

#[async_trait]
impl PaymentProvider for MercadoPagoClient {
    async fn fetch_payment(&self, payment_id: &str) -> Result<ProviderPayment, ProviderError> {
        let response = self
            .http
            .get(format!("{}/v1/payments/{}", self.api_url, payment_id))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        Ok(response.json::<ProviderPayment>().await?)
    }
}

/// Extract the hash component of an `x-signature` header.
///
/// Accepts a bare hex digest, `key=hex`, or the provider's
/// `ts=...,v1=hex` form.
pub fn signature_hash(header: &str) -> &str {
    let header = header.trim();
    let parts: Vec<&str> = header.split(',').map(str::trim).collect();

    if let Some(v1) = parts.iter().find_map(|part| part.strip_prefix("v1=")) {
        return v1;
    }

    match header.split_once('=') {
        Some((_, hash)) => hash.trim(),
        None => header,
    }
}

/// Hex-encoded HMAC-SHA256 of `body` under `secret`
pub fn sign_body(secret: &str, body: &[u8]) -> Result<String, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time comparison of the header's hash against the body's HMAC
pub fn verify_signature(secret: &str, body: &[u8], header: &str) -> bool {
    let Ok(expected) = hex::decode(signature_hash(header)) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}
