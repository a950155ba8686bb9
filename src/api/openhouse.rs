use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Gender;

/// Errors from the remote Open House backend. Every variant keeps the URL:
/// the backend sits behind shared hosting and "which endpoint" is usually
/// the whole diagnosis.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("openhouse api unreachable at {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("openhouse api returned {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("openhouse api sent an unreadable body for {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhoneLookup {
    pub exists: bool,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QrLookup {
    pub exists: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewRegistrant {
    pub name: String,
    pub phone: String,
    pub gender: Gender,
    pub school: String,
    pub qrcode: String,
}

#[derive(Debug, Deserialize)]
struct LogUpdateResponse {
    #[serde(default)]
    success: bool,
}

/// The four operations the remote backend exposes. Route handlers and
/// services only see this trait; tests substitute a recording fake.
#[async_trait]
pub trait OpenhouseApi: Send + Sync {
    async fn check_phone(&self, phone: &str) -> Result<PhoneLookup, ApiError>;
    async fn register(&self, registrant: &NewRegistrant) -> Result<(), ApiError>;
    async fn check_qrcode(&self, code: &str) -> Result<QrLookup, ApiError>;
    async fn update_log(&self, phone: &str, log: &str) -> Result<bool, ApiError>;
}

/// HTTP implementation against the PHP endpoints.
pub struct HttpOpenhouseApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpOpenhouseApi {
    /// The upstream gave no timeout guarantees; a stuck shared-hosting
    /// endpoint must not pin a scanner session forever.
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client construction only fails on TLS backend misconfiguration");
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    pub fn from_env() -> Self {
        let base_url = std::env::var("OPENHOUSE_API_URL")
            .unwrap_or_else(|_| "https://app.rlagency.id/apiopenhouse".to_string());
        Self::new(base_url)
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), name)
    }
}

#[async_trait]
impl OpenhouseApi for HttpOpenhouseApi {
    async fn check_phone(&self, phone: &str) -> Result<PhoneLookup, ApiError> {
        let url = self.endpoint("check-phone.php");
        let resp = self
            .client
            .get(&url)
            .query(&[("phone", phone)])
            .send()
            .await
            .map_err(|source| ApiError::Connect {
                url: url.clone(),
                source,
            })?;

        if !resp.status().is_success() {
            return Err(ApiError::Status {
                url,
                status: resp.status(),
            });
        }
        resp.json()
            .await
            .map_err(|source| ApiError::Decode { url, source })
    }

    async fn register(&self, registrant: &NewRegistrant) -> Result<(), ApiError> {
        let url = self.endpoint("register-peserta.php");
        let resp = self
            .client
            .post(&url)
            .json(registrant)
            .send()
            .await
            .map_err(|source| ApiError::Connect {
                url: url.clone(),
                source,
            })?;

        if !resp.status().is_success() {
            return Err(ApiError::Status {
                url,
                status: resp.status(),
            });
        }
        Ok(())
    }

    async fn check_qrcode(&self, code: &str) -> Result<QrLookup, ApiError> {
        let url = self.endpoint("check-qrcode.php");
        let resp = self
            .client
            .get(&url)
            .query(&[("qrcode", code)])
            .send()
            .await
            .map_err(|source| ApiError::Connect {
                url: url.clone(),
                source,
            })?;

        if !resp.status().is_success() {
            return Err(ApiError::Status {
                url,
                status: resp.status(),
            });
        }
        resp.json()
            .await
            .map_err(|source| ApiError::Decode { url, source })
    }

    async fn update_log(&self, phone: &str, log: &str) -> Result<bool, ApiError> {
        let url = self.endpoint("update-log.php");
        let resp = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "phone": phone, "log": log }))
            .send()
            .await
            .map_err(|source| ApiError::Connect {
                url: url.clone(),
                source,
            })?;

        if !resp.status().is_success() {
            return Err(ApiError::Status {
                url,
                status: resp.status(),
            });
        }
        let body: LogUpdateResponse = resp
            .json()
            .await
            .map_err(|source| ApiError::Decode { url, source })?;
        Ok(body.success)
    }
}
