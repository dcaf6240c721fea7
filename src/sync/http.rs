//! HTTP profile source: `GET`/`PUT` against the backend user-profile
//! endpoint with a bearer credential.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};

use crate::error::SyncError;
use crate::profile::Profile;

use super::ProfileSource;

/// reqwest-backed [`ProfileSource`].
pub struct HttpProfileSource {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpProfileSource {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, SyncError> {
        let endpoint = endpoint.into();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Network {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self { endpoint, client })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn network_error(&self, e: reqwest::Error) -> SyncError {
        SyncError::Network {
            endpoint: self.endpoint.clone(),
            reason: e.to_string(),
        }
    }

    fn status_error(&self, status: StatusCode) -> SyncError {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            SyncError::Unauthorized {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
            }
        } else {
            SyncError::Status {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
            }
        }
    }
}

#[async_trait]
impl ProfileSource for HttpProfileSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, token: &SecretString) -> Result<serde_json::Value, SyncError> {
        let resp = self
            .client
            .get(&self.endpoint)
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(|e| self.network_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(self.status_error(status));
        }

        let body: serde_json::Value = resp.json().await.map_err(|e| SyncError::InvalidBody {
            endpoint: self.endpoint.clone(),
            reason: e.to_string(),
        })?;

        if !body.is_object() {
            return Err(SyncError::InvalidBody {
                endpoint: self.endpoint.clone(),
                reason: "expected a JSON object".to_string(),
            });
        }

        Ok(body)
    }

    async fn push(&self, token: &SecretString, profile: &Profile) -> Result<(), SyncError> {
        let resp = self
            .client
            .put(&self.endpoint)
            .bearer_auth(token.expose_secret())
            .json(profile)
            .send()
            .await
            .map_err(|e| self.network_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(self.status_error(status));
        }
        Ok(())
    }
}
