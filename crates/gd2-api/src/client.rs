//! HTTP plumbing shared by every operation.
//!
//! A [`Client`] is bound to exactly one [`ClusterEndpoint`] for its whole
//! lifetime. Talking to another cluster means building another client with
//! [`Client::for_endpoint`]; nothing ever re-points an existing one.

use crate::endpoint::ClusterEndpoint;
use crate::error::{ApiError, Result};
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Every REST path lives under this prefix.
pub const API_PREFIX: &str = "/v1";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Placeholder for requests without a body.
pub(crate) const NO_BODY: Option<&()> = None;

/// A fully-read response.
#[derive(Debug, Clone)]
pub struct Reply {
    method: Method,
    path: String,
    status: StatusCode,
    body: String,
}

impl Reply {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Fails with [`ApiError::UnexpectedStatus`] unless the status is `expected`.
    pub fn expect_status(self, expected: StatusCode) -> Result<Self> {
        if self.status == expected {
            return Ok(self);
        }
        warn!(
            method = %self.method,
            path = %self.path,
            expected = expected.as_u16(),
            status = self.status.as_u16(),
            "unexpected response status"
        );
        Err(ApiError::UnexpectedStatus {
            method: self.method.to_string(),
            path: self.path,
            expected: expected.as_u16(),
            status: self.status.as_u16(),
            body: self.body,
        })
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|source| ApiError::Decode {
            path: self.path.clone(),
            source,
        })
    }
}

/// Client for one cluster's management API.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    endpoint: ClusterEndpoint,
    timeout: Duration,
}

impl Client {
    pub fn new(endpoint: ClusterEndpoint) -> Result<Self> {
        Self::with_timeout(endpoint, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(endpoint: ClusterEndpoint, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(!endpoint.verify)
            .build()?;
        Ok(Self {
            http,
            endpoint,
            timeout,
        })
    }

    /// A client for a different cluster, sharing this client's timeout.
    pub fn for_endpoint(&self, endpoint: ClusterEndpoint) -> Result<Self> {
        Self::with_timeout(endpoint, self.timeout)
    }

    pub fn endpoint(&self) -> &ClusterEndpoint {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Signs and sends one request. `path` is relative to [`API_PREFIX`].
    pub async fn send<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<Reply>
    where
        B: Serialize + ?Sized,
    {
        let path = format!("{}{}", API_PREFIX, path);
        let url = self.endpoint.url(&path);

        let mut request = self.http.request(method.clone(), &url);
        // fresh token per request: the qsh claim binds it to this method and path
        if let Some(signer) = self.endpoint.signer() {
            request = request.header(AUTHORIZATION, signer.authorization(method.as_str(), &path)?);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(method = %method, url = %url, "sending request");
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(method = %method, path = %path, status = status.as_u16(), "received response");

        Ok(Reply {
            method,
            path,
            status,
            body,
        })
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(Method::GET, path, NO_BODY)
            .await?
            .expect_status(StatusCode::OK)?
            .json()
    }
}
