//! Addressable clusters and the credentials used against them.

use crate::auth::TokenSigner;
use crate::error::Result;
use crate::validate::{validate_port, validate_remote_host};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One cluster's REST endpoint plus the credentials that sign requests to it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterEndpoint {
    pub base_url: String,
    pub user: String,
    /// Shared signing secret. Without one, requests go out unsigned.
    pub secret: Option<String>,
    /// Verify the server's TLS certificate.
    pub verify: bool,
}

impl fmt::Debug for ClusterEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterEndpoint")
            .field("base_url", &self.base_url)
            .field("user", &self.user)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("verify", &self.verify)
            .finish()
    }
}

impl ClusterEndpoint {
    pub fn new(base_url: &str, user: &str, secret: Option<&str>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            user: user.to_string(),
            secret: secret.map(str::to_string),
            verify: true,
        }
    }

    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Absolute URL for a path that already carries the `/v1` prefix.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    pub fn signer(&self) -> Option<TokenSigner> {
        self.secret
            .as_deref()
            .map(|secret| TokenSigner::new(&self.user, secret))
    }
}

/// Where the remote side of a geo-replication session lives.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteCluster {
    /// IPv4 address of a remote cluster node; also the session's remote host.
    pub host: String,
    pub port: i64,
    /// Explicit remote REST endpoint and credentials. When absent the remote
    /// API is reached at `http://{host}:{port}`.
    pub endpoint: Option<ClusterEndpoint>,
    /// Overrides for the `http://{host}:{port}` endpoint. Unset fields fall
    /// back to the local endpoint's values.
    pub user: Option<String>,
    pub secret: Option<String>,
    pub verify: Option<bool>,
}

impl fmt::Debug for RemoteCluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteCluster")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("endpoint", &self.endpoint)
            .field("user", &self.user)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("verify", &self.verify)
            .finish()
    }
}

impl RemoteCluster {
    pub fn new(host: &str, port: impl Into<i64>) -> Self {
        Self {
            host: host.to_string(),
            port: port.into(),
            endpoint: None,
            user: None,
            secret: None,
            verify: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: ClusterEndpoint) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Signs remote lookups as `user` with `secret` without changing the URL.
    pub fn with_credentials(mut self, user: Option<&str>, secret: Option<&str>) -> Self {
        self.user = user.map(str::to_string);
        self.secret = secret.map(str::to_string);
        self
    }

    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = Some(verify);
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_port(self.port)?;
        validate_remote_host(&self.host)?;
        Ok(())
    }

    /// The endpoint remote lookups are issued against.
    pub fn resolve_endpoint(&self, local: &ClusterEndpoint) -> Result<ClusterEndpoint> {
        self.validate()?;
        if let Some(endpoint) = &self.endpoint {
            return Ok(endpoint.clone());
        }
        Ok(ClusterEndpoint {
            base_url: format!("http://{}:{}", self.host, self.port),
            user: self.user.clone().unwrap_or_else(|| local.user.clone()),
            secret: self.secret.clone().or_else(|| local.secret.clone()),
            verify: self.verify.unwrap_or(local.verify),
        })
    }
}
