use crate::client::DEFAULT_TIMEOUT_SECS;
use crate::endpoint::ClusterEndpoint;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub endpoint: String,
    pub user: String,
    pub secret: Option<String>,
    /// Read the signing secret from this file when `secret` is unset.
    pub secret_file: Option<PathBuf>,
    pub verify_tls: bool,
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: String::from("http://localhost:24007"),
            user: String::from("glustercli"),
            secret: None,
            secret_file: None,
            verify_tls: true,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        match ext.to_lowercase().as_str() {
            "toml" => {
                let config: ClientConfig = toml::from_str(&contents)?;
                Ok(config)
            }
            "json" => {
                let config: ClientConfig = serde_json::from_str(&contents)?;
                Ok(config)
            }
            _ => anyhow::bail!("Unsupported config file extension: {}", ext),
        }
    }

    /// Inline secret, else the trimmed contents of `secret_file`.
    pub fn load_secret(&self) -> anyhow::Result<Option<String>> {
        if let Some(secret) = &self.secret {
            return Ok(Some(secret.clone()));
        }
        match &self.secret_file {
            Some(path) => {
                let secret = std::fs::read_to_string(path).map_err(|e| {
                    anyhow::anyhow!("Unable to open secret file {}: {}", path.display(), e)
                })?;
                Ok(Some(secret.trim().to_string()))
            }
            None => Ok(None),
        }
    }

    pub fn to_endpoint(&self) -> anyhow::Result<ClusterEndpoint> {
        let secret = self.load_secret()?;
        Ok(ClusterEndpoint::new(&self.endpoint, &self.user, secret.as_deref())
            .with_verify(self.verify_tls))
    }

    pub fn timeout(&self) -> anyhow::Result<Duration> {
        if self.timeout_secs == 0 {
            anyhow::bail!("timeout_secs must be at least 1");
        }
        Ok(Duration::from_secs(self.timeout_secs))
    }
}
