//! Geo-replication sessions.
//!
//! Creating a session needs identifiers from two clusters: the master volume
//! and the remote peer come from the local cluster, the remote volume from the
//! remote one. The remote lookup runs on a separate client built from the
//! remote endpoint, so the local client's endpoint and credentials are the
//! same after [`Client::georep_create`] returns, whatever the outcome.
//!
//! Lifecycle operations (start, stop, delete, status) resolve both ids from
//! the local cluster's session listing instead.

use crate::client::{Client, NO_BODY};
use crate::endpoint::RemoteCluster;
use crate::error::{ApiError, Result};
use crate::models::{ForceRequest, GeorepCreateRequest, GeorepRemoteHost, GeorepSession};
use crate::validate::{require_non_empty, validate_volume_name};
use reqwest::{Method, StatusCode};
use tracing::{debug, info};

pub const DEFAULT_REMOTE_USER: &str = "root";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeorepCreateOptions {
    pub remote_user: String,
    pub force: bool,
}

impl Default for GeorepCreateOptions {
    fn default() -> Self {
        Self {
            remote_user: DEFAULT_REMOTE_USER.to_string(),
            force: false,
        }
    }
}

/// First session replicating `master` to `remote` on `host`.
pub fn find_session<'a>(
    sessions: &'a [GeorepSession],
    master: &str,
    host: &str,
    remote: &str,
) -> Result<&'a GeorepSession> {
    let session = sessions
        .iter()
        .find(|s| s.matches(master, host, remote))
        .ok_or_else(|| {
            ApiError::invalid(format!(
                "no geo-replication session {} -> {}::{}",
                master, host, remote
            ))
        })?;
    if session.master_volume_id.is_empty() || session.remote_volume_id.is_empty() {
        return Err(ApiError::invalid(format!(
            "geo-replication session {} -> {}::{} has no volume ids",
            master, host, remote
        )));
    }
    Ok(session)
}

fn session_path(master_id: &str, remote_id: &str) -> String {
    format!("/geo-replication/{}/{}", master_id, remote_id)
}

impl Client {
    /// Id of `volume` on the remote cluster.
    ///
    /// Host and port are checked before anything is sent.
    pub async fn extract_remote_volume_id(
        &self,
        remote: &RemoteCluster,
        volume: &str,
    ) -> Result<String> {
        validate_volume_name(volume)?;
        let endpoint = remote.resolve_endpoint(self.endpoint())?;
        debug!(remote = %endpoint.base_url, volume, "resolving remote volume");
        let remote_client = self.for_endpoint(endpoint)?;
        remote_client.resolve_volume_id_from_list(volume).await
    }

    pub async fn georep_create(
        &self,
        master_volume: &str,
        remote: &RemoteCluster,
        remote_volume: &str,
        opts: &GeorepCreateOptions,
    ) -> Result<GeorepSession> {
        validate_volume_name(master_volume)?;
        validate_volume_name(remote_volume)?;
        remote.validate()?;
        require_non_empty("remote user", &opts.remote_user)?;

        let master_id = self.resolve_volume_id(master_volume).await?;
        let peer_id = self.resolve_peer_id(&remote.host).await?;
        let remote_id = self.extract_remote_volume_id(remote, remote_volume).await?;
        debug!(%master_id, %peer_id, %remote_id, "geo-replication ids resolved");

        let req = GeorepCreateRequest {
            mastervol: master_volume.to_string(),
            remotehosts: vec![GeorepRemoteHost {
                peerid: peer_id,
                host: remote.host.clone(),
            }],
            remotevol: remote_volume.to_string(),
            remoteuser: opts.remote_user.clone(),
            force: opts.force,
        };
        let session = self
            .send(Method::POST, &session_path(&master_id, &remote_id), Some(&req))
            .await?
            .expect_status(StatusCode::CREATED)?
            .json()?;
        info!(
            master = master_volume,
            remote_host = %remote.host,
            remote = remote_volume,
            "geo-replication session created"
        );
        Ok(session)
    }

    pub async fn georep_list(&self) -> Result<Vec<GeorepSession>> {
        self.get_json("/geo-replication").await
    }

    /// Master and remote volume ids of an existing session.
    pub async fn georep_session_ids(
        &self,
        master_volume: &str,
        remote_host: &str,
        remote_volume: &str,
    ) -> Result<(String, String)> {
        validate_volume_name(master_volume)?;
        validate_volume_name(remote_volume)?;
        require_non_empty("remote host", remote_host)?;
        let sessions = self.georep_list().await?;
        let session = find_session(&sessions, master_volume, remote_host, remote_volume)?;
        Ok((
            session.master_volume_id.clone(),
            session.remote_volume_id.clone(),
        ))
    }

    pub async fn georep_start(
        &self,
        master_volume: &str,
        remote_host: &str,
        remote_volume: &str,
        force: bool,
    ) -> Result<GeorepSession> {
        self.georep_action(master_volume, remote_host, remote_volume, "start", force)
            .await
    }

    pub async fn georep_stop(
        &self,
        master_volume: &str,
        remote_host: &str,
        remote_volume: &str,
        force: bool,
    ) -> Result<GeorepSession> {
        self.georep_action(master_volume, remote_host, remote_volume, "stop", force)
            .await
    }

    async fn georep_action(
        &self,
        master_volume: &str,
        remote_host: &str,
        remote_volume: &str,
        action: &str,
        force: bool,
    ) -> Result<GeorepSession> {
        let (master_id, remote_id) = self
            .georep_session_ids(master_volume, remote_host, remote_volume)
            .await?;
        let path = format!("{}/{}", session_path(&master_id, &remote_id), action);
        let session = self
            .send(Method::POST, &path, Some(&ForceRequest { force }))
            .await?
            .expect_status(StatusCode::OK)?
            .json()?;
        info!(master = master_volume, remote = remote_volume, action, "geo-replication action done");
        Ok(session)
    }

    pub async fn georep_delete(
        &self,
        master_volume: &str,
        remote_host: &str,
        remote_volume: &str,
        force: bool,
    ) -> Result<()> {
        let (master_id, remote_id) = self
            .georep_session_ids(master_volume, remote_host, remote_volume)
            .await?;
        self.send(
            Method::DELETE,
            &session_path(&master_id, &remote_id),
            Some(&ForceRequest { force }),
        )
        .await?
        .expect_status(StatusCode::NO_CONTENT)?;
        info!(master = master_volume, remote = remote_volume, "geo-replication session deleted");
        Ok(())
    }

    pub async fn georep_status(
        &self,
        master_volume: &str,
        remote_host: &str,
        remote_volume: &str,
    ) -> Result<GeorepSession> {
        let (master_id, remote_id) = self
            .georep_session_ids(master_volume, remote_host, remote_volume)
            .await?;
        self.send(Method::GET, &session_path(&master_id, &remote_id), NO_BODY)
            .await?
            .expect_status(StatusCode::OK)?
            .json()
    }
}
