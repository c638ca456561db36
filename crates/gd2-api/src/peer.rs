//! Peer membership operations and host-to-peer resolution.

use crate::client::{Client, NO_BODY};
use crate::error::{ApiError, Result};
use crate::models::{Peer, PeerAddRequest};
use crate::validate::{require_non_empty, strip_port, validate_path_id};
use reqwest::{Method, StatusCode};
use std::collections::HashMap;
use tracing::info;

/// Id of the first peer with an id advertising `host` on any of its peer addresses.
///
/// Ports are ignored, so `10.0.0.2` matches `10.0.0.2:24008`.
pub fn find_peer_id(peers: &[Peer], host: &str) -> Result<String> {
    peers
        .iter()
        .find(|p| {
            !p.id.is_empty() && p.peer_addresses.iter().any(|addr| strip_port(addr) == host)
        })
        .map(|p| p.id.clone())
        .ok_or_else(|| ApiError::PeerNotFound {
            host: host.to_string(),
        })
}

impl Client {
    /// Probes `host` into the cluster.
    pub async fn peer_add(
        &self,
        host: &str,
        zone: Option<&str>,
        metadata: HashMap<String, String>,
    ) -> Result<Peer> {
        require_non_empty("peer host", host)?;
        let req = PeerAddRequest {
            addresses: vec![host.to_string()],
            zone: zone.map(str::to_string),
            metadata,
        };
        let peer: Peer = self
            .send(Method::POST, "/peers", Some(&req))
            .await?
            .expect_status(StatusCode::CREATED)?
            .json()?;
        info!(peer_id = %peer.id, host, "peer added");
        Ok(peer)
    }

    pub async fn peer_remove(&self, peer_id: &str) -> Result<()> {
        validate_path_id("peer id", peer_id)?;
        self.send(Method::DELETE, &format!("/peers/{}", peer_id), NO_BODY)
            .await?
            .expect_status(StatusCode::NO_CONTENT)?;
        info!(peer_id, "peer removed");
        Ok(())
    }

    pub async fn peer_list(&self) -> Result<Vec<Peer>> {
        self.get_json("/peers").await
    }

    /// Peer id of the cluster member reachable at `host`.
    pub async fn resolve_peer_id(&self, host: &str) -> Result<String> {
        require_non_empty("peer host", host)?;
        let peers = self.peer_list().await?;
        find_peer_id(&peers, host)
    }
}
