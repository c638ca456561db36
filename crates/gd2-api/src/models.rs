//! Request and response bodies exchanged with the daemon.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Peer {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "peer-addresses", default)]
    pub peer_addresses: Vec<String>,
    #[serde(rename = "client-addresses", default)]
    pub client_addresses: Vec<String>,
    #[serde(default)]
    pub online: bool,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PeerAddRequest {
    pub addresses: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub zone: Option<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Brick {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "peer-id", default)]
    pub peer_id: String,
    #[serde(default)]
    pub host: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Subvol {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub subvol_type: String,
    #[serde(default)]
    pub bricks: Vec<Brick>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Volume {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub volume_type: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub transport: String,
    #[serde(rename = "distribute-count", default)]
    pub distribute_count: u32,
    #[serde(rename = "replica-count", default)]
    pub replica_count: u32,
    #[serde(default)]
    pub subvols: Vec<Subvol>,
    #[serde(default)]
    pub options: HashMap<String, String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// A brick in a create request, `peerid:/path` on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrickRequest {
    pub peerid: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubvolRequest {
    #[serde(rename = "type")]
    pub subvol_type: String,
    pub bricks: Vec<BrickRequest>,
    #[serde(skip_serializing_if = "is_zero", default)]
    pub replica: u32,
    #[serde(skip_serializing_if = "is_zero", default)]
    pub arbiter: u32,
    #[serde(rename = "disperse-count", skip_serializing_if = "is_zero", default)]
    pub disperse_count: u32,
    #[serde(rename = "disperse-data", skip_serializing_if = "is_zero", default)]
    pub disperse_data: u32,
    #[serde(rename = "disperse-redundancy", skip_serializing_if = "is_zero", default)]
    pub disperse_redundancy: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeCreateRequest {
    pub name: String,
    pub transport: String,
    pub subvols: Vec<SubvolRequest>,
    pub force: bool,
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub options: HashMap<String, String>,
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub metadata: HashMap<String, String>,
}

/// Body of start/stop/delete requests for volumes and sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ForceRequest {
    pub force: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GeorepRemoteHost {
    pub peerid: String,
    pub host: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeorepCreateRequest {
    pub mastervol: String,
    pub remotehosts: Vec<GeorepRemoteHost>,
    pub remotevol: String,
    pub remoteuser: String,
    pub force: bool,
}

/// Per-brick worker state reported by session status.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeorepWorker {
    #[serde(default)]
    pub master_peerid: String,
    #[serde(default)]
    pub master_brick: String,
    #[serde(default)]
    pub remote_node: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub last_synced: String,
    #[serde(default)]
    pub checkpoint_time: String,
    #[serde(default)]
    pub checkpoint_completed: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeorepSession {
    #[serde(rename = "master_volume_id", alias = "master_volid", default)]
    pub master_volume_id: String,
    #[serde(rename = "remote_volume_id", alias = "remote_volid", default)]
    pub remote_volume_id: String,
    #[serde(default)]
    pub master_volume: String,
    #[serde(default)]
    pub remote_volume: String,
    #[serde(default)]
    pub remote_user: String,
    #[serde(default)]
    pub remote_hosts: Vec<GeorepRemoteHost>,
    #[serde(default)]
    pub monitor_status: String,
    #[serde(default)]
    pub workers: Vec<GeorepWorker>,
    #[serde(default)]
    pub options: HashMap<String, String>,
}

impl GeorepSession {
    /// Whether this session replicates `master` to `remote` on `host`.
    pub fn matches(&self, master: &str, host: &str, remote: &str) -> bool {
        self.master_volume == master
            && self.remote_volume == remote
            && self.remote_hosts.iter().any(|h| h.host == host)
    }
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}
