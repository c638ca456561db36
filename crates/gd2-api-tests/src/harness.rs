//! Test Harness - in-process mock GlusterD2 cluster
//!
//! Serves the `/v1` REST surface from memory on `127.0.0.1:0`, verifies
//! request tokens when started with a secret, and records every request so
//! tests can assert on exactly what went over the wire.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use gd2_api::auth::{qsh, Claims};
use gd2_api::models::{
    Brick, GeorepCreateRequest, GeorepRemoteHost, GeorepSession, Peer, PeerAddRequest, Subvol,
    Volume, VolumeCreateRequest,
};
use gd2_api::ClusterEndpoint;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Option<serde_json::Value>,
}

#[derive(Debug, Default)]
struct ClusterState {
    secret: Option<String>,
    peers: Vec<Peer>,
    volumes: Vec<Volume>,
    sessions: Vec<GeorepSession>,
    requests: Vec<RecordedRequest>,
    overrides: HashMap<String, u16>,
    delay: Option<Duration>,
    next_id: u64,
}

type Shared = Arc<Mutex<ClusterState>>;

pub struct MockCluster {
    addr: SocketAddr,
    state: Shared,
    handle: JoinHandle<()>,
}

impl MockCluster {
    /// Starts a cluster; with a secret, unsigned or mis-signed requests get 401.
    pub async fn start(secret: Option<&str>) -> Self {
        let state: Shared = Arc::new(Mutex::new(ClusterState {
            secret: secret.map(str::to_string),
            ..ClusterState::default()
        }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind mock cluster");
        let addr = listener.local_addr().expect("mock cluster has no address");
        let router = Router::new().fallback(handle).with_state(state.clone());
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router.into_make_service()).await {
                tracing::error!("mock cluster serve error: {}", e);
            }
        });
        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn endpoint(&self, user: &str, secret: Option<&str>) -> ClusterEndpoint {
        ClusterEndpoint::new(&self.base_url(), user, secret)
    }

    pub fn add_peer(&self, id: &str, addresses: &[&str]) {
        self.state.lock().unwrap().peers.push(Peer {
            id: id.to_string(),
            name: id.to_string(),
            peer_addresses: addresses.iter().map(|a| a.to_string()).collect(),
            online: true,
            ..Peer::default()
        });
    }

    pub fn add_volume(&self, name: &str, id: &str) {
        self.state.lock().unwrap().volumes.push(Volume {
            id: id.to_string(),
            name: name.to_string(),
            state: "Started".to_string(),
            ..Volume::default()
        });
    }

    pub fn add_session(&self, session: GeorepSession) {
        self.state.lock().unwrap().sessions.push(session);
    }

    /// Answers `method path` with `status` instead of the normal response.
    pub fn override_status(&self, method: &str, path: &str, status: u16) {
        self.state
            .lock()
            .unwrap()
            .overrides
            .insert(format!("{} {}", method, path), status);
    }

    /// Holds every response back by `delay`.
    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    pub fn requests_to(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    pub fn sessions(&self) -> Vec<GeorepSession> {
        self.state.lock().unwrap().sessions.clone()
    }

    pub fn volumes(&self) -> Vec<Volume> {
        self.state.lock().unwrap().volumes.clone()
    }

    pub fn peers(&self) -> Vec<Peer> {
        self.state.lock().unwrap().peers.clone()
    }
}

impl Drop for MockCluster {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A session record as the daemon lists it.
pub fn session(master: &str, master_id: &str, remote: &str, remote_id: &str, host: &str) -> GeorepSession {
    GeorepSession {
        master_volume: master.to_string(),
        master_volume_id: master_id.to_string(),
        remote_volume: remote.to_string(),
        remote_volume_id: remote_id.to_string(),
        remote_user: "root".to_string(),
        remote_hosts: vec![GeorepRemoteHost {
            peerid: format!("peer-{}", host),
            host: host.to_string(),
        }],
        monitor_status: "Created".to_string(),
        ..GeorepSession::default()
    }
}

fn token_valid(header: Option<&str>, secret: &str, method: &str, path: &str) -> bool {
    let Some(token) = header.and_then(|h| h.strip_prefix("bearer ")) else {
        return false;
    };
    let validation = Validation::new(Algorithm::HS256);
    match decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation) {
        Ok(data) => data.claims.qsh == qsh(method, path),
        Err(_) => false,
    }
}

async fn handle(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = if body.is_empty() {
        None
    } else {
        serde_json::from_slice(&body).ok()
    };

    let delay = state.lock().unwrap().delay;
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let mut state = state.lock().unwrap();
    state.requests.push(RecordedRequest {
        method: method.to_string(),
        path: path.clone(),
        authorization: authorization.clone(),
        body: body.clone(),
    });

    if let Some(secret) = state.secret.clone() {
        if !token_valid(authorization.as_deref(), &secret, method.as_str(), &path) {
            return (StatusCode::UNAUTHORIZED, "invalid token").into_response();
        }
    }
    if let Some(code) = state.overrides.get(&format!("{} {}", method, path)) {
        let status = StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, "forced failure").into_response();
    }
    state.dispatch(method.as_str(), &path, body)
}

fn parse<T: DeserializeOwned>(body: Option<serde_json::Value>) -> Option<T> {
    body.and_then(|b| serde_json::from_value(b).ok())
}

fn bad_request() -> Response {
    (StatusCode::BAD_REQUEST, "malformed body").into_response()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(serde_json::json!({"errors": ["not found"]}))).into_response()
}

impl ClusterState {
    fn new_id(&mut self, kind: &str) -> String {
        self.next_id += 1;
        format!("{}-{:04}", kind, self.next_id)
    }

    fn dispatch(&mut self, method: &str, path: &str, body: Option<serde_json::Value>) -> Response {
        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        match (method, segments.as_slice()) {
            ("GET", ["v1", "peers"]) => Json(self.peers.clone()).into_response(),
            ("POST", ["v1", "peers"]) => {
                let Some(req) = parse::<PeerAddRequest>(body) else {
                    return bad_request();
                };
                let Some(host) = req.addresses.first().cloned() else {
                    return bad_request();
                };
                let peer = Peer {
                    id: self.new_id("peer"),
                    name: host.clone(),
                    peer_addresses: vec![format!("{}:24008", host)],
                    client_addresses: vec![format!("{}:24007", host)],
                    online: true,
                    metadata: req.metadata,
                };
                self.peers.push(peer.clone());
                (StatusCode::CREATED, Json(peer)).into_response()
            }
            ("DELETE", ["v1", "peers", id]) => {
                let before = self.peers.len();
                self.peers.retain(|p| p.id != *id);
                if self.peers.len() == before {
                    return not_found();
                }
                StatusCode::NO_CONTENT.into_response()
            }
            ("GET", ["v1", "volumes"]) => Json(self.volumes.clone()).into_response(),
            ("POST", ["v1", "volumes"]) => {
                let Some(req) = parse::<VolumeCreateRequest>(body) else {
                    return bad_request();
                };
                if self.volumes.iter().any(|v| v.name == req.name) {
                    return (StatusCode::CONFLICT, "volume exists").into_response();
                }
                let subvols = req
                    .subvols
                    .iter()
                    .enumerate()
                    .map(|(i, sv)| Subvol {
                        name: format!("{}-{}-{}", req.name, sv.subvol_type, i),
                        subvol_type: sv.subvol_type.clone(),
                        bricks: sv
                            .bricks
                            .iter()
                            .map(|b| Brick {
                                peer_id: b.peerid.clone(),
                                path: b.path.clone(),
                                ..Brick::default()
                            })
                            .collect(),
                    })
                    .collect();
                let volume = Volume {
                    id: self.new_id("vol"),
                    name: req.name.clone(),
                    state: "Created".to_string(),
                    transport: req.transport.clone(),
                    subvols,
                    options: req.options.clone(),
                    metadata: req.metadata.clone(),
                    ..Volume::default()
                };
                self.volumes.push(volume.clone());
                (StatusCode::CREATED, Json(volume)).into_response()
            }
            ("GET", ["v1", "volumes", name]) => match self.volumes.iter().find(|v| v.name == *name) {
                Some(v) => Json(v.clone()).into_response(),
                None => not_found(),
            },
            ("DELETE", ["v1", "volumes", name]) => {
                let before = self.volumes.len();
                self.volumes.retain(|v| v.name != *name);
                if self.volumes.len() == before {
                    return not_found();
                }
                StatusCode::NO_CONTENT.into_response()
            }
            ("POST", ["v1", "volumes", name, action]) => {
                let new_state = match *action {
                    "start" => "Started",
                    "stop" => "Stopped",
                    _ => return not_found(),
                };
                match self.volumes.iter_mut().find(|v| v.name == *name) {
                    Some(v) => {
                        v.state = new_state.to_string();
                        Json(v.clone()).into_response()
                    }
                    None => not_found(),
                }
            }
            ("GET", ["v1", "geo-replication"]) => Json(self.sessions.clone()).into_response(),
            ("POST", ["v1", "geo-replication", mid, rid]) => {
                let Some(req) = parse::<GeorepCreateRequest>(body) else {
                    return bad_request();
                };
                if self
                    .sessions
                    .iter()
                    .any(|s| s.master_volume_id == *mid && s.remote_volume_id == *rid)
                {
                    return (StatusCode::CONFLICT, "session exists").into_response();
                }
                let session = GeorepSession {
                    master_volume_id: mid.to_string(),
                    remote_volume_id: rid.to_string(),
                    master_volume: req.mastervol,
                    remote_volume: req.remotevol,
                    remote_user: req.remoteuser,
                    remote_hosts: req.remotehosts,
                    monitor_status: "Created".to_string(),
                    ..GeorepSession::default()
                };
                self.sessions.push(session.clone());
                (StatusCode::CREATED, Json(session)).into_response()
            }
            ("GET", ["v1", "geo-replication", mid, rid]) => match self
                .sessions
                .iter()
                .find(|s| s.master_volume_id == *mid && s.remote_volume_id == *rid)
            {
                Some(s) => Json(s.clone()).into_response(),
                None => not_found(),
            },
            ("DELETE", ["v1", "geo-replication", mid, rid]) => {
                let before = self.sessions.len();
                self.sessions
                    .retain(|s| !(s.master_volume_id == *mid && s.remote_volume_id == *rid));
                if self.sessions.len() == before {
                    return not_found();
                }
                StatusCode::NO_CONTENT.into_response()
            }
            ("POST", ["v1", "geo-replication", mid, rid, action]) => {
                let status = match *action {
                    "start" => "Started",
                    "stop" => "Stopped",
                    _ => return not_found(),
                };
                match self
                    .sessions
                    .iter_mut()
                    .find(|s| s.master_volume_id == *mid && s.remote_volume_id == *rid)
                {
                    Some(s) => {
                        s.monitor_status = status.to_string();
                        Json(s.clone()).into_response()
                    }
                    None => not_found(),
                }
            }
            _ => not_found(),
        }
    }
}
