//! Geo-replication flows against two mock clusters.

use crate::harness::{session, MockCluster};
use gd2_api::{ApiError, Client, ClusterEndpoint, ErrorKind, GeorepCreateOptions, RemoteCluster};

const SECRET: &str = "master-secret";
const REMOTE_SECRET: &str = "remote-secret";

struct Pair {
    master: MockCluster,
    remote: MockCluster,
    client: Client,
}

/// Master cluster knows `mastervol` and a peer on 127.0.0.1; the remote
/// cluster serves `remotevol` under its own secret.
async fn pair() -> Pair {
    let master = MockCluster::start(Some(SECRET)).await;
    let remote = MockCluster::start(Some(REMOTE_SECRET)).await;
    master.add_volume("mastervol", "mvol-id");
    master.add_peer("peer-local", &["10.0.0.1:24008"]);
    master.add_peer("peer-remote", &["127.0.0.1:24008"]);
    remote.add_volume("othervol", "other-id");
    remote.add_volume("remotevol", "rvol-id");
    let client = Client::new(master.endpoint("glustercli", Some(SECRET))).unwrap();
    Pair {
        master,
        remote,
        client,
    }
}

fn remote_of(p: &Pair) -> RemoteCluster {
    RemoteCluster::new("127.0.0.1", p.remote.port())
        .with_endpoint(p.remote.endpoint("georep", Some(REMOTE_SECRET)))
}

#[tokio::test]
async fn test_georep_create_resolves_ids_across_clusters() {
    let p = pair().await;
    let before = p.client.endpoint().clone();

    let created = p
        .client
        .georep_create("mastervol", &remote_of(&p), "remotevol", &GeorepCreateOptions::default())
        .await
        .unwrap();

    assert_eq!(created.master_volume_id, "mvol-id");
    assert_eq!(created.remote_volume_id, "rvol-id");
    assert_eq!(created.remote_hosts[0].peerid, "peer-remote");
    assert_eq!(created.remote_hosts[0].host, "127.0.0.1");
    assert_eq!(created.remote_user, "root");
    assert_eq!(p.client.endpoint(), &before);

    let posts = p.master.requests_to("POST", "/v1/geo-replication/mvol-id/rvol-id");
    assert_eq!(posts.len(), 1);
    let body = posts[0].body.as_ref().unwrap();
    assert_eq!(body["mastervol"], "mastervol");
    assert_eq!(body["remotevol"], "remotevol");
    assert_eq!(body["remotehosts"][0]["peerid"], "peer-remote");

    // only the volume listing went to the remote cluster
    let remote_requests = p.remote.requests();
    assert_eq!(remote_requests.len(), 1);
    assert_eq!(remote_requests[0].method, "GET");
    assert_eq!(remote_requests[0].path, "/v1/volumes");
}

#[tokio::test]
async fn test_georep_create_step_order() {
    let p = pair().await;
    p.client
        .georep_create("mastervol", &remote_of(&p), "remotevol", &GeorepCreateOptions::default())
        .await
        .unwrap();

    let paths: Vec<(String, String)> = p
        .master
        .requests()
        .into_iter()
        .map(|r| (r.method, r.path))
        .collect();
    assert_eq!(
        paths,
        vec![
            ("GET".to_string(), "/v1/volumes/mastervol".to_string()),
            ("GET".to_string(), "/v1/peers".to_string()),
            ("POST".to_string(), "/v1/geo-replication/mvol-id/rvol-id".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_georep_create_default_remote_endpoint_reuses_local_credentials() {
    let master = MockCluster::start(Some(SECRET)).await;
    // same secret on both sides, remote reached at http://host:port
    let remote = MockCluster::start(Some(SECRET)).await;
    master.add_volume("mastervol", "mvol-id");
    master.add_peer("peer-remote", &["127.0.0.1:24008"]);
    remote.add_volume("remotevol", "rvol-id");
    let client = Client::new(master.endpoint("glustercli", Some(SECRET))).unwrap();

    let remote_cluster = RemoteCluster::new("127.0.0.1", remote.port() as i64);
    let created = client
        .georep_create("mastervol", &remote_cluster, "remotevol", &GeorepCreateOptions::default())
        .await
        .unwrap();
    assert_eq!(created.remote_volume_id, "rvol-id");
    assert_eq!(remote.requests_to("GET", "/v1/volumes").len(), 1);
}

#[tokio::test]
async fn test_remote_credentials_on_default_endpoint() {
    let p = pair().await;
    // remote reached at http://host:port but signed with its own secret
    let remote = RemoteCluster::new("127.0.0.1", p.remote.port())
        .with_credentials(Some("georep"), Some(REMOTE_SECRET));
    let created = p
        .client
        .georep_create("mastervol", &remote, "remotevol", &GeorepCreateOptions::default())
        .await
        .unwrap();
    assert_eq!(created.remote_volume_id, "rvol-id");

    let lookups = p.remote.requests_to("GET", "/v1/volumes");
    assert_eq!(lookups.len(), 1);
    assert!(lookups[0].authorization.as_deref().unwrap().starts_with("bearer "));

    // without them the local secret signs the lookup and the remote refuses it
    let local_signed = RemoteCluster::new("127.0.0.1", p.remote.port());
    let err = p
        .client
        .georep_create("mastervol", &local_signed, "remotevol", &GeorepCreateOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::UnexpectedStatus { status: 401, .. }));
}

#[tokio::test]
async fn test_remote_lookup_signed_with_remote_credentials() {
    let p = pair().await;
    // a remote endpoint carrying the master's secret is rejected by the remote cluster
    let wrong = RemoteCluster::new("127.0.0.1", p.remote.port())
        .with_endpoint(p.remote.endpoint("georep", Some(SECRET)));
    let err = p
        .client
        .georep_create("mastervol", &wrong, "remotevol", &GeorepCreateOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::UnexpectedStatus { status: 401, .. }));
    assert!(p
        .master
        .requests()
        .iter()
        .all(|r| r.method != "POST"));
}

#[tokio::test]
async fn test_endpoint_unchanged_after_remote_failure() {
    let p = pair().await;
    let before = p.client.endpoint().clone();

    let err = p
        .client
        .georep_create("mastervol", &remote_of(&p), "ghostvol", &GeorepCreateOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::VolumeNotFound { ref name } if name == "ghostvol"));
    assert_eq!(p.client.endpoint(), &before);
    assert!(p.master.requests().iter().all(|r| r.method != "POST"));

    // the same client still talks to the master cluster afterwards
    let sessions = p.client.georep_list().await.unwrap();
    assert!(sessions.is_empty());
    assert_eq!(p.master.requests().last().unwrap().path, "/v1/geo-replication");
}

#[tokio::test]
async fn test_georep_create_unknown_peer() {
    let p = pair().await;
    let remote = RemoteCluster::new("10.0.0.9", p.remote.port())
        .with_endpoint(p.remote.endpoint("georep", Some(REMOTE_SECRET)));
    let err = p
        .client
        .georep_create("mastervol", &remote, "remotevol", &GeorepCreateOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(matches!(err, ApiError::PeerNotFound { .. }));
    assert_eq!(p.remote.request_count(), 0);
}

#[tokio::test]
async fn test_georep_create_unknown_master_volume() {
    let p = pair().await;
    let err = p
        .client
        .georep_create("nosuchvol", &remote_of(&p), "remotevol", &GeorepCreateOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::VolumeNotFound { ref name } if name == "nosuchvol"));
    assert_eq!(p.master.request_count(), 1);
    assert_eq!(p.remote.request_count(), 0);
}

#[tokio::test]
async fn test_georep_create_rejects_bad_remote_without_network() {
    let p = pair().await;
    for remote in [
        RemoteCluster::new("127.0.0.1", 0),
        RemoteCluster::new("127.0.0.1", 65536),
        RemoteCluster::new("127.0.0.1", -1),
        RemoteCluster::new("not-an-ip", p.remote.port() as i64),
    ] {
        let err = p
            .client
            .georep_create("mastervol", &remote, "remotevol", &GeorepCreateOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
    assert_eq!(p.master.request_count(), 0);
    assert_eq!(p.remote.request_count(), 0);
}

#[tokio::test]
async fn test_extract_remote_volume_id() {
    let p = pair().await;
    let id = p
        .client
        .extract_remote_volume_id(&remote_of(&p), "remotevol")
        .await
        .unwrap();
    assert_eq!(id, "rvol-id");
    assert_eq!(p.master.request_count(), 0);
}

#[tokio::test]
async fn test_extract_remote_volume_id_rejects_bad_port_and_host() {
    let p = pair().await;
    for (host, port) in [("127.0.0.1", 0), ("127.0.0.1", 65536), ("127.0.0.1", -1), ("not-an-ip", 24007)] {
        let remote = RemoteCluster::new(host, port)
            .with_endpoint(p.remote.endpoint("georep", Some(REMOTE_SECRET)));
        let err = p
            .client
            .extract_remote_volume_id(&remote, "remotevol")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput, "{}:{}", host, port);
    }
    assert_eq!(p.remote.request_count(), 0);
}

#[tokio::test]
async fn test_georep_create_failure_status() {
    let p = pair().await;
    p.master
        .override_status("POST", "/v1/geo-replication/mvol-id/rvol-id", 500);
    let err = p
        .client
        .georep_create("mastervol", &remote_of(&p), "remotevol", &GeorepCreateOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(matches!(err, ApiError::UnexpectedStatus { expected: 201, status: 500, .. }));
}

#[tokio::test]
async fn test_lifecycle_start_stop_status_delete() {
    let master = MockCluster::start(Some(SECRET)).await;
    master.add_session(session("mastervol", "m1", "remotevol", "r1", "10.0.0.2"));
    let client = Client::new(master.endpoint("glustercli", Some(SECRET))).unwrap();

    let started = client
        .georep_start("mastervol", "10.0.0.2", "remotevol", false)
        .await
        .unwrap();
    assert_eq!(started.monitor_status, "Started");
    let start_req = master.requests_to("POST", "/v1/geo-replication/m1/r1/start");
    assert_eq!(start_req[0].body.as_ref().unwrap()["force"], false);

    let stopped = client
        .georep_stop("mastervol", "10.0.0.2", "remotevol", true)
        .await
        .unwrap();
    assert_eq!(stopped.monitor_status, "Stopped");
    let stop_req = master.requests_to("POST", "/v1/geo-replication/m1/r1/stop");
    assert_eq!(stop_req[0].body.as_ref().unwrap()["force"], true);

    let status = client
        .georep_status("mastervol", "10.0.0.2", "remotevol")
        .await
        .unwrap();
    assert_eq!(status.master_volume_id, "m1");
    assert_eq!(status.monitor_status, "Stopped");

    client
        .georep_delete("mastervol", "10.0.0.2", "remotevol", false)
        .await
        .unwrap();
    assert!(master.sessions().is_empty());
    assert!(client.georep_list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_lifecycle_unknown_session_sends_nothing() {
    let master = MockCluster::start(Some(SECRET)).await;
    master.add_session(session("mastervol", "m1", "remotevol", "r1", "10.0.0.2"));
    let client = Client::new(master.endpoint("glustercli", Some(SECRET))).unwrap();

    let start = client.georep_start("ghostvol", "10.0.0.2", "remotevol", false).await;
    let stop = client.georep_stop("ghostvol", "10.0.0.2", "remotevol", false).await;
    let delete = client.georep_delete("ghostvol", "10.0.0.2", "remotevol", false).await;
    let status = client.georep_status("ghostvol", "10.0.0.2", "remotevol").await;

    assert_eq!(start.unwrap_err().kind(), ErrorKind::InvalidInput);
    assert_eq!(stop.unwrap_err().kind(), ErrorKind::InvalidInput);
    assert_eq!(delete.unwrap_err().kind(), ErrorKind::InvalidInput);
    assert_eq!(status.unwrap_err().kind(), ErrorKind::InvalidInput);

    // only the session listings went out
    let requests = master.requests();
    assert_eq!(requests.len(), 4);
    assert!(requests
        .iter()
        .all(|r| r.method == "GET" && r.path == "/v1/geo-replication"));
}

#[tokio::test]
async fn test_lifecycle_requires_matching_host() {
    let master = MockCluster::start(None).await;
    master.add_session(session("mastervol", "m1", "remotevol", "r1", "10.0.0.2"));
    let client = Client::new(master.endpoint("glustercli", None)).unwrap();

    let err = client
        .georep_start("mastervol", "10.0.0.3", "remotevol", false)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn test_delete_unexpected_status() {
    let master = MockCluster::start(None).await;
    master.add_session(session("mastervol", "m1", "remotevol", "r1", "10.0.0.2"));
    master.override_status("DELETE", "/v1/geo-replication/m1/r1", 200);
    let client = Client::new(master.endpoint("glustercli", None)).unwrap();

    let err = client
        .georep_delete("mastervol", "10.0.0.2", "remotevol", false)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::UnexpectedStatus { expected: 204, status: 200, .. }));
}

#[tokio::test]
async fn test_explicit_remote_endpoint_user() {
    let p = pair().await;
    let remote = RemoteCluster::new("127.0.0.1", p.remote.port()).with_endpoint(ClusterEndpoint::new(
        &p.remote.base_url(),
        "remote-admin",
        Some(REMOTE_SECRET),
    ));
    p.client
        .georep_create("mastervol", &remote, "remotevol", &GeorepCreateOptions::default())
        .await
        .unwrap();
    let auth = p.remote.requests()[0].authorization.clone().unwrap();
    assert!(auth.starts_with("bearer "));
}
