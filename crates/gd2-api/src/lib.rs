#![warn(missing_docs)]

//! GlusterD2 REST bindings: peer membership, volume lifecycle and
//! cross-cluster geo-replication sessions, with per-request signed tokens.

pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod georep;
pub mod models;
pub mod peer;
pub mod validate;
pub mod volume;

pub use client::{Client, Reply};
pub use config::ClientConfig;
pub use endpoint::{ClusterEndpoint, RemoteCluster};
pub use error::{ApiError, ErrorKind, Result};
pub use georep::GeorepCreateOptions;
pub use volume::VolumeCreateOptions;
