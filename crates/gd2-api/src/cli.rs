use crate::client::Client;
use crate::config::ClientConfig;
use crate::endpoint::{ClusterEndpoint, RemoteCluster};
use crate::georep::{GeorepCreateOptions, DEFAULT_REMOTE_USER};
use crate::volume::VolumeCreateOptions;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gd2ctl")]
#[command(about = "GlusterD2 REST API client", long_about = None)]
pub struct Cli {
    /// TOML or JSON client config
    #[arg(short, long, env = "GD2_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(short, long, env = "GD2_ENDPOINT")]
    pub endpoint: Option<String>,

    #[arg(short, long, env = "GD2_USER")]
    pub user: Option<String>,

    #[arg(long, env = "GD2_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    #[arg(long, env = "GD2_SECRET_FILE")]
    pub secret_file: Option<PathBuf>,

    /// Skip TLS certificate verification
    #[arg(long)]
    pub insecure: bool,

    #[arg(long)]
    pub timeout_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    Peer {
        #[command(subcommand)]
        cmd: PeerCmd,
    },
    Volume {
        #[command(subcommand)]
        cmd: VolumeCmd,
    },
    Georep {
        #[command(subcommand)]
        cmd: GeorepCmd,
    },
}

#[derive(Subcommand, Clone)]
pub enum PeerCmd {
    Add {
        host: String,
        #[arg(long)]
        zone: Option<String>,
    },
    Remove {
        peer_id: String,
    },
    List,
}

#[derive(Subcommand, Clone)]
pub enum VolumeCmd {
    Create {
        name: String,
        /// Bricks as peerid:/path
        #[arg(required = true)]
        bricks: Vec<String>,
        #[arg(long, default_value = "tcp")]
        transport: String,
        #[arg(long, default_value = "0")]
        replica: u32,
        #[arg(long, default_value = "0")]
        arbiter: u32,
        #[arg(long, default_value = "0")]
        disperse: u32,
        #[arg(long, default_value = "0")]
        disperse_data: u32,
        #[arg(long, default_value = "0")]
        disperse_redundancy: u32,
        #[arg(long)]
        force: bool,
        /// Volume option as key=value, repeatable
        #[arg(long = "option", value_parser = parse_key_val)]
        options: Vec<(String, String)>,
    },
    Start {
        name: String,
        #[arg(long)]
        force: bool,
    },
    Stop {
        name: String,
        #[arg(long)]
        force: bool,
    },
    Delete {
        name: String,
    },
    Info {
        name: String,
    },
    List,
}

#[derive(Args, Clone)]
pub struct SessionArgs {
    pub master_volume: String,
    pub remote_host: String,
    pub remote_volume: String,
}

/// How to reach the remote cluster's REST API.
#[derive(Args, Clone)]
pub struct RemoteArgs {
    #[arg(long, default_value = "24007", allow_negative_numbers = true)]
    pub remote_port: i64,
    /// REST endpoint of the remote cluster; defaults to http://host:port
    #[arg(long)]
    pub remote_endpoint: Option<String>,
    /// Remote API user; defaults to the local user
    #[arg(long)]
    pub remote_api_user: Option<String>,
    /// Remote signing secret; defaults to the local secret
    #[arg(long, hide_env_values = true, env = "GD2_REMOTE_SECRET")]
    pub remote_secret: Option<String>,
    #[arg(long)]
    pub remote_insecure: bool,
}

impl RemoteArgs {
    /// Remote cluster at `host`, with credentials falling back to `local`.
    pub fn remote_cluster(&self, host: &str, local: &ClusterEndpoint) -> RemoteCluster {
        let remote = RemoteCluster::new(host, self.remote_port);
        if let Some(url) = &self.remote_endpoint {
            let user = self.remote_api_user.as_deref().unwrap_or(&local.user);
            let secret = self.remote_secret.as_deref().or(local.secret.as_deref());
            return remote.with_endpoint(
                ClusterEndpoint::new(url, user, secret).with_verify(!self.remote_insecure),
            );
        }
        let remote =
            remote.with_credentials(self.remote_api_user.as_deref(), self.remote_secret.as_deref());
        if self.remote_insecure {
            remote.with_verify(false)
        } else {
            remote
        }
    }
}

#[derive(Subcommand, Clone)]
pub enum GeorepCmd {
    Create {
        #[command(flatten)]
        session: SessionArgs,
        #[command(flatten)]
        remote: RemoteArgs,
        /// User the session replicates as on the remote side
        #[arg(long, default_value = DEFAULT_REMOTE_USER)]
        remote_user: String,
        #[arg(long)]
        force: bool,
    },
    Start {
        #[command(flatten)]
        session: SessionArgs,
        #[arg(long)]
        force: bool,
    },
    Stop {
        #[command(flatten)]
        session: SessionArgs,
        #[arg(long)]
        force: bool,
    },
    Delete {
        #[command(flatten)]
        session: SessionArgs,
        #[arg(long)]
        force: bool,
    },
    /// All sessions, or one when master, host and remote volume are given
    Status {
        #[arg(requires_all = ["remote_host", "remote_volume"])]
        master_volume: Option<String>,
        remote_host: Option<String>,
        remote_volume: Option<String>,
    },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .filter(|(k, _)| !k.is_empty())
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {}", s))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

impl Cli {
    /// File config (if any) with command-line overrides applied.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::from_file(path)?,
            None => ClientConfig::default(),
        };
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(user) = &self.user {
            config.user = user.clone();
        }
        if let Some(secret) = &self.secret {
            config.secret = Some(secret.clone());
        }
        if let Some(secret_file) = &self.secret_file {
            config.secret_file = Some(secret_file.clone());
        }
        if self.insecure {
            config.verify_tls = false;
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.timeout_secs = timeout_secs;
        }
        Ok(config)
    }

    pub async fn run(self) -> Result<()> {
        let config = self.client_config()?;
        let client = Client::with_timeout(config.to_endpoint()?, config.timeout()?)?;
        tracing::debug!(endpoint = %client.endpoint().base_url, "client ready");

        match &self.command {
            Command::Peer { cmd } => Self::peer(&client, cmd).await,
            Command::Volume { cmd } => Self::volume(&client, cmd).await,
            Command::Georep { cmd } => Self::georep(&client, cmd).await,
        }
    }

    async fn peer(client: &Client, cmd: &PeerCmd) -> Result<()> {
        match cmd {
            PeerCmd::Add { host, zone } => {
                print_json(&client.peer_add(host, zone.as_deref(), HashMap::new()).await?)
            }
            PeerCmd::Remove { peer_id } => {
                client.peer_remove(peer_id).await?;
                println!("Peer {} removed", peer_id);
                Ok(())
            }
            PeerCmd::List => {
                let peers = client.peer_list().await?;
                println!("{:<38} {:<20} {:<8} {}", "ID", "NAME", "ONLINE", "PEER ADDRESSES");
                println!("{}", "-".repeat(90));
                for peer in peers {
                    println!(
                        "{:<38} {:<20} {:<8} {}",
                        peer.id,
                        peer.name,
                        if peer.online { "yes" } else { "no" },
                        peer.peer_addresses.join(",")
                    );
                }
                Ok(())
            }
        }
    }

    async fn volume(client: &Client, cmd: &VolumeCmd) -> Result<()> {
        match cmd {
            VolumeCmd::Create {
                name,
                bricks,
                transport,
                replica,
                arbiter,
                disperse,
                disperse_data,
                disperse_redundancy,
                force,
                options,
            } => {
                let opts = VolumeCreateOptions {
                    transport: Some(transport.clone()),
                    replica: *replica,
                    arbiter: *arbiter,
                    disperse: *disperse,
                    disperse_data: *disperse_data,
                    disperse_redundancy: *disperse_redundancy,
                    force: *force,
                    options: options.iter().cloned().collect(),
                    metadata: HashMap::new(),
                };
                print_json(&client.volume_create(name, bricks, &opts).await?)
            }
            VolumeCmd::Start { name, force } => print_json(&client.volume_start(name, *force).await?),
            VolumeCmd::Stop { name, force } => print_json(&client.volume_stop(name, *force).await?),
            VolumeCmd::Delete { name } => {
                client.volume_delete(name).await?;
                println!("Volume {} deleted", name);
                Ok(())
            }
            VolumeCmd::Info { name } => print_json(&client.volume_info(name).await?),
            VolumeCmd::List => print_json(&client.volume_list().await?),
        }
    }

    async fn georep(client: &Client, cmd: &GeorepCmd) -> Result<()> {
        match cmd {
            GeorepCmd::Create {
                session,
                remote,
                remote_user,
                force,
            } => {
                let remote = remote.remote_cluster(&session.remote_host, client.endpoint());
                let opts = GeorepCreateOptions {
                    remote_user: remote_user.clone(),
                    force: *force,
                };
                let created = client
                    .georep_create(&session.master_volume, &remote, &session.remote_volume, &opts)
                    .await?;
                print_json(&created)
            }
            GeorepCmd::Start { session, force } => print_json(
                &client
                    .georep_start(
                        &session.master_volume,
                        &session.remote_host,
                        &session.remote_volume,
                        *force,
                    )
                    .await?,
            ),
            GeorepCmd::Stop { session, force } => print_json(
                &client
                    .georep_stop(
                        &session.master_volume,
                        &session.remote_host,
                        &session.remote_volume,
                        *force,
                    )
                    .await?,
            ),
            GeorepCmd::Delete { session, force } => {
                client
                    .georep_delete(
                        &session.master_volume,
                        &session.remote_host,
                        &session.remote_volume,
                        *force,
                    )
                    .await?;
                println!(
                    "Session {} -> {}::{} deleted",
                    session.master_volume, session.remote_host, session.remote_volume
                );
                Ok(())
            }
            GeorepCmd::Status {
                master_volume,
                remote_host,
                remote_volume,
            } => match (master_volume, remote_host, remote_volume) {
                (Some(m), Some(h), Some(r)) => print_json(&client.georep_status(m, h, r).await?),
                _ => print_json(&client.georep_list().await?),
            },
        }
    }
}
