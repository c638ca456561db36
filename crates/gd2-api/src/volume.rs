//! Volume lifecycle operations and name-to-id resolution.

use crate::client::{Client, NO_BODY};
use crate::error::{ApiError, Result};
use crate::models::{BrickRequest, ForceRequest, SubvolRequest, Volume, VolumeCreateRequest};
use crate::validate::validate_volume_name;
use reqwest::{Method, StatusCode};
use std::collections::HashMap;
use tracing::info;

pub const DEFAULT_TRANSPORT: &str = "tcp";

/// Layout and flags for [`Client::volume_create`].
#[derive(Debug, Clone, Default)]
pub struct VolumeCreateOptions {
    /// Defaults to [`DEFAULT_TRANSPORT`].
    pub transport: Option<String>,
    pub replica: u32,
    pub arbiter: u32,
    pub disperse: u32,
    pub disperse_data: u32,
    pub disperse_redundancy: u32,
    pub force: bool,
    pub options: HashMap<String, String>,
    pub metadata: HashMap<String, String>,
}

/// Parses a `peerid:/brick/path` spec.
pub fn parse_brick(spec: &str) -> Result<BrickRequest> {
    let (peerid, path) = spec
        .split_once(':')
        .ok_or_else(|| ApiError::invalid(format!("brick {} is not peerid:/path", spec)))?;
    if peerid.is_empty() || !path.starts_with('/') {
        return Err(ApiError::invalid(format!("brick {} is not peerid:/path", spec)));
    }
    Ok(BrickRequest {
        peerid: peerid.to_string(),
        path: path.to_string(),
    })
}

/// Groups bricks into subvolumes according to the requested layout.
pub fn build_volume_create_request(
    name: &str,
    bricks: &[String],
    opts: &VolumeCreateOptions,
) -> Result<VolumeCreateRequest> {
    validate_volume_name(name)?;
    if bricks.is_empty() {
        return Err(ApiError::invalid("at least one brick is required"));
    }
    let bricks = bricks
        .iter()
        .map(|b| parse_brick(b))
        .collect::<Result<Vec<_>>>()?;

    let disperse = if opts.disperse > 0 {
        opts.disperse
    } else {
        opts.disperse_data + opts.disperse_redundancy
    };
    if opts.replica > 0 && disperse > 0 {
        return Err(ApiError::invalid("replica and disperse are mutually exclusive"));
    }
    if opts.arbiter > 0 && opts.replica == 0 {
        return Err(ApiError::invalid("arbiter requires a replica count"));
    }

    let (subvol_type, group) = if opts.replica > 0 {
        ("replicate", (opts.replica + opts.arbiter) as usize)
    } else if disperse > 0 {
        ("disperse", disperse as usize)
    } else {
        ("distribute", bricks.len())
    };
    if bricks.len() % group != 0 {
        return Err(ApiError::invalid(format!(
            "{} bricks cannot be split into {} subvolumes of {}",
            bricks.len(),
            subvol_type,
            group
        )));
    }

    let subvols = bricks
        .chunks(group)
        .map(|chunk| SubvolRequest {
            subvol_type: subvol_type.to_string(),
            bricks: chunk.to_vec(),
            replica: opts.replica,
            arbiter: opts.arbiter,
            disperse_count: if opts.replica > 0 { 0 } else { opts.disperse },
            disperse_data: if opts.replica > 0 { 0 } else { opts.disperse_data },
            disperse_redundancy: if opts.replica > 0 { 0 } else { opts.disperse_redundancy },
        })
        .collect();

    Ok(VolumeCreateRequest {
        name: name.to_string(),
        transport: opts
            .transport
            .clone()
            .unwrap_or_else(|| DEFAULT_TRANSPORT.to_string()),
        subvols,
        force: opts.force,
        options: opts.options.clone(),
        metadata: opts.metadata.clone(),
    })
}

/// Id of the volume called `name` in a volume listing.
pub fn find_volume_id(volumes: &[Volume], name: &str) -> Result<String> {
    volumes
        .iter()
        .find(|v| v.name == name && !v.id.is_empty())
        .map(|v| v.id.clone())
        .ok_or_else(|| ApiError::VolumeNotFound {
            name: name.to_string(),
        })
}

impl Client {
    pub async fn volume_create(
        &self,
        name: &str,
        bricks: &[String],
        opts: &VolumeCreateOptions,
    ) -> Result<Volume> {
        let req = build_volume_create_request(name, bricks, opts)?;
        let volume: Volume = self
            .send(Method::POST, "/volumes", Some(&req))
            .await?
            .expect_status(StatusCode::CREATED)?
            .json()?;
        info!(volume = name, volume_id = %volume.id, "volume created");
        Ok(volume)
    }

    pub async fn volume_start(&self, name: &str, force: bool) -> Result<Volume> {
        self.volume_action(name, "start", force).await
    }

    pub async fn volume_stop(&self, name: &str, force: bool) -> Result<Volume> {
        self.volume_action(name, "stop", force).await
    }

    async fn volume_action(&self, name: &str, action: &str, force: bool) -> Result<Volume> {
        validate_volume_name(name)?;
        let path = format!("/volumes/{}/{}", name, action);
        let volume = self
            .send(Method::POST, &path, Some(&ForceRequest { force }))
            .await?
            .expect_status(StatusCode::OK)?
            .json()?;
        info!(volume = name, action, "volume action done");
        Ok(volume)
    }

    pub async fn volume_delete(&self, name: &str) -> Result<()> {
        validate_volume_name(name)?;
        self.send(Method::DELETE, &format!("/volumes/{}", name), NO_BODY)
            .await?
            .expect_status(StatusCode::NO_CONTENT)?;
        info!(volume = name, "volume deleted");
        Ok(())
    }

    /// Single-volume lookup. A 404 means the volume does not exist.
    pub async fn volume_info(&self, name: &str) -> Result<Volume> {
        validate_volume_name(name)?;
        let reply = self
            .send(Method::GET, &format!("/volumes/{}", name), NO_BODY)
            .await?;
        if reply.status() == StatusCode::NOT_FOUND {
            return Err(ApiError::VolumeNotFound {
                name: name.to_string(),
            });
        }
        reply.expect_status(StatusCode::OK)?.json()
    }

    pub async fn volume_list(&self) -> Result<Vec<Volume>> {
        self.get_json("/volumes").await
    }

    /// Id of volume `name` on this client's cluster.
    pub async fn resolve_volume_id(&self, name: &str) -> Result<String> {
        let volume = self.volume_info(name).await?;
        if volume.name != name || volume.id.is_empty() {
            return Err(ApiError::VolumeNotFound {
                name: name.to_string(),
            });
        }
        Ok(volume.id)
    }

    /// Like [`Client::resolve_volume_id`] but scans the full listing.
    pub async fn resolve_volume_id_from_list(&self, name: &str) -> Result<String> {
        validate_volume_name(name)?;
        let volumes = self.volume_list().await?;
        find_volume_id(&volumes, name)
    }
}
