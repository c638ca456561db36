//! Input checks run before any request leaves the client.

use crate::error::{ApiError, Result};
use std::net::Ipv4Addr;

pub const MAX_VOLUME_NAME_LEN: usize = 64;

/// Volume names are 1..=64 chars of `[A-Za-z0-9_-]` and may not start with `-`.
pub fn validate_volume_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ApiError::invalid("volume name is empty"));
    }
    if name.len() > MAX_VOLUME_NAME_LEN {
        return Err(ApiError::invalid(format!(
            "volume name longer than {} characters",
            MAX_VOLUME_NAME_LEN
        )));
    }
    if name.starts_with('-') {
        return Err(ApiError::invalid(format!("invalid volume name: {}", name)));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ApiError::invalid(format!("invalid volume name: {}", name)));
    }
    Ok(())
}

pub fn validate_remote_host(host: &str) -> Result<Ipv4Addr> {
    host.parse::<Ipv4Addr>()
        .map_err(|_| ApiError::invalid(format!("invalid remote host IP address: {}", host)))
}

pub fn validate_port(port: i64) -> Result<u16> {
    if !(1..=65535).contains(&port) {
        return Err(ApiError::invalid(format!("incorrect port: {}", port)));
    }
    Ok(port as u16)
}

pub fn require_non_empty(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ApiError::invalid(format!("{} is empty", what)));
    }
    Ok(())
}

/// An id that goes into a URL path as one segment.
pub fn validate_path_id(what: &str, value: &str) -> Result<()> {
    require_non_empty(what, value)?;
    if value == "." || value == ".." {
        return Err(ApiError::invalid(format!("invalid {}: {}", what, value)));
    }
    if value
        .chars()
        .any(|c| matches!(c, '/' | '\\' | '?' | '#' | '%') || c.is_whitespace() || c.is_control())
    {
        return Err(ApiError::invalid(format!("invalid {}: {}", what, value)));
    }
    Ok(())
}

/// Host part of an advertised address: drops a `:port` suffix and IPv6 brackets.
pub fn strip_port(addr: &str) -> &str {
    if let Some(rest) = addr.strip_prefix('[') {
        return match rest.find(']') {
            Some(end) => &rest[..end],
            None => rest,
        };
    }
    match addr.rsplit_once(':') {
        // a bare IPv6 literal has several colons and no port
        Some((host, port)) if !host.contains(':') && port.chars().all(|c| c.is_ascii_digit()) => {
            host
        }
        _ => addr,
    }
}
