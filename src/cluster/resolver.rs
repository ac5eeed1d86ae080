//! Cluster resolver
//!
//! Turns a connection URI into a live, optionally authenticated connection.
//!
//! ## Resolution
//! 1. `cn` plus a bootstrap URI: dial the bootstrap URI and read the members
//!    published under `/ctl/ns/<cn>`
//! 2. Otherwise: use the `ca` addresses
//! 3. Dial one candidate chosen at random
//! 4. Call ACCESS with `sk`, if present

use std::time::Duration;

use rand::seq::SliceRandom;

use super::uri::ClusterUri;
use crate::config::Config;
use crate::error::{Result, RevtreeError};
use crate::network::Conn;

/// Directory under which each cluster publishes its members
pub const NAMESPACE_ROOT: &str = "/ctl/ns";

/// Candidates and credentials produced by resolving a URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Cluster name, when the candidates came from a lookup
    pub cluster: Option<String>,
    pub addrs: Vec<String>,
    pub secret: Option<String>,
}

/// Connect to one of the servers named by `uri`
///
/// If `uri` carries a cluster name, its members are looked up through
/// `bootstrap`. If it carries a secret, the new connection is authenticated
/// before it is returned.
pub fn dial_uri(uri: &str, bootstrap: Option<&str>) -> Result<Conn> {
    dial_uri_with_config(uri, bootstrap, &Config::default())
}

/// Like [`dial_uri`], bounding each TCP connect by `timeout`
pub fn dial_uri_timeout(uri: &str, bootstrap: Option<&str>, timeout: Duration) -> Result<Conn> {
    let config = Config::builder().dial_timeout(timeout).build();
    dial_uri_with_config(uri, bootstrap, &config)
}

/// Like [`dial_uri`], with explicit connection settings
pub fn dial_uri_with_config(uri: &str, bootstrap: Option<&str>, config: &Config) -> Result<Conn> {
    let resolved = resolve_with_config(uri, bootstrap, config)?;

    let addr = resolved
        .addrs
        .choose(&mut rand::thread_rng())
        .ok_or_else(|| {
            RevtreeError::NoAddresses(resolved.cluster.clone().unwrap_or_default())
        })?;

    let conn = Conn::dial_with_config(addr, config)?;

    if let Some(secret) = &resolved.secret {
        if let Err(e) = conn.access(secret) {
            tracing::debug!("access to {} rejected: {}", addr, e);
            conn.close();
            return Err(e);
        }
    }

    Ok(conn)
}

/// Resolve `uri` to its candidate addresses without dialing a candidate
///
/// A cluster with no published members resolves to an empty list.
pub fn resolve(uri: &str, bootstrap: Option<&str>) -> Result<Resolved> {
    resolve_with_config(uri, bootstrap, &Config::default())
}

fn resolve_with_config(uri: &str, bootstrap: Option<&str>, config: &Config) -> Result<Resolved> {
    let parsed = ClusterUri::parse(uri)?;

    if let (Some(name), Some(bootstrap)) = (&parsed.name, bootstrap) {
        let conn = dial_uri_with_config(bootstrap, None, config)?;
        let addrs = lookup(&conn, name)?;
        tracing::debug!("cluster {} has {} candidates", name, addrs.len());
        return Ok(Resolved {
            cluster: Some(name.clone()),
            addrs,
            secret: parsed.secret,
        });
    }

    if parsed.addrs.is_empty() {
        return Err(RevtreeError::InvalidUri(format!(
            "no candidate addresses in {}",
            uri
        )));
    }

    Ok(Resolved {
        cluster: None,
        addrs: parsed.addrs,
        secret: parsed.secret,
    })
}

/// Addresses published for cluster `name`, read at one consistent revision
pub fn lookup(conn: &Conn, name: &str) -> Result<Vec<String>> {
    let rev = conn.rev()?;

    let dir = format!("{}/{}", NAMESPACE_ROOT, name);
    let members = match conn.getdir(&dir, rev, 0, -1) {
        Ok(members) => members,
        Err(e) if e.is_not_found() => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    members
        .iter()
        .map(|member| {
            let path = format!("{}/{}", dir, member);
            let (body, _) = conn.get(&path, Some(rev))?;
            String::from_utf8(body)
                .map_err(|e| RevtreeError::Decode(format!("address at {}: {}", path, e)))
        })
        .collect()
}
