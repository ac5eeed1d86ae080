//! Connection URI parsing
//!
//! ```text
//! revtree:?ca=10.0.0.1:8046&ca=10.0.0.2:8046
//! revtree:?cn=prod&sk=secret
//! ```

use url::form_urlencoded;

use crate::error::{Result, RevtreeError};

/// Every connection URI starts with this prefix
pub const URI_PREFIX: &str = "revtree:?";

/// A parsed connection URI
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterUri {
    /// Cluster name (`cn`), looked up through a bootstrap connection
    pub name: Option<String>,
    /// Explicit candidate addresses (`ca`)
    pub addrs: Vec<String>,
    /// Secret token (`sk`) passed to ACCESS after connecting
    pub secret: Option<String>,
}

impl ClusterUri {
    /// Parse a connection URI
    ///
    /// Only the syntax is validated here; whether the URI names enough to
    /// connect is decided during resolution. Empty values are ignored and
    /// the first `cn` and `sk` win.
    pub fn parse(uri: &str) -> Result<Self> {
        let query = uri
            .strip_prefix(URI_PREFIX)
            .ok_or_else(|| RevtreeError::InvalidUri(format!("missing {} prefix: {}", URI_PREFIX, uri)))?;
        validate_query(query)
            .map_err(|reason| RevtreeError::InvalidUri(format!("{}: {}", reason, uri)))?;

        let mut parsed = ClusterUri::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "ca" => parsed.addrs.push(value.into_owned()),
                "cn" if parsed.name.is_none() => parsed.name = Some(value.into_owned()),
                "sk" if parsed.secret.is_none() => parsed.secret = Some(value.into_owned()),
                _ => {}
            }
        }

        Ok(parsed)
    }
}

/// Reject query strings that `form_urlencoded` would otherwise decode leniently
fn validate_query(query: &str) -> std::result::Result<(), &'static str> {
    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        if pair.contains(';') {
            return Err("semicolon in query");
        }

        let key = pair.split_once('=').map_or(pair, |(key, _)| key);
        if key.is_empty() {
            return Err("empty query key");
        }

        let bytes = pair.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'%' {
                let escape = bytes.get(i + 1..i + 3);
                if !escape.is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit)) {
                    return Err("invalid percent escape");
                }
                i += 3;
            } else {
                i += 1;
            }
        }
    }
    Ok(())
}
