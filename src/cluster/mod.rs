//! Cluster Module
//!
//! Connection strings and cluster membership lookup.

mod resolver;
mod uri;

pub use resolver::{
    dial_uri, dial_uri_timeout, dial_uri_with_config, lookup, resolve, Resolved, NAMESPACE_ROOT,
};
pub use uri::{ClusterUri, URI_PREFIX};
