//! # revtree
//!
//! A client for a tree-structured, revisioned key-value store:
//! - One TCP connection shared by any number of caller threads
//! - Tag-multiplexed requests, answered in any order
//! - Blocking get/set/del/stat, paginated listings, change notification
//! - Cluster lookup through a bootstrap connection
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Caller threads (Conn methods)               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ submit / wait
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Multiplexer thread                     │
//! │              (tag table, sole socket writer)                │
//! └──────────┬──────────────────────────────────▲───────────────┘
//!            │ frames                           │ frames
//!            ▼                                  │
//!   ┌─────────────────┐                ┌────────┴────────┐
//!   │   TCP (write)   │                │  Reader thread  │
//!   └─────────────────┘                └─────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use revtree::Conn;
//!
//! let conn = Conn::dial("127.0.0.1:8046")?;
//! let rev = conn.set("/config/mode", revtree::protocol::REV_CLOBBER, b"active")?;
//! let (body, _) = conn.get("/config/mode", Some(rev))?;
//! assert_eq!(body, b"active");
//! # Ok::<(), revtree::RevtreeError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;
pub mod cluster;
pub mod types;

mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, RevtreeError, ServerError};
pub use config::Config;
pub use network::Conn;
pub use cluster::{dial_uri, dial_uri_timeout, ClusterUri};
pub use types::{Event, FileInfo, FileRev, FLAG_DEL, FLAG_SET};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of revtree
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
