//! Error types for revtree
//!
//! Provides a unified error type for all client operations.
//!
//! Errors fall in two groups. Terminal errors (`Transport`, `Closed`) end the
//! connection and are handed to every pending and future call. Everything
//! else belongs to the single call that produced it.

use std::fmt;
use std::io;
use std::sync::Arc;

use thiserror::Error;

use crate::protocol::{ErrorCode, Verb};

/// Result type alias using RevtreeError
pub type Result<T> = std::result::Result<T, RevtreeError>;

/// Unified error type for revtree operations
///
/// Cloneable so one terminal error can be delivered to many waiting callers.
#[derive(Debug, Clone, Error)]
pub enum RevtreeError {
    // -------------------------------------------------------------------------
    // Connection Errors
    // -------------------------------------------------------------------------
    #[error("transport error: {0}")]
    Transport(Arc<io::Error>),

    #[error("connection closed")]
    Closed,

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    #[error("encode error: {0}")]
    Encode(String),

    #[error("decode error: {0}")]
    Decode(String),

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("no such entry: {0}")]
    NotFound(String),

    // -------------------------------------------------------------------------
    // Resolution Errors
    // -------------------------------------------------------------------------
    #[error("invalid uri: {0}")]
    InvalidUri(String),

    #[error("no addresses for cluster {0}")]
    NoAddresses(String),
}

impl From<io::Error> for RevtreeError {
    fn from(err: io::Error) -> Self {
        RevtreeError::Transport(Arc::new(err))
    }
}

impl RevtreeError {
    /// Server error code, if the store rejected the request
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            RevtreeError::Server(err) => Some(err.code),
            _ => None,
        }
    }

    /// True for a missing entry, whether reported by the store or by `statinfo`
    pub fn is_not_found(&self) -> bool {
        matches!(self, RevtreeError::NotFound(_)) || self.code() == Some(ErrorCode::NoEnt)
    }

    /// True when the store reported an offset past the end of a listing
    pub fn is_range(&self) -> bool {
        self.code() == Some(ErrorCode::Range)
    }

    /// True for errors that end the connection
    pub fn is_terminal(&self) -> bool {
        matches!(self, RevtreeError::Transport(_) | RevtreeError::Closed)
    }
}

/// An error code returned by the store, with the request that caused it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerError {
    pub verb: Verb,
    pub path: Option<String>,
    pub code: ErrorCode,
    pub detail: Option<String>,
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.verb)?;
        if let Some(path) = &self.path {
            write!(f, " {}", path)?;
        }
        write!(f, ": {}", self.code)?;
        if let Some(detail) = &self.detail {
            write!(f, ": {}", detail)?;
        }
        Ok(())
    }
}

impl std::error::Error for ServerError {}
