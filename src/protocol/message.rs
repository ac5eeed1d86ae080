//! Message definitions
//!
//! Request and response records exchanged with the store. Every field except
//! the verb is optional on the wire; operations pick the fields they need.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Revision reported by STAT for a path that does not exist
pub const REV_MISSING: i64 = -1;

/// Revision accepted by SET to overwrite regardless of the current revision
pub const REV_CLOBBER: i64 = -2;

/// Revision reported by STAT for a directory
pub const REV_DIR: i64 = -3;

/// Request verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verb {
    Get,
    Set,
    Del,
    Rev,
    Wait,
    #[default]
    Nop,
    Walk,
    Getdir,
    Stat,
    Access,
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Verb::Get => "GET",
            Verb::Set => "SET",
            Verb::Del => "DEL",
            Verb::Rev => "REV",
            Verb::Wait => "WAIT",
            Verb::Nop => "NOP",
            Verb::Walk => "WALK",
            Verb::Getdir => "GETDIR",
            Verb::Stat => "STAT",
            Verb::Access => "ACCESS",
        };
        f.write_str(name)
    }
}

/// Error codes a server may attach to a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    Other,
    TagInUse,
    UnknownVerb,
    Readonly,
    TooLate,
    RevMismatch,
    BadPath,
    MissingArg,
    Range,
    NotDir,
    IsDir,
    NoEnt,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ErrorCode::Other => "other error",
            ErrorCode::TagInUse => "tag in use",
            ErrorCode::UnknownVerb => "unknown verb",
            ErrorCode::Readonly => "read-only",
            ErrorCode::TooLate => "too late",
            ErrorCode::RevMismatch => "revision mismatch",
            ErrorCode::BadPath => "bad path",
            ErrorCode::MissingArg => "missing argument",
            ErrorCode::Range => "out of range",
            ErrorCode::NotDir => "not a directory",
            ErrorCode::IsDir => "is a directory",
            ErrorCode::NoEnt => "no such entry",
        };
        f.write_str(text)
    }
}

/// A request sent to the store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Correlation tag, stamped by the multiplexer
    pub tag: Option<i32>,
    pub verb: Verb,
    pub path: Option<String>,
    pub value: Option<Vec<u8>>,
    pub offset: Option<i32>,
    pub rev: Option<i64>,
}

impl Request {
    /// Create an untagged request for `verb`
    pub fn new(verb: Verb) -> Self {
        Self {
            verb,
            ..Self::default()
        }
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn value(mut self, value: impl Into<Vec<u8>>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn rev(mut self, rev: Option<i64>) -> Self {
        self.rev = rev;
        self
    }

    pub fn offset(mut self, offset: i32) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// A response received from the store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Tag of the request this answers
    pub tag: Option<i32>,
    pub flags: Option<i32>,
    pub rev: Option<i64>,
    pub path: Option<String>,
    pub value: Option<Vec<u8>>,
    pub len: Option<i32>,
    pub err_code: Option<ErrorCode>,
    pub err_detail: Option<String>,
}

impl Response {
    /// Create a successful response for `tag`
    pub fn ok(tag: i32) -> Self {
        Self {
            tag: Some(tag),
            ..Self::default()
        }
    }

    /// Create an error response for `tag`
    pub fn error(tag: i32, code: ErrorCode) -> Self {
        Self {
            tag: Some(tag),
            err_code: Some(code),
            ..Self::default()
        }
    }
}
