//! Message codec
//!
//! Serializes requests and responses into frame payloads.
//!
//! Messages are encoded with bincode's default options (varint integers,
//! little endian). The client side only ever calls [`encode_request`] and
//! [`decode_response`]; the mirror functions exist for anything playing the
//! server role.

use bincode::Options;

use super::{Request, Response};
use crate::error::{Result, RevtreeError};

/// Default upper bound on an encoded request (16 MB)
pub const DEFAULT_MAX_MESSAGE_SIZE: u64 = 16 * 1024 * 1024;

fn options() -> impl Options {
    bincode::DefaultOptions::new()
}

// =============================================================================
// Request Encoding/Decoding
// =============================================================================

/// Encode a request, failing if the encoding would exceed `max_size` bytes
pub fn encode_request(request: &Request, max_size: u64) -> Result<Vec<u8>> {
    options()
        .with_limit(max_size)
        .serialize(request)
        .map_err(|e| RevtreeError::Encode(format!("{} request: {}", request.verb, e)))
}

/// Decode a request
pub fn decode_request(bytes: &[u8]) -> Result<Request> {
    options()
        .deserialize(bytes)
        .map_err(|e| RevtreeError::Decode(format!("request: {}", e)))
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response
pub fn encode_response(response: &Response) -> Result<Vec<u8>> {
    options()
        .serialize(response)
        .map_err(|e| RevtreeError::Encode(format!("response: {}", e)))
}

/// Decode a response
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    options()
        .deserialize(bytes)
        .map_err(|e| RevtreeError::Decode(format!("response: {}", e)))
}
