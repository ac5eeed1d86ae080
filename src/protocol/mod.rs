//! Protocol Module
//!
//! Defines the wire protocol spoken with the store.
//!
//! ## Frame Format
//! ```text
//! ┌──────────┬─────────────────────────────┐
//! │ Len (4)  │     Encoded message         │
//! └──────────┴─────────────────────────────┘
//! ```
//!
//! The length is an unsigned big-endian integer. The message is a bincode
//! encoded [`Request`] or [`Response`].
//!
//! ### Request fields
//! tag, verb, path, value, offset, rev
//!
//! ### Response fields
//! tag, flags, rev, path, value, len, err_code, err_detail
//!
//! Responses are matched to requests by tag alone; a server may answer in
//! any order.

mod codec;
mod frame;
mod message;

pub use codec::{
    decode_request, decode_response, encode_request, encode_response, DEFAULT_MAX_MESSAGE_SIZE,
};
pub use frame::{read_frame, write_frame, LENGTH_PREFIX_SIZE, MAX_FRAME_LEN};
pub use message::{ErrorCode, Request, Response, Verb, REV_CLOBBER, REV_DIR, REV_MISSING};
