//! Frame codec
//!
//! Splits a byte stream into length-prefixed frames and back.

use std::io::{self, Read, Write};

use bytes::{Bytes, BytesMut};

use crate::error::Result;

/// Length prefix size: 4 bytes, big endian
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Largest payload the length prefix can describe
pub const MAX_FRAME_LEN: u64 = u32::MAX as u64;

/// Write one frame: length prefix followed by `payload`
///
/// Payloads that do not fit the length prefix are rejected before anything
/// is written.
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<()> {
    let len = u32::try_from(payload.len()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("frame of {} bytes exceeds length prefix", payload.len()),
        )
    })?;
    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(payload)?;
    writer.flush()?;
    Ok(())
}

/// Read one frame
///
/// Blocks until a complete frame is received. A short read or a closed stream
/// is reported as a transport error.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Bytes> {
    let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
    reader.read_exact(&mut prefix)?;

    let len = u32::from_be_bytes(prefix) as usize;
    let mut payload = BytesMut::zeroed(len);
    if len > 0 {
        reader.read_exact(&mut payload)?;
    }

    Ok(payload.freeze())
}
