//! Reader loop
//!
//! Pulls frames off the connection and hands them to the multiplexer.

use std::io::BufReader;
use std::net::TcpStream;

use bytes::Bytes;
use crossbeam::channel::Sender;

use crate::error::Result;
use crate::protocol::read_frame;

/// Read frames until the stream fails or the multiplexer goes away
///
/// The first read failure is forwarded as the last message on `inbound`.
pub(crate) fn run(stream: TcpStream, inbound: Sender<Result<Bytes>>) {
    let mut reader = BufReader::new(stream);

    loop {
        match read_frame(&mut reader) {
            Ok(frame) => {
                tracing::trace!("read frame of {} bytes", frame.len());
                if inbound.send(Ok(frame)).is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::debug!("reader loop stopping: {}", e);
                let _ = inbound.send(Err(e));
                break;
            }
        }
    }
}
