//! Multiplexer
//!
//! Sole owner of the tag table and of the write half of the connection.
//!
//! ## Event Sources
//! - Submissions from callers: tag, encode, write
//! - Frames from the reader loop: decode, route by tag
//! - Reader failure, close request, or every handle dropped: tear down
//!
//! Events are handled one at a time on a dedicated thread, so neither the tag
//! table nor the socket writer needs a lock.

use std::collections::HashMap;
use std::io::{self, BufWriter};
use std::net::{Shutdown, TcpStream};
use std::sync::{Arc, OnceLock};

use bytes::Bytes;
use crossbeam::channel::{Receiver, Sender};

use super::transaction::Transaction;
use crate::error::{Result, RevtreeError};
use crate::protocol::{decode_response, encode_request, write_frame, MAX_FRAME_LEN};

// =============================================================================
// Tag Table
// =============================================================================

/// Outstanding transactions keyed by tag
#[derive(Default)]
pub(crate) struct TagTable {
    pending: HashMap<i32, Transaction>,
}

impl TagTable {
    /// Lowest tag not currently in use
    pub(crate) fn next_tag(&self) -> i32 {
        let mut tag = 0;
        while self.pending.contains_key(&tag) {
            tag += 1;
        }
        tag
    }

    pub(crate) fn insert(&mut self, tag: i32, txn: Transaction) {
        self.pending.insert(tag, txn);
    }

    pub(crate) fn remove(&mut self, tag: i32) -> Option<Transaction> {
        self.pending.remove(&tag)
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn drain(&mut self) -> impl Iterator<Item = Transaction> + '_ {
        self.pending.drain().map(|(_, txn)| txn)
    }
}

// =============================================================================
// Multiplexer
// =============================================================================

/// Channel ends the multiplexer listens on, plus the signals it fires on exit
pub(crate) struct Endpoints {
    /// New transactions from callers
    pub(crate) submit: Receiver<Transaction>,

    /// Frames (or the final read failure) from the reader loop
    pub(crate) inbound: Receiver<Result<Bytes>>,

    /// Close requests
    pub(crate) stop: Receiver<()>,

    /// Dropped on exit; callers observe the disconnect
    pub(crate) stopped: Sender<()>,

    /// Terminal error, written once before `stopped` fires
    pub(crate) terminal: Arc<OnceLock<RevtreeError>>,
}

/// Connection state owned by the multiplexer thread
pub(crate) struct Multiplexer {
    writer: BufWriter<TcpStream>,
    tags: TagTable,
    max_message_size: u64,
    addr: String,
}

impl Multiplexer {
    pub(crate) fn new(stream: TcpStream, max_message_size: u64, addr: String) -> Self {
        Self {
            writer: BufWriter::new(stream),
            tags: TagTable::default(),
            max_message_size: max_message_size.min(MAX_FRAME_LEN),
            addr,
        }
    }

    /// Serve events until the connection reaches its terminal state
    pub(crate) fn run(mut self, endpoints: Endpoints) {
        let Endpoints {
            submit,
            inbound,
            stop,
            stopped,
            terminal,
        } = endpoints;

        let err = loop {
            crossbeam::select! {
                recv(submit) -> msg => match msg {
                    Ok(txn) => {
                        if let Err(e) = self.admit(txn) {
                            break e;
                        }
                    }
                    // Every handle is gone
                    Err(_) => break RevtreeError::Closed,
                },
                recv(inbound) -> msg => match msg {
                    Ok(Ok(frame)) => self.dispatch(frame),
                    Ok(Err(e)) => break e,
                    Err(_) => {
                        break RevtreeError::from(io::Error::new(
                            io::ErrorKind::BrokenPipe,
                            "reader loop exited",
                        ))
                    }
                },
                recv(stop) -> _ => break RevtreeError::Closed,
            }
        };

        self.shutdown(err, &terminal);
        drop(stopped);
    }

    /// Tag a new transaction and write it to the connection
    ///
    /// Only a failed write is returned; it is fatal to the connection.
    fn admit(&mut self, mut txn: Transaction) -> Result<()> {
        let tag = self.tags.next_tag();
        txn.request.tag = Some(tag);

        let buf = match encode_request(&txn.request, self.max_message_size) {
            Ok(buf) => buf,
            Err(e) => {
                tracing::debug!("failed to encode request for tag {}: {}", tag, e);
                txn.complete(Err(e));
                return Ok(());
            }
        };

        tracing::trace!("sending {} with tag {} to {}", txn.request.verb, tag, self.addr);
        self.tags.insert(tag, txn);
        write_frame(&mut self.writer, &buf)
    }

    /// Route a frame to the transaction waiting on its tag
    fn dispatch(&mut self, frame: Bytes) {
        let response = match decode_response(&frame) {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("dropping frame from {}: {}", self.addr, e);
                return;
            }
        };

        let Some(tag) = response.tag else {
            tracing::warn!("dropping untagged response from {}: {:?}", self.addr, response);
            return;
        };

        match self.tags.remove(tag) {
            Some(txn) => txn.complete(Ok(response)),
            None => tracing::warn!("unexpected response from {}: {:?}", self.addr, response),
        }
    }

    /// Record the terminal error, fail everything pending, close the stream
    fn shutdown(&mut self, err: RevtreeError, terminal: &OnceLock<RevtreeError>) {
        let err = terminal.get_or_init(|| err).clone();
        tracing::debug!(
            "connection to {} stopping with {} pending: {}",
            self.addr,
            self.tags.len(),
            err
        );

        for txn in self.tags.drain() {
            txn.complete(Err(err.clone()));
        }

        if let Err(e) = self.writer.get_ref().shutdown(Shutdown::Both) {
            tracing::trace!("shutdown of {} failed: {}", self.addr, e);
        }
    }
}
