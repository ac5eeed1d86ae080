//! Connection handle
//!
//! A `Conn` is one established session with a store server. It is cheap to
//! share by reference across threads: every call goes through channels to the
//! connection's multiplexer thread.

use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};

use super::mux::{Endpoints, Multiplexer};
use super::reader;
use super::transaction::Transaction;
use crate::config::Config;
use crate::error::{Result, RevtreeError, ServerError};
use crate::protocol::{Request, Response};

/// A session with a single store server
pub struct Conn {
    /// Remote address as given to dial
    addr: String,

    /// Hands transactions to the multiplexer (rendezvous)
    submit: Sender<Transaction>,

    /// Close requests (capacity one, extra requests are dropped)
    stop: Sender<()>,

    /// Disconnects once the multiplexer has exited
    stopped: Receiver<()>,

    /// Why the connection stopped
    terminal: Arc<OnceLock<RevtreeError>>,
}

impl Conn {
    /// Connect to a single server
    pub fn dial(addr: &str) -> Result<Self> {
        Self::dial_with_config(addr, &Config::default())
    }

    /// Connect to a single server, giving up on establishment after `timeout`
    pub fn dial_timeout(addr: &str, timeout: Duration) -> Result<Self> {
        let config = Config::builder().dial_timeout(timeout).build();
        Self::dial_with_config(addr, &config)
    }

    /// Connect to a single server with explicit settings
    pub fn dial_with_config(addr: &str, config: &Config) -> Result<Self> {
        let stream = connect(addr, config.dial_timeout)?;
        tracing::debug!("connected to {}", addr);
        Self::from_stream(addr, stream, config)
    }

    /// Start the reader and multiplexer threads over an established stream
    pub fn from_stream(addr: &str, stream: TcpStream, config: &Config) -> Result<Self> {
        stream.set_nodelay(config.nodelay)?;
        let read_stream = stream.try_clone()?;

        let (submit_tx, submit_rx) = channel::bounded(0);
        let (inbound_tx, inbound_rx) = channel::unbounded();
        let (stop_tx, stop_rx) = channel::bounded(1);
        let (stopped_tx, stopped_rx) = channel::bounded(0);
        let terminal = Arc::new(OnceLock::new());

        let mux = Multiplexer::new(stream, config.max_message_size, addr.to_string());
        let endpoints = Endpoints {
            submit: submit_rx,
            inbound: inbound_rx,
            stop: stop_rx,
            stopped: stopped_tx,
            terminal: Arc::clone(&terminal),
        };

        thread::Builder::new()
            .name("revtree-reader".to_string())
            .spawn(move || reader::run(read_stream, inbound_tx))?;
        thread::Builder::new()
            .name("revtree-mux".to_string())
            .spawn(move || mux.run(endpoints))?;

        Ok(Self {
            addr: addr.to_string(),
            submit: submit_tx,
            stop: stop_tx,
            stopped: stopped_rx,
            terminal,
        })
    }

    /// Remote address this connection was dialed with
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Ask the connection to shut down
    ///
    /// Never blocks and may be called any number of times from any thread.
    /// Pending and future calls fail with [`RevtreeError::Closed`] once the
    /// multiplexer processes the request.
    pub fn close(&self) {
        let _ = self.stop.try_send(());
    }

    /// True once the connection has reached its terminal state
    pub fn is_closed(&self) -> bool {
        self.terminal.get().is_some()
    }

    /// The error that ended the connection, if it has ended
    pub fn error(&self) -> Option<RevtreeError> {
        self.terminal.get().cloned()
    }

    fn terminal_error(&self) -> RevtreeError {
        self.error().unwrap_or(RevtreeError::Closed)
    }

    /// Submit one request and block until it is answered or the connection dies
    ///
    /// A response carrying an error code is turned into [`ServerError`].
    pub(crate) fn call(&self, request: Request) -> Result<Response> {
        let verb = request.verb;
        let path = request.path.clone();
        let (txn, wait) = Transaction::new(request);

        crossbeam::select! {
            recv(self.stopped) -> _ => return Err(self.terminal_error()),
            send(self.submit, txn) -> sent => {
                if sent.is_err() {
                    return Err(self.terminal_error());
                }
            }
        }

        let response = match wait.recv() {
            Ok(outcome) => outcome?,
            Err(_) => return Err(self.terminal_error()),
        };

        match response.err_code {
            Some(code) => Err(ServerError {
                verb,
                path,
                code,
                detail: response.err_detail,
            }
            .into()),
            None => Ok(response),
        }
    }
}

impl Drop for Conn {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Conn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conn")
            .field("addr", &self.addr)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Establish a TCP stream, trying each resolved address under `timeout`
fn connect(addr: &str, timeout: Option<Duration>) -> Result<TcpStream> {
    let Some(timeout) = timeout else {
        return Ok(TcpStream::connect(addr)?);
    };

    let mut last_err = None;
    for socket_addr in addr.to_socket_addrs()? {
        match TcpStream::connect_timeout(&socket_addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }

    Err(last_err
        .unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("no address for {}", addr))
        })
        .into())
}
