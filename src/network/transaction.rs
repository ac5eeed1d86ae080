//! Transaction
//!
//! One request in flight, paired with the channel its caller waits on.

use crossbeam::channel::{self, Receiver, Sender};

use crate::error::Result;
use crate::protocol::{Request, Response};

/// An outstanding request awaiting a response or a terminal error
pub(crate) struct Transaction {
    pub(crate) request: Request,
    done: Sender<Result<Response>>,
}

impl Transaction {
    /// Create a transaction and the receiver its caller blocks on
    pub(crate) fn new(request: Request) -> (Self, Receiver<Result<Response>>) {
        let (done, wait) = channel::bounded(1);
        (Self { request, done }, wait)
    }

    /// Deliver the outcome. Consumes the transaction, so it fires at most once.
    pub(crate) fn complete(self, outcome: Result<Response>) {
        // The caller may have gone away; nobody else wants the outcome.
        let _ = self.done.send(outcome);
    }
}
