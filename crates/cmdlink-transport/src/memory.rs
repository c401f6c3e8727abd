//! In-process transport backed by byte queues.

use std::cell::RefCell;
use std::rc::Rc;

use bytes::BytesMut;

use crate::error::Result;
use crate::traits::Transport;

type Queue = Rc<RefCell<BytesMut>>;

/// In-memory transport endpoint.
///
/// A standalone endpoint ([`MemoryTransport::new`]) is scripted by the
/// caller: bytes pushed with [`push_incoming`](Self::push_incoming) become
/// readable, and everything the engine writes collects in the outgoing
/// queue. [`MemoryTransport::pair`] cross-connects two endpoints so that
/// two engines can talk to each other on one thread.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    incoming: Queue,
    outgoing: Queue,
    read_limit: Option<usize>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self {
            incoming: Rc::new(RefCell::new(BytesMut::new())),
            outgoing: Rc::new(RefCell::new(BytesMut::new())),
            read_limit: None,
        }
    }

    /// Two endpoints where each one's output is the other's input.
    pub fn pair() -> (Self, Self) {
        let a_to_b = Rc::new(RefCell::new(BytesMut::new()));
        let b_to_a = Rc::new(RefCell::new(BytesMut::new()));
        let left = Self {
            incoming: Rc::clone(&b_to_a),
            outgoing: Rc::clone(&a_to_b),
            read_limit: None,
        };
        let right = Self {
            incoming: a_to_b,
            outgoing: b_to_a,
            read_limit: None,
        };
        (left, right)
    }

    /// Limit how many bytes are reported and returned per call, like a slow UART.
    pub fn with_read_limit(mut self, limit: usize) -> Self {
        self.read_limit = Some(limit.max(1));
        self
    }

    /// Make `bytes` readable from this endpoint.
    pub fn push_incoming(&self, bytes: &[u8]) {
        self.incoming.borrow_mut().extend_from_slice(bytes);
    }

    /// Drain everything written to this endpoint so far.
    pub fn take_outgoing(&self) -> Vec<u8> {
        self.outgoing.borrow_mut().split().to_vec()
    }

    /// Copy of the pending output without draining it.
    pub fn outgoing(&self) -> Vec<u8> {
        self.outgoing.borrow().to_vec()
    }

    /// Bytes still waiting to be read.
    pub fn pending_incoming(&self) -> usize {
        self.incoming.borrow().len()
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MemoryTransport {
    fn available(&self) -> Result<usize> {
        let pending = self.incoming.borrow().len();
        Ok(match self.read_limit {
            Some(limit) => pending.min(limit),
            None => pending,
        })
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut incoming = self.incoming.borrow_mut();
        let mut n = buf.len().min(incoming.len());
        if let Some(limit) = self.read_limit {
            n = n.min(limit);
        }
        let chunk = incoming.split_to(n);
        buf[..n].copy_from_slice(&chunk);
        Ok(n)
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.outgoing.borrow_mut().extend_from_slice(bytes);
        Ok(())
    }
}
