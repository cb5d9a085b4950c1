use std::{fmt, sync::Arc};

use tracing::debug;

use skylane_wire::Packet;

use crate::{queue::Producer, ReorderBuffer};

enum Inner {
    /// Packets go straight into the reorder buffer.
    Direct(Arc<ReorderBuffer>),
    /// Packets are staged through the lock-free ring.
    Staged(Producer<Packet>),
}

/// The producer end of a [`Pipeline`](super::Pipeline).
///
/// There is exactly one ingress per pipeline. Closing or dropping it is the end-of-stream
/// signal: the pipeline drains what it holds and then shuts down.
pub struct Ingress {
    inner: Option<Inner>,
}

impl Ingress {
    pub(super) fn direct(reorder: Arc<ReorderBuffer>) -> Self {
        Self { inner: Some(Inner::Direct(reorder)) }
    }

    pub(super) fn staged(producer: Producer<Packet>) -> Self {
        Self { inner: Some(Inner::Staged(producer)) }
    }

    /// Hands a packet to the pipeline without blocking.
    ///
    /// The packet is returned in the `Err` variant when the pipeline cannot take it yet: a
    /// staged ingress when its ring is full, a direct ingress when the reorder buffer is full.
    /// Retrying later delivers it.
    pub fn send(&mut self, packet: Packet) -> Result<(), Packet> {
        match self.inner.as_mut() {
            Some(Inner::Direct(reorder)) => reorder.insert(packet).map(|_| ()),
            Some(Inner::Staged(producer)) => producer.try_push(packet),
            None => Err(packet),
        }
    }

    /// Returns `true` if packets are staged through the lock-free ring.
    pub fn is_staged(&self) -> bool {
        matches!(self.inner, Some(Inner::Staged(_)))
    }

    /// Signals the end of the stream.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        match self.inner.take() {
            Some(Inner::Direct(reorder)) => {
                debug!("Ingress closed, stopping reorder buffer");
                reorder.stop();
            }
            Some(Inner::Staged(producer)) => {
                debug!(staged = producer.len(), "Ingress closed, stager will drain the ring");
                drop(producer);
            }
            None => {}
        }
    }
}

impl Drop for Ingress {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for Ingress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ingress").field("staged", &self.is_staged()).finish()
    }
}
