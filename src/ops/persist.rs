//! The seam between the reorder engine and durable storage.
//!
//! The engine never waits on storage. It hands a [`PersistRequest`] to a
//! [`PersistSink`] right after committing locally and moves on; the sink
//! decides when (and on which thread) the [`PersistenceGateway`] runs.

use serde::Serialize;

use crate::model::{ChannelId, SectionId};

/// New channel order for one or two sections.
///
/// For a same-section reorder the two ids are equal and both lists hold that
/// section's order. For a transfer they differ and each list is the full
/// final order of its section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelOrder {
    pub source_section_id: SectionId,
    pub destination_section_id: SectionId,
    pub source_channel_ids: Vec<ChannelId>,
    pub destination_channel_ids: Vec<ChannelId>,
}

impl ChannelOrder {
    pub fn is_transfer(&self) -> bool {
        self.source_section_id != self.destination_section_id
    }
}

/// One write produced by a committed drop
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PersistRequest {
    SectionOrder { ordered_section_ids: Vec<SectionId> },
    ChannelOrder(ChannelOrder),
}

impl PersistRequest {
    /// Run this request against a gateway.
    pub fn dispatch<G: PersistenceGateway + ?Sized>(&self, gateway: &G) -> Result<(), PersistError> {
        match self {
            PersistRequest::SectionOrder {
                ordered_section_ids,
            } => gateway.persist_section_order(ordered_section_ids),
            PersistRequest::ChannelOrder(order) => gateway.persist_channel_order(order),
        }
    }
}

/// Error type for durable writes
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("section not found: {0}")]
    SectionNotFound(SectionId),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Store(#[from] crate::io::store::StoreError),
}

/// Durable storage for section and channel order.
pub trait PersistenceGateway {
    fn persist_section_order(&self, ordered_section_ids: &[SectionId]) -> Result<(), PersistError>;

    fn persist_channel_order(&self, order: &ChannelOrder) -> Result<(), PersistError>;
}

/// Where the coordinator hands off writes.
pub trait PersistSink {
    /// Hand off a write without waiting for its outcome. Returns the
    /// write's sequence number (monotonic, starting at 1).
    fn submit(&mut self, request: PersistRequest) -> u64;
}

/// A write that did not land
#[derive(Debug)]
pub struct PersistFailure {
    pub seq: u64,
    pub request: PersistRequest,
    pub error: PersistError,
}

/// Runs each request on the calling thread and keeps the failures.
///
/// Used by one-shot commands that exit right after the drop and so cannot
/// leave a write in flight.
pub struct Immediate<G> {
    gateway: G,
    next_seq: u64,
    failures: Vec<PersistFailure>,
}

impl<G: PersistenceGateway> Immediate<G> {
    pub fn new(gateway: G) -> Self {
        Immediate {
            gateway,
            next_seq: 1,
            failures: Vec::new(),
        }
    }

    pub fn take_failures(&mut self) -> Vec<PersistFailure> {
        std::mem::take(&mut self.failures)
    }
}

impl<G: PersistenceGateway> PersistSink for Immediate<G> {
    fn submit(&mut self, request: PersistRequest) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        if let Err(error) = request.dispatch(&self.gateway) {
            tracing::warn!(seq, %error, "write failed");
            self.failures.push(PersistFailure {
                seq,
                request,
                error,
            });
        }
        seq
    }
}

/// Records every submitted request in order; writes always succeed.
///
/// The sink the coordinator and TUI tests observe commits through.
impl PersistSink for Vec<PersistRequest> {
    fn submit(&mut self, request: PersistRequest) -> u64 {
        self.push(request);
        self.len() as u64
    }
}
