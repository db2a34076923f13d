//! Fire-and-forget dispatch of persistence writes.
//!
//! One worker thread drains a FIFO queue, so writes are issued and
//! completed in the order they were committed. The UI thread never blocks
//! on a write; it polls for outcomes between frames.

use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::io::recovery::log_persist_failure;
use crate::ops::persist::{PersistError, PersistRequest, PersistSink, PersistenceGateway};

/// Outcome of one write, reported back to the UI thread
#[derive(Debug)]
pub struct PersistStatus {
    pub seq: u64,
    pub request: PersistRequest,
    pub result: Result<(), PersistError>,
}

pub struct BackgroundWriter {
    tx: Option<mpsc::Sender<(u64, PersistRequest)>>,
    status_rx: mpsc::Receiver<PersistStatus>,
    worker: Option<JoinHandle<()>>,
    /// Outcomes that never reached the worker
    undelivered: Vec<PersistStatus>,
    next_seq: u64,
    pending: usize,
}

impl BackgroundWriter {
    /// Start the worker. Failed writes are appended to the recovery log in
    /// `recovery_dir`.
    pub fn spawn<G>(gateway: G, recovery_dir: impl Into<PathBuf>) -> std::io::Result<Self>
    where
        G: PersistenceGateway + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<(u64, PersistRequest)>();
        let (status_tx, status_rx) = mpsc::channel();
        let recovery_dir = recovery_dir.into();

        let worker = std::thread::Builder::new()
            .name("chanbar-writer".into())
            .spawn(move || {
                for (seq, request) in rx {
                    let result = request.dispatch(&gateway);
                    if let Err(error) = &result {
                        tracing::warn!(seq, %error, "write failed; not retried");
                        log_persist_failure(&recovery_dir, seq, &request, &error.to_string());
                    }
                    // A dropped receiver must not stop queued writes from landing.
                    let _ = status_tx.send(PersistStatus {
                        seq,
                        request,
                        result,
                    });
                }
            })?;

        Ok(BackgroundWriter {
            tx: Some(tx),
            status_rx,
            worker: Some(worker),
            undelivered: Vec::new(),
            next_seq: 1,
            pending: 0,
        })
    }

    /// Writes submitted but not yet reported back by [`poll`](Self::poll)
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn is_idle(&self) -> bool {
        self.pending == 0
    }

    /// Collect every outcome that has arrived, without blocking.
    pub fn poll(&mut self) -> Vec<PersistStatus> {
        let mut out = std::mem::take(&mut self.undelivered);
        while let Ok(status) = self.status_rx.try_recv() {
            out.push(status);
        }
        self.pending = self.pending.saturating_sub(out.len());
        out
    }

    /// Block until every submitted write has been reported, or `timeout`
    /// passes.
    pub fn flush(&mut self, timeout: Duration) -> Vec<PersistStatus> {
        let deadline = Instant::now() + timeout;
        let mut out = self.poll();
        while self.pending > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.status_rx.recv_timeout(remaining) {
                Ok(status) => {
                    self.pending -= 1;
                    out.push(status);
                }
                Err(RecvTimeoutError::Timeout) => {
                    tracing::warn!(pending = self.pending, "writes still in flight after flush timeout");
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    self.pending = 0;
                    break;
                }
            }
        }
        out
    }
}

impl PersistSink for BackgroundWriter {
    fn submit(&mut self, request: PersistRequest) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending += 1;

        let sent = match &self.tx {
            Some(tx) => tx
                .send((seq, request))
                .map_err(|mpsc::SendError((_, request))| request),
            None => Err(request),
        };
        if let Err(request) = sent {
            tracing::warn!(seq, "writer thread is gone; write dropped");
            self.undelivered.push(PersistStatus {
                seq,
                request,
                result: Err(PersistError::Unavailable("writer thread stopped".into())),
            });
        }
        seq
    }
}

impl Drop for BackgroundWriter {
    /// Close the queue and wait for queued writes to land.
    fn drop(&mut self) {
        self.tx.take();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            tracing::error!("writer thread panicked");
        }
    }
}
