//! Debounced route lookups.
//!
//! Rapid edits to the address fields collapse into one outstanding request:
//! each new request aborts the pending timer, and any response that is not
//! the latest issued one is dropped on arrival.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use super::lookup::RouteLookup;
use super::RouteOutcome;
use crate::models::travel::Coordinate;

#[derive(Debug, Clone, PartialEq)]
pub struct LookupResponse {
    pub sequence: u64,
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub outcome: RouteOutcome,
}

pub struct LookupDebouncer {
    runtime: Handle,
    lookup: Arc<dyn RouteLookup>,
    delay: Duration,
    latest: u64,
    pending: Option<JoinHandle<()>>,
    tx: UnboundedSender<LookupResponse>,
    rx: UnboundedReceiver<LookupResponse>,
}

impl LookupDebouncer {
    pub fn new(runtime: Handle, lookup: Arc<dyn RouteLookup>, delay: Duration) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            runtime,
            lookup,
            delay,
            latest: 0,
            pending: None,
            tx,
            rx,
        }
    }

    /// Schedule a lookup after the debounce delay, replacing any pending one.
    /// Returns the request's sequence number.
    pub fn request(&mut self, origin: Coordinate, destination: Coordinate) -> u64 {
        self.cancel();
        self.latest += 1;
        let sequence = self.latest;

        let lookup = Arc::clone(&self.lookup);
        let tx = self.tx.clone();
        let delay = self.delay;

        self.pending = Some(self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let joined =
                tokio::task::spawn_blocking(move || lookup.route(origin, destination)).await;
            let outcome = match joined {
                Ok(Ok(estimate)) => RouteOutcome::Route(estimate),
                Ok(Err(err)) => {
                    log::warn!("Route lookup failed: {:#}", err);
                    RouteOutcome::PointsOnly {
                        origin,
                        destination,
                        reason: err.to_string(),
                    }
                }
                Err(err) => RouteOutcome::PointsOnly {
                    origin,
                    destination,
                    reason: err.to_string(),
                },
            };
            let response = LookupResponse {
                sequence,
                origin,
                destination,
                outcome,
            };
            if tx.send(response).is_err() {
                log::debug!("Debouncer dropped before route lookup {} answered", sequence);
            }
        }));

        sequence
    }

    /// Abort the pending timer; any response already in flight becomes stale.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// Invalidate everything issued so far, e.g. when the panel closes.
    pub fn reset(&mut self) {
        self.cancel();
        self.latest += 1;
    }

    pub fn latest_sequence(&self) -> u64 {
        self.latest
    }

    /// Drain arrived responses, returning only the one matching the latest
    /// request.
    pub fn poll(&mut self) -> Option<LookupResponse> {
        let mut current = None;
        while let Ok(response) = self.rx.try_recv() {
            if response.sequence == self.latest {
                current = Some(response);
            } else {
                log::debug!(
                    "Dropping stale route response #{} (latest #{})",
                    response.sequence,
                    self.latest
                );
            }
        }
        current
    }
}

impl Drop for LookupDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
