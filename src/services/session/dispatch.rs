//! Runs gateway requests off the UI thread.
//!
//! Each request is executed on tokio's blocking pool; replies come back
//! through a channel that the app drains once per frame.

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use super::board::Ticket;
use super::SessionGateway;
use crate::models::recurrence::{RecurrencePattern, ScheduleSpec, SlotTimes};
use crate::models::session::{NewSession, SessionBlock, SessionId, SessionPatch};
use crate::services::availability::AvailabilitySlot;
use crate::services::error::{SchedulingError, SchedulingResult};

#[derive(Debug, Clone, PartialEq)]
pub enum GatewayRequest {
    Create(NewSession),
    Update { id: SessionId, patch: SessionPatch },
    Delete(SessionId),
    ListRange { from: NaiveDate, to: NaiveDate },
    Preview { spec: ScheduleSpec, times: SlotTimes },
    CheckAvailability {
        patterns: Vec<RecurrencePattern>,
        package_id: i64,
        from: NaiveDate,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum GatewayReply {
    Saved(SchedulingResult<SessionBlock>),
    Deleted(SchedulingResult<()>),
    Listed(SchedulingResult<Vec<SessionBlock>>),
    Previewed(SchedulingResult<Vec<SessionBlock>>),
    Availability(SchedulingResult<Vec<AvailabilitySlot>>),
}

impl GatewayReply {
    pub fn error(&self) -> Option<&SchedulingError> {
        match self {
            GatewayReply::Saved(Err(e))
            | GatewayReply::Deleted(Err(e))
            | GatewayReply::Listed(Err(e))
            | GatewayReply::Previewed(Err(e))
            | GatewayReply::Availability(Err(e)) => Some(e),
            _ => None,
        }
    }
}

/// Run one request synchronously against `gateway`.
pub fn execute(gateway: &dyn SessionGateway, request: GatewayRequest) -> GatewayReply {
    match request {
        GatewayRequest::Create(new_session) => GatewayReply::Saved(gateway.create(new_session)),
        GatewayRequest::Update { id, patch } => GatewayReply::Saved(gateway.update(id, patch)),
        GatewayRequest::Delete(id) => GatewayReply::Deleted(gateway.delete(id)),
        GatewayRequest::ListRange { from, to } => GatewayReply::Listed(gateway.list_range(from, to)),
        GatewayRequest::Preview { spec, times } => {
            GatewayReply::Previewed(gateway.preview(&spec, &times))
        }
        GatewayRequest::CheckAvailability {
            patterns,
            package_id,
            from,
        } => GatewayReply::Availability(gateway.check_availability(&patterns, package_id, from)),
    }
}

pub struct GatewayDispatcher {
    runtime: Handle,
    gateway: Arc<dyn SessionGateway>,
    tx: UnboundedSender<(Ticket, GatewayReply)>,
    rx: UnboundedReceiver<(Ticket, GatewayReply)>,
    in_flight: usize,
}

impl GatewayDispatcher {
    pub fn new(runtime: Handle, gateway: Arc<dyn SessionGateway>) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            runtime,
            gateway,
            tx,
            rx,
            in_flight: 0,
        }
    }

    pub fn dispatch(&mut self, ticket: Ticket, request: GatewayRequest) {
        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();
        self.in_flight += 1;
        log::debug!("Dispatching request {}: {:?}", ticket.value(), request);

        self.runtime.spawn_blocking(move || {
            let reply = execute(gateway.as_ref(), request);
            if tx.send((ticket, reply)).is_err() {
                log::debug!("Dispatcher dropped before reply {} arrived", ticket.value());
            }
        });
    }

    /// Replies that have arrived since the last poll, in arrival order.
    pub fn poll(&mut self) -> Vec<(Ticket, GatewayReply)> {
        let mut replies = Vec::new();
        while let Ok(reply) = self.rx.try_recv() {
            replies.push(reply);
        }
        self.in_flight = self.in_flight.saturating_sub(replies.len());
        replies
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}
