//! Optimistic in-memory view of the sessions shown on the grid.
//!
//! Local edits are applied immediately and tagged with a [`Ticket`]. When the
//! gateway answers, the board either confirms the edit, rolls the block back
//! to its last confirmed state, or ignores the answer as stale. A response is
//! stale when the board was invalidated (week navigation) after the request
//! was issued. Each block has at most one request in flight, so the gateway
//! always sees edits to one session in the order they were made.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::models::session::{NewSession, SessionBlock, SessionId, SessionPatch};
use crate::services::error::{SchedulingError, SchedulingResult};

/// Identifier of one outbound gateway request; strictly increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Issues monotonically increasing tickets.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    last: u64,
}

impl RequestSequencer {
    pub fn next_ticket(&mut self) -> Ticket {
        self.last += 1;
        Ticket(self.last)
    }

    pub fn last_issued(&self) -> Option<Ticket> {
        (self.last > 0).then_some(Ticket(self.last))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingKind {
    Load,
    Create { provisional_id: SessionId },
    Update { id: SessionId },
    Delete { id: SessionId },
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    kind: PendingKind,
    generation: u64,
}

/// What a gateway response did to the board
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Server accepted; the displayed block now carries this id
    Confirmed(SessionId),
    Removed(SessionId),
    Loaded(usize),
    /// Server rejected; the block was restored to its confirmed state
    /// (or dropped, for a provisional create)
    RolledBack {
        block_id: SessionId,
        error: SchedulingError,
    },
    /// A week listing failed; displayed blocks are unchanged
    LoadFailed(SchedulingError),
    /// Superseded or unknown; nothing displayed changed
    Stale,
}

#[derive(Debug, Default)]
pub struct SessionBoard {
    blocks: Vec<SessionBlock>,
    confirmed: HashMap<SessionId, SessionBlock>,
    pending: HashMap<Ticket, Pending>,
    latest_for: HashMap<SessionId, Ticket>,
    latest_load: Option<Ticket>,
    tickets: RequestSequencer,
    provisional_count: i64,
    generation: u64,
}

impl SessionBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything with server-confirmed blocks.
    pub fn load(&mut self, blocks: Vec<SessionBlock>) {
        self.confirmed = blocks.iter().map(|b| (b.id, b.clone())).collect();
        self.blocks = blocks;
        self.latest_for.clear();
        self.sort();
    }

    /// Drop all pending requests and displayed blocks; answers to requests
    /// issued before this call are treated as stale.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.pending.clear();
        self.latest_for.clear();
        self.latest_load = None;
        self.blocks.clear();
        self.confirmed.clear();
        log::debug!("Session board invalidated (generation {})", self.generation);
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn blocks(&self) -> &[SessionBlock] {
        &self.blocks
    }

    pub fn blocks_on(&self, date: NaiveDate) -> impl Iterator<Item = &SessionBlock> {
        self.blocks.iter().filter(move |b| b.date == date)
    }

    pub fn block(&self, id: SessionId) -> Option<&SessionBlock> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn confirmed(&self, id: SessionId) -> Option<&SessionBlock> {
        self.confirmed.get(&id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn has_pending(&self, id: SessionId) -> bool {
        self.latest_for.contains_key(&id)
    }

    /// Ticket for a request that does not touch displayed blocks
    /// (previews, availability checks).
    pub fn next_ticket(&mut self) -> Ticket {
        self.tickets.next_ticket()
    }

    pub fn begin_load(&mut self) -> Ticket {
        let ticket = self.track(PendingKind::Load);
        self.latest_load = Some(ticket);
        ticket
    }

    /// Show a provisional block for `request` right away.
    pub fn begin_create(&mut self, request: &NewSession) -> SchedulingResult<(Ticket, SessionBlock)> {
        request.validate()?;
        self.provisional_count += 1;
        let provisional_id = -self.provisional_count;

        let block = request.clone().into_block(provisional_id);
        self.blocks.push(block.clone());
        self.sort();

        let ticket = self.track(PendingKind::Create { provisional_id });
        self.latest_for.insert(provisional_id, ticket);
        Ok((ticket, block))
    }

    /// Apply `patch` to the displayed block right away.
    pub fn begin_update(&mut self, id: SessionId, patch: &SessionPatch) -> SchedulingResult<Ticket> {
        let index = self.editable_index(id)?;
        let next = self.blocks[index].patched(patch)?;
        self.blocks[index] = next;
        self.sort();

        let ticket = self.track(PendingKind::Update { id });
        self.latest_for.insert(id, ticket);
        Ok(ticket)
    }

    /// Hide the block right away.
    pub fn begin_delete(&mut self, id: SessionId) -> SchedulingResult<Ticket> {
        let index = self.editable_index(id)?;
        self.blocks.remove(index);

        let ticket = self.track(PendingKind::Delete { id });
        self.latest_for.insert(id, ticket);
        Ok(ticket)
    }

    /// Apply the answer to a create or update.
    pub fn resolve_saved(
        &mut self,
        ticket: Ticket,
        result: SchedulingResult<SessionBlock>,
    ) -> Resolution {
        let Some(kind) = self.take_current(ticket) else {
            return Resolution::Stale;
        };

        match (kind, result) {
            (PendingKind::Create { provisional_id }, Ok(block)) => {
                self.latest_for.remove(&provisional_id);
                self.confirmed.insert(block.id, block.clone());
                let id = block.id;
                match self.blocks.iter().position(|b| b.id == provisional_id) {
                    Some(index) => self.blocks[index] = block,
                    None => self.blocks.push(block),
                }
                self.sort();
                Resolution::Confirmed(id)
            }
            (PendingKind::Create { provisional_id }, Err(error)) => {
                self.latest_for.remove(&provisional_id);
                self.blocks.retain(|b| b.id != provisional_id);
                log::warn!("Create rejected, dropping provisional block: {}", error);
                Resolution::RolledBack {
                    block_id: provisional_id,
                    error,
                }
            }
            (PendingKind::Update { id }, Ok(block)) => {
                if !self.is_latest(id, ticket) {
                    log::debug!("Ignoring confirmation of superseded update {}", ticket.value());
                    return Resolution::Stale;
                }
                self.latest_for.remove(&id);
                self.confirmed.insert(id, block.clone());
                if let Some(index) = self.blocks.iter().position(|b| b.id == id) {
                    self.blocks[index] = block;
                    self.sort();
                }
                Resolution::Confirmed(id)
            }
            (PendingKind::Update { id }, Err(error)) => {
                if !self.is_latest(id, ticket) {
                    log::debug!("Ignoring rejection of superseded update {}", ticket.value());
                    return Resolution::Stale;
                }
                self.latest_for.remove(&id);
                self.restore(id);
                log::warn!("Update of session {} rejected, rolled back: {}", id, error);
                Resolution::RolledBack {
                    block_id: id,
                    error,
                }
            }
            (kind, _) => {
                log::error!("Ticket {} answered as a save but was {:?}", ticket.value(), kind);
                Resolution::Stale
            }
        }
    }

    pub fn resolve_deleted(&mut self, ticket: Ticket, result: SchedulingResult<()>) -> Resolution {
        let Some(kind) = self.take_current(ticket) else {
            return Resolution::Stale;
        };
        let PendingKind::Delete { id } = kind else {
            log::error!("Ticket {} answered as a delete but was {:?}", ticket.value(), kind);
            return Resolution::Stale;
        };
        if !self.is_latest(id, ticket) {
            return Resolution::Stale;
        }
        self.latest_for.remove(&id);

        match result {
            Ok(()) => {
                self.confirmed.remove(&id);
                Resolution::Removed(id)
            }
            Err(error) => {
                self.restore(id);
                log::warn!("Delete of session {} rejected, restored: {}", id, error);
                Resolution::RolledBack {
                    block_id: id,
                    error,
                }
            }
        }
    }

    pub fn resolve_listed(
        &mut self,
        ticket: Ticket,
        result: SchedulingResult<Vec<SessionBlock>>,
    ) -> Resolution {
        let Some(kind) = self.take_current(ticket) else {
            return Resolution::Stale;
        };
        if kind != PendingKind::Load || self.latest_load != Some(ticket) {
            return Resolution::Stale;
        }
        self.latest_load = None;

        match result {
            Ok(blocks) => {
                let count = blocks.len();
                // Keep optimistic edits that are still waiting on the gateway
                let in_flight: Vec<SessionBlock> = self
                    .blocks
                    .iter()
                    .filter(|b| self.latest_for.contains_key(&b.id))
                    .cloned()
                    .collect();
                let deleting: Vec<SessionId> = self
                    .latest_for
                    .keys()
                    .copied()
                    .filter(|id| self.pending_delete(*id))
                    .collect();
                let latest_for = std::mem::take(&mut self.latest_for);
                self.load(blocks);
                for block in in_flight {
                    match self.blocks.iter().position(|b| b.id == block.id) {
                        Some(index) => self.blocks[index] = block,
                        None => self.blocks.push(block),
                    }
                }
                self.blocks.retain(|b| !deleting.contains(&b.id));
                self.latest_for = latest_for;
                self.sort();
                Resolution::Loaded(count)
            }
            Err(error) => {
                log::warn!("Failed to list sessions: {}", error);
                Resolution::LoadFailed(error)
            }
        }
    }

    fn track(&mut self, kind: PendingKind) -> Ticket {
        let ticket = self.tickets.next_ticket();
        self.pending.insert(
            ticket,
            Pending {
                kind,
                generation: self.generation,
            },
        );
        ticket
    }

    /// Remove and return the pending entry if it belongs to this generation.
    fn take_current(&mut self, ticket: Ticket) -> Option<PendingKind> {
        let pending = self.pending.remove(&ticket)?;
        if pending.generation != self.generation {
            log::debug!(
                "Dropping response {} from generation {}",
                ticket.value(),
                pending.generation
            );
            return None;
        }
        Some(pending.kind)
    }

    fn is_latest(&self, id: SessionId, ticket: Ticket) -> bool {
        self.latest_for.get(&id) == Some(&ticket)
    }

    fn pending_delete(&self, id: SessionId) -> bool {
        self.latest_for
            .get(&id)
            .and_then(|t| self.pending.get(t))
            .is_some_and(|p| p.kind == PendingKind::Delete { id })
    }

    /// Position of a confirmed block with no request in flight.
    fn editable_index(&self, id: SessionId) -> SchedulingResult<usize> {
        if id < 0 {
            return Err(SchedulingError::Validation(
                "Session is still being created".to_string(),
            ));
        }
        if self.has_pending(id) {
            return Err(SchedulingError::Validation(format!(
                "Session {} is still saving",
                id
            )));
        }
        self.blocks
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| SchedulingError::Validation(format!("Session {} is not on the grid", id)))
    }

    fn restore(&mut self, id: SessionId) {
        self.blocks.retain(|b| b.id != id);
        if let Some(block) = self.confirmed.get(&id) {
            self.blocks.push(block.clone());
        }
        self.sort();
    }

    fn sort(&mut self) {
        self.blocks
            .sort_by(|a, b| (a.date, a.start_minute, a.id).cmp(&(b.date, b.start_minute, b.id)));
    }
}
