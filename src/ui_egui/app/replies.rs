use super::SchedulerApp;
use crate::services::session::board::Ticket;
use crate::services::session::dispatch::GatewayReply;

impl SchedulerApp {
    /// Apply every gateway answer that arrived since the last frame.
    pub(super) fn drain_replies(&mut self) {
        for (ticket, reply) in self.dispatcher.poll() {
            self.apply_reply(ticket, reply);
        }
    }

    fn apply_reply(&mut self, ticket: Ticket, reply: GatewayReply) {
        let resolution = match reply {
            GatewayReply::Saved(result) => self.board.resolve_saved(ticket, result),
            GatewayReply::Deleted(result) => self.board.resolve_deleted(ticket, result),
            GatewayReply::Listed(result) => self.board.resolve_listed(ticket, result),
            GatewayReply::Previewed(result) => {
                if self.latest_preview == Some(ticket) {
                    self.latest_preview = None;
                    self.planner.apply_preview(result);
                } else {
                    log::debug!("Dropping superseded preview {}", ticket.value());
                }
                return;
            }
            GatewayReply::Availability(result) => {
                if self.latest_availability == Some(ticket) {
                    self.latest_availability = None;
                    self.planner.apply_availability(result);
                } else {
                    log::debug!("Dropping superseded availability {}", ticket.value());
                }
                return;
            }
        };
        self.toasts.resolution(&resolution);
    }
}
