//! Stable display colours for recurrence patterns and session statuses.
//!
//! Colours are hex strings (`#RRGGBB`) so they can be stored and compared
//! without a GUI dependency; the time grid converts them with `parse_color`.

use crate::models::recurrence::canonical_key;
use crate::models::session::SessionStatus;

/// Fixed palette; the order is part of the colour contract.
pub const PATTERN_PALETTE: [&str; 10] = [
    "#4F86C6", "#E07A5F", "#3D9970", "#9B5DE5", "#F2A541",
    "#2EC4B6", "#D64161", "#6C757D", "#8AB17D", "#5465FF",
];

/// Colour used for blocks that have no recurrence pattern.
pub const UNPATTERNED_COLOR: &str = "#64A0C8";

pub struct ColorAssigner;

impl ColorAssigner {
    /// Palette entry for a weekday pattern, independent of input order.
    ///
    /// ```
    /// use coach_planner::services::palette::ColorAssigner;
    /// assert_eq!(ColorAssigner::color_for(&[1, 3, 5]), ColorAssigner::color_for(&[5, 1, 3]));
    /// ```
    pub fn color_for(pattern: &[u8]) -> &'static str {
        PATTERN_PALETTE[Self::palette_index(pattern)]
    }

    pub fn palette_index(pattern: &[u8]) -> usize {
        let key = canonical_key(pattern);
        (pattern_hash(&key) % PATTERN_PALETTE.len() as u32) as usize
    }

    /// Status overrides the pattern colour for sessions that are no longer
    /// upcoming.
    pub fn status_color(status: SessionStatus) -> Option<&'static str> {
        match status {
            SessionStatus::Scheduled => None,
            SessionStatus::Completed => Some("#2E7D32"),
            SessionStatus::Missed => Some("#C62828"),
            SessionStatus::Cancelled => Some("#9E9E9E"),
            SessionStatus::Rescheduled => Some("#EF6C00"),
        }
    }

    /// Effective colour of a block: status colour first, then pattern colour.
    pub fn block_color(status: SessionStatus, pattern: Option<&[u8]>) -> &'static str {
        Self::status_color(status)
            .or_else(|| pattern.map(Self::color_for))
            .unwrap_or(UNPATTERNED_COLOR)
    }
}

/// `h = h * 31 + code` over UTF-16 code units, wrapping at 32 bits.
fn pattern_hash(key: &str) -> u32 {
    key.encode_utf16()
        .fold(0u32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as u32))
}
