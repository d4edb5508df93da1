//! Recurring slot scheduling.
//! Turns weekday patterns and a session count into concrete session blocks.

pub mod quota;
mod sequencer;

pub use sequencer::{
    SequenceOutcome, SkippedSlot, SlotSequencer, SlotVerdict, DEFAULT_MAX_HORIZON_DAYS,
};
