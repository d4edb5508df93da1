// Service module exports

pub mod availability;
pub mod database;
pub mod error;
pub mod palette;
pub mod schedule;
pub mod session;
pub mod settings;
pub mod travel;
