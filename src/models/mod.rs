// Module exports for models

pub mod recurrence;
pub mod session;
pub mod settings;
pub mod travel;
