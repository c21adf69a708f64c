//! Command implementations

pub mod agents;
pub mod lifecycle;
pub mod version;
