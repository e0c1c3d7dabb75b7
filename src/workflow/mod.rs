//! Multi-step operations composed from API client calls

pub mod clone;
pub mod purge;

pub use clone::clone_host;
pub use purge::{PurgeError, PurgeOutcome, PurgeWorkflow};
