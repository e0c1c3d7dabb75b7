//! API client module

pub mod auth;
pub mod client;
pub mod error;
pub mod types;

pub use client::StrikeTrackerClient;
pub use error::ApiError;
