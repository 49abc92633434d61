//! Polling feed backed by the PSX terminal REST API.

pub mod provider;
pub mod response;
