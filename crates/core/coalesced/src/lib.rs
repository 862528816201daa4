//! Request coalescing for a rate limited upstream.
//!
//! Callers asking for the same key within a short window are served by a
//! single upstream call. Results are kept for a short TTL, and callers
//! arriving while a call is already running share its outcome instead of
//! starting another one.

mod cache;
mod config;
mod error;
mod fetch;
mod inflight;
mod key;
mod service;
mod window;


pub use config::CoalescionServiceConfig;
pub use error::Error;
pub use fetch::{Fetch, Fetched};
pub use key::normalize;
pub use service::CoalescionService;

pub use async_trait::async_trait;
