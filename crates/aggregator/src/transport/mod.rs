//! Shared HTTP transport.
//!
//! This module contains:
//! - The `HttpTransport` trait every adapter talks through
//! - `HttpClient`, the pooled reqwest-backed implementation with an explicit
//!   init/shutdown lifecycle
//!
//! The trait is the substitution seam: tests hand adapters a stub transport
//! instead of a live client.

mod client;
mod traits;

#[cfg(test)]
pub(crate) mod stub;

pub use client::HttpClient;
pub use traits::{HttpRequest, HttpResponse, HttpTransport, TransportError};
pub use reqwest::Method;
