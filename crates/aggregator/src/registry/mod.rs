//! Provider registry and fan-out coordination.
//!
//! This module provides:
//! - [`ProviderRegistry`]: the fixed, ordered set of market and news adapters
//! - [`FanOut`]: concurrent execution of one request across those adapters
//!   under a global deadline, with optional per-attempt timeouts and retries

mod fanout;
mod registry;

pub use fanout::{CallOutcome, CallState, FanOut, ProviderCall};
pub use registry::ProviderRegistry;
