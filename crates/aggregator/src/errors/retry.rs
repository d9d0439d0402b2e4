/// Classification for retry policy.
///
/// Used by the fan-out coordinator to decide whether a failed provider call
/// may be attempted again within the same request.
///
/// # Behavior Summary
///
/// | Class | Retried when retries are enabled? |
/// |-------|-----------------------------------|
/// | `Transient` | Yes, while the request deadline has not passed |
/// | `Never` | No |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// The failure may clear on its own (timeout, dropped connection, 5xx).
    Transient,

    /// Retrying won't help: the provider throttled us or sent garbage.
    Never,
}
