//! Event emitter trait for lifecycle event delivery.
//!
//! Implementations handle transport details (broadcast channels, SSE, etc.).

use crate::events::ProviderEvent;

/// Sink for provider lifecycle events.
///
/// Keeps channel types out of the public API of anything that only needs to
/// receive what the manager publishes.
pub trait EventEmitter: Send + Sync {
    /// Emit an event.
    ///
    /// Called with manager state locked, so it must not block.
    fn emit(&self, event: ProviderEvent);
}
